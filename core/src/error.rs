use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Worker '{id}' not on the roster")]
    UnknownWorker { id: String },

    #[error("Unknown trait '{name}'")]
    UnknownTrait { name: String },

    #[error("Role '{role}' has no configuration")]
    UnknownRole { role: String },

    #[error("Invalid reference: {what}")]
    InvalidReference { what: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
