//! Staff simulation core: workers, their task queues and activity states,
//! loyalty and risk, payroll and tips, driven by a deterministic clock.

pub mod activity;
pub mod clock;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod event;
pub mod loyalty;
pub mod modifier;
pub mod name_generator;
pub mod orchestrator;
pub mod persistence;
pub mod rng;
pub mod role;
pub mod scoring;
pub mod skill;
pub mod store;
pub mod task;
pub mod task_queue;
pub mod types;
pub mod worker;
