//! Roles and task kinds: the closed sets every worker is parameterised by.
//!
//! A worker's behaviour is data (its `RoleConfig` row) plus the small pure
//! functions here, dispatched over the role tag.

use crate::skill;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Cook,
    Waiter,
    Bartender,
    Cleaner,
    Bouncer,
    Manager,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Cook,
        Role::Waiter,
        Role::Bartender,
        Role::Cleaner,
        Role::Bouncer,
        Role::Manager,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Cook      => "cook",
            Role::Waiter    => "waiter",
            Role::Bartender => "bartender",
            Role::Cleaner   => "cleaner",
            Role::Bouncer   => "bouncer",
            Role::Manager   => "manager",
        }
    }

    /// The primary skill a role is hired, paid and trained for.
    pub fn primary_skill(&self) -> &'static str {
        match self {
            Role::Cook      => skill::COOKING,
            Role::Waiter    => skill::SERVICE,
            Role::Bartender => skill::MIXOLOGY,
            Role::Cleaner   => skill::CLEANING,
            Role::Bouncer   => skill::SECURITY,
            Role::Manager   => skill::MANAGEMENT,
        }
    }

    /// Task kinds a role handles when no configuration overrides them.
    pub fn default_task_kinds(&self) -> &'static [TaskKind] {
        match self {
            Role::Cook      => &[TaskKind::CookOrder, TaskKind::Restock],
            Role::Waiter    => &[TaskKind::TakeOrder, TaskKind::ServeOrder, TaskKind::CleanTable],
            Role::Bartender => &[TaskKind::MixDrink, TaskKind::Restock],
            Role::Cleaner   => &[TaskKind::CleanTable, TaskKind::CleanSpill],
            Role::Bouncer   => &[TaskKind::Patrol, TaskKind::RemoveTroublemaker],
            Role::Manager   => &[TaskKind::Supervise, TaskKind::TakeOrder],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.name() == s)
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CookOrder,
    TakeOrder,
    ServeOrder,
    MixDrink,
    CleanTable,
    CleanSpill,
    Restock,
    Patrol,
    RemoveTroublemaker,
    Supervise,
}

impl TaskKind {
    pub const ALL: [TaskKind; 10] = [
        TaskKind::CookOrder,
        TaskKind::TakeOrder,
        TaskKind::ServeOrder,
        TaskKind::MixDrink,
        TaskKind::CleanTable,
        TaskKind::CleanSpill,
        TaskKind::Restock,
        TaskKind::Patrol,
        TaskKind::RemoveTroublemaker,
        TaskKind::Supervise,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::CookOrder          => "cook_order",
            TaskKind::TakeOrder          => "take_order",
            TaskKind::ServeOrder         => "serve_order",
            TaskKind::MixDrink           => "mix_drink",
            TaskKind::CleanTable         => "clean_table",
            TaskKind::CleanSpill         => "clean_spill",
            TaskKind::Restock            => "restock",
            TaskKind::Patrol             => "patrol",
            TaskKind::RemoveTroublemaker => "remove_troublemaker",
            TaskKind::Supervise          => "supervise",
        }
    }

    pub fn default_relevant_skill(&self) -> &'static str {
        match self {
            TaskKind::CookOrder                          => skill::COOKING,
            TaskKind::TakeOrder | TaskKind::ServeOrder   => skill::SERVICE,
            TaskKind::MixDrink                           => skill::MIXOLOGY,
            TaskKind::CleanTable | TaskKind::CleanSpill  => skill::CLEANING,
            TaskKind::Restock                            => skill::SPEED,
            TaskKind::Patrol | TaskKind::RemoveTroublemaker => skill::SECURITY,
            TaskKind::Supervise                          => skill::MANAGEMENT,
        }
    }

    /// Kinds a customer interaction is served with directly.
    pub fn is_customer_facing(&self) -> bool {
        matches!(
            self,
            TaskKind::CookOrder | TaskKind::TakeOrder | TaskKind::ServeOrder | TaskKind::MixDrink
        )
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
