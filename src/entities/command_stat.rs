//! Command statistics entity - Execution and failure counters per command.
//! Rows are created on first execution and only ever incremented.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Command statistics database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "command_stats")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Command name (e.g., `"ping"`)
    #[sea_orm(unique)]
    pub command: String,
    /// Number of times the handler was started
    pub executed: i64,
    /// Number of times the handler failed or timed out
    pub failed: i64,
    /// When either counter last changed
    pub updated_at: DateTime,
}

/// `CommandStat` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
