//! Premium user entity - Users granted access to premium-only commands.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Premium user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "premium_users")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Discord user ID, stored as a string like every other snowflake
    #[sea_orm(unique)]
    pub user_id: String,
    /// Discord user ID of the owner who granted premium
    pub granted_by: String,
    /// When premium was granted
    pub granted_at: DateTime,
}

/// `PremiumUser` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
