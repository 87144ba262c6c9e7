//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod command_stat;
pub mod premium_user;

// Re-export specific types to avoid conflicts
pub use command_stat::{Entity as CommandStat, Model as CommandStatModel};
pub use premium_user::{Entity as PremiumUser, Model as PremiumUserModel};
