/// Database configuration and connection management
pub mod database;

/// Bot owner IDs from environment variables
pub mod owners;

/// Bot settings and per-command overrides loaded from config.toml
pub mod settings;
