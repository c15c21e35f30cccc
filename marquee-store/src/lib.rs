pub mod app_config;
pub mod database;
pub mod pg;

pub use app_config::{BusinessRules, Config};
pub use database::DbClient;
pub use pg::PgStore;
