pub mod api;
pub mod early_warning;
pub mod entities;
pub mod forecast;
pub mod metrics;
pub mod migrator;
pub mod risk_rank;
pub mod store;
pub mod summary;
pub mod telemetry;
pub mod timeframe;

pub use sea_orm;
