pub mod alerts;
pub mod cases;
pub mod dashboard;
pub mod public;
pub mod reports;
