pub mod alert;
pub mod barangay;
pub mod dengue_case;
pub mod environmental_report;

pub use alert::Entity as Alert;
pub use barangay::Entity as Barangay;
pub use dengue_case::Entity as DengueCase;
pub use environmental_report::Entity as EnvironmentalReport;
