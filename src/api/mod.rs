pub mod attendance;
pub mod dashboard;
pub mod members;
pub mod reports;
pub mod settings;
