pub mod attendance;
pub mod dashboard;
pub mod reports;
pub mod users;
