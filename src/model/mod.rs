pub mod attendance;
pub mod clock_time;
pub mod role;
pub mod settings;
pub mod user;
