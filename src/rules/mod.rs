pub mod activity;
pub mod clock;
pub mod export;
pub mod stats;
pub mod window;
