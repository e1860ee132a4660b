pub mod clock;
pub mod config;
pub mod error;
pub mod live_channels;
pub mod messages;
pub mod models;
pub mod platform;
pub mod schedule;
pub mod screen;
