pub mod aggregation;
pub mod auth;
pub mod fiscal;
pub mod state;
pub mod targets;
