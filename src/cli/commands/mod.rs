//! CLI command implementations.

mod build;
mod cache;
mod check;
mod config;
mod doctor;
mod movapp;

pub use build::run_build;
pub use cache::run_cache;
pub use check::run_check;
pub use config::run_config;
pub use doctor::run_doctor;
pub use movapp::run_movapp;
