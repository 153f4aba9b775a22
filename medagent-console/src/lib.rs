pub mod cli;
pub mod config;
pub mod report;
pub mod telemetry;

pub use cli::{Cli, Command, Outcome, execute, run};
pub use config::ConsoleConfig;
pub use telemetry::init_tracing;
