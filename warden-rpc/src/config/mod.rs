mod app;
pub use app::App;

mod database;
pub use database::{Database, RocksDBCommon, RocksDBOptions, Storage};

mod agent;
pub use agent::Agent;

mod platform;
pub use platform::Platform;

mod scheduler;
pub use scheduler::Scheduler;

mod bpdm;
pub use bpdm::Bpdm;

#[allow(clippy::module_inception)]
mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
