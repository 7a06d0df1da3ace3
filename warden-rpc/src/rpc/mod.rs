pub mod shared;

pub mod agent;
pub mod bpdm;
pub mod notifier;
pub mod revocation;
