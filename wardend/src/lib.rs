//! `prople-wardend` is the daemon of the managed identity wallet. It receives the agent
//! webhooks, serves the public status lists and drives the periodic jobs.
pub mod errors;
pub mod svc;
