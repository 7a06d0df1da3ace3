//! `prople-warden-core` holds the business logic of the managed identity wallet.
//!
//! It never talks to a database or a network by itself. Every external concern is
//! expressed as a trait (repositories, the identity agent, the callback notifier, the
//! BPDM collaborator) and implemented by `prople-warden-rpc`.
pub mod agent;
pub mod bpdm;
pub mod identity;
pub mod locks;
pub mod tasks;

#[cfg(test)]
mod testing;
