//! `identity` is the root of all wallet related domains.
//!
//! - `wallet`: provisioning, deletion and default credential bootstrap
//! - `connection`: the RFC23 connection sub-machine
//! - `exchange`: the credential exchange sub-machine
//! - `callback`: pending callback correlation and outbound notifications
//! - `revocation`: bitstring status lists
//! - `verifiable`: credential and presentation issuance and verification
pub mod callback;
pub mod connection;
pub mod exchange;
pub mod revocation;
pub mod types;
pub mod verifiable;
pub mod wallet;
