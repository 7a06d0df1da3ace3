pub mod callback;
pub mod connection;
pub mod credential;
pub mod revocation;
pub mod wallet;
