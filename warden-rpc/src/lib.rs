//! `prople-warden-rpc` implements every seam of `prople-warden-core`: RocksDB backed
//! repositories, the identity agent client, callback notifications, remote status lists
//! and the BPDM pipeline trigger. [`WardenRPC`] wires them into the core usecases.
pub mod common;

mod apps;
pub use apps::DbBuilder;

pub mod config;

pub mod rpc;

mod warden;
pub use warden::{
    AgentClient, BootstrapService, BpdmClient, CallbackService, ConnectionService,
    CredentialService, ExchangeService, Identity, PresentationService, RevocationService,
    WalletService, WardenRPC,
};
