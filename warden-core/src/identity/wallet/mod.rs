pub mod types;

mod wallet;
pub use wallet::{AgentKeys, Wallet, WalletKind};

mod bootstrap;
pub use bootstrap::Bootstrap;

mod usecase;
pub use usecase::Usecase;
