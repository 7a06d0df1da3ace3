pub mod types;

mod credential;
pub use credential::{Credential, StatusRef};

mod usecase;
pub use usecase::Usecase;
