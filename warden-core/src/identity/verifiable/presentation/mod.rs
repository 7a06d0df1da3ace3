pub mod types;

mod verifier;
pub use verifier::Verifier;

mod usecase;
pub use usecase::Usecase;
