pub mod credential;
pub mod presentation;
pub mod proof;
pub mod vc;
pub mod vp;

pub use vc::VerifiableCredential;
pub use vp::VerifiablePresentation;
