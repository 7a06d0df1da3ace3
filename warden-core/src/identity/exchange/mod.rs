pub mod types;

mod usecase;
pub use usecase::Usecase;
