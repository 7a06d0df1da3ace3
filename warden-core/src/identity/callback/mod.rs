pub mod types;

mod callback;
pub use callback::PendingCallback;

mod usecase;
pub use usecase::Usecase;
