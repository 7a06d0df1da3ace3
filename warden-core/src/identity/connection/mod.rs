pub mod types;

mod connection;
pub use connection::Connection;

mod usecase;
pub use usecase::Usecase;
