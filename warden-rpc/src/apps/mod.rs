pub mod types;

mod db;
pub use db::{Builder as DbBuilder, IdSet as DbIdSet, Runner as DbRunner};

pub mod identity;
