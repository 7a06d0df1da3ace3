pub mod bitstring;
pub mod types;

mod list;
pub use list::{build_status_list_credential, decode_status_list_credential, RevocationList};

mod usecase;
pub use usecase::Usecase;
