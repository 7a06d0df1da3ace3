mod call;
pub use call::{call, call_empty, call_limited, CallError, HttpClient};
