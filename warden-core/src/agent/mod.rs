pub mod types;
pub use types::{AgentAuth, AgentBuilder, AgentError};
