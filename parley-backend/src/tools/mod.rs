pub mod builtin;
pub mod http_retry;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{ToolContext, ToolDefinition};
