//! Tool capabilities attached to remote agents, and locally executed tools.

pub mod capability;
pub mod session_tool;
pub mod tool;
pub mod types;
pub mod validation;

pub use capability::ToolCapability;
pub use session_tool::SessionTool;
pub use tool::{FnTool, Tool};
pub use types::ToolParameters;
