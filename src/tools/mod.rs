//! Tool declaration, registration, and dispatch.

pub mod arguments;
pub mod registry;
pub mod tool;
pub mod types;
pub(crate) mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{FunctionTool, StopSignal, Tool, ToolContext};
pub use types::{ParameterBuilder, ToolParameters};

/// Which declared tools a call exposes to the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolFilter {
    /// Every registered tool.
    #[default]
    Auto,
    /// Only the named subset. Naming an unregistered tool fails the call
    /// before any request is sent.
    Named(Vec<String>),
    /// No tools at all.
    Disabled,
}

impl ToolFilter {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Named(names.into_iter().map(Into::into).collect())
    }
}
