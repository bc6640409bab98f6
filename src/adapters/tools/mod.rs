//! Tool adapters.

mod function_tool;

pub use function_tool::FunctionTool;
