//! Tool System - descriptors, the JSON registry, and process execution

mod descriptor;
mod executor;
mod registry;

pub use descriptor::ToolDescriptor;
pub use executor::{DEFAULT_MAX_OUTPUT_BYTES, ProcessExecutor, RecordingExecutor, ToolExecutor};
pub use registry::{LISTING_HEADER, REGISTRY_FILE_NAME, ToolRegistry};
