//! Type-safe tool argument modules.
//!
//! Each struct implements `ToolArgs` and maps Rust fields to the exact flags
//! of one external tool.

pub mod disk;
pub mod packages;
pub mod system;
