//! Configuration sources, merging, and derived overrides
//!
//! Three layered sources (builtin defaults, TOML config file, command line)
//! with precedence CLI > File > Defaults, resolved into one master tree.

pub mod loader;
pub mod merge;
pub mod tree;

pub use loader::{config_dir, default_config, load_file_config, ConfigError};
pub use merge::{apply_derived_overrides, resolve};
pub use tree::{ConfigTree, ConfigValue};
