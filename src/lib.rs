//! Interactive command shell with layered configuration and a fault-isolated
//! startup pipeline.
//!
//! Configuration comes from three sources with fixed precedence (builtin
//! defaults < config file < command line), is resolved into one master tree,
//! and drives a strictly ordered startup: derived overrides, engine
//! construction, banner, then extensions, startup statements, and startup
//! files — each pass isolating per-action failures — before the main loop.

pub mod cli;
pub mod config;
pub mod shell;
pub mod startup;

pub use config::{ConfigTree, ConfigValue};
pub use shell::{Engine, ShellFacade};
pub use startup::Pipeline;
