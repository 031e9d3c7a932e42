//! The staged startup pipeline
//!
//! A fixed, ordered sequence of stages over one mutable pipeline state:
//!
//! ```text
//! create-defaults -> load-command-line -> post-command-line
//!   -> load-file -> post-file -> pre-construct
//! ```
//!
//! followed by engine construction, the three fault-isolated startup passes,
//! and the main loop. Every stage failure before the startup passes is fatal.
//! The stages are plain functions in a table rather than overridable methods;
//! there is exactly one pipeline variant.

pub mod runner;

use crate::config::{self, ConfigTree, ConfigValue};
use crate::shell::ShellFacade;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub use runner::{run_pass, run_startup_file, PassReport};

type StageFn = fn(&mut Pipeline) -> Result<()>;

/// The configuration stages, in their one and only order.
const STAGES: &[(&str, StageFn)] = &[
    ("create-defaults", Pipeline::create_defaults),
    ("load-command-line", Pipeline::load_command_line),
    ("post-command-line", Pipeline::post_command_line),
    ("load-file", Pipeline::load_file),
    ("post-file", Pipeline::post_file),
    ("pre-construct", Pipeline::pre_construct),
];

/// Mutable state threaded through the configuration stages.
///
/// Each raw tree is owned by exactly one source; the stages are the only
/// code allowed to mutate them, and `master_config` exists only after the
/// pre-construct stage has run.
pub struct Pipeline {
    config_dir: Option<PathBuf>,
    pending_command_line: ConfigTree,
    default_config: ConfigTree,
    command_line_config: ConfigTree,
    file_config: ConfigTree,
    master_config: ConfigTree,
}

impl Pipeline {
    /// `command_line` is the already-parsed command-line source: it holds
    /// exactly the keys the user passed, nothing defaulted.
    pub fn new(command_line: ConfigTree) -> Self {
        Self::with_config_dir(command_line, config::config_dir())
    }

    pub fn with_config_dir(command_line: ConfigTree, config_dir: Option<PathBuf>) -> Self {
        Pipeline {
            config_dir,
            pending_command_line: command_line,
            default_config: ConfigTree::new(),
            command_line_config: ConfigTree::new(),
            file_config: ConfigTree::new(),
            master_config: ConfigTree::new(),
        }
    }

    /// Runs every configuration stage in order and yields the master
    /// configuration, ready for engine construction.
    pub fn resolve(mut self) -> Result<ConfigTree> {
        for (name, stage) in STAGES {
            tracing::debug!("startup stage: {name}");
            stage(&mut self)?;
        }
        Ok(self.master_config)
    }

    fn create_defaults(&mut self) -> Result<()> {
        self.default_config = config::default_config();
        Ok(())
    }

    fn load_command_line(&mut self) -> Result<()> {
        self.command_line_config = std::mem::take(&mut self.pending_command_line);
        Ok(())
    }

    /// Strips the deprecated threaded-shell request before it can reach the
    /// master configuration.
    fn post_command_line(&mut self) -> Result<()> {
        if self
            .command_line_config
            .remove("Global", "threaded_shell")
            .is_some()
        {
            tracing::warn!(
                "the threaded shell flags (--pylab, --wthread, --qthread, --q4thread, \
                 --gthread) are deprecated and have no effect"
            );
        }
        Ok(())
    }

    fn load_file(&mut self) -> Result<()> {
        if self.command_line_config.get_bool("Global", "quick") == Some(true) {
            tracing::debug!("quick startup requested, skipping the config file");
            self.file_config = ConfigTree::new();
            return Ok(());
        }
        let Some(dir) = self.config_dir.clone() else {
            tracing::debug!("no config directory, skipping the config file");
            self.file_config = ConfigTree::new();
            return Ok(());
        };
        let file_name = self
            .command_line_config
            .get_str("Global", "config_file")
            .or_else(|| self.default_config.get_str("Global", "config_file"))
            .unwrap_or(config::loader::DEFAULT_CONFIG_FILE_NAME)
            .to_string();
        self.file_config = config::load_file_config(&dir, &file_name)?;
        Ok(())
    }

    /// Moves `--ext` into the file source's extension list before the merge,
    /// so the appended value is subject to normal precedence afterwards.
    fn post_file(&mut self) -> Result<()> {
        let Some(value) = self
            .command_line_config
            .remove("Global", "extra_extension")
        else {
            return Ok(());
        };
        if let ConfigValue::Str(name) = value {
            let mut extensions = self
                .file_config
                .get_list("Global", "extensions")
                .map(<[String]>::to_vec)
                .unwrap_or_default();
            extensions.push(name);
            self.file_config.set("Global", "extensions", extensions);
        }
        Ok(())
    }

    fn pre_construct(&mut self) -> Result<()> {
        let mut master = config::resolve(
            &self.default_config,
            &self.file_config,
            &self.command_line_config,
        );
        config::apply_derived_overrides(&mut master);
        self.master_config = master;
        Ok(())
    }
}

/// Post-construction startup: banner first, then the three fault-isolated
/// passes in fixed order. Nothing here can fail the session.
pub fn post_construct<S: ShellFacade>(
    shell: &mut S,
    master: &ConfigTree,
    config_dir: Option<&Path>,
) {
    // The banner is shown by hand so it renders before any startup-action
    // output, never interleaved with it.
    shell.set_banner_enabled(false);
    if master.get_bool("Global", "display_banner").unwrap_or(true) {
        shell.show_banner();
    }

    run_pass(shell, "extensions", master, "extensions", |s, name| {
        s.load_extension(name)
    });
    run_pass(shell, "startup statements", master, "exec_lines", |s, code| {
        s.run_statement(code)
    });
    run_pass(shell, "startup files", master, "exec_files", |s, name| {
        run_startup_file(s, name, config_dir)
    });
}
