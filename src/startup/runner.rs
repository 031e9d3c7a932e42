//! Fault-isolated execution of startup actions
//!
//! One action's failure never skips the remaining actions, and a structural
//! failure in one pass (the action list itself being malformed) never stops
//! the later passes. The runner owns the logging; `perform` just returns a
//! result, which keeps the isolation policy testable on its own.

use crate::config::ConfigTree;
use crate::shell::{classify_file, ShellFacade};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Outcome of one runner pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub attempted: usize,
    pub failed: usize,
    /// True when the pass never ran its actions because the list itself was
    /// malformed.
    pub aborted: bool,
}

/// Runs the startup actions held in `Global.<key>`, in order, isolating each
/// failure.
///
/// An absent key is a silent no-op. A present key that is not a list aborts
/// only this pass ("unknown error"); each failing action is logged, its
/// diagnostic surfaced through the shell, and the iteration continues.
pub fn run_pass<S, F>(
    shell: &mut S,
    pass: &str,
    master: &ConfigTree,
    key: &str,
    mut perform: F,
) -> PassReport
where
    S: ShellFacade,
    F: FnMut(&mut S, &str) -> Result<()>,
{
    let Some(value) = master.get("Global", key) else {
        tracing::debug!("no Global.{key}, skipping the {pass} pass");
        return PassReport::default();
    };
    let Some(actions) = value.as_list() else {
        tracing::warn!("unknown error in the {pass} pass: Global.{key} is not a list of actions");
        return PassReport {
            aborted: true,
            ..PassReport::default()
        };
    };

    let mut report = PassReport::default();
    for action in actions {
        report.attempted += 1;
        tracing::debug!("{pass}: {action}");
        if let Err(err) = perform(shell, action) {
            report.failed += 1;
            tracing::warn!("error in the {pass} pass for '{action}': {err:#}");
            shell.show_diagnostic(&err);
        }
    }
    report
}

/// Locates `name` in the current directory, then in the config directory.
pub fn locate_file(name: &str, config_dir: Option<&Path>) -> Result<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    if let Some(dir) = config_dir {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    bail!("startup file '{name}' not found in the current directory or the config directory")
}

/// One action of the startup-files pass: locate the file, dispatch it by
/// extension, and skip unrecognized extensions with a warning.
pub fn run_startup_file<S: ShellFacade>(
    shell: &mut S,
    name: &str,
    config_dir: Option<&Path>,
) -> Result<()> {
    let path = locate_file(name, config_dir)?;
    match classify_file(&path) {
        Some(kind) => shell.run_file(&path, kind),
        None => {
            tracing::warn!(
                "startup file {} is neither a .rsh script nor a .rlog transcript, skipping",
                path.display()
            );
            Ok(())
        }
    }
}
