//! Interactive engine seam
//!
//! The startup pipeline only ever talks to the engine through
//! [`ShellFacade`], which keeps the fault-isolation policy testable against
//! a recording stub.

pub mod engine;

use anyhow::Result;
use std::path::Path;

pub use engine::Engine;

/// How a startup file is executed, selected by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.rsh`: every non-blank, non-comment line is a statement.
    Script,
    /// `.rlog`: a recorded session; only prompt-prefixed lines are replayed.
    Transcript,
}

/// Classifies a startup file by extension. `None` means the file is skipped
/// with a warning, never an error.
pub fn classify_file(path: &Path) -> Option<FileKind> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("rsh") => Some(FileKind::Script),
        Some("rlog") => Some(FileKind::Transcript),
        _ => None,
    }
}

/// Narrow interface the startup pipeline drives the engine through.
pub trait ShellFacade {
    /// Suppresses or restores the engine's own banner printing; the pipeline
    /// shows the banner by hand so it lands before any startup-action output.
    fn set_banner_enabled(&mut self, enabled: bool);

    fn show_banner(&mut self);

    fn load_extension(&mut self, name: &str) -> Result<()>;

    fn run_statement(&mut self, code: &str) -> Result<()>;

    fn run_file(&mut self, path: &Path, kind: FileKind) -> Result<()>;

    /// Renders a recoverable failure the way the engine renders its own
    /// runtime errors, honoring the configured exception mode and colors.
    fn show_diagnostic(&mut self, err: &anyhow::Error);

    /// Blocks until the interactive session ends.
    fn main_loop(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(
            classify_file(&PathBuf::from("startup.rsh")),
            Some(FileKind::Script)
        );
        assert_eq!(
            classify_file(&PathBuf::from("session.rlog")),
            Some(FileKind::Transcript)
        );
        assert_eq!(classify_file(&PathBuf::from("notes.txt")), None);
        assert_eq!(classify_file(&PathBuf::from("no_extension")), None);
    }
}
