//! ironrepl: an interactive command shell
//!
//! Startup resolves configuration from builtin defaults, the user's config
//! file, and command-line flags, then boots the interactive engine with
//! fault-isolated initialization actions.

use anyhow::Result;

fn main() -> Result<()> {
    ironrepl::cli::run()
}
