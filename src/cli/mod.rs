//! Command-line surface for ironrepl
//!
//! One flag per row of the startup configuration table. Boolean settings are
//! paired enable/disable flags writing the same key; `overrides_with` makes
//! the last one passed win. The derived [`ConfigTree`] holds exactly the
//! flags the user passed — an untouched flag leaves its key absent, so it can
//! never shadow a config-file or default value during the merge.

use crate::config::ConfigTree;
use crate::shell::{Engine, ShellFacade};
use crate::startup::{self, Pipeline};
use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Interactive command shell with layered configuration
#[derive(Parser, Debug)]
#[command(name = "ironrepl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,

    /// Display the banner on startup
    #[arg(long, overrides_with = "nobanner")]
    banner: bool,
    /// Don't display the banner on startup
    #[arg(long, overrides_with = "banner")]
    nobanner: bool,

    /// Size of the statement history cache
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    cache_size: Option<i64>,

    /// Give the shell the feel of a classic bare prompt
    #[arg(long)]
    classic: bool,

    /// Color scheme (NoColor, Linux, or LightBG)
    #[arg(long, value_name = "SCHEME")]
    colors: Option<String>,

    /// Prompt before exiting
    #[arg(long, overrides_with = "noconfirm_exit")]
    confirm_exit: bool,
    /// Don't prompt before exiting
    #[arg(long, overrides_with = "confirm_exit")]
    noconfirm_exit: bool,

    /// Name of the configuration file to load
    #[arg(long, value_name = "NAME")]
    config_file: Option<String>,

    /// Editor used by the edit builtin
    #[arg(long, value_name = "CMD")]
    editor: Option<String>,

    /// Statement to run after startup (repeatable)
    #[arg(short = 'e', long = "exec", value_name = "STMT")]
    exec: Vec<String>,

    /// Name of an extension to load in addition to the configured ones
    #[arg(long = "ext", value_name = "NAME")]
    extra_extension: Option<String>,

    /// Eliminate all spacing between prompts
    #[arg(long)]
    nosep: bool,

    /// Align variable listings
    #[arg(long, overrides_with = "nopprint")]
    pprint: bool,
    /// Don't align variable listings
    #[arg(long, overrides_with = "pprint")]
    nopprint: bool,

    /// Main input prompt
    #[arg(long, value_name = "PROMPT")]
    prompt_in1: Option<String>,

    /// Continuation input prompt
    #[arg(long, value_name = "PROMPT")]
    prompt_in2: Option<String>,

    /// Output prompt
    #[arg(long, value_name = "PROMPT")]
    prompt_out: Option<String>,

    /// Quick startup: skip the configuration file entirely
    #[arg(long)]
    quick: bool,

    /// Number of history lines shown by the history builtin (0 = all)
    #[arg(long, value_name = "N")]
    screen_length: Option<i64>,

    /// Separator printed before the input prompt
    #[arg(long, value_name = "SEP")]
    separate_in: Option<String>,

    /// Separator printed before statement output
    #[arg(long, value_name = "SEP")]
    separate_out: Option<String>,

    /// Separator printed after statement output
    #[arg(long, value_name = "SEP")]
    separate_out2: Option<String>,

    /// Set the terminal title
    #[arg(long, overrides_with = "noterm_title")]
    term_title: bool,
    /// Don't set the terminal title
    #[arg(long, overrides_with = "term_title")]
    noterm_title: bool,

    /// Exception display mode (Plain, Context, or Verbose)
    #[arg(long, value_name = "MODE")]
    xmode: Option<String>,

    /// Deprecated; recognized only to warn, has no effect
    #[arg(long)]
    pylab: bool,
    /// Deprecated; recognized only to warn, has no effect
    #[arg(long)]
    wthread: bool,
    /// Deprecated; recognized only to warn, has no effect
    #[arg(long)]
    qthread: bool,
    /// Deprecated; recognized only to warn, has no effect
    #[arg(long)]
    q4thread: bool,
    /// Deprecated; recognized only to warn, has no effect
    #[arg(long)]
    gthread: bool,

    /// Startup files to run after the startup statements (.rsh or .rlog)
    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

impl Cli {
    /// Lowers the parsed arguments into the command-line configuration
    /// source. Only flags the user actually passed produce keys.
    pub fn command_line_config(&self) -> ConfigTree {
        let mut config = ConfigTree::new();

        flag_pair(&mut config, "Global", "display_banner", self.banner, self.nobanner);
        flag_pair(&mut config, "Shell", "confirm_exit", self.confirm_exit, self.noconfirm_exit);
        flag_pair(&mut config, "Shell", "pprint", self.pprint, self.nopprint);
        flag_pair(&mut config, "Shell", "term_title", self.term_title, self.noterm_title);

        int_value(&mut config, "Shell", "cache_size", self.cache_size);
        int_value(&mut config, "Shell", "screen_length", self.screen_length);

        str_value(&mut config, "Shell", "colors", &self.colors);
        str_value(&mut config, "Shell", "editor", &self.editor);
        str_value(&mut config, "Shell", "prompt_in1", &self.prompt_in1);
        str_value(&mut config, "Shell", "prompt_in2", &self.prompt_in2);
        str_value(&mut config, "Shell", "prompt_out", &self.prompt_out);
        str_value(&mut config, "Shell", "separate_in", &self.separate_in);
        str_value(&mut config, "Shell", "separate_out", &self.separate_out);
        str_value(&mut config, "Shell", "separate_out2", &self.separate_out2);
        str_value(&mut config, "Shell", "xmode", &self.xmode);
        str_value(&mut config, "Global", "config_file", &self.config_file);
        str_value(&mut config, "Global", "extra_extension", &self.extra_extension);

        if self.classic {
            config.set("Global", "classic", true);
        }
        if self.nosep {
            config.set("Global", "nosep", true);
        }
        if self.quick {
            config.set("Global", "quick", true);
        }
        if self.pylab || self.wthread || self.qthread || self.q4thread || self.gthread {
            config.set("Global", "threaded_shell", true);
        }
        if !self.exec.is_empty() {
            config.set("Global", "exec_lines", self.exec.clone());
        }
        if !self.files.is_empty() {
            config.set("Global", "exec_files", self.files.clone());
        }

        config
    }
}

fn flag_pair(config: &mut ConfigTree, section: &str, key: &str, on: bool, off: bool) {
    if on {
        config.set(section, key, true);
    } else if off {
        config.set(section, key, false);
    }
}

fn int_value(config: &mut ConfigTree, section: &str, key: &str, value: Option<i64>) {
    if let Some(n) = value {
        config.set(section, key, n);
    }
}

fn str_value(config: &mut ConfigTree, section: &str, key: &str, value: &Option<String>) {
    if let Some(s) = value {
        config.set(section, key, s.as_str());
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire the verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls
    // back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let config_dir = crate::config::config_dir();
    let master = Pipeline::with_config_dir(cli.command_line_config(), config_dir.clone())
        .resolve()?;

    let mut shell = Engine::construct(&master)?;
    startup::post_construct(&mut shell, &master, config_dir.as_deref());

    tracing::debug!("entering the main loop");
    shell.main_loop()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ironrepl").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn unpassed_flags_leave_no_keys_behind() {
        let config = parse(&[]).command_line_config();
        assert!(config.is_empty());
    }

    #[test]
    fn paired_flags_write_the_same_key() {
        let config = parse(&["--banner"]).command_line_config();
        assert_eq!(config.get_bool("Global", "display_banner"), Some(true));

        let config = parse(&["--nobanner"]).command_line_config();
        assert_eq!(config.get_bool("Global", "display_banner"), Some(false));
    }

    #[test]
    fn the_last_of_a_flag_pair_wins() {
        let config = parse(&["--banner", "--nobanner"]).command_line_config();
        assert_eq!(config.get_bool("Global", "display_banner"), Some(false));

        let config = parse(&["--nopprint", "--pprint"]).command_line_config();
        assert_eq!(config.get_bool("Shell", "pprint"), Some(true));
    }

    #[test]
    fn valued_flags_land_in_the_right_sections() {
        let config = parse(&[
            "--cache-size",
            "42",
            "--colors",
            "NoColor",
            "--ext",
            "timer",
            "--exec",
            "set a 1",
            "--exec",
            "set b 2",
            "boot.rsh",
        ])
        .command_line_config();

        assert_eq!(config.get_int("Shell", "cache_size"), Some(42));
        assert_eq!(config.get_str("Shell", "colors"), Some("NoColor"));
        assert_eq!(config.get_str("Global", "extra_extension"), Some("timer"));
        assert_eq!(
            config.get_list("Global", "exec_lines"),
            Some(&["set a 1".to_string(), "set b 2".to_string()][..])
        );
        assert_eq!(
            config.get_list("Global", "exec_files"),
            Some(&["boot.rsh".to_string()][..])
        );
    }

    #[test]
    fn every_deprecated_flag_requests_the_threaded_shell() {
        for flag in ["--pylab", "--wthread", "--qthread", "--q4thread", "--gthread"] {
            let config = parse(&[flag]).command_line_config();
            assert_eq!(
                config.get_bool("Global", "threaded_shell"),
                Some(true),
                "{flag}"
            );
        }
    }
}
