//! Concrete interactive engine
//!
//! Statements are system commands resolved through a cwd-prefixed PATH, plus
//! a handful of builtins (`cd`, `set`, `vars`, `history`, `edit`, `exit`).
//! All engine settings are snapshotted from the master configuration at
//! construction time and never change afterwards, which is why every derived
//! override must be applied before [`Engine::construct`] runs.

use crate::config::ConfigTree;
use crate::shell::{FileKind, ShellFacade};
use anyhow::{bail, Context, Result};
use reedline::{
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline, Signal,
};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorScheme {
    NoColor,
    Linux,
    LightBg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExceptionMode {
    Plain,
    Context,
    Verbose,
}

/// Engine settings, frozen at construction.
#[derive(Debug, Clone)]
struct Settings {
    prompt_in1: String,
    prompt_in2: String,
    prompt_out: String,
    separate_in: String,
    separate_out: String,
    separate_out2: String,
    colors: ColorScheme,
    xmode: ExceptionMode,
    pprint: bool,
    cache_size: usize,
    confirm_exit: bool,
    screen_length: usize,
    term_title: bool,
    editor: String,
}

impl Settings {
    fn from_config(config: &ConfigTree) -> Result<Self> {
        let colors = match config.get_str("Shell", "colors").unwrap_or("Linux") {
            "NoColor" => ColorScheme::NoColor,
            "Linux" => ColorScheme::Linux,
            "LightBG" => ColorScheme::LightBg,
            other => bail!("unsupported color scheme '{other}' (expected NoColor, Linux, or LightBG)"),
        };
        let xmode = match config.get_str("Shell", "xmode").unwrap_or("Context") {
            "Plain" => ExceptionMode::Plain,
            "Context" => ExceptionMode::Context,
            "Verbose" => ExceptionMode::Verbose,
            other => bail!("unsupported exception mode '{other}' (expected Plain, Context, or Verbose)"),
        };

        let cache_size = config.get_int("Shell", "cache_size").unwrap_or(1000);
        if cache_size < 0 {
            bail!("cache_size must not be negative, got {cache_size}");
        }
        let screen_length = config.get_int("Shell", "screen_length").unwrap_or(0).max(0);

        Ok(Settings {
            prompt_in1: config.get_str("Shell", "prompt_in1").unwrap_or("ir> ").to_string(),
            prompt_in2: config.get_str("Shell", "prompt_in2").unwrap_or("... ").to_string(),
            prompt_out: config.get_str("Shell", "prompt_out").unwrap_or("=> ").to_string(),
            separate_in: config.get_str("Shell", "separate_in").unwrap_or("\n").to_string(),
            separate_out: config.get_str("Shell", "separate_out").unwrap_or("").to_string(),
            separate_out2: config.get_str("Shell", "separate_out2").unwrap_or("").to_string(),
            colors,
            xmode,
            pprint: config.get_bool("Shell", "pprint").unwrap_or(true),
            cache_size: cache_size as usize,
            confirm_exit: config.get_bool("Shell", "confirm_exit").unwrap_or(true),
            screen_length: screen_length as usize,
            term_title: config.get_bool("Shell", "term_title").unwrap_or(true),
            editor: config.get_str("Shell", "editor").unwrap_or("vi").to_string(),
        })
    }
}

/// The interactive command engine.
#[derive(Debug)]
pub struct Engine {
    settings: Settings,
    banner_enabled: bool,
    path_env: OsString,
    vars: HashMap<String, String>,
    history: Vec<String>,
    timer: bool,
    show_exit_status: bool,
    exit_requested: bool,
}

impl Engine {
    /// Builds the engine from the resolved master configuration. Any
    /// unsupported setting value is fatal: a malformed engine cannot proceed.
    ///
    /// The command search path is extended with the current working
    /// directory, ahead of the inherited PATH.
    pub fn construct(master: &ConfigTree) -> Result<Self> {
        let settings = Settings::from_config(master)?;

        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let path_env = std::env::join_paths(
            std::iter::once(std::path::PathBuf::from("."))
                .chain(std::env::split_paths(&inherited)),
        )
        .context("current PATH cannot be extended with the working directory")?;

        Ok(Engine {
            settings,
            banner_enabled: true,
            path_env,
            vars: HashMap::new(),
            history: Vec::new(),
            timer: false,
            show_exit_status: false,
            exit_requested: false,
        })
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    fn remember(&mut self, code: &str) {
        if self.settings.cache_size == 0 {
            return;
        }
        self.history.push(code.to_string());
        if self.history.len() > self.settings.cache_size {
            let excess = self.history.len() - self.settings.cache_size;
            self.history.drain(..excess);
        }
    }

    fn run_external(&mut self, program: &str, args: &[&str]) -> Result<()> {
        let started = Instant::now();
        let status = Command::new(program)
            .args(args)
            .env("PATH", &self.path_env)
            .envs(&self.vars)
            .status()
            .with_context(|| format!("failed to launch '{program}'"))?;

        if self.timer {
            println!("# {:.3}s", started.elapsed().as_secs_f64());
        }
        if self.show_exit_status {
            println!("{}{}", self.settings.prompt_out, status.code().unwrap_or(-1));
        }
        if !status.success() {
            bail!("'{program}' exited with {status}");
        }
        Ok(())
    }

    fn print_vars(&self) {
        let width = self.vars.keys().map(String::len).max().unwrap_or(0);
        let mut names: Vec<_> = self.vars.keys().collect();
        names.sort();
        for name in names {
            if self.settings.pprint {
                println!("{name:width$} = {}", self.vars[name]);
            } else {
                println!("{name}={}", self.vars[name]);
            }
        }
    }

    fn print_history(&self) {
        let entries = if self.settings.screen_length > 0 {
            let skip = self.history.len().saturating_sub(self.settings.screen_length);
            &self.history[skip..]
        } else {
            &self.history[..]
        };
        for (idx, entry) in entries.iter().enumerate() {
            println!("{:4}  {entry}", idx + 1);
        }
    }

    fn edit_and_run(&mut self) -> Result<()> {
        let scratch = std::env::temp_dir().join("ironrepl_edit.rsh");
        if !scratch.exists() {
            fs::write(&scratch, "").with_context(|| {
                format!("failed to create scratch file {}", scratch.display())
            })?;
        }
        let editor = self.settings.editor.clone();
        let status = Command::new(&editor)
            .arg(&scratch)
            .status()
            .with_context(|| format!("failed to launch editor '{editor}'"))?;
        if !status.success() {
            bail!("editor '{editor}' exited with {status}");
        }
        self.run_file(&scratch, FileKind::Script)
    }

    fn confirm_exit(&self) -> bool {
        if !self.settings.confirm_exit {
            return true;
        }
        print!("Do you really want to exit ([y]/n)? ");
        use std::io::Write;
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return true;
        }
        !answer.trim_start().starts_with(['n', 'N'])
    }

    fn print_separator(sep: &str) {
        // The literal "0" marks an explicitly empty separator.
        if !sep.is_empty() && sep != "0" {
            print!("{sep}");
        }
    }
}

impl ShellFacade for Engine {
    fn set_banner_enabled(&mut self, enabled: bool) {
        self.banner_enabled = enabled;
    }

    fn show_banner(&mut self) {
        println!(
            "ironrepl {} -- an interactive command shell",
            env!("CARGO_PKG_VERSION")
        );
        println!("Type 'exit' to leave, 'history' to review the session.");
        println!();
    }

    fn load_extension(&mut self, name: &str) -> Result<()> {
        match name {
            "timer" => self.timer = true,
            "exit-status" => self.show_exit_status = true,
            other => bail!("unknown extension '{other}'"),
        }
        tracing::debug!("loaded extension {name}");
        Ok(())
    }

    fn run_statement(&mut self, code: &str) -> Result<()> {
        let code = code.trim();
        if code.is_empty() || code.starts_with('#') {
            return Ok(());
        }
        self.remember(code);

        let parts: Vec<&str> = code.split_whitespace().collect();
        match parts[0] {
            "exit" | "quit" => {
                self.exit_requested = true;
                Ok(())
            }
            "cd" => {
                let target = parts
                    .get(1)
                    .map(|dir| dir.to_string())
                    .or_else(|| std::env::var("HOME").ok())
                    .context("cd: no target directory and HOME is not set")?;
                std::env::set_current_dir(&target)
                    .with_context(|| format!("cd: cannot change to '{target}'"))
            }
            "set" => {
                let name = parts.get(1).context("set: usage: set NAME VALUE")?;
                let value = parts.get(2..).unwrap_or_default().join(" ");
                self.vars.insert(name.to_string(), value);
                Ok(())
            }
            "vars" => {
                self.print_vars();
                Ok(())
            }
            "history" => {
                self.print_history();
                Ok(())
            }
            "edit" => self.edit_and_run(),
            program => self.run_external(program, &parts[1..]),
        }
    }

    fn run_file(&mut self, path: &Path, kind: FileKind) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let statements = match kind {
            FileKind::Script => script_statements(&content),
            FileKind::Transcript => transcript_statements(&content),
        };
        for statement in statements {
            self.run_statement(&statement)
                .with_context(|| format!("in {}", path.display()))?;
        }
        Ok(())
    }

    fn show_diagnostic(&mut self, err: &anyhow::Error) {
        let rendered = match self.settings.xmode {
            ExceptionMode::Plain => format!("{err}"),
            ExceptionMode::Context => format!("{err:#}"),
            ExceptionMode::Verbose => {
                let mut lines = format!("{err}");
                for cause in err.chain().skip(1) {
                    lines.push_str(&format!("\n  caused by: {cause}"));
                }
                lines
            }
        };
        if self.settings.colors == ColorScheme::NoColor {
            eprintln!("{rendered}");
        } else {
            eprintln!("\x1b[31m{rendered}\x1b[0m");
        }
    }

    fn main_loop(&mut self) -> Result<()> {
        if self.settings.term_title {
            print!("\x1b]0;ironrepl\x07");
        }
        if self.banner_enabled {
            self.show_banner();
        }

        let mut line_editor = Reedline::create();
        let prompt = ReplPrompt {
            left: self.settings.prompt_in1.clone(),
            continuation: self.settings.prompt_in2.clone(),
        };

        loop {
            if self.exit_requested {
                break;
            }
            Self::print_separator(&self.settings.separate_in);

            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    Self::print_separator(&self.settings.separate_out);
                    if let Err(err) = self.run_statement(&line) {
                        self.show_diagnostic(&err);
                    }
                    Self::print_separator(&self.settings.separate_out2);
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(Signal::CtrlD) => {
                    if self.confirm_exit() {
                        break;
                    }
                }
                Err(err) => {
                    // Not a tty, or the terminal went away: end the session.
                    tracing::debug!("line editor stopped: {err}");
                    break;
                }
            }
        }
        Ok(())
    }
}

fn script_statements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Extracts the statements from a recorded session. Only lines carrying the
/// classic prompts are replayed; continuation lines extend the previous
/// statement and everything else is session output, which is ignored.
fn transcript_statements(content: &str) -> Vec<String> {
    let mut statements: Vec<String> = Vec::new();
    for line in content.lines() {
        if let Some(stmt) = line.strip_prefix(">>> ") {
            statements.push(stmt.trim_end().to_string());
        } else if let Some(cont) = line.strip_prefix("... ") {
            if let Some(last) = statements.last_mut() {
                last.push(' ');
                last.push_str(cont.trim_end());
            }
        }
    }
    statements.retain(|stmt| !stmt.is_empty());
    statements
}

struct ReplPrompt {
    left: String,
    continuation: String,
}

impl Prompt for ReplPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.left)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.continuation)
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({prefix}reverse search) "))
    }
}
