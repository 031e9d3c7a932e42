//! Builtin defaults and config file loading
//!
//! The file source parses TOML to a generic value first and then lowers it
//! into a [`ConfigTree`], so the file shares the exact value model of the
//! other sources. A missing file is an empty tree, not an error; a file that
//! fails to parse is fatal.

use crate::config::tree::ConfigTree;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "ironrepl.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML syntax in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "unsupported value for {section}.{key} in {path} \
         (expected bool, integer, string, or list of strings)"
    )]
    UnsupportedValue {
        path: PathBuf,
        section: String,
        key: String,
    },

    #[error("top-level entry '{key}' in {path} is not a [section] table")]
    NotASection { path: PathBuf, key: String },
}

/// Builtin defaults, the lowest-precedence configuration source.
pub fn default_config() -> ConfigTree {
    let mut config = ConfigTree::new();

    config.set("Global", "display_banner", true);
    config.set("Global", "config_file", DEFAULT_CONFIG_FILE_NAME);

    config.set("Shell", "cache_size", 1000i64);
    config.set("Shell", "colors", "Linux");
    config.set("Shell", "confirm_exit", true);
    config.set(
        "Shell",
        "editor",
        std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string()),
    );
    config.set("Shell", "pprint", true);
    config.set("Shell", "prompt_in1", "ir> ");
    config.set("Shell", "prompt_in2", "... ");
    config.set("Shell", "prompt_out", "=> ");
    config.set("Shell", "screen_length", 0i64);
    config.set("Shell", "separate_in", "\n");
    config.set("Shell", "separate_out", "");
    config.set("Shell", "separate_out2", "");
    config.set("Shell", "term_title", true);
    config.set("Shell", "xmode", "Context");

    config
}

/// Per-user configuration directory, e.g. `~/.config/ironrepl` on Linux.
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ironrepl").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads `file_name` from `dir` into a ConfigTree.
///
/// Absence is not an error; the caller gets an empty tree. Anything the
/// parser itself rejects propagates as a fatal [`ConfigError`].
pub fn load_file_config(dir: &Path, file_name: &str) -> Result<ConfigTree, ConfigError> {
    let path = dir.join(file_name);
    if !path.is_file() {
        tracing::debug!("no config file at {}", path.display());
        return Ok(ConfigTree::new());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    let raw: toml::Value = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    tracing::debug!("loaded config file {}", path.display());
    lower(&path, raw)
}

/// Lowers a parsed TOML document into the section/key/value model.
fn lower(path: &Path, raw: toml::Value) -> Result<ConfigTree, ConfigError> {
    let toml::Value::Table(sections) = raw else {
        return Err(ConfigError::NotASection {
            path: path.to_path_buf(),
            key: String::new(),
        });
    };

    let mut config = ConfigTree::new();
    for (section, entries) in sections {
        let toml::Value::Table(entries) = entries else {
            return Err(ConfigError::NotASection {
                path: path.to_path_buf(),
                key: section,
            });
        };
        for (key, value) in entries {
            match value {
                toml::Value::Boolean(b) => config.set(&section, &key, b),
                toml::Value::Integer(n) => config.set(&section, &key, n),
                toml::Value::String(s) => config.set(&section, &key, s),
                toml::Value::Array(items) => {
                    let strings = items
                        .into_iter()
                        .map(|item| match item {
                            toml::Value::String(s) => Ok(s),
                            _ => Err(ConfigError::UnsupportedValue {
                                path: path.to_path_buf(),
                                section: section.clone(),
                                key: key.clone(),
                            }),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    config.set(&section, &key, strings);
                }
                _ => {
                    return Err(ConfigError::UnsupportedValue {
                        path: path.to_path_buf(),
                        section,
                        key,
                    })
                }
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) {
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE_NAME), content).expect("write config");
    }

    #[test]
    fn missing_file_yields_empty_tree() {
        let dir = TempDir::new().expect("temp dir");
        let config = load_file_config(dir.path(), DEFAULT_CONFIG_FILE_NAME).expect("load");
        assert!(config.is_empty());
    }

    #[test]
    fn sections_and_values_are_lowered() {
        let dir = TempDir::new().expect("temp dir");
        write_config(
            &dir,
            r#"
[Global]
display_banner = false
extensions = ["timer", "exit-status"]

[Shell]
cache_size = 50
prompt_in1 = ">> "
"#,
        );

        let config = load_file_config(dir.path(), DEFAULT_CONFIG_FILE_NAME).expect("load");
        assert_eq!(config.get_bool("Global", "display_banner"), Some(false));
        assert_eq!(
            config.get_list("Global", "extensions"),
            Some(&["timer".to_string(), "exit-status".to_string()][..])
        );
        assert_eq!(config.get_int("Shell", "cache_size"), Some(50));
        assert_eq!(config.get_str("Shell", "prompt_in1"), Some(">> "));
    }

    #[test]
    fn syntax_error_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        write_config(&dir, "[Global\ndisplay_banner = false");
        let err = load_file_config(dir.path(), DEFAULT_CONFIG_FILE_NAME).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn float_values_are_rejected() {
        let dir = TempDir::new().expect("temp dir");
        write_config(&dir, "[Shell]\ncache_size = 1.5\n");
        let err = load_file_config(dir.path(), DEFAULT_CONFIG_FILE_NAME).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedValue { .. }));
    }

    #[test]
    fn non_string_list_items_are_rejected() {
        let dir = TempDir::new().expect("temp dir");
        write_config(&dir, "[Global]\nextensions = [1, 2]\n");
        let err = load_file_config(dir.path(), DEFAULT_CONFIG_FILE_NAME).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedValue { .. }));
    }

    #[test]
    fn top_level_scalars_are_rejected() {
        let dir = TempDir::new().expect("temp dir");
        write_config(&dir, "display_banner = false\n");
        let err = load_file_config(dir.path(), DEFAULT_CONFIG_FILE_NAME).unwrap_err();
        assert!(matches!(err, ConfigError::NotASection { .. }));
    }

    #[test]
    fn defaults_enable_the_banner() {
        let config = default_config();
        assert_eq!(config.get_bool("Global", "display_banner"), Some(true));
        assert_eq!(
            config.get_str("Global", "config_file"),
            Some(DEFAULT_CONFIG_FILE_NAME)
        );
    }
}
