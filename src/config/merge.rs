//! Configuration merging and derived overrides
//!
//! Precedence, low to high: defaults < config file < command line. The
//! command-line source only ever records flags the user actually passed, so
//! an untouched flag can never shadow a file or default value.

use crate::config::tree::ConfigTree;

/// Merges the three sources into the master configuration.
///
/// Per (section, key), the highest-precedence source that has the key wins
/// wholesale. List values are replaced, never concatenated; the one place a
/// list grows across sources is the extra-extension rule in the startup
/// pipeline, which runs before this merge.
pub fn resolve(
    default_config: &ConfigTree,
    file_config: &ConfigTree,
    command_line_config: &ConfigTree,
) -> ConfigTree {
    let mut master = default_config.clone();
    overlay(&mut master, file_config);
    overlay(&mut master, command_line_config);
    master
}

fn overlay(master: &mut ConfigTree, higher: &ConfigTree) {
    for (section, key, value) in higher.iter() {
        master.set(section, key, value.clone());
    }
}

/// Applies the post-merge derived overrides, classic first, then nosep.
///
/// Runs exactly once, between the merge and engine construction: the engine
/// snapshots these settings at construction time and cannot change them
/// afterwards.
pub fn apply_derived_overrides(master: &mut ConfigTree) {
    apply_classic(master);
    apply_nosep(master);
}

/// `Global.classic` expands into the settings of a bare classic prompt.
fn apply_classic(master: &mut ConfigTree) {
    if master.get_bool("Global", "classic") != Some(true) {
        return;
    }
    tracing::debug!("classic mode requested, overriding shell settings");
    master.set("Shell", "cache_size", 0i64);
    master.set("Shell", "pprint", false);
    master.set("Shell", "prompt_in1", ">>> ");
    master.set("Shell", "prompt_in2", "... ");
    master.set("Shell", "prompt_out", "");
    master.set("Shell", "separate_in", "");
    master.set("Shell", "separate_out", "");
    master.set("Shell", "separate_out2", "");
    master.set("Shell", "colors", "NoColor");
    master.set("Shell", "xmode", "Plain");
}

/// `Global.nosep` blanks every prompt separator. Applied after classic, so
/// its `"0"` wins when both flags are set.
fn apply_nosep(master: &mut ConfigTree) {
    if master.get_bool("Global", "nosep") != Some(true) {
        return;
    }
    master.set("Shell", "separate_in", "0");
    master.set("Shell", "separate_out", "0");
    master.set("Shell", "separate_out2", "0");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_default_and_command_line_overrides_file() {
        let mut defaults = ConfigTree::new();
        defaults.set("Shell", "colors", "Linux");
        defaults.set("Shell", "cache_size", 1000i64);
        defaults.set("Shell", "editor", "vi");

        let mut file = ConfigTree::new();
        file.set("Shell", "colors", "LightBG");
        file.set("Shell", "cache_size", 200i64);

        let mut cli = ConfigTree::new();
        cli.set("Shell", "colors", "NoColor");

        let master = resolve(&defaults, &file, &cli);
        assert_eq!(master.get_str("Shell", "colors"), Some("NoColor"));
        assert_eq!(master.get_int("Shell", "cache_size"), Some(200));
        assert_eq!(master.get_str("Shell", "editor"), Some("vi"));
    }

    #[test]
    fn unpassed_command_line_flag_never_shadows_lower_sources() {
        let mut defaults = ConfigTree::new();
        defaults.set("Shell", "pprint", true);

        let mut file = ConfigTree::new();
        file.set("Shell", "pprint", false);

        // Nothing passed on the command line: the key simply is not there.
        let cli = ConfigTree::new();

        let master = resolve(&defaults, &file, &cli);
        assert_eq!(master.get_bool("Shell", "pprint"), Some(false));
    }

    #[test]
    fn empty_file_and_command_line_reproduce_the_defaults() {
        let mut defaults = ConfigTree::new();
        defaults.set("Global", "display_banner", true);
        defaults.set("Shell", "prompt_in1", "ir> ");
        defaults.set("Global", "extensions", vec!["timer".to_string()]);

        let master = resolve(&defaults, &ConfigTree::new(), &ConfigTree::new());
        assert_eq!(master, defaults);
    }

    #[test]
    fn lists_are_replaced_wholesale() {
        let mut defaults = ConfigTree::new();
        defaults.set(
            "Global",
            "extensions",
            vec!["a".to_string(), "b".to_string()],
        );

        let mut cli = ConfigTree::new();
        cli.set("Global", "extensions", vec!["c".to_string()]);

        let master = resolve(&defaults, &ConfigTree::new(), &cli);
        assert_eq!(
            master.get_list("Global", "extensions"),
            Some(&["c".to_string()][..])
        );
    }

    #[test]
    fn classic_expands_into_the_exact_documented_settings() {
        let mut master = ConfigTree::new();
        master.set("Global", "classic", true);
        apply_derived_overrides(&mut master);

        assert_eq!(master.get_int("Shell", "cache_size"), Some(0));
        assert_eq!(master.get_bool("Shell", "pprint"), Some(false));
        assert_eq!(master.get_str("Shell", "prompt_in1"), Some(">>> "));
        assert_eq!(master.get_str("Shell", "prompt_in2"), Some("... "));
        assert_eq!(master.get_str("Shell", "prompt_out"), Some(""));
        assert_eq!(master.get_str("Shell", "separate_in"), Some(""));
        assert_eq!(master.get_str("Shell", "separate_out"), Some(""));
        assert_eq!(master.get_str("Shell", "separate_out2"), Some(""));
        assert_eq!(master.get_str("Shell", "colors"), Some("NoColor"));
        assert_eq!(master.get_str("Shell", "xmode"), Some("Plain"));
    }

    #[test]
    fn classic_false_changes_nothing() {
        let mut master = ConfigTree::new();
        master.set("Global", "classic", false);
        apply_derived_overrides(&mut master);
        assert!(!master.contains("Shell", "cache_size"));
    }

    #[test]
    fn nosep_wins_over_classic_for_separators() {
        let mut master = ConfigTree::new();
        master.set("Global", "classic", true);
        master.set("Global", "nosep", true);
        apply_derived_overrides(&mut master);

        assert_eq!(master.get_str("Shell", "separate_in"), Some("0"));
        assert_eq!(master.get_str("Shell", "separate_out"), Some("0"));
        assert_eq!(master.get_str("Shell", "separate_out2"), Some("0"));
        // The rest of classic still applies.
        assert_eq!(master.get_str("Shell", "prompt_in1"), Some(">>> "));
    }
}
