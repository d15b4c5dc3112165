//! Command-line argument parsing.
//!
//! This module defines the command-line interface of the `watchout` binary
//! using the `clap` crate, and turns it into the session's [`RunConfig`].

use clap::Parser;
use watchout_core::config::{RunConfig, Settings};
use watchout_core::error::Result;

/// Command-line arguments for the watchout CLI tool.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use watchout_cli::cli_args::Args;
///
/// let args = Args::parse_from(["watchout", "report.py", "--lazy"]);
/// assert!(args.lazy);
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0)] // Just to make testing across clap features easier
#[allow(clippy::struct_excessive_bools)] // silence clippy's warning on this struct
pub struct Args {
    /// Path to the script to re-run. It must exist.
    pub script_path: String,

    /// Keep showing the previous output while the next run executes silently.
    #[arg(long, action)]
    pub lazy: bool,

    /// Record every run, even when its output matches the previous run.
    #[arg(long, action)]
    pub keep_duplicates: bool,

    /// Do not watch the script for changes; only run when Enter is pressed.
    #[arg(long, action)]
    pub no_watch: bool,

    /// Use longer wording in the status line.
    #[arg(long, action)]
    pub verbose: bool,

    /// Program used to run the script.
    ///
    /// Overrides the settings file. Defaults to `python3`.
    #[arg(long, short = 'i')]
    pub interpreter: Option<String>,

    /// Path to the settings file YAML.
    ///
    /// If not provided, defaults to `~/.watchout/config.yml`.
    #[arg(long, short = 'c')]
    pub config_path: Option<String>,
}

impl Args {
    /// Combines the arguments with the settings file into the session config.
    ///
    /// # Errors
    ///
    /// Returns an error if the script path does not exist.
    pub fn to_run_config(&self, settings: &Settings) -> Result<RunConfig> {
        let mut config = RunConfig::new(&self.script_path)?.with_settings(settings);

        config.lazy |= self.lazy;
        config.keep_duplicates |= self.keep_duplicates;
        config.verbose |= self.verbose;
        config.watch = !self.no_watch;

        if let Some(interpreter) = &self.interpreter {
            config.interpreter.clone_from(interpreter);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use watchout_core::config::DEFAULT_INTERPRETER;
    use watchout_core::error::Error;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["watchout", "script.py"]);

        assert_eq!(args.script_path, "script.py");
        assert!(!args.lazy);
        assert!(!args.keep_duplicates);
        assert!(!args.no_watch);
        assert!(!args.verbose);
        assert!(args.interpreter.is_none());
        assert!(args.config_path.is_none());
    }

    #[test]
    fn test_args_long_flags() {
        let args = Args::parse_from([
            "watchout",
            "script.py",
            "--lazy",
            "--keep-duplicates",
            "--no-watch",
            "--verbose",
            "--interpreter",
            "pypy3",
            "--config-path",
            "/custom/config.yml",
        ]);

        assert!(args.lazy);
        assert!(args.keep_duplicates);
        assert!(args.no_watch);
        assert!(args.verbose);
        assert_eq!(args.interpreter, Some("pypy3".to_string()));
        assert_eq!(args.config_path, Some("/custom/config.yml".to_string()));
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["watchout", "-i", "node", "-c", "/x.yml", "app.js"]);

        assert_eq!(args.script_path, "app.js");
        assert_eq!(args.interpreter, Some("node".to_string()));
        assert_eq!(args.config_path, Some("/x.yml".to_string()));
    }

    #[test]
    fn test_script_path_is_required() {
        assert!(Args::try_parse_from(["watchout"]).is_err());
    }

    #[test]
    fn test_run_config_from_args() {
        let script = NamedTempFile::new().unwrap();
        let path = script.path().to_str().unwrap();
        let args = Args::parse_from(["watchout", path, "--no-watch", "--lazy"]);

        let config = args.to_run_config(&Settings::default()).unwrap();

        assert!(!config.watch);
        assert!(config.lazy);
        assert!(!config.keep_duplicates);
        assert_eq!(config.interpreter, DEFAULT_INTERPRETER);
    }

    #[test]
    fn test_interpreter_flag_beats_settings() {
        let script = NamedTempFile::new().unwrap();
        let path = script.path().to_str().unwrap();
        let args = Args::parse_from(["watchout", path, "-i", "python3.12"]);
        let settings = Settings {
            interpreter: Some("python2".to_string()),
            verbose: true,
            ..Settings::default()
        };

        let config = args.to_run_config(&settings).unwrap();

        assert_eq!(config.interpreter, "python3.12");
        assert!(config.verbose);
    }

    #[test]
    fn test_missing_script_is_rejected() {
        let args = Args::parse_from(["watchout", "/no/such/script.py"]);
        let result = args.to_run_config(&Settings::default());

        assert!(matches!(result, Err(Error::MissingTarget(_))));
    }
}
