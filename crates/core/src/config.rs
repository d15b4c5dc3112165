//! Startup configuration for watchout.
//!
//! [`RunConfig`] is assembled once from the command line and the optional
//! settings file, and stays read-only for the lifetime of the process.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default path for the settings file
const DEFAULT_CONFIG_PATH: &str = "~/.watchout/config.yml";

/// Interpreter used when neither the settings file nor the command line name one
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Optional defaults read from the settings file.
///
/// Every key may be omitted. Boolean keys act as defaults that command line
/// flags can only switch on.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub interpreter: Option<String>,
    pub lazy: bool,
    pub keep_duplicates: bool,
    pub verbose: bool,
}

/// The program and arguments of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
}

impl RunCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_directory: None,
        }
    }

    #[must_use]
    pub fn in_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(directory.into());
        self
    }
}

/// Immutable session configuration.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunConfig {
    pub target: PathBuf,
    pub interpreter: String,
    pub lazy: bool,
    pub keep_duplicates: bool,
    pub watch: bool,
    pub verbose: bool,
}

impl RunConfig {
    /// Builds a config for `target`, checking that it exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTarget`] if the path does not exist.
    pub fn new(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        if !target.exists() {
            return Err(Error::MissingTarget(target.display().to_string()));
        }

        Ok(Self {
            target,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            lazy: false,
            keep_duplicates: false,
            watch: true,
            verbose: false,
        })
    }

    /// Folds the settings file values into this config.
    #[must_use]
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        if let Some(interpreter) = &settings.interpreter {
            self.interpreter.clone_from(interpreter);
        }
        self.lazy |= settings.lazy;
        self.keep_duplicates |= settings.keep_duplicates;
        self.verbose |= settings.verbose;
        self
    }

    /// Display name of the session: the target's file name without extension.
    pub fn name(&self) -> String {
        self.target
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| self.target.display().to_string())
    }

    /// The fixed interpreter-plus-script invocation for every run.
    pub fn command(&self) -> RunCommand {
        let target = std::path::absolute(&self.target).unwrap_or_else(|_| self.target.clone());
        let command = RunCommand::new(
            self.interpreter.clone(),
            vec![target.display().to_string()],
        );

        match std::env::current_dir() {
            Ok(directory) => command.in_directory(directory),
            Err(_) => command,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// Resolves the settings file path.
///
/// If a custom path is provided, uses that path. Otherwise, uses the default
/// path. Shell expansions like `~` are resolved.
///
/// # Examples
///
/// ```
/// use watchout_core::config::get_config_path;
///
/// let custom_path = get_config_path(&Some("/etc/watchout.yml".to_string()));
/// assert_eq!(custom_path, "/etc/watchout.yml");
/// ```
pub fn get_config_path(config_path_arg: &Option<String>) -> String {
    let config_path = match config_path_arg {
        Some(config_path) => config_path,
        None => DEFAULT_CONFIG_PATH,
    };

    shellexpand::tilde(config_path).to_string()
}
