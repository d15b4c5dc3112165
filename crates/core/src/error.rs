use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not allocate a pseudo-terminal: {}", _0)]
    PtySetup(String),

    #[error("Could not spawn `{}`: {}", .program, .reason)]
    Spawn { program: String, reason: String },

    #[error("The script to run does not exist: `{}`", _0)]
    MissingTarget(String),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("Could not watch `{}` for changes: {}", .path, .original)]
    Watch {
        path: String,
        original: notify::Error,
    },

    #[error("Terminal error: {}", _0)]
    Terminal(#[from] std::io::Error),
}

impl Error {
    pub fn spawn_error(program: &str, reason: impl ToString) -> Self {
        Self::Spawn {
            program: program.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    pub fn watch_error(path: String, original: notify::Error) -> Self {
        Self::Watch { path, original }
    }
}
