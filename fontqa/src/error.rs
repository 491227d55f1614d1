use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io failed for '{path}': '{source}'")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write to stdout or stderr: '{0}'")]
    StdioWriteFail(#[source] io::Error),
    #[error(transparent)]
    YamlSerError(#[from] serde_yaml::Error),
    #[error(transparent)]
    JsonSerError(#[from] serde_json::Error),
    #[error("bad check id pattern: {0}")]
    BadPattern(#[from] regex::Error),
    #[error(transparent)]
    Config(#[from] qaengine::ConfigError),
}
