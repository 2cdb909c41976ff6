/// Error taxonomy.
///
/// None of these end a session: move rejections come back as a Blocked
/// outcome, oracle failures fall back to the built-in check, and config
/// problems fall back to defaults. Terminal outcomes (caught / won) are not
/// errors at all.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::entity::Position;

/// Why a proposed actor move was refused.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum MoveRejection {
    #[error("destination is off the grid")]
    OutOfBounds,
    #[error("destination is an obstacle")]
    Obstacle,
    #[error("legality oracle vetoed the move")]
    OracleVeto { suggestion: Option<Position> },
}

/// The external legality oracle could not give an answer.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("could not start oracle `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("oracle i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),
    #[error("oracle exited unsuccessfully ({0})")]
    Failed(String),
    #[error("oracle output not understood: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}
