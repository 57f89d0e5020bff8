//! Transport-level sensor failures
//!
//! These never reach the simulation. Each adapter turns them into a degraded
//! value (released button, cached distance, no detection) at its boundary.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },
    #[error("unparseable sensor output: {0:?}")]
    Parse(String),
    #[error("no capture device found")]
    NoDevice,
    #[error("sensor stream closed")]
    Disconnected,
}

impl SensorError {
    pub(crate) fn spawn(command: &str, source: io::Error) -> Self {
        Self::Spawn {
            command: command.to_string(),
            source,
        }
    }
}
