//! Deterministic transports that replay fixed sample sequences
//!
//! Stand-ins for the hardware in unit tests.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use super::{AmplitudeSource, GpioTransport, LineSource, SensorError};

/// Output text marking a failed query in a [`ScriptedGpio`] script
pub const FAIL: &str = "<fail>";

/// GPIO query replaying one output string per read
#[derive(Debug, Clone, Default)]
pub struct ScriptedGpio {
    available: bool,
    outputs: VecDeque<String>,
}

impl ScriptedGpio {
    /// Replay `outputs`; the entry [`FAIL`] makes that query fail
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: true,
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    /// A machine without the query tool
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl GpioTransport for ScriptedGpio {
    fn probe(&mut self) -> bool {
        self.available
    }

    fn query(&mut self) -> Result<String, SensorError> {
        match self.outputs.pop_front() {
            Some(text) if text == FAIL => Err(SensorError::Parse(text)),
            Some(text) => Ok(text),
            None => Err(SensorError::Disconnected),
        }
    }
}

/// Line stream delivered in batches, one batch per `DistanceProbe::read`
///
/// Each batch is what has arrived on the pipe since the previous read. Once
/// all batches are consumed the stream reports itself closed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    batches: VecDeque<VecDeque<String>>,
}

impl ScriptedLines {
    pub fn new<I, B, S>(batches: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batches: batches
                .into_iter()
                .map(|batch| batch.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// One reading per batch
    pub fn readings(values: &[i32]) -> Self {
        Self::new(values.iter().map(|v| [v.to_string()]))
    }
}

impl LineSource for ScriptedLines {
    fn try_next_line(&mut self) -> Result<Option<String>, SensorError> {
        let Some(batch) = self.batches.front_mut() else {
            return Err(SensorError::Disconnected);
        };
        match batch.pop_front() {
            Some(line) => Ok(Some(line)),
            None => {
                self.batches.pop_front();
                Ok(None)
            }
        }
    }
}

/// Audio source replaying peak values, silence once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedAmplitudes {
    available: bool,
    peaks: VecDeque<Result<f32, SensorError>>,
}

impl ScriptedAmplitudes {
    pub fn new<I>(peaks: I) -> Self
    where
        I: IntoIterator<Item = Result<f32, SensorError>>,
    {
        Self {
            available: true,
            peaks: peaks.into_iter().collect(),
        }
    }

    /// No capture device
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl AmplitudeSource for ScriptedAmplitudes {
    fn probe(&mut self) -> Result<(), SensorError> {
        if self.available {
            Ok(())
        } else {
            Err(SensorError::NoDevice)
        }
    }

    fn capture_peak(&mut self, window: Duration) -> Result<f32, SensorError> {
        thread::sleep(window);
        self.peaks.pop_front().unwrap_or(Ok(0.0))
    }
}
