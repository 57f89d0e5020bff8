//! Sensor adapters
//!
//! Each physical input sits behind a small transport trait so the fusion layer
//! never knows whether samples come from a subprocess, a driver or a script:
//! - `gpio`: Digital button line polled through `gpioget`
//! - `distance`: Time-of-flight probe fed by a long-lived helper process
//! - `voice`: Background microphone sampler raising a level-triggered flag
//! - `scripted`: Deterministic transports replaying fixed sample sequences (tests)

pub mod distance;
pub mod error;
pub mod gpio;
#[cfg(test)]
pub(crate) mod scripted;
pub mod voice;

pub use distance::{ChildLineSource, DistanceProbe, LineSource, Millimeters};
pub use error::SensorError;
pub use gpio::{DigitalInputPort, GpiodVersion, GpioTransport, GpiogetTransport, Level};
pub use voice::{
    AmplitudeSource, MonitorState, SoxAmplitudeSource, VoiceActivityMonitor, VoiceFlag,
    VoiceTiming,
};

/// Button source as seen by the fusion layer
pub trait ButtonInput {
    fn read(&mut self) -> Level;
}

/// Distance source as seen by the fusion layer
pub trait DistanceInput {
    fn read(&mut self) -> Option<Millimeters>;
}

/// Voice source as seen by the fusion layer
pub trait VoiceInput {
    /// Read and clear the detection flag in one step
    fn take(&mut self) -> bool;

    /// Release background resources (bounded wait)
    fn stop(&mut self) {}
}

/// Stand-in for a sensor that is not wired at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Absent;

impl ButtonInput for Absent {
    fn read(&mut self) -> Level {
        Level::High
    }
}

impl DistanceInput for Absent {
    fn read(&mut self) -> Option<Millimeters> {
        None
    }
}

impl VoiceInput for Absent {
    fn take(&mut self) -> bool {
        false
    }
}
