//! Digital jump button on a GPIO line
//!
//! Polarity contract: the button shorts the line to ground when pressed and the
//! line is read with a pull-up bias, so `Low` means pressed. Both libgpiod
//! generations are handled: the tool's `--version` output picks the argument
//! syntax, and both output formats are accepted (v1 prints `0`/`1`, v2 prints
//! `"17"=inactive` / `"17"=active`). Anything else reads as released.
//!
//! Latency: one `gpioget` invocation per frame. The tool samples the line and
//! exits immediately, so the frame stall is bounded by process spawn time
//! (a few milliseconds on a Raspberry Pi).

use std::process::Command;

use super::{ButtonInput, SensorError};

/// Raw digital level of the button line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// Not pressed (pulled up)
    #[default]
    High,
    /// Pressed (shorted to ground)
    Low,
}

impl Level {
    #[inline]
    pub fn is_pressed(self) -> bool {
        self == Level::Low
    }

    /// Map query output to a level, `None` if it matches neither format
    pub fn parse(output: &str) -> Option<Self> {
        let text = output.trim();
        if text == "0" || text.ends_with("=inactive") {
            Some(Level::Low)
        } else if text == "1" || text.ends_with("=active") {
            Some(Level::High)
        } else {
            None
        }
    }
}

/// How a GPIO line is queried
pub trait GpioTransport {
    /// Whether the query facility exists on this machine (checked once)
    fn probe(&mut self) -> bool;
    /// Run one query and return its raw text
    fn query(&mut self) -> Result<String, SensorError>;
}

/// libgpiod tool generation; the two take different arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpiodVersion {
    /// `gpioget -B pull-up <chip> <line>`
    #[default]
    V1,
    /// `gpioget -c <chip> -b pull-up <line>`
    V2,
}

impl GpiodVersion {
    /// Read the generation from `gpioget --version`, e.g. `gpioget (libgpiod) v2.1`
    pub fn from_version_output(text: &str) -> Self {
        let major = text
            .split_whitespace()
            .find_map(|word| word.strip_prefix('v'))
            .and_then(|version| version.split('.').next())
            .and_then(|major| major.parse::<u32>().ok());
        match major {
            Some(major) if major >= 2 => GpiodVersion::V2,
            _ => GpiodVersion::V1,
        }
    }
}

/// Queries a line through the libgpiod `gpioget` tool
#[derive(Debug, Clone)]
pub struct GpiogetTransport {
    chip: String,
    line: u32,
    version: GpiodVersion,
}

impl GpiogetTransport {
    pub fn new(chip: impl Into<String>, line: u32) -> Self {
        Self {
            chip: chip.into(),
            line,
            version: GpiodVersion::default(),
        }
    }

    /// Arguments for one pull-up read of the line
    pub fn query_args(&self) -> Vec<String> {
        let chip = self.chip.clone();
        let line = self.line.to_string();
        match self.version {
            GpiodVersion::V1 => vec!["-B".into(), "pull-up".into(), chip, line],
            GpiodVersion::V2 => vec!["-c".into(), chip, "-b".into(), "pull-up".into(), line],
        }
    }
}

impl GpioTransport for GpiogetTransport {
    fn probe(&mut self) -> bool {
        match Command::new("gpioget").arg("--version").output() {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout);
                self.version = GpiodVersion::from_version_output(&text);
                log::info!("Using gpioget ({:?} syntax)", self.version);
                true
            }
            _ => false,
        }
    }

    fn query(&mut self) -> Result<String, SensorError> {
        let output = Command::new("gpioget")
            .args(self.query_args())
            .output()
            .map_err(|e| SensorError::spawn("gpioget", e))?;
        if !output.status.success() {
            return Err(SensorError::CommandFailed {
                command: "gpioget".to_string(),
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Jump button with fail-safe reads
pub struct DigitalInputPort<T> {
    transport: T,
    available: bool,
}

impl<T: GpioTransport> DigitalInputPort<T> {
    /// Probe the transport once; a missing tool puts the port in released-only mode
    pub fn new(mut transport: T) -> Self {
        let available = transport.probe();
        if !available {
            log::warn!("GPIO query tool not found - button disabled, keyboard only");
        }
        Self {
            transport,
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Sample the line. Every failure reads as released.
    pub fn read(&mut self) -> Level {
        if !self.available {
            return Level::High;
        }
        match self.transport.query() {
            Ok(text) => Level::parse(&text).unwrap_or_else(|| {
                log::debug!("Unrecognised GPIO output {:?}", text.trim());
                Level::High
            }),
            Err(e) => {
                log::debug!("GPIO read failed: {}", e);
                Level::High
            }
        }
    }
}

impl<T: GpioTransport> ButtonInput for DigitalInputPort<T> {
    fn read(&mut self) -> Level {
        DigitalInputPort::read(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::scripted::ScriptedGpio;

    #[test]
    fn test_parse_both_libgpiod_formats() {
        assert_eq!(Level::parse("0\n"), Some(Level::Low));
        assert_eq!(Level::parse("1\n"), Some(Level::High));
        assert_eq!(Level::parse("\"17\"=inactive\n"), Some(Level::Low));
        assert_eq!(Level::parse("\"17\"=active\n"), Some(Level::High));
        assert_eq!(Level::parse("garbage"), None);
        assert_eq!(Level::parse(""), None);
    }

    #[test]
    fn test_version_detection() {
        assert_eq!(
            GpiodVersion::from_version_output("gpioget (libgpiod) v1.6.3\nCopyright (C) 2017-2018"),
            GpiodVersion::V1
        );
        assert_eq!(
            GpiodVersion::from_version_output("gpioget (libgpiod) v2.1.1\n"),
            GpiodVersion::V2
        );
        assert_eq!(GpiodVersion::from_version_output(""), GpiodVersion::V1);
    }

    #[test]
    fn test_query_args_follow_version() {
        let mut transport = GpiogetTransport::new("gpiochip0", 17);
        assert_eq!(transport.query_args(), ["-B", "pull-up", "gpiochip0", "17"]);
        transport.version = GpiodVersion::V2;
        assert_eq!(transport.query_args(), ["-c", "gpiochip0", "-b", "pull-up", "17"]);
    }

    #[test]
    fn test_missing_tool_reads_released_forever() {
        let transport = ScriptedGpio::unavailable();
        let mut port = DigitalInputPort::new(transport);
        assert!(!port.is_available());
        for _ in 0..5 {
            assert_eq!(port.read(), Level::High);
        }
    }

    #[test]
    fn test_failures_read_as_released() {
        let transport = ScriptedGpio::new(["0", "<fail>", "junk", "0", "1"]);
        let mut port = DigitalInputPort::new(transport);
        assert_eq!(port.read(), Level::Low);
        assert_eq!(port.read(), Level::High);
        assert_eq!(port.read(), Level::High);
        assert_eq!(port.read(), Level::Low);
        assert_eq!(port.read(), Level::High);
        // Script exhausted
        assert_eq!(port.read(), Level::High);
    }
}
