//! Time-of-flight distance probe
//!
//! A helper process prints one integer per line (millimeters) at its own
//! cadence, roughly 20 Hz for a VL53L0X. The probe keeps the last good reading
//! so a slow or stalled helper never stalls the frame.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::{DistanceInput, SensorError};

/// Distance in millimeters as reported by the helper
pub type Millimeters = i32;

/// The helper prints a negative value when an I2C read fails
#[inline]
fn is_error_marker(mm: Millimeters) -> bool {
    mm < 0
}

/// A newline-delimited text stream polled without blocking
pub trait LineSource {
    /// Next pending line, `Ok(None)` when nothing new has arrived
    fn try_next_line(&mut self) -> Result<Option<String>, SensorError>;
}

/// Stdout of a long-lived child process
///
/// A reader thread forwards lines over a channel so polling is a `try_recv`.
/// The thread only owns the pipe and exits when the child closes it.
pub struct ChildLineSource {
    child: Child,
    lines: Receiver<String>,
}

impl ChildLineSource {
    pub fn spawn(command: &[String]) -> Result<Self, SensorError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| SensorError::Parse("empty distance command".to_string()))?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SensorError::spawn(program, e))?;
        let stdout = child.stdout.take().ok_or(SensorError::Disconnected)?;

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("distance-reader".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| SensorError::spawn("distance-reader", e))?;

        log::info!("Distance helper started: {}", command.join(" "));
        Ok(Self { child, lines: rx })
    }
}

impl LineSource for ChildLineSource {
    fn try_next_line(&mut self) -> Result<Option<String>, SensorError> {
        match self.lines.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SensorError::Disconnected),
        }
    }
}

impl Drop for ChildLineSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Distance sensor with last-known-good caching
pub struct DistanceProbe<S> {
    source: Option<S>,
    latest: Option<Millimeters>,
    closed: bool,
}

impl DistanceProbe<ChildLineSource> {
    /// Launch the helper; if it cannot start the probe stays empty
    pub fn spawn(command: &[String]) -> Self {
        match ChildLineSource::spawn(command) {
            Ok(source) => Self::new(source),
            Err(e) => {
                log::warn!("Distance sensor unavailable ({}) - squat by keyboard only", e);
                Self::disabled()
            }
        }
    }
}

impl<S: LineSource> DistanceProbe<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            latest: None,
            closed: false,
        }
    }

    /// A probe with no backing source; always reads `None`
    pub fn disabled() -> Self {
        Self {
            source: None,
            latest: None,
            closed: true,
        }
    }

    /// Last good reading without touching the source
    pub fn latest(&self) -> Option<Millimeters> {
        self.latest
    }

    /// Drain pending lines and return the freshest valid reading
    ///
    /// Never waits: unparseable lines, the helper's error marker and an empty
    /// pipe all fall back to the cached value.
    pub fn read(&mut self) -> Option<Millimeters> {
        let Some(source) = self.source.as_mut() else {
            return self.latest;
        };
        loop {
            match source.try_next_line() {
                Ok(Some(line)) => match line.trim().parse::<Millimeters>() {
                    Ok(mm) if is_error_marker(mm) => {
                        log::debug!("Distance helper reported a read error ({})", mm);
                    }
                    Ok(mm) => self.latest = Some(mm),
                    Err(_) => log::debug!("Ignoring distance line {:?}", line),
                },
                Ok(None) => break,
                Err(e) => {
                    if !self.closed {
                        log::warn!("Distance sensor stream lost: {}", e);
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        self.latest
    }
}

impl<S: LineSource> DistanceInput for DistanceProbe<S> {
    fn read(&mut self) -> Option<Millimeters> {
        DistanceProbe::read(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::scripted::ScriptedLines;

    #[test]
    fn test_none_before_first_reading() {
        let mut probe = DistanceProbe::new(ScriptedLines::new(Vec::<Vec<&str>>::new()));
        assert_eq!(probe.read(), None);
    }

    #[test]
    fn test_keeps_last_good_value() {
        let source = ScriptedLines::new(vec![vec!["120"], vec![], vec!["oops"], vec!["250\n"]]);
        let mut probe = DistanceProbe::new(source);
        assert_eq!(probe.read(), Some(120));
        assert_eq!(probe.read(), Some(120)); // nothing new
        assert_eq!(probe.read(), Some(120)); // parse failure
        assert_eq!(probe.read(), Some(250));
        assert_eq!(probe.read(), Some(250)); // stream closed
        assert_eq!(probe.latest(), Some(250));
    }

    #[test]
    fn test_takes_freshest_pending_line() {
        let source = ScriptedLines::new(vec![vec!["100", "110", "x", "130"]]);
        let mut probe = DistanceProbe::new(source);
        assert_eq!(probe.read(), Some(130));
    }

    #[test]
    fn test_error_marker_keeps_last_good_value() {
        let source = ScriptedLines::new(vec![vec!["300", "-1"], vec!["-1"]]);
        let mut probe = DistanceProbe::new(source);
        assert_eq!(probe.read(), Some(300));
        assert_eq!(probe.read(), Some(300));
        assert_eq!(probe.latest(), Some(300));
    }

    #[test]
    fn test_error_marker_alone_reads_none() {
        let mut probe = DistanceProbe::new(ScriptedLines::new(vec![vec!["-1"]]));
        assert_eq!(probe.read(), None);
    }

    #[test]
    fn test_disabled_probe_reads_none() {
        let mut probe = DistanceProbe::<ScriptedLines>::disabled();
        assert_eq!(probe.read(), None);
    }

    #[test]
    fn test_missing_helper_is_disabled() {
        let command = vec!["/nonexistent/distance-helper".to_string()];
        let mut probe = DistanceProbe::spawn(&command);
        assert_eq!(probe.read(), None);
    }
}
