//! Voice activity monitor
//!
//! A background thread records short audio windows and raises a shared flag
//! when the peak amplitude crosses a threshold. The flag is level-triggered:
//! it stays set until the main loop clears it, and detections between two
//! reads coalesce into one.
//!
//! The flag is the only value shared with the main loop. Its lock is held for
//! the flag access alone, never across a capture or a sleep.

use std::process::Command;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use regex::Regex;

use super::{SensorError, VoiceInput};
use crate::consts::*;

/// Samples logged at debug level after start, for threshold calibration
const CALIBRATION_SAMPLES: u64 = 10;

/// Lifecycle of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Uninitialized,
    /// Checking for the capture tool and a device
    Probing,
    /// Sampler thread alive
    Running,
    /// Capture unavailable; `detected()` is always false
    Disabled,
    /// Sampler asked to exit
    Stopped,
}

/// Something that can measure the loudness of a short audio window
pub trait AmplitudeSource: Send + 'static {
    /// Check once that capture is possible
    fn probe(&mut self) -> Result<(), SensorError>;
    /// Record `window` of audio and return its peak amplitude on a 0-1 scale
    fn capture_peak(&mut self, window: Duration) -> Result<f32, SensorError>;
}

/// Sampler cadence and thresholds
#[derive(Debug, Clone, Copy)]
pub struct VoiceTiming {
    pub window: Duration,
    pub threshold: f32,
    /// Pause after a detection so one shout sets the flag once
    pub debounce: Duration,
    /// Pause after a failed capture
    pub error_backoff: Duration,
    /// Longest `stop()` waits for the sampler to exit
    pub stop_timeout: Duration,
}

impl Default for VoiceTiming {
    fn default() -> Self {
        Self {
            window: VOICE_WINDOW,
            threshold: VOICE_THRESHOLD,
            debounce: VOICE_DEBOUNCE,
            error_backoff: VOICE_ERROR_BACKOFF,
            stop_timeout: VOICE_STOP_TIMEOUT,
        }
    }
}

/// Detection flag shared between the sampler thread and the main loop
#[derive(Debug, Clone, Default)]
pub struct VoiceFlag(Arc<Mutex<bool>>);

impl VoiceFlag {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn raise(&self) {
        *self.lock() = true;
    }

    pub fn get(&self) -> bool {
        *self.lock()
    }

    pub fn clear(&self) {
        *self.lock() = false;
    }

    /// Read and clear under one lock
    pub fn take(&self) -> bool {
        std::mem::take(&mut *self.lock())
    }
}

impl VoiceInput for VoiceFlag {
    fn take(&mut self) -> bool {
        VoiceFlag::take(self)
    }
}

/// Background microphone sampler with a lock-guarded detection flag
pub struct VoiceActivityMonitor {
    state: MonitorState,
    flag: VoiceFlag,
    stop_tx: Option<Sender<()>>,
    /// Disconnects when the sampler thread exits, however it exits
    done_rx: Option<Receiver<()>>,
    worker: Option<JoinHandle<()>>,
    timing: VoiceTiming,
}

impl VoiceActivityMonitor {
    /// Probe `source` and start sampling with the default timing
    pub fn start<A: AmplitudeSource>(source: A) -> Self {
        Self::with_timing(source, VoiceTiming::default())
    }

    pub fn with_timing<A: AmplitudeSource>(mut source: A, timing: VoiceTiming) -> Self {
        let mut monitor = Self {
            state: MonitorState::Uninitialized,
            flag: VoiceFlag::new(),
            stop_tx: None,
            done_rx: None,
            worker: None,
            timing,
        };

        monitor.state = MonitorState::Probing;
        if let Err(e) = source.probe() {
            log::warn!("Voice input disabled ({}) - use the special key instead", e);
            monitor.state = MonitorState::Disabled;
            return monitor;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let flag = monitor.flag.clone();
        let spawned = thread::Builder::new()
            .name("voice-sampler".to_string())
            .spawn(move || {
                let _done = done_tx;
                sampling_loop(source, flag, stop_rx, timing);
            });
        match spawned {
            Ok(handle) => {
                log::info!(
                    "Voice input started (threshold {:.1}%)",
                    timing.threshold * 100.0
                );
                monitor.stop_tx = Some(stop_tx);
                monitor.done_rx = Some(done_rx);
                monitor.worker = Some(handle);
                monitor.state = MonitorState::Running;
            }
            Err(e) => {
                log::warn!("Voice input disabled (sampler thread failed: {})", e);
                monitor.state = MonitorState::Disabled;
            }
        }
        monitor
    }

    /// A monitor that never detects anything
    pub fn disabled() -> Self {
        Self {
            state: MonitorState::Disabled,
            flag: VoiceFlag::new(),
            stop_tx: None,
            done_rx: None,
            worker: None,
            timing: VoiceTiming::default(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Current flag value, without clearing it
    pub fn detected(&self) -> bool {
        self.flag.get()
    }

    pub fn reset(&self) {
        self.flag.clear();
    }

    /// Read and clear the flag under one lock
    pub fn take(&self) -> bool {
        self.flag.take()
    }

    /// Ask the sampler to exit and wait for it, at most `stop_timeout`
    ///
    /// A sampler stuck in a capture is detached; shutdown carries on.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let (Some(handle), Some(done)) = (self.worker.take(), self.done_rx.take()) else {
            return;
        };
        self.state = MonitorState::Stopped;

        match done.recv_timeout(self.timing.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    log::warn!("Voice sampler panicked");
                }
                log::info!("Voice input stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Voice sampler did not exit within {:?}; detaching it",
                    self.timing.stop_timeout
                );
            }
        }
    }
}

impl VoiceInput for VoiceActivityMonitor {
    fn take(&mut self) -> bool {
        VoiceActivityMonitor::take(self)
    }

    fn stop(&mut self) {
        VoiceActivityMonitor::stop(self);
    }
}

impl Drop for VoiceActivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sleep for `pause` unless a stop arrives first. Returns true on stop.
fn wait_for_stop(stop: &Receiver<()>, pause: Duration) -> bool {
    match stop.recv_timeout(pause) {
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        Err(RecvTimeoutError::Timeout) => false,
    }
}

fn sampling_loop<A: AmplitudeSource>(
    mut source: A,
    flag: VoiceFlag,
    stop: Receiver<()>,
    timing: VoiceTiming,
) {
    let mut samples: u64 = 0;
    loop {
        let pause = match source.capture_peak(timing.window) {
            Ok(peak) => {
                samples += 1;
                if samples <= CALIBRATION_SAMPLES {
                    log::debug!(
                        "Voice sample {}: peak {:.1}% (threshold {:.1}%)",
                        samples,
                        peak * 100.0,
                        timing.threshold * 100.0
                    );
                }
                if peak > timing.threshold {
                    flag.raise();
                    log::info!("Voice detected (peak {:.1}%)", peak * 100.0);
                    timing.debounce
                } else {
                    Duration::ZERO
                }
            }
            Err(e) => {
                log::warn!("Voice sampling failed: {}", e);
                timing.error_backoff
            }
        };
        if wait_for_stop(&stop, pause) {
            break;
        }
    }
    log::debug!("Voice sampler exiting after {} samples", samples);
}

static MAX_AMPLITUDE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Maximum amplitude:\s+([\d.]+)").ok());

/// Extract the peak from sox `stat` output
pub fn parse_max_amplitude(text: &str) -> Option<f32> {
    let captures = MAX_AMPLITUDE.as_ref()?.captures(text)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Captures through sox (`rec ... stat`) and ALSA device listing
#[derive(Debug, Clone, Copy, Default)]
pub struct SoxAmplitudeSource;

impl SoxAmplitudeSource {
    pub fn new() -> Self {
        Self
    }
}

impl AmplitudeSource for SoxAmplitudeSource {
    fn probe(&mut self) -> Result<(), SensorError> {
        let sox = Command::new("sox")
            .arg("--version")
            .output()
            .map_err(|e| SensorError::spawn("sox", e))?;
        if !sox.status.success() {
            return Err(SensorError::CommandFailed {
                command: "sox".to_string(),
                status: sox.status,
            });
        }

        let listing = Command::new("arecord")
            .arg("-l")
            .output()
            .map_err(|e| SensorError::spawn("arecord", e))?;
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&listing.stdout),
            String::from_utf8_lossy(&listing.stderr)
        );
        if text.contains("card") || text.contains("カード") {
            log::info!("Capture device found");
            Ok(())
        } else {
            log::debug!("arecord -l output: {}", text.trim());
            Err(SensorError::NoDevice)
        }
    }

    fn capture_peak(&mut self, window: Duration) -> Result<f32, SensorError> {
        let seconds = format!("{:.3}", window.as_secs_f32());
        let output = Command::new("rec")
            .args(["-n", "trim", "0", &seconds, "stat"])
            .output()
            .map_err(|e| SensorError::spawn("rec", e))?;
        // `stat` reports on stderr
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        parse_max_amplitude(&text).ok_or_else(|| {
            let head: String = text.chars().take(80).collect();
            SensorError::Parse(head)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::scripted::ScriptedAmplitudes;
    use std::time::Instant;

    fn fast_timing() -> VoiceTiming {
        VoiceTiming {
            window: Duration::from_millis(2),
            threshold: 0.05,
            debounce: Duration::from_millis(10),
            error_backoff: Duration::from_millis(5),
            stop_timeout: Duration::from_secs(1),
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_flag_coalesces_detections() {
        let flag = VoiceFlag::new();
        let sampler_side = flag.clone();
        sampler_side.raise();
        sampler_side.raise();
        assert!(flag.get());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_parse_sox_stat_output() {
        let text = "Samples read:   4800\nMaximum amplitude:     0.123456\nMinimum amplitude: -0.1\n";
        assert_eq!(parse_max_amplitude(text), Some(0.123456));
        assert_eq!(parse_max_amplitude("rec FAIL formats: can't open input"), None);
    }

    #[test]
    fn test_probe_failure_disables() {
        let mut monitor = VoiceActivityMonitor::with_timing(ScriptedAmplitudes::unavailable(), fast_timing());
        assert_eq!(monitor.state(), MonitorState::Disabled);
        assert!(!monitor.detected());
        assert!(!monitor.take());
        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Disabled);
    }

    #[test]
    fn test_loud_window_sets_flag_until_cleared() {
        let source = ScriptedAmplitudes::new([Ok(0.01), Ok(0.2)]);
        let mut monitor = VoiceActivityMonitor::with_timing(source, fast_timing());
        assert_eq!(monitor.state(), MonitorState::Running);

        assert!(wait_until(|| monitor.detected()));
        // Non-consuming read
        assert!(monitor.detected());
        assert!(monitor.take());
        assert!(!monitor.detected());
        assert!(!monitor.take());

        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[test]
    fn test_threshold_is_strict() {
        let source = ScriptedAmplitudes::new([Ok(0.05), Ok(0.05), Ok(0.04)]);
        let mut monitor = VoiceActivityMonitor::with_timing(source, fast_timing());
        thread::sleep(Duration::from_millis(50));
        assert!(!monitor.detected());
        monitor.stop();
    }

    #[test]
    fn test_reset_clears_flag() {
        let source = ScriptedAmplitudes::new([Ok(0.9)]);
        let mut monitor = VoiceActivityMonitor::with_timing(source, fast_timing());
        assert!(wait_until(|| monitor.detected()));
        monitor.reset();
        assert!(!monitor.detected());
        monitor.stop();
    }

    #[test]
    fn test_failures_do_not_end_sampling() {
        let source = ScriptedAmplitudes::new([
            Err(SensorError::Parse("no stat".to_string())),
            Err(SensorError::Disconnected),
            Ok(0.5),
        ]);
        let mut monitor = VoiceActivityMonitor::with_timing(source, fast_timing());
        assert!(wait_until(|| monitor.detected()));
        monitor.stop();
    }

    #[test]
    fn test_stop_interrupts_long_debounce() {
        let timing = VoiceTiming {
            debounce: Duration::from_secs(30),
            ..fast_timing()
        };
        let source = ScriptedAmplitudes::new([Ok(0.9)]);
        let mut monitor = VoiceActivityMonitor::with_timing(source, timing);
        assert!(wait_until(|| monitor.detected()));

        let started = Instant::now();
        monitor.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_stop_returns_when_sampler_exits() {
        let timing = VoiceTiming {
            stop_timeout: Duration::from_secs(30),
            ..fast_timing()
        };
        let mut monitor = VoiceActivityMonitor::with_timing(ScriptedAmplitudes::new([]), timing);
        thread::sleep(Duration::from_millis(10));

        let started = Instant::now();
        monitor.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[test]
    fn test_stop_is_bounded_when_capture_hangs() {
        let timing = VoiceTiming {
            window: Duration::from_secs(5),
            stop_timeout: Duration::from_millis(100),
            ..fast_timing()
        };
        let mut monitor = VoiceActivityMonitor::with_timing(ScriptedAmplitudes::new([]), timing);
        thread::sleep(Duration::from_millis(10));

        let started = Instant::now();
        monitor.stop();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(2));
    }
}
