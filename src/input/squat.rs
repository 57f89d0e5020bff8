//! Squat posture with hysteresis
//!
//! The distance sensor hangs above the player: squatting moves the head away
//! from it, so the reading grows. Two thresholds keep the posture from
//! chattering when the reading hovers near one boundary.

use std::ops::RangeInclusive;

use crate::consts::*;
use crate::sensors::Millimeters;

/// Enter/exit thresholds and the plausible reading window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquatThresholds {
    /// Enter squatting at or above this reading
    pub enter: Millimeters,
    /// Leave squatting at or below this reading (strictly below `enter`)
    pub exit: Millimeters,
    /// Readings outside are ignored
    pub plausible: RangeInclusive<Millimeters>,
}

impl Default for SquatThresholds {
    fn default() -> Self {
        Self::new(SQUAT_ENTER_MM, SQUAT_EXIT_MM)
    }
}

impl SquatThresholds {
    pub fn new(enter: Millimeters, exit: Millimeters) -> Self {
        debug_assert!(enter > exit, "squat enter threshold must exceed exit");
        Self {
            enter,
            exit,
            plausible: DISTANCE_PLAUSIBLE_MM,
        }
    }

    #[inline]
    pub fn is_plausible(&self, mm: Millimeters) -> bool {
        self.plausible.contains(&mm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SquatState {
    pub active: bool,
}

impl SquatState {
    /// Apply one distance reading. Returns true if the posture changed.
    ///
    /// Nothing changes mid-air or on an implausible reading.
    pub fn update(&mut self, mm: Millimeters, grounded: bool, thresholds: &SquatThresholds) -> bool {
        if !grounded || !thresholds.is_plausible(mm) {
            return false;
        }
        let next = if self.active {
            mm > thresholds.exit
        } else {
            mm >= thresholds.enter
        };
        let changed = next != self.active;
        self.active = next;
        changed
    }

    /// Keyboard toggle, grounded only
    pub fn toggle(&mut self, grounded: bool) -> bool {
        if grounded {
            self.active = !self.active;
        }
        grounded
    }
}
