//! Keyboard fallback events delivered by the presentation layer

/// Discrete key presses, merged into the frame's `InputState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// Jump (B key); gated exactly like the button
    Jump,
    /// Flip between standing and squatting while grounded
    SquatToggle,
    /// Restart after game over (Return)
    Restart,
    /// Special action, same as a voice detection (F key)
    Special,
    /// Leave the game (Escape)
    Quit,
}

impl KeyEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyEvent::Jump => "Jump",
            KeyEvent::SquatToggle => "SquatToggle",
            KeyEvent::Restart => "Restart",
            KeyEvent::Special => "Special",
            KeyEvent::Quit => "Quit",
        }
    }

    /// Map a key name from the presentation layer
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "b" | "space" => Some(KeyEvent::Jump),
            "s" | "down" => Some(KeyEvent::SquatToggle),
            "return" | "enter" => Some(KeyEvent::Restart),
            "f" => Some(KeyEvent::Special),
            "escape" | "esc" => Some(KeyEvent::Quit),
            _ => None,
        }
    }
}
