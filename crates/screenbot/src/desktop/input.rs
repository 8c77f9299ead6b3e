use super::keys::{key_for_char, key_from_name};
use crate::errors::ProviderError;
use rdev::{simulate, Button, EventType, Key};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Synthetic mouse and keyboard input.
///
/// Calls block the current thread; [`super::DesktopProvider`] runs them on the
/// blocking pool.
pub trait InputDriver: Send + Sync {
    fn move_to(&self, x: i32, y: i32) -> Result<(), ProviderError>;
    fn click(&self, x: i32, y: i32) -> Result<(), ProviderError>;
    fn type_text(&self, text: &str) -> Result<(), ProviderError>;
    fn press_key(&self, key: &str) -> Result<(), ProviderError>;
}

/// Input through `rdev::simulate`
#[derive(Debug, Clone)]
pub struct RdevInput {
    /// Pause after each synthetic event so the OS can pick it up
    pub settle_delay: Duration,
    /// Pause after a completed click
    pub click_settle: Duration,
    /// Pause between characters when typing
    pub key_interval: Duration,
}

impl Default for RdevInput {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(20),
            click_settle: Duration::from_millis(200),
            key_interval: Duration::from_millis(50),
        }
    }
}

impl RdevInput {
    fn send(&self, event: &EventType) -> Result<(), ProviderError> {
        simulate(event)
            .map_err(|_| ProviderError::Input(format!("could not simulate {event:?}")))?;
        thread::sleep(self.settle_delay);
        Ok(())
    }

    fn tap(&self, key: Key, shift: bool) -> Result<(), ProviderError> {
        if shift {
            self.send(&EventType::KeyPress(Key::ShiftLeft))?;
        }
        let result = self
            .send(&EventType::KeyPress(key))
            .and_then(|_| self.send(&EventType::KeyRelease(key)));
        if shift {
            self.send(&EventType::KeyRelease(Key::ShiftLeft))?;
        }
        result
    }
}

impl InputDriver for RdevInput {
    fn move_to(&self, x: i32, y: i32) -> Result<(), ProviderError> {
        self.send(&EventType::MouseMove {
            x: x as f64,
            y: y as f64,
        })
    }

    fn click(&self, x: i32, y: i32) -> Result<(), ProviderError> {
        debug!("Clicking at ({}, {})", x, y);
        self.move_to(x, y)?;
        self.send(&EventType::ButtonPress(Button::Left))?;
        self.send(&EventType::ButtonRelease(Button::Left))?;
        thread::sleep(self.click_settle);
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), ProviderError> {
        // Check the whole text first so nothing is half-typed.
        let keys = text
            .chars()
            .map(|c| {
                key_for_char(c).ok_or_else(|| {
                    ProviderError::InvalidArgument(format!("cannot type character {c:?}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Typing {} character(s)", keys.len());
        for (key, shift) in keys {
            self.tap(key, shift)?;
            thread::sleep(self.key_interval);
        }
        Ok(())
    }

    fn press_key(&self, key: &str) -> Result<(), ProviderError> {
        let resolved = key_from_name(key)
            .ok_or_else(|| ProviderError::InvalidArgument(format!("unknown key '{key}'")))?;
        debug!("Pressing {:?}", resolved);
        self.tap(resolved, false)
    }
}
