//! One-at-a-time gate for long-running list actions.
//!
//! A screen owns one [`ActionSlot`]. Starting an action takes an
//! [`ActionGuard`] that is moved into the action's command; the slot frees
//! itself when the command finishes, fails or is dropped on cancellation.

use std::sync::{Arc, Mutex, PoisonError};

use crate::tui::command::Command;

#[derive(Debug, Clone, Default)]
pub struct ActionSlot {
    running: Arc<Mutex<Option<&'static str>>>,
}

#[derive(Debug)]
pub struct ActionGuard {
    running: Arc<Mutex<Option<&'static str>>>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl ActionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `action`, or returns the name of the action
    /// already holding it.
    pub fn try_begin(&self, action: &'static str) -> Result<ActionGuard, &'static str> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = *running {
            return Err(current);
        }
        *running = Some(action);
        Ok(ActionGuard {
            running: Arc::clone(&self.running),
        })
    }

    pub fn running(&self) -> Option<&'static str> {
        *self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the slot and builds the action's command with the guard, or
    /// returns a notification naming the action that is in the way.
    pub fn run(&self, action: &'static str, build: impl FnOnce(ActionGuard) -> Command) -> Command {
        match self.try_begin(action) {
            Ok(guard) => build(guard),
            Err(current) => {
                Command::notify(format!("Can't {action} right now, {current} is running"))
            }
        }
    }
}
