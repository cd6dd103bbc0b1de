//! Per-user scratch notes written by running commands.
//!
//! A command may leave a short note about what it did; the orchestrator reads
//! it right after the command resolves and appends it to the step detail in the
//! progress report.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Shared handle to the command memory.
///
/// Cloning the handle shares the underlying map.
#[derive(Clone, Default, Debug)]
pub struct CommandMemory {
    notes: Arc<Mutex<HashMap<String, String>>>,
}

impl CommandMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the note of `user_id`.
    pub fn write(&self, user_id: &str, text: &str) {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.to_owned(), text.to_owned());
    }

    /// Returns the note of `user_id`, or an empty string if none was written.
    pub fn read(&self, user_id: &str) -> String {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Clears the note of `user_id`.
    pub fn reset(&self, user_id: &str) {
        self.write(user_id, "");
    }

    /// Drops the entry of `user_id` once its chain is over.
    pub fn forget(&self, user_id: &str) {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);
    }

    #[cfg(test)]
    pub fn tracked_users(&self) -> usize {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
