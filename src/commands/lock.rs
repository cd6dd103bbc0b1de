//! Per-user execution lock.
//!
//! A user can only have one chain in flight. [`UserLocks::try_acquire`] hands
//! out a [`UserLockGuard`] that removes the user from the registry when
//! dropped, so the lock is released on every exit path: normal completion,
//! early return, panic or cancellation of the owning task.
//!
//! Every acquisition gets its own token and a guard only removes the entry
//! carrying its token, so a stale guard never unlocks a later holder.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use log::trace;

#[derive(Default, Debug)]
struct LockTable {
    /// Token of the acquisition currently holding each user's lock
    running: HashMap<String, u64>,
    next_token: u64,
}

/// Process-wide registry of users currently running a chain.
#[derive(Clone, Default, Debug)]
pub struct UserLocks {
    table: Arc<Mutex<LockTable>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks `user_id` if it is not already running a chain.
    ///
    /// Returns `None` when the user already holds the lock.
    pub fn try_acquire(&self, user_id: &str) -> Option<UserLockGuard> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        if table.running.contains_key(user_id) {
            trace!("{} already holds the execution lock", user_id);
            return None;
        }

        let token = table.next_token;
        table.next_token = table.next_token.wrapping_add(1);
        table.running.insert(user_id.to_owned(), token);

        trace!("execution lock acquired by {} ({})", user_id, token);
        Some(UserLockGuard {
            locks: self.clone(),
            user_id: user_id.to_owned(),
            token,
        })
    }

    /// Removes `user_id` only while `token` still owns its entry.
    fn release(&self, user_id: &str, token: u64) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        if table.running.get(user_id) == Some(&token) {
            table.running.remove(user_id);
            trace!("execution lock released by {} ({})", user_id, token);
        }
    }

    #[cfg(test)]
    pub fn is_locked(&self, user_id: &str) -> bool {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running
            .contains_key(user_id)
    }
}

/// Scoped ownership of a user's execution lock.
#[derive(Debug)]
pub struct UserLockGuard {
    locks: UserLocks,
    user_id: String,
    token: u64,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        self.locks.release(&self.user_id, self.token);
    }
}
