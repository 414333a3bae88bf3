//! Session registry: usernames and rooms observed during this session.
//!
//! Append-only. The inbound render path inserts, the local `list`
//! command reads a snapshot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;

#[derive(Debug, Default)]
struct Seen {
    users: IndexSet<String>,
    rooms: IndexSet<String>,
}

/// Insertion-ordered, deduplicated sets of users and rooms.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    seen: Mutex<Seen>,
}

/// A point-in-time copy of the registry, safe to render without holding
/// the lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub users: Vec<String>,
    pub rooms: Vec<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Seen> {
        // Inserts cannot leave the sets half-updated, so a poisoned lock
        // still holds valid data.
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a username. Returns `true` if it was new.
    pub fn add_user(&self, user: &str) -> bool {
        let mut seen = self.lock();
        if seen.users.contains(user) {
            return false;
        }
        seen.users.insert(user.to_owned())
    }

    /// Record a room identifier. Returns `true` if it was new.
    pub fn add_room(&self, room: &str) -> bool {
        let mut seen = self.lock();
        if seen.rooms.contains(room) {
            return false;
        }
        seen.rooms.insert(room.to_owned())
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let seen = self.lock();
        RegistrySnapshot {
            users: seen.users.iter().cloned().collect(),
            rooms: seen.rooms.iter().cloned().collect(),
        }
    }
}
