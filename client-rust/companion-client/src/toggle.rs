//! Local membership flags: joined landmarks, sent friend requests, joined
//! groups and joined events.
//!
//! These never reach the API. Each domain is a persisted set of ids kept
//! under its own storage namespace; a flag is on iff its id is in the set.

use crate::error::ClientError;
use crate::storage::{load_json, save_json, LocalStorage};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToggleDomain {
    JoinedLandmarks,
    SentFriendRequests,
    JoinedGroups,
    JoinedEvents,
}

impl ToggleDomain {
    pub const ALL: [ToggleDomain; 4] = [
        ToggleDomain::JoinedLandmarks,
        ToggleDomain::SentFriendRequests,
        ToggleDomain::JoinedGroups,
        ToggleDomain::JoinedEvents,
    ];

    pub fn namespace(&self) -> &'static str {
        match self {
            ToggleDomain::JoinedLandmarks => "toggle:joined-landmarks",
            ToggleDomain::SentFriendRequests => "toggle:sent-friend-requests",
            ToggleDomain::JoinedGroups => "toggle:joined-groups",
            ToggleDomain::JoinedEvents => "toggle:joined-events",
        }
    }
}

impl Display for ToggleDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.namespace())
    }
}

pub struct ToggleStore {
    namespace: String,
    storage: Arc<dyn LocalStorage>,
    ids: Mutex<BTreeSet<String>>,
}

impl ToggleStore {
    /// Opens the store for `namespace`, loading whatever was persisted.
    ///
    /// Unreadable data is dropped: the store is a convenience cache and
    /// starting empty is better than refusing to start.
    pub fn open(namespace: impl Into<String>, storage: Arc<dyn LocalStorage>) -> Self {
        let namespace = namespace.into();
        let ids = match load_json::<Vec<String>>(storage.as_ref(), &namespace) {
            Ok(ids) => ids.unwrap_or_default().into_iter().collect(),
            Err(e) => {
                log::warn!("toggle store {namespace} - dropping unreadable data: {e}");
                BTreeSet::new()
            }
        };

        ToggleStore {
            namespace,
            storage,
            ids: Mutex::new(ids),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn activate(&self, id: &str) -> Result<(), ClientError> {
        let mut ids = self.lock();
        self.insert(&mut ids, id)
    }

    pub fn deactivate(&self, id: &str) -> Result<(), ClientError> {
        let mut ids = self.lock();
        self.remove(&mut ids, id)
    }

    /// Flips the flag of `id` and returns the new state.
    pub fn toggle(&self, id: &str) -> Result<bool, ClientError> {
        let mut ids = self.lock();
        if ids.contains(id) {
            self.remove(&mut ids, id)?;
            Ok(false)
        } else {
            self.insert(&mut ids, id)?;
            Ok(true)
        }
    }

    pub fn active_ids(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, ids: &mut BTreeSet<String>, id: &str) -> Result<(), ClientError> {
        if ids.insert(id.to_string()) {
            if let Err(e) = self.persist(ids) {
                ids.remove(id);
                return Err(e);
            }
            log::debug!("toggle store {} - activated: {id}", self.namespace);
        }
        Ok(())
    }

    fn remove(&self, ids: &mut BTreeSet<String>, id: &str) -> Result<(), ClientError> {
        if ids.remove(id) {
            if let Err(e) = self.persist(ids) {
                ids.insert(id.to_string());
                return Err(e);
            }
            log::debug!("toggle store {} - deactivated: {id}", self.namespace);
        }
        Ok(())
    }

    fn persist(&self, ids: &BTreeSet<String>) -> Result<(), ClientError> {
        save_json(self.storage.as_ref(), &self.namespace, ids)
    }
}

/// One store per domain, opened once at startup and shared by every screen.
pub struct ToggleStores {
    landmarks: Arc<ToggleStore>,
    friend_requests: Arc<ToggleStore>,
    groups: Arc<ToggleStore>,
    events: Arc<ToggleStore>,
}

impl ToggleStores {
    pub fn open(storage: Arc<dyn LocalStorage>) -> Self {
        let open = |domain: ToggleDomain| {
            Arc::new(ToggleStore::open(domain.namespace(), storage.clone()))
        };

        ToggleStores {
            landmarks: open(ToggleDomain::JoinedLandmarks),
            friend_requests: open(ToggleDomain::SentFriendRequests),
            groups: open(ToggleDomain::JoinedGroups),
            events: open(ToggleDomain::JoinedEvents),
        }
    }

    pub fn get(&self, domain: ToggleDomain) -> Arc<ToggleStore> {
        match domain {
            ToggleDomain::JoinedLandmarks => self.landmarks.clone(),
            ToggleDomain::SentFriendRequests => self.friend_requests.clone(),
            ToggleDomain::JoinedGroups => self.groups.clone(),
            ToggleDomain::JoinedEvents => self.events.clone(),
        }
    }
}
