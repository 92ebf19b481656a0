//! Authoritative user directory

use parking_lot::RwLock;
use praxia_common::{AccessResult, Role};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Subject lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    /// May authenticate
    Active,
    /// Locked out; valid tokens are rejected
    Suspended,
    /// Removed; valid tokens are rejected
    Deleted,
}

/// Authoritative user row
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// User id
    pub id: i64,
    /// Owning tenant; `None` for platform admins
    pub tenant_id: Option<i64>,
    /// Email address
    pub email: String,
    /// Tenant role
    pub role: Role,
    /// Platform role, if any
    pub platform_role: Option<String>,
    /// Lifecycle status, read fresh at every verification
    pub status: UserStatus,
}

/// Read access to the authoritative user store
pub trait UserDirectory: Send + Sync {
    /// Lookup by user id
    fn by_id(&self, id: i64) -> AccessResult<Option<UserRecord>>;
}

/// In-memory user directory with counted lookups
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<i64, UserRecord>>>,
    lookups: AtomicU64,
}

impl InMemoryUserDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            lookups: AtomicU64::new(0),
        }
    }

    /// Insert or replace a user row
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.id, record);
    }

    /// Update a user's status
    pub fn set_status(&self, id: i64, status: UserStatus) {
        if let Some(user) = self.users.write().get_mut(&id) {
            user.status = status;
        }
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn by_id(&self, id: i64) -> AccessResult<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.users.read().get(&id).cloned())
    }
}
