//! Per-request connection scoping.
//!
//! Pooled connections are reused across tenants between requests, so the
//! tenant namespace is never set as connection default state. It is
//! applied when a connection is acquired for one request and cleared
//! before the connection returns to the pool.

use crate::schema::SchemaName;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct PooledConn {
    scope: Mutex<Option<SchemaName>>,
}

/// Fixed-size pool of shareable store connections
pub struct ConnectionPool {
    conns: Vec<Arc<PooledConn>>,
    next: AtomicUsize,
}

impl ConnectionPool {
    /// Create a pool with the given number of connections
    pub fn new(size: usize) -> Self {
        let conns = (0..size.max(1))
            .map(|_| {
                Arc::new(PooledConn {
                    scope: Mutex::new(None),
                })
            })
            .collect();
        Self {
            conns,
            next: AtomicUsize::new(0),
        }
    }

    /// Acquire a connection scoped to the tenant's namespace
    ///
    /// The scope lives exactly as long as the returned guard.
    pub fn acquire(&self, schema: SchemaName) -> ScopedConnection {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        let conn = Arc::clone(&self.conns[idx]);
        *conn.scope.lock() = Some(schema.clone());
        tracing::debug!(schema = %schema, "connection scoped to tenant namespace");
        ScopedConnection { conn, schema }
    }

    /// Whether any pooled connection still carries a tenant scope
    ///
    /// Must be false whenever no request holds a guard.
    pub fn has_leaked_scope(&self) -> bool {
        self.conns.iter().any(|c| c.scope.lock().is_some())
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Guard holding a connection scoped to one tenant namespace
pub struct ScopedConnection {
    conn: Arc<PooledConn>,
    schema: SchemaName,
}

impl ScopedConnection {
    /// The namespace this connection is scoped to
    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }
}

impl std::fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("schema", &self.schema)
            .finish()
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        // Reset before the connection becomes visible to other requests.
        *self.conn.scope.lock() = None;
    }
}
