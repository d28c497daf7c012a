//! Per-keyword run leases.
//!
//! At most one check run may be in flight for a keyword at a time. Leases
//! are held in process memory and expire after a TTL so a crashed or
//! abandoned run cannot block a keyword forever.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use aevis_core::{defaults, Error, Result};

/// One held lease: when it was taken and a token identifying the holder.
#[derive(Clone, Copy, Debug)]
struct Lease {
    acquired_at: Instant,
    token: Uuid,
}

/// Tracks in-flight check runs keyed by keyword id.
pub struct RunLeaseManager {
    leases: Arc<Mutex<HashMap<Uuid, Lease>>>,
    ttl: Duration,
}

impl RunLeaseManager {
    /// Create a manager with an explicit lease TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// TTL derived from the adapter timeout: long enough to cover every
    /// retry in a full fan-out, short enough that a dead run frees the
    /// keyword within minutes.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(
            defaults::ADAPTER_TIMEOUT_SECS * defaults::LEASE_TTL_TIMEOUT_MULTIPLE as u64,
        ))
    }

    /// Acquire the lease for a keyword.
    ///
    /// Returns [`Error::AlreadyRunning`] if a non-expired lease exists.
    /// The returned guard releases the lease on drop, including on error
    /// and panic paths.
    pub fn acquire(&self, keyword_id: Uuid) -> Result<RunLeaseGuard> {
        let mut leases = self.leases.lock().unwrap();
        if let Some(lease) = leases.get(&keyword_id) {
            if lease.acquired_at.elapsed() < self.ttl {
                return Err(Error::AlreadyRunning(keyword_id));
            }
            warn!(%keyword_id, "Reclaiming expired run lease");
        }
        let token = Uuid::new_v4();
        leases.insert(
            keyword_id,
            Lease {
                acquired_at: Instant::now(),
                token,
            },
        );
        debug!(%keyword_id, "Acquired run lease");
        Ok(RunLeaseGuard {
            leases: self.leases.clone(),
            keyword_id,
            token,
        })
    }

    /// Number of currently held (possibly expired) leases.
    pub fn active_count(&self) -> usize {
        self.leases.lock().unwrap().len()
    }
}

/// Releases the keyword lease when dropped.
///
/// The token check means a guard whose lease expired and was reclaimed
/// cannot release the reclaimer's lease.
#[derive(Debug)]
pub struct RunLeaseGuard {
    leases: Arc<Mutex<HashMap<Uuid, Lease>>>,
    keyword_id: Uuid,
    token: Uuid,
}

impl Drop for RunLeaseGuard {
    fn drop(&mut self) {
        let mut leases = self.leases.lock().unwrap();
        if leases.get(&self.keyword_id).map(|l| l.token) == Some(self.token) {
            leases.remove(&self.keyword_id);
            debug!(keyword_id = %self.keyword_id, "Released run lease");
        }
    }
}
