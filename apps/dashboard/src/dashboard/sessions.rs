use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::data::directory::CountryDirectory;
use crate::data::snapshot::Snapshot;

/// Country-selection widget state. A failed directory load disables only this widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirectoryState {
    Ready { entries: CountryDirectory },
    Disabled { reason: String },
}

/// Everything fetched for one page load. Never mutated once built.
#[derive(Debug)]
pub struct DashboardSession {
    pub id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub snapshot: Snapshot,
    pub directory: DirectoryState,
}

impl DashboardSession {
    pub fn new(snapshot: Snapshot, directory: DirectoryState) -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            snapshot,
            directory,
        }
    }
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<Uuid, Arc<DashboardSession>>,
    // Insertion order, oldest first.
    order: VecDeque<Uuid>,
}

/// Open sessions, bounded; the oldest is evicted once `capacity` is reached.
pub struct SessionRegistry {
    inner: RwLock<Sessions>,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    pub async fn insert(&self, session: DashboardSession) -> Arc<DashboardSession> {
        let session = Arc::new(session);
        let mut inner = self.inner.write().await;
        while inner.order.len() >= self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.by_id.remove(&evicted);
                debug!("Evicted session {evicted}");
            }
        }
        inner.order.push_back(session.id);
        inner.by_id.insert(session.id, Arc::clone(&session));
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<DashboardSession>> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}
