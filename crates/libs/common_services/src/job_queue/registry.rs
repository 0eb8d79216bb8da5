use crate::ingest::IngestError;
use common_types::Job;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Shared state of one job: the live status plus its cancellation flag.
#[derive(Debug)]
pub struct JobEntry {
    state: RwLock<Job>,
    cancel: CancellationToken,
}

impl JobEntry {
    fn new(job: Job) -> Self {
        Self {
            state: RwLock::new(job),
            cancel: CancellationToken::new(),
        }
    }

    /// An owned copy of the current status.
    pub async fn snapshot(&self) -> Job {
        self.state.read().await.clone()
    }

    pub(crate) async fn update(&self, change: impl FnOnce(&mut Job)) {
        let mut job = self.state.write().await;
        change(&mut job);
    }

    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct Jobs {
    by_id: HashMap<String, Arc<JobEntry>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Every known job by id. Optionally forgets the oldest finished jobs beyond a cap.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<Jobs>,
    max_retained: Option<usize>,
}

impl JobRegistry {
    #[must_use]
    pub fn new(max_retained: Option<usize>) -> Self {
        Self {
            jobs: RwLock::default(),
            max_retained,
        }
    }

    pub async fn insert(&self, job: Job) -> Arc<JobEntry> {
        let id = job.id.clone();
        let entry = Arc::new(JobEntry::new(job));
        let mut jobs = self.jobs.write().await;
        jobs.by_id.insert(id.clone(), entry.clone());
        jobs.order.push_back(id);

        if let Some(max) = self.max_retained {
            evict_terminal(&mut jobs, max).await;
        }
        entry
    }

    pub async fn get(&self, id: &str) -> Option<Arc<JobEntry>> {
        self.jobs.read().await.by_id.get(id).cloned()
    }

    pub async fn status(&self, id: &str) -> Result<Job, IngestError> {
        let entry = self
            .get(id)
            .await
            .ok_or_else(|| IngestError::NotFound(format!("job {id}")))?;
        Ok(entry.snapshot().await)
    }

    /// Snapshots of all known jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let entries: Vec<_> = {
            let jobs = self.jobs.read().await;
            jobs.order
                .iter()
                .rev()
                .filter_map(|id| jobs.by_id.get(id).cloned())
                .collect()
        };
        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            snapshots.push(entry.snapshot().await);
        }
        snapshots
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

async fn evict_terminal(jobs: &mut Jobs, max: usize) {
    let mut index = 0;
    while jobs.by_id.len() > max && index < jobs.order.len() {
        let id = jobs.order[index].clone();
        let terminal = match jobs.by_id.get(&id) {
            Some(entry) => entry.state.read().await.is_terminal(),
            None => true,
        };
        if terminal {
            jobs.by_id.remove(&id);
            jobs.order.remove(index);
        } else {
            index += 1;
        }
    }
}
