use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::io::store::StoreError;
use crate::model::{CategoryId, EntryId, GroceryList};

/// Error type for the persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("persistence rejected the change: {0}")]
    Rejected(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("sync worker is not running")]
    Disconnected,
}

/// The collaborator that owns the authoritative list.
///
/// Moves are fire-and-forget with a failure signal: an `Err` means the
/// caller should refresh, never retry.
pub trait SyncAdapter {
    fn fetch_all(&mut self) -> Result<GroceryList, SyncError>;

    fn persist_entry_move(
        &mut self,
        id: EntryId,
        new_position: Option<i64>,
        new_category_id: Option<CategoryId>,
    ) -> Result<(), SyncError>;

    fn persist_category_move(&mut self, id: CategoryId, new_position: i64)
    -> Result<(), SyncError>;
}

impl<A: SyncAdapter + ?Sized> SyncAdapter for Box<A> {
    fn fetch_all(&mut self) -> Result<GroceryList, SyncError> {
        (**self).fetch_all()
    }

    fn persist_entry_move(
        &mut self,
        id: EntryId,
        new_position: Option<i64>,
        new_category_id: Option<CategoryId>,
    ) -> Result<(), SyncError> {
        (**self).persist_entry_move(id, new_position, new_category_id)
    }

    fn persist_category_move(
        &mut self,
        id: CategoryId,
        new_position: i64,
    ) -> Result<(), SyncError> {
        (**self).persist_category_move(id, new_position)
    }
}

/// Result of one job run by the background worker
#[derive(Debug)]
pub enum SyncReport {
    /// The job succeeded; this is the list as stored afterwards
    Refreshed(GroceryList),
    /// The job failed; the caller should refresh
    Failed(SyncError),
}

enum Job {
    EntryMove {
        id: EntryId,
        new_position: Option<i64>,
        new_category_id: Option<CategoryId>,
    },
    CategoryMove {
        id: CategoryId,
        new_position: i64,
    },
    Refresh,
    Fetch(mpsc::Sender<Result<GroceryList, SyncError>>),
}

/// Runs an adapter on a worker thread so persisting never blocks the UI.
///
/// Each move is persisted and followed by a fresh fetch; results come back
/// as [`SyncReport`]s through [`BackgroundSync::poll`].
pub struct BackgroundSync {
    jobs: Option<mpsc::Sender<Job>>,
    reports: mpsc::Receiver<SyncReport>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundSync {
    pub fn spawn<A>(mut adapter: A) -> Self
    where
        A: SyncAdapter + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (report_tx, report_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            for job in job_rx {
                let persisted = match job {
                    Job::EntryMove {
                        id,
                        new_position,
                        new_category_id,
                    } => adapter.persist_entry_move(id, new_position, new_category_id),
                    Job::CategoryMove { id, new_position } => {
                        adapter.persist_category_move(id, new_position)
                    }
                    Job::Refresh => Ok(()),
                    Job::Fetch(reply) => {
                        let _ = reply.send(adapter.fetch_all());
                        continue;
                    }
                };
                let report = match persisted.and_then(|()| adapter.fetch_all()) {
                    Ok(list) => SyncReport::Refreshed(list),
                    Err(e) => {
                        tracing::warn!(error = %e, "background sync failed");
                        SyncReport::Failed(e)
                    }
                };
                if report_tx.send(report).is_err() {
                    break;
                }
            }
            tracing::debug!("sync worker stopped");
        });

        BackgroundSync {
            jobs: Some(job_tx),
            reports: report_rx,
            worker: Some(worker),
        }
    }

    fn submit(&self, job: Job) -> Result<(), SyncError> {
        self.jobs
            .as_ref()
            .ok_or(SyncError::Disconnected)?
            .send(job)
            .map_err(|_| SyncError::Disconnected)
    }

    /// Queue a fetch whose result arrives as a report.
    pub fn request_refresh(&self) -> Result<(), SyncError> {
        self.submit(Job::Refresh)
    }

    /// Non-blocking poll for finished jobs.
    pub fn poll(&self) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        while let Ok(report) = self.reports.try_recv() {
            reports.push(report);
        }
        reports
    }

    /// Wait up to `timeout` for the next report.
    pub fn wait(&self, timeout: Duration) -> Option<SyncReport> {
        self.reports.recv_timeout(timeout).ok()
    }
}

impl SyncAdapter for BackgroundSync {
    /// Blocks until the worker has fetched; used for the initial load.
    fn fetch_all(&mut self) -> Result<GroceryList, SyncError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.submit(Job::Fetch(reply_tx))?;
        reply_rx.recv().map_err(|_| SyncError::Disconnected)?
    }

    fn persist_entry_move(
        &mut self,
        id: EntryId,
        new_position: Option<i64>,
        new_category_id: Option<CategoryId>,
    ) -> Result<(), SyncError> {
        self.submit(Job::EntryMove {
            id,
            new_position,
            new_category_id,
        })
    }

    fn persist_category_move(
        &mut self,
        id: CategoryId,
        new_position: i64,
    ) -> Result<(), SyncError> {
        self.submit(Job::CategoryMove { id, new_position })
    }
}

impl Drop for BackgroundSync {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Entry};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared {
        moves: Arc<Mutex<Vec<(EntryId, Option<i64>, Option<CategoryId>)>>>,
        reject: bool,
    }

    impl SyncAdapter for Shared {
        fn fetch_all(&mut self) -> Result<GroceryList, SyncError> {
            Ok(GroceryList::new(
                vec![Category::default_category()],
                vec![Entry::new(1, "eggs", 1, 0)],
            ))
        }

        fn persist_entry_move(
            &mut self,
            id: EntryId,
            new_position: Option<i64>,
            new_category_id: Option<CategoryId>,
        ) -> Result<(), SyncError> {
            if self.reject {
                return Err(SyncError::Rejected("read-only".into()));
            }
            self.moves
                .lock()
                .unwrap()
                .push((id, new_position, new_category_id));
            Ok(())
        }

        fn persist_category_move(&mut self, _: CategoryId, _: i64) -> Result<(), SyncError> {
            Ok(())
        }
    }

    #[test]
    fn persist_then_refresh_report() {
        let adapter = Shared::default();
        let moves = adapter.moves.clone();
        let mut sync = BackgroundSync::spawn(adapter);

        sync.persist_entry_move(1, Some(0), None).unwrap();
        let report = sync.wait(Duration::from_secs(5)).unwrap();
        assert!(matches!(report, SyncReport::Refreshed(ref list) if list.entries.len() == 1));
        assert_eq!(moves.lock().unwrap().as_slice(), &[(1, Some(0), None)]);
    }

    #[test]
    fn failure_is_reported_not_retried() {
        let adapter = Shared {
            reject: true,
            ..Default::default()
        };
        let mut sync = BackgroundSync::spawn(adapter);
        sync.persist_entry_move(1, Some(3), Some(2)).unwrap();
        let report = sync.wait(Duration::from_secs(5)).unwrap();
        assert!(matches!(report, SyncReport::Failed(SyncError::Rejected(_))));
        assert!(sync.wait(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn fetch_all_blocks_for_result() {
        let mut sync = BackgroundSync::spawn(Shared::default());
        let list = sync.fetch_all().unwrap();
        assert_eq!(list.categories.len(), 1);
        assert!(sync.poll().is_empty());
    }
}
