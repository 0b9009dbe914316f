//! Background avatar loader with single-flight coalescing
//!
//! One worker thread per loader pulls jobs off a request channel, runs
//! the (possibly slow) fetch, and pushes `(key, path)` onto a response
//! channel. All loader state — the resolved map and the tracked pending
//! key — lives on the foreground side and is touched only by the caller,
//! so no lock is needed. The worker runs for the process lifetime; it
//! winds down on its own once the loader (and with it the request
//! sender) is dropped.
//!
//! Callers poll: `query(Some(key))` either answers from the resolved map
//! or enqueues a fetch exactly once, and `drain()` moves a completed
//! fetch into the map without blocking.

use crate::avatar::AvatarSource;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, warn};

pub struct AvatarLoader {
    resolved: HashMap<String, PathBuf>,
    latest_job: Option<String>,
    job_tx: Sender<String>,
    done_rx: Receiver<(String, PathBuf)>,
}

impl AvatarLoader {
    /// Spawn the worker thread and return the foreground handle.
    pub fn spawn<S: AvatarSource>(source: S) -> Self {
        let (job_tx, job_rx) = unbounded::<String>();
        let (done_tx, done_rx) = unbounded::<(String, PathBuf)>();
        thread::spawn(move || worker(source, job_rx, done_tx));
        Self {
            resolved: HashMap::new(),
            latest_job: None,
            job_tx,
            done_rx,
        }
    }

    /// Look up an avatar, enqueueing a fetch on a miss.
    ///
    /// With `None`, re-queries the most recently requested unresolved
    /// key, if any. A hit on the tracked pending key clears the
    /// tracking. A miss on a *new* key enqueues one fetch and makes it
    /// the pending key; a miss on the already-pending key returns
    /// without re-enqueueing, so at most one request per perceived
    /// pending key is ever in flight.
    pub fn query(&mut self, job: Option<&str>) -> Option<PathBuf> {
        let job = match job {
            Some(job) => job.to_string(),
            None => self.latest_job.clone()?,
        };

        if let Some(path) = self.resolved.get(&job) {
            if self.latest_job.as_deref() == Some(job.as_str()) {
                self.latest_job = None;
            }
            return Some(path.clone());
        }

        if self.latest_job.as_deref() != Some(job.as_str()) {
            // A fetch for the previous pending key may still be running;
            // it just stops being "the" latest job. drain() will still
            // cache its result under its own key.
            debug!("queueing avatar fetch for {job}");
            let _ = self.job_tx.send(job.clone());
            self.latest_job = Some(job);
        }
        None
    }

    /// Move at most one completed fetch into the resolved map.
    /// Never blocks; call it periodically while waiting on a query.
    pub fn drain(&mut self) {
        if let Ok((job, path)) = self.done_rx.try_recv() {
            self.resolved.insert(job, path);
        }
    }
}

fn worker<S: AvatarSource>(source: S, jobs: Receiver<String>, done: Sender<(String, PathBuf)>) {
    for job in jobs {
        match source.fetch(&job) {
            Ok(path) => {
                if done.send((job, path)).is_err() {
                    break;
                }
            }
            // Dropped on purpose: the key stays unresolved and a later
            // query for it re-enqueues.
            Err(err) => warn!("avatar fetch for {job} failed: {err:#}"),
        }
    }
}
