//! Session record store interface.
//!
//! The lifecycle manager appends terminal sessions; the statistics layer
//! reads the whole history back. Nothing else touches stored sessions.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::StoreError;
use crate::session::Session;

pub trait SessionStore: Send + Sync {
    /// Durably append a terminal session.
    fn append(&self, session: &Session) -> Result<(), StoreError>;

    /// Every stored session, ordered by start time.
    fn query_all(&self) -> Result<Vec<Session>, StoreError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn append(&self, session: &Session) -> Result<(), StoreError> {
        (**self).append(session)
    }

    fn query_all(&self) -> Result<Vec<Session>, StoreError> {
        (**self).query_all()
    }
}

/// Vec-backed store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn append(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        sessions.push(session.clone());
        Ok(())
    }

    fn query_all(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut all = sessions.clone();
        all.sort_by_key(|s| s.start_time);
        Ok(all)
    }
}

/// Bounded exponential backoff for store writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

enum WriteJob {
    Append(Session),
    Flush(oneshot::Sender<()>),
}

/// Write-behind decorator that retries failed appends on a worker thread.
///
/// `append` only queues the record, so a slow or failing backend never
/// stalls the caller. Reads wait for queued writes to land first. Dropping
/// the store drains the queue.
pub struct RetryingStore<S> {
    inner: Arc<S>,
    jobs: Option<mpsc::UnboundedSender<WriteJob>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: SessionStore + 'static> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        let inner = Arc::new(inner);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = inner.clone();
        let worker = std::thread::Builder::new()
            .name("session-writer".into())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    match job {
                        WriteJob::Append(session) => {
                            append_with_retry(&*backend, &policy, &session)
                        }
                        WriteJob::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn session writer");
                None
            }
        };
        Self {
            inner,
            jobs: worker.as_ref().map(|_| tx),
            worker,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Block until every queued append has been written or given up on.
    pub fn flush(&self) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        let (done, wait) = oneshot::channel();
        if jobs.send(WriteJob::Flush(done)).is_ok() {
            let _ = wait.blocking_recv();
        }
    }
}

fn is_retryable(err: &StoreError) -> bool {
    !matches!(err, StoreError::Corrupt(_) | StoreError::Serialization(_))
}

fn append_with_retry<S>(store: &S, policy: &RetryPolicy, session: &Session)
where
    S: SessionStore + ?Sized,
{
    let mut attempt = 1;
    loop {
        match store.append(session) {
            Ok(()) => return,
            Err(e) if attempt < policy.max_attempts && is_retryable(&e) => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    session_id = %session.id,
                    attempt,
                    ?delay,
                    error = %e,
                    "retrying session append"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session.id,
                    attempt,
                    error = %e,
                    "giving up on session record"
                );
                return;
            }
        }
    }
}

impl<S: SessionStore + 'static> SessionStore for RetryingStore<S> {
    fn append(&self, session: &Session) -> Result<(), StoreError> {
        match &self.jobs {
            Some(jobs) => jobs
                .send(WriteJob::Append(session.clone()))
                .map_err(|_| StoreError::Unavailable("session writer stopped".into())),
            None => self.inner.append(session),
        }
    }

    fn query_all(&self) -> Result<Vec<Session>, StoreError> {
        self.flush();
        self.inner.query_all()
    }
}

impl<S> Drop for RetryingStore<S> {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("session writer panicked");
            }
        }
    }
}
