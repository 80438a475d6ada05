//! Index lifecycle coordination.
//!
//! The coordinator owns the state machine
//! `Uninitialized -> Loading -> Ready | Failed`, runs the (slow) index build
//! on a dedicated background thread, and publishes the result through a
//! `tokio::sync::watch` channel that doubles as the readiness signal.
//!
//! # Thread Safety
//!
//! The lifecycle state and the index handle travel together in a single
//! watch value, so no reader can see `Ready` without also seeing the handle.
//! Every transition sends the watch value while holding the
//! [`StatusRegistry`] write lock, so a status snapshot and the readiness
//! channel never disagree. Locks are always taken registry first, then
//! channel.

use crate::config::{IndexConfig, StoreConfig};
use crate::error::NotReady;
use crate::index::{BuiltIndex, EmbedConfig, IndexBuilder, IndexHandle};
use crate::status::{LifecycleState, StatusRegistry, StatusUpdate};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Value carried by the readiness channel.
#[derive(Debug, Clone)]
enum Phase {
    Uninitialized,
    Loading,
    Ready(IndexHandle),
    Failed(String),
}

impl Phase {
    fn state(&self) -> LifecycleState {
        match self {
            Phase::Uninitialized => LifecycleState::Uninitialized,
            Phase::Loading => LifecycleState::Loading,
            Phase::Ready(_) => LifecycleState::Ready,
            Phase::Failed(_) => LifecycleState::Failed,
        }
    }

    fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }
}

struct Inner {
    phase: watch::Sender<Phase>,
    registry: Arc<StatusRegistry>,
    builder: Arc<dyn IndexBuilder>,
}

/// Builds the index once in the background and gates access to it.
///
/// Cloning is cheap; clones share the same lifecycle.
#[derive(Clone)]
pub struct LifecycleCoordinator {
    inner: Arc<Inner>,
}

impl LifecycleCoordinator {
    /// Create a coordinator in the `Uninitialized` state.
    pub fn new(builder: Arc<dyn IndexBuilder>, registry: Arc<StatusRegistry>) -> Self {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                phase,
                registry,
                builder,
            }),
        }
    }

    /// Start building the index in the background.
    ///
    /// Only the first call has any effect; it returns `true`. Every later call,
    /// including concurrent ones, returns `false` without building again.
    pub fn start(&self, config: IndexConfig) -> bool {
        let claimed = self.inner.registry.commit(|record| {
            let claimed = self.inner.phase.send_if_modified(|phase| {
                if matches!(phase, Phase::Uninitialized) {
                    *phase = Phase::Loading;
                    true
                } else {
                    false
                }
            });
            if claimed {
                StatusUpdate::from_embed_config(&EmbedConfig::from_config(&config, 0))
                    .with_status(LifecycleState::Loading)
                    .apply_to(record);
            }
            claimed
        });

        if !claimed {
            debug!("Vector store build already started, ignoring start request");
            return false;
        }

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(StoreConfig::BUILD_THREAD_NAME.to_string())
            .spawn(move || inner.run_build(config));

        if let Err(e) = spawned {
            self.inner
                .fail(format!("Failed to spawn index build thread: {}", e));
        }
        true
    }

    /// True iff the index has been published.
    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.phase.borrow(), Phase::Ready(_))
    }

    pub fn current_state(&self) -> LifecycleState {
        self.inner.phase.borrow().state()
    }

    /// The published index, without waiting.
    pub fn handle(&self) -> Option<IndexHandle> {
        match &*self.inner.phase.borrow() {
            Phase::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// The recorded build error, if the build failed.
    pub fn failure(&self) -> Option<String> {
        match &*self.inner.phase.borrow() {
            Phase::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn registry(&self) -> &Arc<StatusRegistry> {
        &self.inner.registry
    }

    /// Number of callers currently suspended in [`await_ready`](Self::await_ready).
    pub fn waiter_count(&self) -> usize {
        self.inner.phase.receiver_count()
    }

    /// Wait until the build finishes, optionally bounded by `timeout`.
    ///
    /// Waiters that subscribe after the result was published return
    /// immediately; earlier waiters are all woken by the same publish.
    pub async fn await_ready(&self, timeout: Option<Duration>) -> Result<IndexHandle, NotReady> {
        let mut rx = self.inner.phase.subscribe();
        let wait = async move {
            rx.wait_for(Phase::is_terminal)
                .await
                .map(|phase| (*phase).clone())
        };

        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| NotReady::TimedOut(limit))?,
            None => wait.await,
        };

        match outcome {
            Ok(Phase::Ready(handle)) => Ok(handle),
            Ok(Phase::Failed(reason)) => Err(NotReady::Failed { reason }),
            Ok(_) | Err(_) => Err(NotReady::Abandoned),
        }
    }
}

impl std::fmt::Debug for LifecycleCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleCoordinator")
            .field("state", &self.current_state())
            .finish()
    }
}

impl Inner {
    fn run_build(&self, config: IndexConfig) {
        let started = Instant::now();
        info!("Loading the vector store - db_dir: {}", config.db_dir.display());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.builder.build(&config)));

        match outcome {
            Ok(Ok(built)) => self.publish(built, started.elapsed()),
            Ok(Err(e)) => self.fail(format!("Error loading vector store: {}", e)),
            Err(payload) => self.fail(format!(
                "Vector store build panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }

    fn publish(&self, built: BuiltIndex, elapsed: Duration) {
        let BuiltIndex {
            handle,
            mut embed_config,
        } = built;
        embed_config.index_size = handle.len();

        let update =
            StatusUpdate::from_embed_config(&embed_config).with_status(LifecycleState::Ready);
        let waiters = self.registry.commit(|record| {
            update.apply_to(record);
            let waiters = self.phase.receiver_count();
            self.phase.send_replace(Phase::Ready(handle));
            waiters
        });

        info!(
            "Vector store is ready: {} entries, {} matches per search, built in {:.1}s ({} waiters)",
            embed_config.index_size,
            embed_config.matches,
            elapsed.as_secs_f64(),
            waiters
        );
    }

    fn fail(&self, message: String) {
        error!("{}", message);
        self.registry.commit(|record| {
            StatusUpdate::failure(message.clone()).apply_to(record);
            self.phase.send_replace(Phase::Failed(message));
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BuildError, IndexError};
    use crate::index::{SearchIndex, SearchResultItem};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Mutex;

    struct FixedIndex(usize);

    impl SearchIndex for FixedIndex {
        fn search_multi(&self, _probes: &[&str]) -> Result<Vec<SearchResultItem>, IndexError> {
            Ok(Vec::new())
        }

        fn len(&self) -> usize {
            self.0
        }
    }

    fn built(size: usize, config: &IndexConfig) -> BuiltIndex {
        BuiltIndex {
            handle: IndexHandle::new(FixedIndex(size)),
            embed_config: EmbedConfig::from_config(config, size),
        }
    }

    fn coordinator(builder: impl IndexBuilder) -> LifecycleCoordinator {
        LifecycleCoordinator::new(Arc::new(builder), Arc::new(StatusRegistry::new()))
    }

    fn sized_builder(size: usize) -> impl IndexBuilder {
        move |config: &IndexConfig| -> Result<BuiltIndex, BuildError> { Ok(built(size, config)) }
    }

    /// Builder that blocks until the test releases it.
    fn gated_builder(size: usize) -> (impl IndexBuilder, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let builder = move |config: &IndexConfig| -> Result<BuiltIndex, BuildError> {
            let _ = rx.lock().unwrap().recv();
            Ok(built(size, config))
        };
        (builder, tx)
    }

    #[test]
    fn test_new_coordinator_is_uninitialized() {
        let coordinator = coordinator(sized_builder(1));
        assert_eq!(coordinator.current_state(), LifecycleState::Uninitialized);
        assert!(!coordinator.is_ready());
        assert!(coordinator.handle().is_none());
        assert_eq!(
            coordinator.registry().snapshot().status,
            LifecycleState::Uninitialized
        );
    }

    #[tokio::test]
    async fn test_start_publishes_ready() {
        let coordinator = coordinator(sized_builder(1000));
        let config = IndexConfig {
            matches: 5,
            ..IndexConfig::default()
        };

        assert!(coordinator.start(config));
        let handle = coordinator
            .await_ready(Some(Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(handle.len(), 1000);
        assert!(coordinator.is_ready());
        let snapshot = coordinator.registry().snapshot();
        assert_eq!(snapshot.status, LifecycleState::Ready);
        assert_eq!(snapshot.matches, 5);
        assert_eq!(snapshot.index_size, 1000);
    }

    #[tokio::test]
    async fn test_second_start_is_noop() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let coordinator = coordinator(move |config: &IndexConfig| -> Result<BuiltIndex, BuildError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(built(1, config))
        });

        assert!(coordinator.start(IndexConfig::default()));
        assert!(!coordinator.start(IndexConfig::default()));
        coordinator.await_ready(None).await.unwrap();
        assert!(!coordinator.start(IndexConfig::default()));

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_state_is_loading_while_build_runs() {
        let (builder, release) = gated_builder(3);
        let coordinator = coordinator(builder);

        coordinator.start(IndexConfig::default());
        assert_eq!(coordinator.current_state(), LifecycleState::Loading);
        assert_eq!(
            coordinator.registry().snapshot().status,
            LifecycleState::Loading
        );
        assert!(coordinator.handle().is_none());

        release.send(()).unwrap();
        coordinator.await_ready(None).await.unwrap();
        assert_eq!(coordinator.current_state(), LifecycleState::Ready);
    }

    #[tokio::test]
    async fn test_build_error_transitions_to_failed() {
        let coordinator = coordinator(|_: &IndexConfig| -> Result<BuiltIndex, BuildError> {
            Err(BuildError::EmptyReference)
        });

        coordinator.start(IndexConfig::default());
        let err = coordinator.await_ready(None).await.unwrap_err();

        assert!(matches!(err, NotReady::Failed { .. }));
        assert_eq!(coordinator.current_state(), LifecycleState::Failed);
        assert!(coordinator.failure().unwrap().contains("empty index"));
        let snapshot = coordinator.registry().snapshot();
        assert_eq!(snapshot.status, LifecycleState::Failed);
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_build_panic_transitions_to_failed() {
        let coordinator = coordinator(|_: &IndexConfig| -> Result<BuiltIndex, BuildError> {
            panic!("out of memory")
        });

        coordinator.start(IndexConfig::default());
        let err = coordinator
            .await_ready(Some(Duration::from_secs(5)))
            .await
            .unwrap_err();

        match err {
            NotReady::Failed { reason } => assert!(reason.contains("out of memory")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_await_ready_times_out_while_loading() {
        let (builder, release) = gated_builder(1);
        let coordinator = coordinator(builder);
        coordinator.start(IndexConfig::default());

        let err = coordinator
            .await_ready(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert_eq!(err, NotReady::TimedOut(Duration::from_millis(20)));

        release.send(()).unwrap();
        assert!(coordinator.await_ready(None).await.is_ok());
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }
}
