//! Registry - session multiplexing and fan-out wiring

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use batcher::Batcher;
use contracts::{Batch, BatchSink, BulkConfig, SessionId, SinkConfig, SinkType};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{ConsoleSink, FileSink, LogSink};

/// One open command stream
struct Session {
    batcher: Batcher,
    /// Sinks this session fans out to, resolved ahead of delivery
    delivery: Vec<Arc<SinkHandle>>,
}

impl Session {
    /// Enqueue a non-empty batch to every wired sink
    fn deliver(&self, id: SessionId, batch: Batch) {
        if batch.is_empty() {
            return;
        }
        observability::record_batch_emitted(batch.len());
        debug!(
            session_id = %id,
            batch_len = batch.len(),
            sinks = self.delivery.len(),
            "Batch completed"
        );
        for handle in &self.delivery {
            handle.enqueue(batch.clone());
        }
    }
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<SessionId, Session>,
    sinks: Vec<Arc<SinkHandle>>,
    last_session_id: u64,
}

/// Owns the open sessions and the registered sinks.
///
/// All operations are serialized by one lock that is held only for lookup,
/// batching and queue insertion; sink I/O happens on each sink's own worker.
/// Every session is wired to the sinks registered when it was opened plus all
/// sinks added afterwards.
pub struct Registry {
    state: Mutex<RegistryState>,
    /// Runtime that hosts the sink workers
    runtime: Option<Handle>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with no sinks and no sessions
    ///
    /// Captures the current tokio runtime, if any, for sink workers. Once
    /// captured, sinks can be added from any thread.
    pub fn new() -> Self {
        Self {
            state: Mutex::default(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Create an empty registry whose sink workers run on `runtime`
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            state: Mutex::default(),
            runtime: Some(runtime),
        }
    }

    fn runtime(&self) -> Result<Handle, DispatcherError> {
        self.runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or(DispatcherError::NoRuntime)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wrap a sink in its own delivery queue and wire it into every open session
    ///
    /// The sink only sees batches completed after this call.
    ///
    /// # Errors
    /// [`DispatcherError::NoRuntime`] if the registry was created outside a
    /// tokio runtime and this call is made outside one too.
    #[instrument(name = "registry_add_sink", skip(self, sink), fields(sink = %sink.name()))]
    pub fn add_sink<S: BatchSink + Send + 'static>(
        &self,
        sink: S,
    ) -> Result<Arc<SinkHandle>, DispatcherError> {
        let runtime = self.runtime()?;
        let handle = Arc::new(SinkHandle::spawn_on(sink, &runtime));

        let mut state = self.lock();
        state.sinks.push(Arc::clone(&handle));
        for session in state.sessions.values_mut() {
            session.delivery.push(Arc::clone(&handle));
        }

        info!(
            sink = %handle.name(),
            sessions = state.sessions.len(),
            "Sink registered"
        );
        Ok(handle)
    }

    /// Build a sink from configuration and register it
    #[instrument(
        name = "registry_add_configured_sink",
        skip(self, config, output_dir),
        fields(sink = %config.name, sink_type = ?config.sink_type)
    )]
    pub fn add_configured_sink(
        &self,
        config: &SinkConfig,
        output_dir: &Path,
    ) -> Result<Arc<SinkHandle>, DispatcherError> {
        let handle = match config.sink_type {
            SinkType::Console => self.add_sink(ConsoleSink::stdout(&config.name))?,
            SinkType::Log => self.add_sink(LogSink::new(&config.name))?,
            SinkType::File => {
                let sink = FileSink::from_params(&config.name, &config.params, output_dir)
                    .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
                self.add_sink(sink)?
            }
        };
        Ok(handle)
    }

    /// Open a new session with the given batch size
    ///
    /// # Errors
    /// - capacity of 0
    /// - the freshly issued id is already registered (internal fault)
    #[instrument(name = "registry_open_session", skip(self))]
    pub fn open_session(&self, capacity: usize) -> Result<SessionId, DispatcherError> {
        let batcher = Batcher::new(capacity)?;

        let mut state = self.lock();
        state.last_session_id += 1;
        let id = SessionId::new(state.last_session_id);
        if state.sessions.contains_key(&id) {
            return Err(DispatcherError::DuplicateSession(id));
        }

        let delivery = state.sinks.clone();
        info!(session_id = %id, capacity, sinks = delivery.len(), "Session opened");
        state.sessions.insert(id, Session { batcher, delivery });
        observability::record_sessions_open(state.sessions.len());

        Ok(id)
    }

    /// Feed one command to a session
    ///
    /// # Errors
    /// - [`DispatcherError::UnknownSession`]
    /// - unbalanced region close, wrapped in [`DispatcherError::Contract`]
    pub fn receive(&self, command: &str, id: SessionId) -> Result<(), DispatcherError> {
        let mut state = self.lock();
        let session = state
            .sessions
            .get_mut(&id)
            .ok_or(DispatcherError::UnknownSession(id))?;

        observability::record_command_received();
        let batch = session.batcher.process(command)?;
        session.deliver(id, batch);
        Ok(())
    }

    /// Close a session, delivering its pending batch first
    ///
    /// When the last open session closes, every registered sink is stopped and
    /// this call waits until they have drained.
    ///
    /// # Errors
    /// [`DispatcherError::UnknownSession`]
    #[instrument(name = "registry_close_session", skip(self))]
    pub async fn close_session(&self, id: SessionId) -> Result<(), DispatcherError> {
        let to_stop = {
            let mut state = self.lock();
            let mut session = state
                .sessions
                .remove(&id)
                .ok_or(DispatcherError::UnknownSession(id))?;

            let batch = session.batcher.flush();
            session.deliver(id, batch);

            let remaining = state.sessions.len();
            observability::record_sessions_open(remaining);
            info!(session_id = %id, remaining, "Session closed");

            if remaining == 0 {
                state.sinks.clone()
            } else {
                Vec::new()
            }
        };

        Self::stop_handles(&to_stop).await;
        Ok(())
    }

    /// Forget every registered sink
    ///
    /// Sessions that are still open keep running but no longer deliver anywhere.
    ///
    /// # Errors
    /// [`DispatcherError::SinksNotStopped`] if any sink worker is still running;
    /// nothing is changed in that case.
    #[instrument(name = "registry_reset_sinks", skip(self))]
    pub fn reset_sinks(&self) -> Result<(), DispatcherError> {
        let mut state = self.lock();

        let running: Vec<String> = state
            .sinks
            .iter()
            .filter(|handle| !handle.is_stopped())
            .map(|handle| handle.name().to_string())
            .collect();
        if !running.is_empty() {
            return Err(DispatcherError::SinksNotStopped { sinks: running });
        }

        let removed = state.sinks.len();
        state.sinks.clear();
        for session in state.sessions.values_mut() {
            session.delivery.clear();
        }

        debug!(removed, "Sinks reset");
        Ok(())
    }

    /// Close every open session and stop every sink
    #[instrument(name = "registry_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let to_stop = {
            let mut state = self.lock();
            let mut ids: Vec<SessionId> = state.sessions.keys().copied().collect();
            ids.sort();
            for id in ids {
                if let Some(mut session) = state.sessions.remove(&id) {
                    let batch = session.batcher.flush();
                    session.deliver(id, batch);
                }
            }
            observability::record_sessions_open(0);
            state.sinks.clone()
        };

        Self::stop_handles(&to_stop).await;
        info!("Registry shutdown complete");
    }

    async fn stop_handles(handles: &[Arc<SinkHandle>]) {
        for handle in handles {
            match handle.stop().await {
                Ok(()) => {}
                Err(DispatcherError::AlreadyStopped { sink_name }) => {
                    debug!(sink = %sink_name, "Sink already stopped");
                }
                Err(e) => warn!(sink = %handle.name(), error = %e, "Sink stop failed"),
            }
        }
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.lock().sinks.len()
    }

    /// Get metrics for all sinks
    pub fn sink_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.lock()
            .sinks
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }
}

/// Builder for creating a Registry with its sinks from configuration
pub struct RegistryBuilder {
    sinks: Vec<SinkConfig>,
    output_dir: PathBuf,
}

impl RegistryBuilder {
    /// Create a new RegistryBuilder
    pub fn new(config: &BulkConfig) -> Self {
        Self {
            sinks: config.sinks.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Build the registry and start every configured sink
    #[instrument(
        name = "registry_builder_build",
        skip(self),
        fields(sink_count = self.sinks.len())
    )]
    pub fn build(self) -> Result<Registry, DispatcherError> {
        let registry = Registry::new();
        for sink_config in &self.sinks {
            registry.add_configured_sink(sink_config, &self.output_dir)?;
        }
        Ok(registry)
    }
}
