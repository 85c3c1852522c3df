//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Turning keystroke-level edits into debounced settled values
//! - Skipping lookups that would only repeat the last resolution
//! - Keeping the two lookup directions from re-triggering each other
//! - Folding lookup outcomes back into the field state
//!
//! ## Architecture
//!
//! ```text
//!  EngineHandle ── EngineCommand ──┐
//!                                  ▼
//!                          ┌──────────────┐      spawn      ┌───────────────┐
//!   Debouncer (x2) ──────▶ │  SyncEngine  │ ──────────────▶ │ LookupService │
//!   settled values         └──────────────┘ ◀────────────── └───────────────┘
//!                                  │          completions
//!                 ┌────────────────┼────────────────┐
//!                 ▼                ▼                ▼
//!         ┌──────────────┐  ┌─────────────┐  ┌─────────────┐
//!         │ LookupGate   │  │ FieldState  │  │   Events    │
//!         │ (dedup)      │  │ Store       │  │  (notify)   │
//!         └──────────────┘  └─────────────┘  └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. A field value changes (edit, candidate pick, or a lookup writing it)
//! 2. That field's debouncer is re-armed
//! 3. On settle, the gate decides: issue, skip as duplicate/blank, or suppress
//!    because the other direction is in flight
//! 4. The lookup runs as a spawned task; its completion is applied as a
//!    transition, which may change the other field and re-arm its debouncer

pub mod debounce;
pub mod gate;
pub mod transition;

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tokio_stream::Stream;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, trace, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::state::{FieldState, FieldStateStore};
use crate::traits::{Locality, LookupService};

use debounce::Debouncer;
use gate::{LookupGate, SettleDecision, SkipReason};
use transition::{Direction, LookupOutcome, Transition};

/// Inbound events from the UI boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// The user edited a field
    FieldChanged { direction: Direction, value: String },

    /// The user picked a postal code from the candidate chooser
    CandidateSelected { postal_code: String },

    /// The user asked for an empty form
    Reset,
}

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started,

    /// A lookup call was issued
    LookupIssued { direction: Direction, query: String },

    /// A settled value did not produce a lookup
    LookupSkipped {
        direction: Direction,
        query: String,
        reason: SkipReason,
    },

    /// A lookup returned at least one record
    LookupResolved {
        direction: Direction,
        query: String,
        results: usize,
    },

    /// A lookup returned no records
    LookupNotFound { direction: Direction, query: String },

    /// A lookup failed at the transport layer
    LookupFailed {
        direction: Direction,
        query: String,
        error: String,
    },

    /// The form was reset
    StateReset,

    /// Engine stopped
    Stopped { reason: String },
}

/// A finished lookup task
struct LookupCompletion {
    direction: Direction,
    query: String,
    /// Reset generation the lookup was issued in
    generation: u64,
    result: Result<Vec<Locality>>,
}

/// One unit of work for the engine loop
enum Input {
    Command(EngineCommand),
    Settled(Direction, String),
    Completed(std::result::Result<LookupCompletion, JoinError>),
    Closed,
    Shutdown,
}

/// Core sync engine
///
/// The engine owns the field state and processes one input at a time:
/// a UI command, a settled value, or a lookup completion. Lookups themselves
/// run as spawned tasks so a slow service never blocks edits.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`], which also returns an [`EngineHandle`]
/// 2. Start with [`SyncEngine::run()`] (usually on its own task)
/// 3. Drive it through the handle
/// 4. The engine stops once every handle is dropped
pub struct SyncEngine {
    /// Lookup service for both directions
    service: Arc<dyn LookupService>,

    /// The shared field record
    store: FieldStateStore,

    /// Dedup references
    gate: LookupGate,

    /// Debounce timer for the locality field
    locality_timer: Debouncer,

    /// Debounce timer for the postal code field
    postal_code_timer: Debouncer,

    /// In-flight lookups
    lookups: JoinSet<LookupCompletion>,

    /// Bumped on every reset; completions from older generations are dropped
    generation: u64,

    /// Commands from the UI boundary
    commands: mpsc::Receiver<EngineCommand>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `service`: Lookup service implementation
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, handle, event_receiver) where the handle drives the
    /// engine and event_receiver yields engine events
    pub fn new(
        service: Box<dyn LookupService>,
        config: EngineConfig,
    ) -> Result<(Self, EngineHandle, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(config.command_channel_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);

        let store = FieldStateStore::new();
        let handle = EngineHandle {
            commands: command_tx,
            state: store.subscribe(),
        };

        let engine = Self {
            service: Arc::from(service),
            store,
            gate: LookupGate::new(),
            locality_timer: Debouncer::new(config.debounce()),
            postal_code_timer: Debouncer::new(config.debounce()),
            lookups: JoinSet::new(),
            generation: 0,
            commands: command_rx,
            event_tx,
        };

        Ok((engine, handle, event_rx))
    }

    /// Run the engine until every [`EngineHandle`] is dropped
    pub async fn run(self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine until `shutdown_rx` fires or every handle is dropped
    ///
    /// Commands already queued when the signal fires are still applied.
    pub async fn run_with_shutdown(self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(mut self, mut shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(EngineEvent::Started);
        info!(
            "Sync engine started (lookup service: {})",
            self.service.service_name()
        );

        let reason = loop {
            match self.next_input(&mut shutdown_rx).await {
                Input::Command(command) => self.handle_command(command),
                Input::Settled(direction, value) => self.handle_settled(direction, value),
                Input::Completed(Ok(completion)) => self.handle_completion(completion),
                Input::Completed(Err(e)) if e.is_cancelled() => {
                    trace!("Lookup task cancelled");
                }
                Input::Completed(Err(e)) => {
                    error!("Lookup task failed: {}", e);
                }
                Input::Closed => break "All handles dropped",
                Input::Shutdown => {
                    self.drain_commands();
                    break "Shutdown signal";
                }
            }
        };

        info!("Sync engine stopping: {}", reason);
        self.lookups.shutdown().await;
        self.emit_event(EngineEvent::Stopped {
            reason: reason.to_string(),
        });

        Ok(())
    }

    /// Wait for the next command, settled value, completion or shutdown
    async fn next_input(&mut self, shutdown_rx: &mut Option<oneshot::Receiver<()>>) -> Input {
        tokio::select! {
            biased;

            _ = wait_for_shutdown(shutdown_rx) => Input::Shutdown,

            command = self.commands.recv() => match command {
                Some(command) => Input::Command(command),
                None => Input::Closed,
            },

            Some(done) = self.lookups.join_next() => Input::Completed(done),

            value = self.locality_timer.settled() => Input::Settled(Direction::Locality, value),

            value = self.postal_code_timer.settled() => Input::Settled(Direction::PostalCode, value),
        }
    }

    /// Apply commands that were already queued when shutdown was requested
    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }
    }

    /// Handle a command from the UI boundary
    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::FieldChanged {
                direction: Direction::Locality,
                value,
            } => {
                self.gate.forget(Direction::Locality);
                self.apply(Transition::LocalityEdited(value));
            }
            EngineCommand::FieldChanged {
                direction: Direction::PostalCode,
                value,
            } => {
                self.gate.forget(Direction::PostalCode);
                self.apply(Transition::PostalCodeEdited(value));
            }
            EngineCommand::CandidateSelected { postal_code } => {
                debug!("Candidate selected: {}", postal_code);
                self.gate.forget(Direction::PostalCode);
                self.apply(Transition::CandidateSelected(postal_code));
            }
            EngineCommand::Reset => self.reset(),
        }
    }

    /// Handle a value that survived its debounce window
    fn handle_settled(&mut self, direction: Direction, value: String) {
        let state = self.store.snapshot();

        match self.gate.evaluate(direction, &value, &state) {
            SettleDecision::Issue => self.issue_lookup(direction, value.trim().to_string()),
            SettleDecision::Skip(reason) => {
                if reason == SkipReason::Blank {
                    self.gate.forget(direction);
                    self.apply(Transition::LookupCleared(direction));
                }

                debug!(
                    "Skipping {} lookup for '{}': {:?}",
                    direction, value, reason
                );
                self.emit_event(EngineEvent::LookupSkipped {
                    direction,
                    query: value,
                    reason,
                });
            }
        }
    }

    /// Mark the direction as loading and spawn the lookup
    fn issue_lookup(&mut self, direction: Direction, query: String) {
        self.gate.record(direction, query.clone());
        self.apply(Transition::LookupStarted(direction));

        debug!("Issuing {} lookup for '{}'", direction, query);
        self.emit_event(EngineEvent::LookupIssued {
            direction,
            query: query.clone(),
        });

        let service = Arc::clone(&self.service);
        let generation = self.generation;
        self.lookups.spawn(async move {
            let result = match direction {
                Direction::Locality => service.localities_by_name(&query).await,
                Direction::PostalCode => service.localities_by_postal_code(&query).await,
            };
            LookupCompletion {
                direction,
                query,
                generation,
                result,
            }
        });
    }

    /// Apply a lookup response to the field state
    fn handle_completion(&mut self, completion: LookupCompletion) {
        let LookupCompletion {
            direction,
            query,
            generation,
            result,
        } = completion;

        // Finished before a reset but collected after it
        if generation != self.generation {
            debug!("Discarding stale {} lookup for '{}'", direction, query);
            return;
        }

        let outcome = LookupOutcome::from_result(result);

        match &outcome {
            LookupOutcome::Found(found) => {
                info!(
                    "{} lookup for '{}' returned {} result(s)",
                    direction,
                    query,
                    found.len()
                );
                self.emit_event(EngineEvent::LookupResolved {
                    direction,
                    query,
                    results: found.len(),
                });
            }
            LookupOutcome::NotFound => {
                info!("{} lookup for '{}' returned no results", direction, query);
                self.emit_event(EngineEvent::LookupNotFound { direction, query });
            }
            LookupOutcome::Failed(e) => {
                warn!("{} lookup for '{}' failed: {}", direction, query, e);
                self.emit_event(EngineEvent::LookupFailed {
                    direction,
                    query,
                    error: e.clone(),
                });
            }
        }

        // The value written into the other field is already resolved
        match (direction, &outcome) {
            (Direction::Locality, LookupOutcome::Found(found)) => {
                if let [only] = found.as_slice() {
                    self.gate
                        .record(Direction::PostalCode, only.postal_code.clone());
                }
            }
            (Direction::PostalCode, LookupOutcome::Found(found)) => {
                if let Some(first) = found.first() {
                    self.gate.record(Direction::Locality, first.name.clone());
                }
            }
            _ => {}
        }

        let transition = match direction {
            Direction::Locality => Transition::LocalityResolved(outcome),
            Direction::PostalCode => Transition::PostalCodeResolved(outcome),
        };
        self.apply(transition);
    }

    /// Clear everything and drop pending work
    fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.lookups.abort_all();
        self.locality_timer.cancel();
        self.postal_code_timer.cancel();
        self.gate.clear();
        self.store.apply(Transition::Reset.patch());

        info!("Field state reset");
        self.emit_event(EngineEvent::StateReset);
    }

    /// Apply a transition and re-arm the debouncer of every field it changed
    fn apply(&mut self, transition: Transition) -> FieldState {
        let previous = self.store.snapshot();
        let next = self.store.apply(transition.patch());

        for direction in [Direction::Locality, Direction::PostalCode] {
            let value = direction.value(&next);
            if value != direction.value(&previous) {
                let value = value.to_string();
                self.timer_mut(direction).arm(value);
            }
        }

        next
    }

    fn timer_mut(&mut self, direction: Direction) -> &mut Debouncer {
        match direction {
            Direction::Locality => &mut self.locality_timer,
            Direction::PostalCode => &mut self.postal_code_timer,
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. Consider increasing event_channel_capacity."
                );
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Resolve when the optional shutdown signal fires; never without one
async fn wait_for_shutdown(shutdown_rx: &mut Option<oneshot::Receiver<()>>) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => std::future::pending().await,
    }
}

/// Handle for driving a running [`SyncEngine`]
///
/// Cheap to clone. The engine keeps running while at least one handle exists.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    state: watch::Receiver<FieldState>,
}

impl EngineHandle {
    /// Forward an edit of either field
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The engine accepted the command
    /// - `Err(Error::EngineStopped)`: The engine is no longer running
    pub async fn field_changed(&self, direction: Direction, value: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::FieldChanged {
            direction,
            value: value.into(),
        })
        .await
    }

    /// Forward an edit of the locality field
    pub async fn set_locality(&self, value: impl Into<String>) -> Result<()> {
        self.field_changed(Direction::Locality, value).await
    }

    /// Forward an edit of the postal code field
    pub async fn set_postal_code(&self, value: impl Into<String>) -> Result<()> {
        self.field_changed(Direction::PostalCode, value).await
    }

    /// Pick a postal code from the candidate chooser
    pub async fn select_candidate(&self, postal_code: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::CandidateSelected {
            postal_code: postal_code.into(),
        })
        .await
    }

    /// Reset the form
    pub async fn reset(&self) -> Result<()> {
        self.send(EngineCommand::Reset).await
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::EngineStopped)
    }

    /// Get a copy of the current field state
    pub fn state(&self) -> FieldState {
        self.state.borrow().clone()
    }

    /// Subscribe to field state changes
    pub fn subscribe(&self) -> watch::Receiver<FieldState> {
        self.state.clone()
    }

    /// Watch field state changes as a stream of snapshots
    pub fn watch(&self) -> Pin<Box<dyn Stream<Item = FieldState> + Send + 'static>> {
        Box::pin(WatchStream::new(self.state.clone()))
    }
}
