//! Test doubles and common utilities for sync engine contract tests
//!
//! This module provides a scripted lookup service that counts calls and can
//! hold responses back until a test releases them.

#![allow(dead_code)]

use plz_core::error::{Error, Result};
use plz_core::traits::{Locality, LookupService};
use plz_core::{EngineConfig, EngineEvent, EngineHandle, SyncEngine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Debounce delay used by the contract tests
pub const DEBOUNCE_MS: u64 = 1000;

/// Comfortably past one debounce window plus an instant lookup
pub const SETTLE_MS: u64 = 1100;

/// Scripted response for one query
#[derive(Clone)]
pub enum Reply {
    Records(Vec<Locality>),
    Fail(String),
}

/// A mock LookupService with per-query scripted replies
///
/// Unknown queries return no records.
pub struct MockLookupService {
    by_name: Arc<Mutex<HashMap<String, Reply>>>,
    by_postal_code: Arc<Mutex<HashMap<String, Reply>>>,
    name_call_count: Arc<AtomicUsize>,
    postal_code_call_count: Arc<AtomicUsize>,
    name_queries: Arc<Mutex<Vec<String>>>,
    postal_code_queries: Arc<Mutex<Vec<String>>>,
    /// When set, postal code lookups wait for a permit before answering
    postal_code_gate: Option<Arc<Semaphore>>,
    /// When set, name lookups wait for a permit before answering
    name_gate: Option<Arc<Semaphore>>,
}

impl MockLookupService {
    pub fn new() -> Self {
        Self {
            by_name: Arc::new(Mutex::new(HashMap::new())),
            by_postal_code: Arc::new(Mutex::new(HashMap::new())),
            name_call_count: Arc::new(AtomicUsize::new(0)),
            postal_code_call_count: Arc::new(AtomicUsize::new(0)),
            name_queries: Arc::new(Mutex::new(Vec::new())),
            postal_code_queries: Arc::new(Mutex::new(Vec::new())),
            postal_code_gate: None,
            name_gate: None,
        }
    }

    /// Script the reply for a name query
    pub fn with_name(self, name: &str, reply: Reply) -> Self {
        self.by_name.lock().unwrap().insert(name.to_string(), reply);
        self
    }

    /// Script the reply for a postal code query
    pub fn with_postal_code(self, postal_code: &str, reply: Reply) -> Self {
        self.by_postal_code
            .lock()
            .unwrap()
            .insert(postal_code.to_string(), reply);
        self
    }

    /// Hold postal code replies until permits are added to the returned semaphore
    pub fn gate_postal_codes(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.postal_code_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Hold name replies until permits are added to the returned semaphore
    pub fn gate_names(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.name_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn name_call_count(&self) -> usize {
        self.name_call_count.load(Ordering::SeqCst)
    }

    pub fn postal_code_call_count(&self) -> usize {
        self.postal_code_call_count.load(Ordering::SeqCst)
    }

    pub fn name_queries(&self) -> Vec<String> {
        self.name_queries.lock().unwrap().clone()
    }

    pub fn postal_code_queries(&self) -> Vec<String> {
        self.postal_code_queries.lock().unwrap().clone()
    }

    /// Create a new MockLookupService that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            by_name: Arc::clone(&other.by_name),
            by_postal_code: Arc::clone(&other.by_postal_code),
            name_call_count: Arc::clone(&other.name_call_count),
            postal_code_call_count: Arc::clone(&other.postal_code_call_count),
            name_queries: Arc::clone(&other.name_queries),
            postal_code_queries: Arc::clone(&other.postal_code_queries),
            postal_code_gate: other.postal_code_gate.clone(),
            name_gate: other.name_gate.clone(),
        }
    }

    fn reply(table: &Mutex<HashMap<String, Reply>>, query: &str) -> Result<Vec<Locality>> {
        match table.lock().unwrap().get(query).cloned() {
            Some(Reply::Records(records)) => Ok(records),
            Some(Reply::Fail(message)) => Err(Error::lookup("mock", message)),
            None => Ok(Vec::new()),
        }
    }
}

async fn pass(gate: &Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.expect("gate open").forget();
    }
}

#[async_trait::async_trait]
impl LookupService for MockLookupService {
    async fn localities_by_name(&self, name: &str) -> Result<Vec<Locality>> {
        self.name_call_count.fetch_add(1, Ordering::SeqCst);
        self.name_queries.lock().unwrap().push(name.to_string());
        pass(&self.name_gate).await;
        Self::reply(&self.by_name, name)
    }

    async fn localities_by_postal_code(&self, postal_code: &str) -> Result<Vec<Locality>> {
        self.postal_code_call_count.fetch_add(1, Ordering::SeqCst);
        self.postal_code_queries
            .lock()
            .unwrap()
            .push(postal_code.to_string());
        pass(&self.postal_code_gate).await;
        Self::reply(&self.by_postal_code, postal_code)
    }

    fn service_name(&self) -> &'static str {
        "mock"
    }
}

/// Engine config with the reference debounce delay
pub fn test_config() -> EngineConfig {
    EngineConfig::default().with_debounce_ms(DEBOUNCE_MS)
}

/// A running engine plus everything a test needs to drive and stop it
pub struct Harness {
    pub handle: EngineHandle,
    pub events: mpsc::Receiver<EngineEvent>,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl Harness {
    /// Spawn an engine backed by a service sharing counters with `service`
    pub fn start(service: &MockLookupService) -> Self {
        let (engine, handle, events) = SyncEngine::new(
            Box::new(MockLookupService::sharing_counters_with(service)),
            test_config(),
        )
        .expect("engine construction succeeds");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(engine.run_with_shutdown(Some(shutdown_rx)));

        Self {
            handle,
            events,
            shutdown_tx,
            task,
        }
    }

    /// Stop the engine and collect every event it emitted
    pub async fn stop(mut self) -> Vec<EngineEvent> {
        self.shutdown_tx.send(()).expect("engine still running");
        self.task
            .await
            .expect("engine task joins")
            .expect("engine exits cleanly");

        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Advance (paused) time by `ms` milliseconds
pub async fn wait_ms(ms: u64) {
    tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
}

/// Records for a locality name
pub fn records(pairs: &[(&str, &str)]) -> Reply {
    Reply::Records(
        pairs
            .iter()
            .map(|(postal_code, name)| Locality::new(*postal_code, *name))
            .collect(),
    )
}

/// Count events of a given shape
pub fn count(events: &[EngineEvent], pred: impl Fn(&EngineEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
