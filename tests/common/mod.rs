//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ouroboros_sqlcache::{
    CacheError, CacheEvent, CacheObserver, CacheStore, CacheValue, ExecutorError, QueryExecutor,
    QueryResult,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Executor that answers `{"sql": .., "params": ..}` and counts calls
#[derive(Default)]
pub struct RecordingExecutor {
    pub calls: AtomicUsize,
    failure: Mutex<Option<ExecutorError>>,
    multi: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(error: ExecutorError) -> Arc<Self> {
        let executor = Self::default();
        *executor.failure.lock().unwrap() = Some(error);
        Arc::new(executor)
    }

    pub fn multi() -> Arc<Self> {
        let executor = Self::default();
        executor.multi.store(true, Ordering::SeqCst);
        Arc::new(executor)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        let executor = Self::default();
        *executor.delay.lock().unwrap() = Some(delay);
        Arc::new(executor)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let row = json!({ "sql": sql, "params": params });
        if self.multi.load(Ordering::SeqCst) {
            Ok(QueryResult::multi(
                vec![vec![row.clone()], vec![row.clone(), row]],
                vec![],
            ))
        } else {
            Ok(QueryResult::single(vec![row], vec![]))
        }
    }
}

/// In-memory store whose reads and writes can be made to fail
#[derive(Default)]
pub struct ScriptedStore {
    pub entries: Mutex<HashMap<String, (CacheValue, u64)>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_reads() -> Arc<Self> {
        let store = Self::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn failing_writes() -> Arc<Self> {
        let store = Self::default();
        store.fail_writes.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn preload(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), 60));
    }

    pub fn value(&self, key: &str) -> Option<CacheValue> {
        self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone())
    }

    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for ScriptedStore {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("read refused".to_string()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: CacheValue, ttl_seconds: u64) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("write refused".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl_seconds));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Observer that keeps every event
#[derive(Default, Clone)]
pub struct CollectingObserver {
    pub events: Arc<Mutex<Vec<CacheEvent>>>,
}

impl CollectingObserver {
    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl CacheObserver for CollectingObserver {
    fn on_event(&self, event: &CacheEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
