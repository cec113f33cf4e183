//! Runtime abstraction layer for async operations
//!
//! The data source never calls `tokio::spawn` directly; it goes through an
//! [`AsyncSpawner`] so the fetch task can be cancelled through a handle and
//! so a missing runtime surfaces as an error instead of a panic.

use crate::{MapError, Result};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Result<Box<dyn AsyncHandle>>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Spawns onto a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: Option<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Spawner bound to a specific runtime
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Spawner that uses whichever runtime is current at spawn time
    pub fn current() -> Self {
        Self { handle: None }
    }
}

impl Default for TokioSpawner {
    fn default() -> Self {
        Self::current()
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Result<Box<dyn AsyncHandle>> {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => tokio::runtime::Handle::try_current()
                .map_err(|e| MapError::Runtime(format!("no tokio runtime available: {}", e)))?,
        };
        Ok(Box::new(TokioHandle(handle.spawn(future))))
    }
}

struct TokioHandle(tokio::task::JoinHandle<()>);

impl AsyncHandle for TokioHandle {
    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn cancel(&self) {
        self.0.abort();
    }
}

/// Default spawner shared by data sources that were not given one
pub fn default_spawner() -> Arc<dyn AsyncSpawner> {
    Arc::new(TokioSpawner::current())
}

/// Locks a mutex, recovering the guard if a panicking holder poisoned it
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
