use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::AppResult;

/// Process-wide state that must be started before first use and stopped once
/// nothing holds it any more.
pub trait Subsystem: Sized + Send + Sync + 'static {
    type Options: Send + Sync + 'static;

    const NAME: &'static str;

    fn start(options: &Self::Options) -> AppResult<Self>;

    fn stop(&self) {}
}

struct LifecycleState<S> {
    instance: Option<Arc<S>>,
    holders: usize,
    starts: u64,
}

/// Reference-counted owner of a [`Subsystem`]. The first [`Lease`] starts it
/// and dropping the last one stops it. Start and stop run under one lock.
pub struct Lifecycle<S: Subsystem> {
    options: S::Options,
    state: Mutex<LifecycleState<S>>,
}

impl<S: Subsystem> Lifecycle<S> {
    pub fn new(options: S::Options) -> Arc<Self> {
        Arc::new(Self {
            options,
            state: Mutex::new(LifecycleState {
                instance: None,
                holders: 0,
                starts: 0,
            }),
        })
    }

    pub fn acquire(self: &Arc<Self>) -> AppResult<Lease<S>> {
        let mut state = self.lock();
        let instance = match &state.instance {
            Some(instance) => Arc::clone(instance),
            None => {
                let instance = Arc::new(S::start(&self.options)?);
                state.instance = Some(Arc::clone(&instance));
                state.starts += 1;
                debug!("{} started (start #{})", S::NAME, state.starts);
                instance
            }
        };
        state.holders += 1;

        Ok(Lease {
            lifecycle: Arc::clone(self),
            instance,
        })
    }

    pub fn is_running(&self) -> bool {
        self.lock().instance.is_some()
    }

    pub fn holders(&self) -> usize {
        self.lock().holders
    }

    /// Number of times the subsystem has been started.
    pub fn starts(&self) -> u64 {
        self.lock().starts
    }

    fn release(&self) {
        let mut state = self.lock();
        state.holders = state.holders.saturating_sub(1);
        if state.holders > 0 {
            return;
        }
        if let Some(instance) = state.instance.take() {
            instance.stop();
            debug!("{} stopped", S::NAME);
        }
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped hold on a running subsystem. Released on drop, on every exit path.
pub struct Lease<S: Subsystem> {
    lifecycle: Arc<Lifecycle<S>>,
    instance: Arc<S>,
}

impl<S: Subsystem> Deref for Lease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.instance
    }
}

impl<S: Subsystem> Drop for Lease<S> {
    fn drop(&mut self) {
        self.lifecycle.release();
    }
}

impl<S: Subsystem> std::fmt::Debug for Lease<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease").field("subsystem", &S::NAME).finish()
    }
}
