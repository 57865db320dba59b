//! Cancellable background computations polled from the frame loop.
//!
//! A [`Future`] runs at most one live computation. Starting another one
//! cancels the previous computation, and whatever it produces afterwards is
//! dropped on the floor. The frame loop never blocks: it calls
//! [`Future::poll`] every frame and renders whichever state comes back.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::FutureError;

/// Cooperative cancellation flag handed to a computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What [`Future::poll`] observed.
#[derive(Debug)]
pub enum FutureState<'a, T> {
    /// Nothing was ever started.
    Idle,
    Pending,
    Ready(&'a T),
    /// The computation was discarded before it finished.
    Cancelled,
    Failed(&'a FutureError),
}

impl<T> FutureState<'_, T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FutureState::Pending)
    }
}

type Notify = Arc<dyn Fn() + Send + Sync>;

enum Phase<T> {
    Idle,
    Pending { generation: u64, token: CancelToken },
    Ready(T),
    Cancelled,
    Failed(FutureError),
}

/// Hand-off slot between the worker and the frame loop. The worker only
/// publishes if the slot still belongs to its generation.
struct Slot<T> {
    generation: u64,
    outcome: Option<Result<T, FutureError>>,
}

pub struct Future<T> {
    phase: Phase<T>,
    generation: u64,
    slot: Arc<Mutex<Slot<T>>>,
    notify: Option<Notify>,
}

impl<T: Send + 'static> Future<T> {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                outcome: None,
            })),
            notify: None,
        }
    }

    /// Called from the worker after it published a result, typically to
    /// request a repaint.
    pub fn with_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    /// Runs `compute` on a worker thread, cancelling whatever was running.
    pub fn start(&mut self, compute: impl FnOnce(&CancelToken) -> T + Send + 'static) {
        self.start_fallible(move |token| Ok::<T, FutureError>(compute(token)));
    }

    /// Like [`Future::start`], for computations that can fail. An error
    /// ends up in [`FutureState::Failed`].
    pub fn start_fallible<E>(
        &mut self,
        compute: impl FnOnce(&CancelToken) -> Result<T, E> + Send + 'static,
    ) where
        E: fmt::Display,
    {
        self.supersede();
        let generation = self.generation;
        let token = CancelToken::new();

        let slot = Arc::clone(&self.slot);
        let notify = self.notify.clone();
        let worker_token = token.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("traceview-future-{generation}"))
            .spawn(move || {
                let outcome = match catch_unwind(AssertUnwindSafe(|| compute(&worker_token))) {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(FutureError::Failed(err.to_string())),
                    Err(payload) => Err(FutureError::Panicked(panic_message(payload.as_ref()))),
                };
                if worker_token.is_cancelled() {
                    log::debug!("dropping result of cancelled computation {generation}");
                    return;
                }
                {
                    let mut slot = slot.lock();
                    if slot.generation != generation {
                        return;
                    }
                    slot.outcome = Some(outcome);
                }
                if let Some(notify) = notify {
                    notify();
                }
            });

        self.phase = match spawned {
            Ok(_) => Phase::Pending { generation, token },
            Err(err) => {
                log::error!("failed to spawn computation: {err}");
                Phase::Failed(FutureError::Spawn(err.to_string()))
            }
        };
    }

    /// Replaces whatever is running with a ready value.
    pub fn set(&mut self, value: T) {
        self.supersede();
        self.phase = Phase::Ready(value);
    }

    /// Discards the running computation, if any.
    pub fn cancel(&mut self) {
        if matches!(self.phase, Phase::Pending { .. }) {
            self.supersede();
            self.phase = Phase::Cancelled;
        }
    }

    /// Signals the live computation and moves the slot to a fresh
    /// generation so a late result cannot land.
    fn supersede(&mut self) {
        if let Phase::Pending { token, .. } = &self.phase {
            token.cancel();
        }
        self.generation += 1;
        let mut slot = self.slot.lock();
        slot.generation = self.generation;
        slot.outcome = None;
    }

    /// Non-blocking. Picks up a finished result, if one arrived.
    pub fn poll(&mut self) -> FutureState<'_, T> {
        if let Phase::Pending { generation, .. } = self.phase {
            let outcome = {
                let mut slot = self.slot.lock();
                if slot.generation == generation {
                    slot.outcome.take()
                } else {
                    None
                }
            };
            match outcome {
                Some(Ok(value)) => self.phase = Phase::Ready(value),
                Some(Err(err)) => {
                    log::warn!("background computation failed: {err}");
                    self.phase = Phase::Failed(err);
                }
                None => {}
            }
        }

        match &self.phase {
            Phase::Idle => FutureState::Idle,
            Phase::Pending { .. } => FutureState::Pending,
            Phase::Ready(value) => FutureState::Ready(value),
            Phase::Cancelled => FutureState::Cancelled,
            Phase::Failed(err) => FutureState::Failed(err),
        }
    }

    /// The value, once ready. The same value is returned on every call
    /// until the next start.
    pub fn result(&mut self) -> Option<&T> {
        match self.poll() {
            FutureState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The last value without polling.
    pub fn value(&self) -> Option<&T> {
        match &self.phase {
            Phase::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }
}

impl<T: Send + 'static> Default for Future<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Future<T> {
    fn drop(&mut self) {
        if let Phase::Pending { token, .. } = &self.phase {
            token.cancel();
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.phase {
            Phase::Idle => write!(f, "Idle"),
            Phase::Pending { generation, .. } => write!(f, "Pending({generation})"),
            Phase::Ready(_) => write!(f, "Ready"),
            Phase::Cancelled => write!(f, "Cancelled"),
            Phase::Failed(err) => write!(f, "Failed({err})"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}
