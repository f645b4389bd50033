#![forbid(unsafe_code)]

//! Throttle a callback to at most one run per animation frame.
//!
//! Calls made while a run is already scheduled are coalesced into that single
//! trailing run. [`FrameThrottle::cancel`] drops the scheduled run; dropping
//! the throttle cancels as well.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::scheduler::{FrameRequestId, FrameScheduler};

/// A callback that runs at most once per frame.
pub struct FrameThrottle {
    scheduler: FrameScheduler,
    callback: Rc<dyn Fn()>,
    pending: Rc<Cell<Option<FrameRequestId>>>,
}

impl FrameThrottle {
    /// Wrap `callback` so it runs on the next frame at most once, however
    /// many times [`call`](Self::call) is invoked before then.
    pub fn new(scheduler: &FrameScheduler, callback: impl Fn() + 'static) -> Self {
        Self {
            scheduler: scheduler.clone(),
            callback: Rc::new(callback),
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// Schedule a run unless one is already scheduled.
    pub fn call(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let pending = Rc::clone(&self.pending);
        let callback = Rc::clone(&self.callback);
        let id = self.scheduler.request_frame(move || {
            pending.set(None);
            callback();
        });
        self.pending.set(Some(id));
    }

    /// Drop the scheduled run, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_frame(id);
        }
    }

    /// Whether a run is scheduled.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for FrameThrottle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for FrameThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameThrottle")
            .field("pending", &self.is_pending())
            .finish()
    }
}
