#![forbid(unsafe_code)]

//! Cooperative frame scheduler.
//!
//! [`FrameScheduler`] models the two deferral primitives an affixed widget
//! relies on: animation-frame callbacks (`requestAnimationFrame`) and
//! zero-delay timers (`setTimeout(f, 0)`). The host drives it by calling
//! [`run_timers`](FrameScheduler::run_timers) and
//! [`tick`](FrameScheduler::tick) from its event loop.
//!
//! # Invariants
//!
//! 1. Callbacks run in request order.
//! 2. A callback requested while a frame is running is deferred to the next
//!    frame (likewise for timers requested while timers run).
//! 3. A cancelled callback never runs, even if it was cancelled by another
//!    callback of the same frame.
//! 4. Cancelling an unknown or already-run request is a no-op.
//!
//! The scheduler is single-threaded (`Rc`-based) and holds no borrow while a
//! callback runs, so callbacks may freely schedule and cancel.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use web_time::Instant;

/// Identifier of a pending animation-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(u64);

/// Identifier of a pending zero-delay timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    frames: Vec<(u64, Callback)>,
    timers: Vec<(u64, Callback)>,
    frame_count: u64,
    last_frame_at: Option<Instant>,
}

impl SchedulerState {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared handle to a frame scheduler. Clones refer to the same queue.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FrameScheduler")
            .field("pending_frames", &state.frames.len())
            .field("pending_timers", &state.timers.len())
            .field("frame_count", &state.frame_count)
            .finish()
    }
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `f` to run on the next animation frame.
    pub fn request_frame(&self, f: impl FnOnce() + 'static) -> FrameRequestId {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        state.frames.push((id, Box::new(f)));
        FrameRequestId(id)
    }

    /// Cancel a pending frame callback. Returns `true` if it was pending.
    pub fn cancel_frame(&self, id: FrameRequestId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.frames.len();
        state.frames.retain(|(pending, _)| *pending != id.0);
        state.frames.len() != before
    }

    /// Schedule `f` to run on the next timer turn.
    pub fn set_timeout(&self, f: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        state.timers.push((id, Box::new(f)));
        TimerId(id)
    }

    /// Cancel a pending timer. Returns `true` if it was pending.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.timers.len();
        state.timers.retain(|(pending, _)| *pending != id.0);
        state.timers.len() != before
    }

    /// Run every timer that was pending when the turn started.
    ///
    /// Returns the number of callbacks that ran.
    pub fn run_timers(&self) -> usize {
        let batch: Vec<u64> = self.state.borrow().timers.iter().map(|(id, _)| *id).collect();
        let mut ran = 0;
        for id in batch {
            let callback = take_callback(&mut self.state.borrow_mut().timers, id);
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Run one animation frame: every frame callback that was pending when
    /// the frame started.
    ///
    /// Returns the number of callbacks that ran.
    pub fn tick(&self) -> usize {
        let batch: Vec<u64> = {
            let mut state = self.state.borrow_mut();
            state.frame_count += 1;
            state.last_frame_at = Some(Instant::now());
            state.frames.iter().map(|(id, _)| *id).collect()
        };
        let mut ran = 0;
        for id in batch {
            let callback = take_callback(&mut self.state.borrow_mut().frames, id);
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        tracing::trace!(frame = self.frame_count(), callbacks = ran, "frame tick");
        ran
    }

    /// One event-loop turn: pending timers, then one frame.
    pub fn advance(&self) -> usize {
        self.run_timers() + self.tick()
    }

    /// Advance until nothing is pending or `max_turns` turns have run.
    ///
    /// Returns the number of turns taken.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut turns = 0;
        while turns < max_turns && !self.is_idle() {
            self.advance();
            turns += 1;
        }
        turns
    }

    #[inline]
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    #[inline]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Whether no timer or frame callback is pending.
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.frames.is_empty() && state.timers.is_empty()
    }

    /// Number of frames ticked so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.state.borrow().frame_count
    }

    /// Wall-clock time of the most recent frame.
    pub fn last_frame_at(&self) -> Option<Instant> {
        self.state.borrow().last_frame_at
    }
}

fn take_callback(queue: &mut Vec<(u64, Callback)>, id: u64) -> Option<Callback> {
    let idx = queue.iter().position(|(pending, _)| *pending == id)?;
    Some(queue.remove(idx).1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn frames_run_in_request_order() {
        let sched = FrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            sched.request_frame(move || log.borrow_mut().push(i));
        }
        assert_eq!(sched.tick(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(sched.frame_count(), 1);
        assert!(sched.last_frame_at().is_some());
    }

    #[test]
    fn requests_during_a_frame_wait_for_the_next() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let inner_sched = sched.clone();
        let inner_hits = Rc::clone(&hits);
        sched.request_frame(move || {
            let hits = Rc::clone(&inner_hits);
            inner_sched.request_frame(move || hits.set(hits.get() + 1));
        });
        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(sched.pending_frames(), 1);
        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cancel_prevents_callback() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = sched.request_frame(move || h.set(h.get() + 1));
        assert!(sched.cancel_frame(id));
        assert!(!sched.cancel_frame(id));
        assert_eq!(sched.tick(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn callback_can_cancel_a_later_callback_in_same_frame() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        let s = sched.clone();
        let v = Rc::clone(&victim);
        sched.request_frame(move || {
            if let Some(id) = v.get() {
                s.cancel_frame(id);
            }
        });
        let h = Rc::clone(&hits);
        victim.set(Some(sched.request_frame(move || h.set(h.get() + 1))));

        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn timers_are_separate_from_frames() {
        let sched = FrameScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&order);
        sched.request_frame(move || o.borrow_mut().push("frame"));
        let o = Rc::clone(&order);
        sched.set_timeout(move || o.borrow_mut().push("timer"));

        assert_eq!(sched.pending_timers(), 1);
        assert_eq!(sched.advance(), 2);
        assert_eq!(*order.borrow(), vec!["timer", "frame"]);
    }

    #[test]
    fn clear_timeout_is_idempotent() {
        let sched = FrameScheduler::new();
        let id = sched.set_timeout(|| panic!("cleared timer ran"));
        assert!(sched.clear_timeout(id));
        assert!(!sched.clear_timeout(id));
        assert_eq!(sched.run_timers(), 0);
    }

    #[test]
    fn run_until_idle_is_bounded() {
        fn reschedule(sched: FrameScheduler) {
            let next = sched.clone();
            sched.request_frame(move || reschedule(next));
        }
        let sched = FrameScheduler::new();
        reschedule(sched.clone());
        assert_eq!(sched.run_until_idle(5), 5);
        assert!(!sched.is_idle());

        let idle = FrameScheduler::new();
        idle.request_frame(|| {});
        assert_eq!(idle.run_until_idle(5), 1);
        assert!(idle.is_idle());
    }
}
