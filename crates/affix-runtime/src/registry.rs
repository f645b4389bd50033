#![forbid(unsafe_code)]

//! Scroll observation registry.
//!
//! The [`ObserverRegistry`] maps each tracked [`ScrollTarget`] to the ordered
//! set of observers that follow it. The first observer of a target attaches
//! one shared listener for every [trigger event](affix_core::TRIGGER_EVENTS);
//! the listener fans out to all observers of that target, at most once per
//! animation frame. The last observer to leave detaches it.
//!
//! The registry is an explicit object: construct one per application (or per
//! widget tree) and hand clones to widgets. Clones share state.
//!
//! # Invariants
//!
//! 1. An observer is registered with at most one target at a time;
//!    registering under a new target moves it.
//! 2. An entry exists iff its observer set is non-empty.
//! 3. Events on a target without an entry are ignored.
//! 4. Registry mutations finish before any observer runs: dispatch iterates a
//!    snapshot, so observers may register or deregister during fan-out.
//!
//! # Failure Modes
//!
//! - `deregister()` of an unknown observer returns `None` (no panic).
//! - Observers dropped without deregistering are skipped at dispatch.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use affix_core::{NodeId, ScrollTarget, TRIGGER_EVENTS, TargetEvent, TargetFn};

use crate::scheduler::FrameScheduler;
use crate::throttle::FrameThrottle;

/// Global counter for unique observer IDs.
static OBSERVER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Create a new unique observer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(OBSERVER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that follows a scroll target.
pub trait ScrollObserver {
    /// Called by the shared listener after the target scrolled or resized.
    fn lazy_update_position(&self);
}

struct Observer {
    id: ObserverId,
    handle: Weak<dyn ScrollObserver>,
}

struct ObserverEntity {
    target: ScrollTarget,
    observers: Vec<Observer>,
    /// The shared listener: one throttled fan-out for every trigger event.
    dispatch: FrameThrottle,
}

#[derive(Default)]
struct RegistryState {
    entities: Vec<ObserverEntity>,
}

impl RegistryState {
    fn entity(&self, target: NodeId) -> Option<&ObserverEntity> {
        self.entities.iter().find(|e| e.target.id() == target)
    }

    fn position_of_observer(&self, id: ObserverId) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.observers.iter().any(|o| o.id == id))
    }
}

/// Registry of scroll targets and their observers.
#[derive(Clone)]
pub struct ObserverRegistry {
    scheduler: FrameScheduler,
    state: Rc<RefCell<RegistryState>>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let mut map = f.debug_map();
        for entity in &state.entities {
            map.entry(&entity.target.to_string(), &entity.observers.len());
        }
        map.finish()
    }
}

impl ObserverRegistry {
    /// Create an empty registry whose listeners throttle on `scheduler`.
    #[must_use]
    pub fn new(scheduler: &FrameScheduler) -> Self {
        Self {
            scheduler: scheduler.clone(),
            state: Rc::new(RefCell::new(RegistryState::default())),
        }
    }

    /// Start observing `target`.
    ///
    /// Attaches the shared listener if this is the target's first observer.
    /// If `id` already observes a different target it is moved.
    pub fn register(&self, target: &ScrollTarget, id: ObserverId, handle: Weak<dyn ScrollObserver>) {
        let moved_from = {
            let state = self.state.borrow();
            match state.position_of_observer(id) {
                Some(idx) if state.entities[idx].target == *target => return,
                Some(idx) => Some(state.entities[idx].target.clone()),
                None => None,
            }
        };
        if let Some(previous) = moved_from {
            tracing::debug!(observer = id.id(), from = %previous, to = %target, "observer moved");
            self.deregister(id);
        }

        let mut state = self.state.borrow_mut();
        if let Some(entity) = state.entities.iter_mut().find(|e| e.target == *target) {
            entity.observers.push(Observer { id, handle });
            tracing::trace!(
                observer = id.id(),
                scroll_target = %target,
                observers = entity.observers.len(),
                "observer registered"
            );
            return;
        }

        state.entities.push(ObserverEntity {
            target: target.clone(),
            observers: vec![Observer { id, handle }],
            dispatch: FrameThrottle::new(&self.scheduler, self.fan_out(target.id())),
        });
        tracing::debug!(
            observer = id.id(),
            scroll_target = %target,
            events = TRIGGER_EVENTS.len(),
            "shared listener attached"
        );
    }

    /// Resolve `accessor` and observe the result.
    ///
    /// Returns the target, or `None` (registering nothing) when the accessor
    /// yields no target.
    pub fn register_accessor(
        &self,
        accessor: &TargetFn,
        id: ObserverId,
        handle: Weak<dyn ScrollObserver>,
    ) -> Option<ScrollTarget> {
        let target = accessor.resolve()?;
        self.register(&target, id, handle);
        Some(target)
    }

    /// Stop observing whatever target `id` follows.
    ///
    /// Detaches the shared listener when the target has no observers left.
    /// Returns the target the observer was removed from.
    pub fn deregister(&self, id: ObserverId) -> Option<ScrollTarget> {
        let removed = {
            let mut state = self.state.borrow_mut();
            let idx = state.position_of_observer(id)?;
            let entity = &mut state.entities[idx];
            entity.observers.retain(|o| o.id != id);
            let target = entity.target.clone();
            tracing::trace!(
                observer = id.id(),
                scroll_target = %target,
                observers = entity.observers.len(),
                "observer deregistered"
            );
            if entity.observers.is_empty() {
                Some((target, Some(state.entities.remove(idx))))
            } else {
                Some((target, None))
            }
        };
        // Dropped outside the borrow: this cancels any pending dispatch.
        let (target, detached) = removed?;
        if let Some(entity) = detached {
            tracing::debug!(scroll_target = %entity.target, "shared listener detached");
            drop(entity);
        }
        Some(target)
    }

    /// Deliver a host event to the target's shared listener.
    ///
    /// Every [`TargetEvent`] is a trigger event, so this returns `true`
    /// exactly when a listener is attached to `target`.
    pub fn notify(&self, target: &ScrollTarget, event: TargetEvent) -> bool {
        let state = self.state.borrow();
        let Some(entity) = state.entity(target.id()) else {
            return false;
        };
        tracing::trace!(scroll_target = %target, event = %event, "target event");
        entity.dispatch.call();
        true
    }

    /// Whether a shared listener is attached to `target`.
    pub fn has_listener(&self, target: &ScrollTarget) -> bool {
        self.state.borrow().entity(target.id()).is_some()
    }

    /// Number of observers following `target`.
    pub fn observer_count(&self, target: &ScrollTarget) -> usize {
        self.state
            .borrow()
            .entity(target.id())
            .map_or(0, |e| e.observers.len())
    }

    /// The target `id` currently follows.
    pub fn target_of(&self, id: ObserverId) -> Option<ScrollTarget> {
        let state = self.state.borrow();
        let idx = state.position_of_observer(id)?;
        Some(state.entities[idx].target.clone())
    }

    /// Number of targets with an attached listener.
    #[inline]
    pub fn len(&self) -> usize {
        self.state.borrow().entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entities.is_empty()
    }

    /// Listener body for one target: notify a snapshot of its observers.
    fn fan_out(&self, target: NodeId) -> impl Fn() + 'static {
        let state = Rc::downgrade(&self.state);
        move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let observers: Vec<Weak<dyn ScrollObserver>> = match state.borrow().entity(target) {
                Some(entity) => entity.observers.iter().map(|o| o.handle.clone()).collect(),
                None => return,
            };
            tracing::trace!(scroll_target = %target, observers = observers.len(), "dispatch");
            for observer in observers.iter().filter_map(Weak::upgrade) {
                observer.lazy_update_position();
            }
        }
    }
}
