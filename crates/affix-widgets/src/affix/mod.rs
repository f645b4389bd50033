#![forbid(unsafe_code)]

//! Affix widget: pins its content to the top or bottom of a scroll target
//! once scrolling crosses a configured offset.
//!
//! # Lifecycle
//!
//! ```text
//! mount ──(zero-delay timer)──► register with target ──► update_position
//!                                                           │ (next frame)
//!  target event ──► shared listener ──► lazy_update_position│
//!                     (per frame)         (per frame)       ▼
//!                                                     prepare_measure
//!                                                           │ re-render
//!                                                           ▼
//!                                                        measure ──► on_change
//! ```
//!
//! Every state change re-renders the widget (the optional render hook runs)
//! and is followed by the post-render pass, which re-registers on target
//! change, re-measures on offset change, and runs [`Affix::measure`].
//!
//! # Invariants
//!
//! 1. The instance observes at most one target at a time.
//! 2. `on_change` fires once per pinned/unpinned transition, after the new
//!    state is applied; it may re-enter the widget (e.g. `set_props`).
//! 3. After unmount nothing scheduled by the instance runs.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | No viewport and no container | Never registers, never pins |
//! | Target accessor yields nothing | `measure` is a no-op |
//! | Nodes not attached yet | `measure` stays pending until attached |

pub mod engine;
pub mod view;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use affix_core::{
    AffixContext, AffixDefaults, ElementRef, ScrollTarget, TargetEvent, TargetFn, TargetSpec,
    resolve_target_accessor,
};
use affix_runtime::{
    FrameScheduler, FrameThrottle, ObserverId, ObserverRegistry, ScrollObserver, TimerId,
};

pub use engine::{
    AffixState, AffixStatus, AffixStyle, Anchor, Measurement, Offsets, Pinned, Placement,
    PlaceholderStyle, StateUpdate, get_fixed_bottom, get_fixed_top,
};
pub use view::{AffixView, FixedNode, InlineStyle, PlaceholderNode, SpacerNode};

/// Name shown in debug output.
pub const DISPLAY_NAME: &str = "Affix";

/// Scheduler, registry and context shared by every affix in a widget tree.
#[derive(Debug, Clone)]
pub struct AffixRuntime {
    scheduler: FrameScheduler,
    registry: ObserverRegistry,
    context: AffixContext,
}

impl AffixRuntime {
    /// Fresh scheduler and registry under `context`.
    #[must_use]
    pub fn new(context: AffixContext) -> Self {
        let scheduler = FrameScheduler::new();
        let registry = ObserverRegistry::new(&scheduler);
        Self {
            scheduler,
            registry,
            context,
        }
    }

    /// Build from existing parts.
    #[must_use]
    pub fn from_parts(
        scheduler: FrameScheduler,
        registry: ObserverRegistry,
        context: AffixContext,
    ) -> Self {
        Self {
            scheduler,
            registry,
            context,
        }
    }

    #[inline]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    #[inline]
    pub fn context(&self) -> &AffixContext {
        &self.context
    }

    /// Forward a host event on `target` to its shared listener.
    pub fn dispatch(&self, target: &ScrollTarget, event: TargetEvent) -> bool {
        self.registry.notify(target, event)
    }
}

/// Widget configuration.
#[derive(Clone, Default)]
pub struct AffixProps {
    offset_top: Option<f64>,
    offset_bottom: Option<f64>,
    target: TargetSpec,
    on_change: Option<Rc<dyn Fn(bool)>>,
    on_test_update_position: Option<Rc<dyn Fn()>>,
    style: InlineStyle,
    class_name: Option<String>,
    prefix_cls: Option<String>,
    attrs: Vec<(String, String)>,
}

impl AffixProps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Props seeded from loaded configuration.
    #[must_use]
    pub fn from_defaults(defaults: &AffixDefaults) -> Self {
        Self {
            offset_top: defaults.offset_top,
            offset_bottom: defaults.offset_bottom,
            prefix_cls: defaults.prefix_cls.clone(),
            ..Self::default()
        }
    }

    /// Pin once the content would scroll within `offset` px of the target top.
    #[must_use]
    pub fn offset_top(mut self, offset: f64) -> Self {
        self.offset_top = Some(offset);
        self
    }

    /// Pin once the content would scroll within `offset` px of the target bottom.
    #[must_use]
    pub fn offset_bottom(mut self, offset: f64) -> Self {
        self.offset_bottom = Some(offset);
        self
    }

    #[must_use]
    pub fn target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    /// Called with the new pinned flag on every transition.
    #[must_use]
    pub fn on_change(mut self, f: impl Fn(bool) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    /// Instrumentation: called every time a measurement is prepared.
    #[must_use]
    pub fn on_test_update_position(mut self, f: impl Fn() + 'static) -> Self {
        self.on_test_update_position = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn style(mut self, style: InlineStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Override the generated prefix class.
    #[must_use]
    pub fn prefix_cls(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_cls = Some(prefix.into());
        self
    }

    /// Extra attribute forwarded to the placeholder element.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn offsets(&self) -> Offsets {
        Offsets::new(self.offset_top, self.offset_bottom)
    }
}

impl fmt::Debug for AffixProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffixProps")
            .field("offset_top", &self.offset_top)
            .field("offset_bottom", &self.offset_bottom)
            .field("target", &self.target)
            .field("on_change", &self.on_change.is_some())
            .field("style", &self.style)
            .field("class_name", &self.class_name)
            .field("prefix_cls", &self.prefix_cls)
            .field("attrs", &self.attrs)
            .finish()
    }
}

/// Host element references the widget measures.
#[derive(Default)]
struct Nodes {
    placeholder: Option<ElementRef>,
    fixed: Option<ElementRef>,
}

struct AffixInner {
    id: ObserverId,
    this: Weak<AffixInner>,
    scheduler: FrameScheduler,
    registry: ObserverRegistry,
    context: AffixContext,
    affix_prefix_cls: RefCell<String>,
    props: RefCell<AffixProps>,
    state: RefCell<AffixState>,
    nodes: RefCell<Nodes>,
    mount_timer: Cell<Option<TimerId>>,
    update_throttle: FrameThrottle,
    lazy_throttle: FrameThrottle,
    render_hook: RefCell<Option<Rc<dyn Fn()>>>,
    renders: Cell<u64>,
}

impl AffixInner {
    fn target_func(&self) -> Option<TargetFn> {
        resolve_target_accessor(&self.props.borrow().target, &self.context)
    }

    fn offsets(&self) -> Offsets {
        self.props.borrow().offsets()
    }

    fn as_observer(&self) -> Weak<dyn ScrollObserver> {
        self.this.clone()
    }

    /// Replace the state and re-render.
    fn set_state(&self, next: AffixState) {
        *self.state.borrow_mut() = next;
        self.renders.set(self.renders.get() + 1);
        let hook = self.render_hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
        self.did_update(None);
    }

    /// Post-render pass.
    fn did_update(&self, prev_offsets: Option<Offsets>) {
        let new_target = self.target_func().and_then(|f| f.resolve());
        let prev_target = self.state.borrow().prev_target.clone();
        if prev_target != new_target {
            self.registry.deregister(self.id);
            if let Some(target) = &new_target {
                self.registry.register(target, self.id, self.as_observer());
                self.update_position();
            }
            let next = AffixState {
                prev_target: new_target,
                ..self.state.borrow().clone()
            };
            self.set_state(next);
        }

        if prev_offsets.is_some_and(|prev| prev != self.offsets()) {
            self.update_position();
        }
        self.measure();
    }

    fn update_position(&self) {
        self.update_throttle.call();
    }

    fn prepare_measure(&self) {
        let next = self.state.borrow().prepared();
        self.set_state(next);
        let hook = self.props.borrow().on_test_update_position.clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Throttled body of the scroll listener. Skips the re-measure when the
    /// content is pinned and the pinned edge would not move.
    fn lazy_update_position_now(&self) {
        let current = self.state.borrow().affix_style().copied();
        if let (Some(target_func), Some(style)) = (self.target_func(), current) {
            let placeholder = self.nodes.borrow().placeholder.clone();
            if let (Some(target), Some(placeholder)) = (target_func.resolve(), placeholder) {
                let offsets = self.offsets();
                let m = Measurement::read(&target, placeholder.rect(), self.viewport_height());
                if style.matches_edges(m.fixed_top(&offsets), m.fixed_bottom(&offsets)) {
                    return;
                }
            }
        }
        self.prepare_measure();
    }

    fn viewport_height(&self) -> Option<f64> {
        self.context.viewport().map(|v| v.inner_height())
    }

    fn measure(&self) {
        let (status, prev) = {
            let state = self.state.borrow();
            (state.status, state.clone())
        };
        let (placeholder, has_fixed) = {
            let nodes = self.nodes.borrow();
            (nodes.placeholder.clone(), nodes.fixed.is_some())
        };
        if status != AffixStatus::MeasurementPending || !has_fixed {
            return;
        }
        let (Some(placeholder), Some(target_func)) = (placeholder, self.target_func()) else {
            return;
        };
        let Some(target) = target_func.resolve() else {
            return;
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "affix_measure",
            widget = DISPLAY_NAME,
            observer = self.id.id(),
            scroll_target = %target
        )
        .entered();

        let offsets = self.offsets();
        let placeholder_rect = placeholder.rect();
        let m = Measurement::read(&target, placeholder_rect, self.viewport_height());
        let StateUpdate { state, notify } =
            prev.next_state(m.placement(&offsets), placeholder_rect.size());

        // Settle before notifying: a callback that re-renders must see Idle.
        self.set_state(state);
        if let Some(pinned) = notify {
            #[cfg(feature = "tracing")]
            tracing::debug!(pinned, "affix transition");
            let on_change = self.props.borrow().on_change.clone();
            if let Some(on_change) = on_change {
                on_change(pinned);
            }
        }
    }

    fn teardown(&self) {
        if let Some(timer) = self.mount_timer.take() {
            self.scheduler.clear_timeout(timer);
        }
        self.registry.deregister(self.id);
        self.update_throttle.cancel();
        self.lazy_throttle.cancel();
    }
}

impl ScrollObserver for AffixInner {
    fn lazy_update_position(&self) {
        self.lazy_throttle.call();
    }
}

/// A mounted affix instance holding `children`.
///
/// Dropping the instance unmounts it.
pub struct Affix<C> {
    inner: Rc<AffixInner>,
    children: C,
}

impl<C> Affix<C> {
    /// Mount a new instance.
    ///
    /// Registration with the scroll target and the first measurement request
    /// are deferred to the next timer turn, after the host's first paint.
    pub fn mount(runtime: &AffixRuntime, props: AffixProps, children: C) -> Self {
        let affix_prefix_cls = runtime
            .context
            .get_prefix_cls("affix", props.prefix_cls.as_deref());
        let inner = Rc::new_cyclic(|this: &Weak<AffixInner>| {
            let on_update = this.clone();
            let on_lazy = this.clone();
            AffixInner {
                id: ObserverId::new(),
                this: this.clone(),
                scheduler: runtime.scheduler.clone(),
                registry: runtime.registry.clone(),
                context: runtime.context.clone(),
                affix_prefix_cls: RefCell::new(affix_prefix_cls),
                props: RefCell::new(props),
                state: RefCell::new(AffixState::default()),
                nodes: RefCell::new(Nodes::default()),
                mount_timer: Cell::new(None),
                update_throttle: FrameThrottle::new(&runtime.scheduler, move || {
                    if let Some(inner) = on_update.upgrade() {
                        inner.prepare_measure();
                    }
                }),
                lazy_throttle: FrameThrottle::new(&runtime.scheduler, move || {
                    if let Some(inner) = on_lazy.upgrade() {
                        inner.lazy_update_position_now();
                    }
                }),
                render_hook: RefCell::new(None),
                renders: Cell::new(0),
            }
        });

        if let Some(target_func) = inner.target_func() {
            let this = Rc::downgrade(&inner);
            let timer = runtime.scheduler.set_timeout(move || {
                let Some(inner) = this.upgrade() else {
                    return;
                };
                inner.mount_timer.set(None);
                let target = inner
                    .registry
                    .register_accessor(&target_func, inner.id, inner.as_observer());
                inner.state.borrow_mut().prev_target = target;
                inner.update_position();
            });
            inner.mount_timer.set(Some(timer));
        }

        Self { inner, children }
    }

    /// Attach the host elements backing the placeholder and fixed wrappers.
    pub fn attach(&self, placeholder: ElementRef, fixed: ElementRef) {
        *self.inner.nodes.borrow_mut() = Nodes {
            placeholder: Some(placeholder),
            fixed: Some(fixed),
        };
    }

    /// Forget the host elements (e.g. while the host re-creates them).
    pub fn detach(&self) {
        *self.inner.nodes.borrow_mut() = Nodes::default();
    }

    /// Called by the host after each re-render.
    pub fn set_render_hook(&self, hook: impl Fn() + 'static) {
        *self.inner.render_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Replace the props and run the post-render pass.
    ///
    /// Changed offsets schedule a fresh measurement; a changed target moves
    /// the registration.
    pub fn set_props(&self, props: AffixProps) {
        let prev_offsets = self.inner.offsets();
        let prefix = self
            .inner
            .context
            .get_prefix_cls("affix", props.prefix_cls.as_deref());
        *self.inner.affix_prefix_cls.borrow_mut() = prefix;
        *self.inner.props.borrow_mut() = props;
        self.inner.renders.set(self.inner.renders.get() + 1);
        self.inner.did_update(Some(prev_offsets));
    }

    /// Request a measurement on the next frame.
    pub fn update_position(&self) {
        self.inner.update_position();
    }

    /// Request a cheap re-check on the next frame.
    pub fn lazy_update_position(&self) {
        self.inner.lazy_throttle.call();
    }

    /// Apply a pending measurement now.
    pub fn measure(&self) {
        self.inner.measure();
    }

    /// The host resized the placeholder element.
    pub fn on_placeholder_resize(&self) {
        self.inner.update_position();
    }

    /// The host resized the pinned content.
    pub fn on_content_resize(&self) {
        self.inner.update_position();
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AffixState {
        self.inner.state.borrow().clone()
    }

    pub fn is_pinned(&self) -> bool {
        self.inner.state.borrow().is_pinned()
    }

    pub fn affix_style(&self) -> Option<AffixStyle> {
        self.inner.state.borrow().affix_style().copied()
    }

    pub fn placeholder_style(&self) -> Option<PlaceholderStyle> {
        self.inner.state.borrow().placeholder_style().copied()
    }

    /// The target this instance is registered with.
    pub fn observed_target(&self) -> Option<ScrollTarget> {
        self.inner.registry.target_of(self.inner.id)
    }

    #[inline]
    pub fn observer_id(&self) -> ObserverId {
        self.inner.id
    }

    /// Number of renders so far.
    #[inline]
    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    /// Class applied to the fixed wrapper while pinned.
    pub fn prefix_cls(&self) -> String {
        self.inner.affix_prefix_cls.borrow().clone()
    }

    pub fn children(&self) -> &C {
        &self.children
    }

    /// Describe the element tree for the host to render.
    pub fn render(&self) -> AffixView<'_, C> {
        let state = self.inner.state.borrow();
        let props = self.inner.props.borrow();
        AffixView {
            placeholder: PlaceholderNode {
                class_name: props.class_name.clone(),
                style: props.style.clone(),
                attrs: props.attrs.clone(),
            },
            spacer: state.placeholder_style().map(|s| SpacerNode {
                style: s.to_inline(),
            }),
            fixed: FixedNode {
                class_name: state
                    .is_pinned()
                    .then(|| self.inner.affix_prefix_cls.borrow().clone()),
                style: state
                    .affix_style()
                    .map(AffixStyle::to_inline)
                    .unwrap_or_default(),
            },
            children: &self.children,
        }
    }

    /// Unmount explicitly. Equivalent to dropping.
    pub fn unmount(self) {
        drop(self);
    }
}

impl<C> Drop for Affix<C> {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl<C: fmt::Debug> fmt::Debug for Affix<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(DISPLAY_NAME)
            .field("id", &self.inner.id)
            .field("props", &*self.inner.props.borrow())
            .field("state", &*self.inner.state.borrow())
            .field("children", &self.children)
            .finish()
    }
}
