#![forbid(unsafe_code)]

//! Scroll targets and target resolution.
//!
//! A [`ScrollTarget`] is either the global [`Viewport`] or a scrollable
//! element ([`ElementRef`]). Both are cheap handles over shared layout data
//! the host updates as it scrolls and lays out; cloning a handle does not
//! create a new target.
//!
//! # Invariants
//!
//! 1. Targets compare by identity, never by value: two distinct elements with
//!    identical rectangles are different targets.
//! 2. The viewport rectangle is expressed in its own frame
//!    (`top == 0`, `bottom == inner height`).
//! 3. [`resolve_target_accessor`] prefers an explicit widget setting (even
//!    [`TargetSpec::Disabled`]) over the ambient default.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::AffixContext;
use crate::geometry::{Rect, Size};

/// Global counter for node identities.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> u64 {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Stable identity of a layout node, used as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ElementNode {
    id: NodeId,
    name: Option<String>,
    rect: Cell<Rect>,
}

/// Handle to a laid-out element.
///
/// The host writes the element's bounding client rect with
/// [`set_rect`](Self::set_rect) whenever layout or scrolling moves it.
#[derive(Clone)]
pub struct ElementRef {
    node: Rc<ElementNode>,
}

impl ElementRef {
    /// Create an element with an initial bounding rect.
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self {
            node: Rc::new(ElementNode {
                id: NodeId(next_node_id()),
                name: None,
                rect: Cell::new(rect),
            }),
        }
    }

    /// Create a named element. The name only shows up in debug output.
    #[must_use]
    pub fn named(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            node: Rc::new(ElementNode {
                id: NodeId(next_node_id()),
                name: Some(name.into()),
                rect: Cell::new(rect),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Current bounding client rect.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.node.rect.get()
    }

    /// Replace the bounding client rect.
    pub fn set_rect(&self, rect: Rect) {
        self.node.rect.set(rect);
    }

    /// Whether both handles refer to the same element.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ElementRef {}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.node.id)
            .field("name", &self.node.name)
            .field("rect", &self.rect())
            .finish()
    }
}

struct ViewportNode {
    id: NodeId,
    size: Cell<Size>,
}

/// Handle to the global viewport (the window).
#[derive(Clone)]
pub struct Viewport {
    node: Rc<ViewportNode>,
}

impl Viewport {
    /// Create a viewport with the given inner size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            node: Rc::new(ViewportNode {
                id: NodeId(next_node_id()),
                size: Cell::new(size),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Inner width and height.
    #[inline]
    pub fn size(&self) -> Size {
        self.node.size.get()
    }

    /// Inner height (`innerHeight`).
    #[inline]
    pub fn inner_height(&self) -> f64 {
        self.node.size.get().height
    }

    /// Resize the viewport.
    pub fn set_size(&self, size: Size) {
        self.node.size.set(size);
    }

    /// Whether both handles refer to the same viewport.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl PartialEq for Viewport {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Viewport {}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("id", &self.node.id)
            .field("size", &self.size())
            .finish()
    }
}

/// The scrollable region an affixed widget tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollTarget {
    Viewport(Viewport),
    Element(ElementRef),
}

impl ScrollTarget {
    /// Identity key of the underlying node.
    pub fn id(&self) -> NodeId {
        match self {
            Self::Viewport(v) => v.id(),
            Self::Element(e) => e.id(),
        }
    }

    /// Visible rectangle of the target.
    ///
    /// Elements report their bounding client rect; the viewport reports
    /// `{top: 0, bottom: inner_height}`.
    pub fn rect(&self) -> Rect {
        match self {
            Self::Viewport(v) => Rect::from_size(v.size()),
            Self::Element(e) => e.rect(),
        }
    }

    /// Whether this target is the global viewport.
    pub fn is_viewport(&self) -> bool {
        matches!(self, Self::Viewport(_))
    }
}

impl From<Viewport> for ScrollTarget {
    fn from(viewport: Viewport) -> Self {
        Self::Viewport(viewport)
    }
}

impl From<ElementRef> for ScrollTarget {
    fn from(element: ElementRef) -> Self {
        Self::Element(element)
    }
}

impl fmt::Display for ScrollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viewport(v) => write!(f, "viewport{}", v.id()),
            Self::Element(e) => write!(f, "element{}", e.id()),
        }
    }
}

/// Lazily evaluated accessor for a scroll target.
///
/// Evaluated on every measurement so that a container created after the
/// widget mounted is still picked up.
#[derive(Clone)]
pub struct TargetFn {
    eval: Rc<dyn Fn() -> Option<ScrollTarget>>,
}

impl TargetFn {
    /// Wrap a closure as a target accessor.
    pub fn new(f: impl Fn() -> Option<ScrollTarget> + 'static) -> Self {
        Self { eval: Rc::new(f) }
    }

    /// Accessor that always yields `target`.
    pub fn fixed(target: impl Into<ScrollTarget>) -> Self {
        let target = target.into();
        Self::new(move || Some(target.clone()))
    }

    /// Accessor that never yields a target.
    pub fn none() -> Self {
        Self::new(|| None)
    }

    /// Resolve the accessor to a concrete target.
    #[must_use]
    pub fn resolve(&self) -> Option<ScrollTarget> {
        (self.eval)()
    }
}

impl fmt::Debug for TargetFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TargetFn").field(&self.resolve()).finish()
    }
}

/// How a widget chooses its scroll target.
#[derive(Debug, Clone, Default)]
pub enum TargetSpec {
    /// Use the ambient context's container, falling back to the viewport.
    #[default]
    Inherit,
    /// Explicitly track nothing. Takes precedence over the ambient default.
    Disabled,
    /// Explicit accessor.
    Accessor(TargetFn),
}

impl TargetSpec {
    /// Explicit accessor from a closure.
    pub fn accessor(f: impl Fn() -> Option<ScrollTarget> + 'static) -> Self {
        Self::Accessor(TargetFn::new(f))
    }

    /// Explicit accessor that always yields `target`.
    pub fn fixed(target: impl Into<ScrollTarget>) -> Self {
        Self::Accessor(TargetFn::fixed(target))
    }
}

/// Accessor for the global viewport, or an accessor yielding nothing when the
/// runtime has no viewport.
pub fn default_target(context: &AffixContext) -> TargetFn {
    match context.viewport() {
        Some(viewport) => TargetFn::fixed(viewport.clone()),
        None => TargetFn::none(),
    }
}

/// Pick the target accessor a widget should use.
///
/// Returns `None` only when the widget explicitly disabled targeting.
pub fn resolve_target_accessor(spec: &TargetSpec, context: &AffixContext) -> Option<TargetFn> {
    match spec {
        TargetSpec::Accessor(f) => Some(f.clone()),
        TargetSpec::Disabled => None,
        TargetSpec::Inherit => Some(
            context
                .target_container()
                .cloned()
                .unwrap_or_else(|| default_target(context)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_compare_by_identity() {
        let a = ElementRef::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = ElementRef::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn clone_shares_layout_data() {
        let a = ElementRef::named("container", Rect::new(0.0, 0.0, 10.0, 10.0));
        let alias = a.clone();
        alias.set_rect(Rect::new(0.0, -50.0, 10.0, 10.0));
        assert_eq!(a.rect().top(), -50.0);
    }

    #[test]
    fn viewport_rect_is_own_frame() {
        let vp = Viewport::new(Size::new(1024.0, 768.0));
        let target = ScrollTarget::from(vp.clone());
        assert_eq!(target.rect().top(), 0.0);
        assert_eq!(target.rect().bottom(), 768.0);
        vp.set_size(Size::new(1024.0, 500.0));
        assert_eq!(target.rect().bottom(), 500.0);
        assert!(target.is_viewport());
    }

    #[test]
    fn viewport_and_element_are_never_equal() {
        let vp = ScrollTarget::from(Viewport::new(Size::new(1.0, 1.0)));
        let el = ScrollTarget::from(ElementRef::new(Rect::default()));
        assert_ne!(vp, el);
    }

    #[test]
    fn explicit_accessor_wins_over_context() {
        let ambient = ElementRef::new(Rect::default());
        let explicit = ElementRef::new(Rect::default());
        let ctx = AffixContext::default().with_target_container(TargetFn::fixed(ambient));
        let f = resolve_target_accessor(&TargetSpec::fixed(explicit.clone()), &ctx)
            .expect("explicit accessor");
        assert_eq!(f.resolve(), Some(ScrollTarget::Element(explicit)));
    }

    #[test]
    fn disabled_wins_over_context() {
        let ambient = ElementRef::new(Rect::default());
        let ctx = AffixContext::default().with_target_container(TargetFn::fixed(ambient));
        assert!(resolve_target_accessor(&TargetSpec::Disabled, &ctx).is_none());
    }

    #[test]
    fn inherit_uses_context_container() {
        let ambient = ElementRef::new(Rect::default());
        let ctx = AffixContext::default().with_target_container(TargetFn::fixed(ambient.clone()));
        let f = resolve_target_accessor(&TargetSpec::Inherit, &ctx).expect("ambient accessor");
        assert_eq!(f.resolve(), Some(ScrollTarget::Element(ambient)));
    }

    #[test]
    fn inherit_falls_back_to_viewport() {
        let vp = Viewport::new(Size::new(800.0, 600.0));
        let ctx = AffixContext::default().with_viewport(vp.clone());
        let f = resolve_target_accessor(&TargetSpec::Inherit, &ctx).expect("default accessor");
        assert_eq!(f.resolve(), Some(ScrollTarget::Viewport(vp)));
    }

    #[test]
    fn headless_runtime_resolves_to_nothing() {
        let ctx = AffixContext::headless();
        let f = resolve_target_accessor(&TargetSpec::Inherit, &ctx).expect("default accessor");
        assert!(f.resolve().is_none());
    }
}
