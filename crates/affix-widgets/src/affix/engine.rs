#![forbid(unsafe_code)]

//! Position engine: the pure part of the affix widget.
//!
//! Given the tracked target's rectangle, the placeholder's rectangle and the
//! configured offsets, decide whether the content is pinned to the top, to
//! the bottom, or left in flow, and derive the next widget state.
//!
//! # Invariants
//!
//! 1. The fixed style and the placeholder style exist together or not at all
//!    (both live in [`Pinned`]).
//! 2. Top pinning wins over bottom pinning when both conditions hold.
//! 3. [`AffixState::next_state`] requests a change notification only when
//!    the pinned flag differs from `last_affix`.
//! 4. The top offset defaults to `0` only when *neither* offset is set.

use affix_core::{Rect, ScrollTarget, Size};

use super::view::{InlineStyle, px};

/// Whether a measurement pass has been scheduled but not applied yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AffixStatus {
    #[default]
    Idle,
    MeasurementPending,
}

/// Configured offsets, before default resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Offsets {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
}

impl Offsets {
    #[must_use]
    pub const fn new(top: Option<f64>, bottom: Option<f64>) -> Self {
        Self { top, bottom }
    }

    /// Top offset used for measurement.
    ///
    /// `Some(0.0)` when neither offset is configured; unset when only the
    /// bottom offset is configured.
    pub fn effective_top(&self) -> Option<f64> {
        match (self.top, self.bottom) {
            (None, None) => Some(0.0),
            (top, _) => top,
        }
    }

    /// Bottom offset used for measurement.
    pub fn effective_bottom(&self) -> Option<f64> {
        self.bottom
    }
}

/// Distance from the viewport top at which to pin, if the top condition holds.
pub fn get_fixed_top(placeholder: &Rect, target: &Rect, offset_top: Option<f64>) -> Option<f64> {
    let offset_top = offset_top?;
    (target.top() > placeholder.top() - offset_top).then(|| offset_top + target.top())
}

/// Distance from the viewport bottom at which to pin, if the bottom condition
/// holds.
///
/// `viewport_height` converts the target's bottom edge into a distance from
/// the bottom of the viewport.
pub fn get_fixed_bottom(
    placeholder: &Rect,
    target: &Rect,
    offset_bottom: Option<f64>,
    viewport_height: f64,
) -> Option<f64> {
    let offset_bottom = offset_bottom?;
    (target.bottom() < placeholder.bottom() + offset_bottom)
        .then(|| offset_bottom + (viewport_height - target.bottom()))
}

/// Where the content should be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Top(f64),
    Bottom(f64),
    Unpinned,
}

impl Placement {
    /// Combine both edge conditions; top wins.
    pub fn from_edges(fixed_top: Option<f64>, fixed_bottom: Option<f64>) -> Self {
        match (fixed_top, fixed_bottom) {
            (Some(top), _) => Self::Top(top),
            (None, Some(bottom)) => Self::Bottom(bottom),
            (None, None) => Self::Unpinned,
        }
    }
}

/// Geometry read for one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub target: Rect,
    pub placeholder: Rect,
    pub viewport_height: f64,
}

impl Measurement {
    /// Read the target's rect and size the viewport from `viewport_height`,
    /// or from the target itself when there is no viewport.
    pub fn read(target: &ScrollTarget, placeholder: Rect, viewport_height: Option<f64>) -> Self {
        let target = target.rect();
        Self {
            target,
            placeholder,
            viewport_height: viewport_height.unwrap_or_else(|| target.bottom()),
        }
    }

    pub fn fixed_top(&self, offsets: &Offsets) -> Option<f64> {
        get_fixed_top(&self.placeholder, &self.target, offsets.effective_top())
    }

    pub fn fixed_bottom(&self, offsets: &Offsets) -> Option<f64> {
        get_fixed_bottom(
            &self.placeholder,
            &self.target,
            offsets.effective_bottom(),
            self.viewport_height,
        )
    }

    pub fn placement(&self, offsets: &Offsets) -> Placement {
        Placement::from_edges(self.fixed_top(offsets), self.fixed_bottom(offsets))
    }
}

/// Edge the content is pinned to, with its distance in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Top(f64),
    Bottom(f64),
}

/// `position: fixed` style for the pinned content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffixStyle {
    pub anchor: Anchor,
    pub width: f64,
    pub height: f64,
}

impl AffixStyle {
    pub fn top(&self) -> Option<f64> {
        match self.anchor {
            Anchor::Top(top) => Some(top),
            Anchor::Bottom(_) => None,
        }
    }

    pub fn bottom(&self) -> Option<f64> {
        match self.anchor {
            Anchor::Bottom(bottom) => Some(bottom),
            Anchor::Top(_) => None,
        }
    }

    /// Whether freshly computed edges would leave this style unchanged.
    pub fn matches_edges(&self, fixed_top: Option<f64>, fixed_bottom: Option<f64>) -> bool {
        (fixed_top.is_some() && self.top() == fixed_top)
            || (fixed_bottom.is_some() && self.bottom() == fixed_bottom)
    }

    pub fn to_inline(&self) -> InlineStyle {
        let style = InlineStyle::new().with("position", "fixed");
        let style = match self.anchor {
            Anchor::Top(top) => style.with("top", px(top)),
            Anchor::Bottom(bottom) => style.with("bottom", px(bottom)),
        };
        style
            .with("width", px(self.width))
            .with("height", px(self.height))
    }
}

/// Size kept in flow while the content is pinned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceholderStyle {
    pub width: f64,
    pub height: f64,
}

impl PlaceholderStyle {
    pub fn to_inline(&self) -> InlineStyle {
        InlineStyle::new()
            .with("width", px(self.width))
            .with("height", px(self.height))
    }
}

/// Styles applied while pinned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinned {
    pub affix: AffixStyle,
    pub placeholder: PlaceholderStyle,
}

impl Pinned {
    fn new(anchor: Anchor, size: Size) -> Self {
        Self {
            affix: AffixStyle {
                anchor,
                width: size.width,
                height: size.height,
            },
            placeholder: PlaceholderStyle {
                width: size.width,
                height: size.height,
            },
        }
    }
}

/// Per-instance widget state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffixState {
    pub status: AffixStatus,
    pub pinned: Option<Pinned>,
    pub last_affix: bool,
    pub prev_target: Option<ScrollTarget>,
}

/// Result of a measurement: the state to apply, plus the pinned flag to
/// report if it changed.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub state: AffixState,
    pub notify: Option<bool>,
}

impl AffixState {
    pub fn affix_style(&self) -> Option<&AffixStyle> {
        self.pinned.as_ref().map(|p| &p.affix)
    }

    pub fn placeholder_style(&self) -> Option<&PlaceholderStyle> {
        self.pinned.as_ref().map(|p| &p.placeholder)
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// State right after a measurement was requested: pending, no styles.
    #[must_use]
    pub fn prepared(&self) -> Self {
        Self {
            status: AffixStatus::MeasurementPending,
            pinned: None,
            ..self.clone()
        }
    }

    /// Apply a placement computed for a placeholder of `size`.
    #[must_use]
    pub fn next_state(&self, placement: Placement, size: Size) -> StateUpdate {
        let pinned = match placement {
            Placement::Top(top) => Some(Pinned::new(Anchor::Top(top), size)),
            Placement::Bottom(bottom) => Some(Pinned::new(Anchor::Bottom(bottom), size)),
            Placement::Unpinned => None,
        };
        let now_pinned = pinned.is_some();
        StateUpdate {
            notify: (now_pinned != self.last_affix).then_some(now_pinned),
            state: Self {
                status: AffixStatus::Idle,
                pinned,
                last_affix: now_pinned,
                prev_target: self.prev_target.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(top: f64, height: f64) -> Rect {
        Rect::new(0.0, top, 800.0, height)
    }

    fn placeholder(top: f64) -> Rect {
        Rect::new(20.0, top, 300.0, 40.0)
    }

    #[test]
    fn top_defaults_to_zero_only_without_any_offset() {
        assert_eq!(Offsets::new(None, None).effective_top(), Some(0.0));
        assert_eq!(Offsets::new(Some(8.0), None).effective_top(), Some(8.0));
        assert_eq!(Offsets::new(None, Some(8.0)).effective_top(), None);
        assert_eq!(Offsets::new(Some(4.0), Some(8.0)).effective_top(), Some(4.0));
        assert_eq!(Offsets::new(None, Some(8.0)).effective_bottom(), Some(8.0));
    }

    #[test]
    fn fixed_top_pins_once_scrolled_past() {
        let t = target(0.0, 600.0);
        assert_eq!(get_fixed_top(&placeholder(100.0), &t, Some(0.0)), None);
        assert_eq!(get_fixed_top(&placeholder(0.0), &t, Some(0.0)), None);
        assert_eq!(get_fixed_top(&placeholder(-1.0), &t, Some(0.0)), Some(0.0));
        assert_eq!(get_fixed_top(&placeholder(9.0), &t, Some(10.0)), Some(10.0));
        assert_eq!(get_fixed_top(&placeholder(-50.0), &t, None), None);
    }

    #[test]
    fn fixed_top_is_relative_to_container_top() {
        let container = target(120.0, 300.0);
        assert_eq!(get_fixed_top(&placeholder(100.0), &container, Some(5.0)), Some(125.0));
    }

    #[test]
    fn fixed_bottom_pins_near_bottom_edge() {
        let t = target(0.0, 600.0);
        assert_eq!(get_fixed_bottom(&placeholder(500.0), &t, Some(20.0), 600.0), None);
        // placeholder bottom 580 + 20 == 600: not strictly below
        assert_eq!(get_fixed_bottom(&placeholder(540.0), &t, Some(20.0), 600.0), None);
        assert_eq!(get_fixed_bottom(&placeholder(541.0), &t, Some(20.0), 600.0), Some(20.0));
        assert_eq!(get_fixed_bottom(&placeholder(900.0), &t, None, 600.0), None);
    }

    #[test]
    fn fixed_bottom_accounts_for_container_above_viewport_bottom() {
        let container = target(100.0, 300.0); // bottom at 400, viewport 600
        assert_eq!(
            get_fixed_bottom(&placeholder(380.0), &container, Some(10.0), 600.0),
            Some(210.0)
        );
    }

    #[test]
    fn top_wins_when_both_edges_hold() {
        assert_eq!(Placement::from_edges(Some(1.0), Some(2.0)), Placement::Top(1.0));
        assert_eq!(Placement::from_edges(None, Some(2.0)), Placement::Bottom(2.0));
        assert_eq!(Placement::from_edges(None, None), Placement::Unpinned);
    }

    #[test]
    fn tall_placeholder_satisfies_both_and_pins_top() {
        let m = Measurement {
            target: target(0.0, 600.0),
            placeholder: Rect::new(0.0, -10.0, 100.0, 1000.0),
            viewport_height: 600.0,
        };
        let offsets = Offsets::new(Some(0.0), Some(0.0));
        assert!(m.fixed_bottom(&offsets).is_some());
        assert_eq!(m.placement(&offsets), Placement::Top(0.0));
    }

    #[test]
    fn bottom_only_never_pins_top() {
        let m = Measurement {
            target: target(0.0, 600.0),
            placeholder: placeholder(-500.0),
            viewport_height: 600.0,
        };
        assert_eq!(m.placement(&Offsets::new(None, Some(10.0))), Placement::Unpinned);
    }

    #[test]
    fn measurement_without_viewport_uses_target_bottom() {
        let el = affix_core::ElementRef::new(target(50.0, 200.0));
        let m = Measurement::read(&ScrollTarget::Element(el), placeholder(0.0), None);
        assert_eq!(m.viewport_height, 250.0);
    }

    #[test]
    fn next_state_pins_and_notifies_once() {
        let size = Size::new(300.0, 40.0);
        let idle = AffixState::default().prepared();
        let update = idle.next_state(Placement::Top(0.0), size);
        assert_eq!(update.notify, Some(true));
        assert_eq!(update.state.status, AffixStatus::Idle);
        let style = update.state.affix_style().copied().unwrap();
        assert_eq!(style.top(), Some(0.0));
        assert_eq!((style.width, style.height), (300.0, 40.0));
        let spacer = update.state.placeholder_style().copied().unwrap();
        assert_eq!((spacer.width, spacer.height), (300.0, 40.0));

        let again = update.state.prepared().next_state(Placement::Top(0.0), size);
        assert_eq!(again.notify, None);

        let released = again.state.prepared().next_state(Placement::Unpinned, size);
        assert_eq!(released.notify, Some(false));
        assert!(released.state.affix_style().is_none());
        assert!(released.state.placeholder_style().is_none());
    }

    #[test]
    fn prepared_clears_styles_but_keeps_history() {
        let pinned = AffixState::default()
            .next_state(Placement::Bottom(5.0), Size::new(1.0, 1.0))
            .state;
        let prepared = pinned.prepared();
        assert_eq!(prepared.status, AffixStatus::MeasurementPending);
        assert!(!prepared.is_pinned());
        assert!(prepared.last_affix);
    }

    #[test]
    fn matches_edges_compares_the_applied_edge_only() {
        let style = AffixStyle {
            anchor: Anchor::Top(10.0),
            width: 1.0,
            height: 1.0,
        };
        assert!(style.matches_edges(Some(10.0), None));
        assert!(!style.matches_edges(Some(11.0), None));
        assert!(!style.matches_edges(None, Some(10.0)));
        assert!(!style.matches_edges(None, None));
    }

    #[test]
    fn inline_styles_serialize_in_declaration_order() {
        let style = AffixStyle {
            anchor: Anchor::Bottom(12.0),
            width: 300.0,
            height: 40.5,
        };
        assert_eq!(
            style.to_inline().to_css(),
            "position: fixed; bottom: 12px; width: 300px; height: 40.5px"
        );
        let spacer = PlaceholderStyle {
            width: 300.0,
            height: 40.5,
        };
        assert_eq!(spacer.to_inline().to_css(), "width: 300px; height: 40.5px");
    }
}
