#![forbid(unsafe_code)]

//! Events on a scroll target that can move an affixed widget.

use std::fmt;

/// Target events the shared listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetEvent {
    Resize,
    Scroll,
    TouchStart,
    TouchMove,
    TouchEnd,
    PageShow,
    Load,
}

/// Every event a shared listener is attached for.
pub const TRIGGER_EVENTS: [TargetEvent; 7] = [
    TargetEvent::Resize,
    TargetEvent::Scroll,
    TargetEvent::TouchStart,
    TargetEvent::TouchMove,
    TargetEvent::TouchEnd,
    TargetEvent::PageShow,
    TargetEvent::Load,
];

impl TargetEvent {
    /// DOM event name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::PageShow => "pageshow",
            Self::Load => "load",
        }
    }
}

impl fmt::Display for TargetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
