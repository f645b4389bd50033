#![forbid(unsafe_code)]

//! Core types for the Affix widget: geometry, scroll targets, trigger events,
//! ambient context, and configuration.

pub mod config;
pub mod context;
pub mod event;
pub mod geometry;
pub mod target;

pub use config::{AffixConfig, AffixDefaults, ConfigError};
pub use context::AffixContext;
pub use event::{TRIGGER_EVENTS, TargetEvent};
pub use geometry::{Rect, Size};
pub use target::{
    ElementRef, NodeId, ScrollTarget, TargetFn, TargetSpec, Viewport, default_target,
    resolve_target_accessor,
};
