#![forbid(unsafe_code)]

//! Runtime services for the Affix widget: a cooperative frame scheduler, a
//! once-per-frame throttle, and the scroll observation registry.

#[cfg(feature = "logging")]
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod throttle;

pub use registry::{ObserverId, ObserverRegistry, ScrollObserver};
pub use scheduler::{FrameRequestId, FrameScheduler, TimerId};
pub use throttle::FrameThrottle;
