#![forbid(unsafe_code)]

//! Ambient configuration shared by every widget in a tree.
//!
//! The [`AffixContext`] plays the role of a config provider: it owns the root
//! class-name prefix, an optional default scroll container for descendants,
//! and the runtime's viewport (absent when there is no window, e.g. during
//! server-side rendering or in headless tests).

use crate::target::{TargetFn, Viewport};

/// Default root prefix for generated class names.
pub const DEFAULT_ROOT_PREFIX: &str = "ui";

/// Ambient widget configuration.
#[derive(Debug, Clone)]
pub struct AffixContext {
    root_prefix_cls: String,
    target_container: Option<TargetFn>,
    viewport: Option<Viewport>,
}

impl Default for AffixContext {
    fn default() -> Self {
        Self::headless()
    }
}

impl AffixContext {
    /// Context for a runtime that has a viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self::headless().with_viewport(viewport)
    }

    /// Context for a runtime without a viewport.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            root_prefix_cls: DEFAULT_ROOT_PREFIX.to_owned(),
            target_container: None,
            viewport: None,
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Default scroll container for widgets that do not set their own.
    #[must_use]
    pub fn with_target_container(mut self, target: TargetFn) -> Self {
        self.target_container = Some(target);
        self
    }

    #[must_use]
    pub fn with_root_prefix_cls(mut self, prefix: impl Into<String>) -> Self {
        self.root_prefix_cls = prefix.into();
        self
    }

    #[inline]
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    #[inline]
    pub fn target_container(&self) -> Option<&TargetFn> {
        self.target_container.as_ref()
    }

    #[inline]
    pub fn root_prefix_cls(&self) -> &str {
        &self.root_prefix_cls
    }

    /// Resolve the class-name prefix for a component.
    ///
    /// A per-widget override is returned verbatim; otherwise the prefix is
    /// `"{root}-{suffix}"`.
    pub fn get_prefix_cls(&self, suffix: &str, custom: Option<&str>) -> String {
        match custom {
            Some(custom) => custom.to_owned(),
            None if suffix.is_empty() => self.root_prefix_cls.clone(),
            None => format!("{}-{}", self.root_prefix_cls, suffix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    #[test]
    fn prefix_defaults_to_root_and_suffix() {
        let ctx = AffixContext::headless();
        assert_eq!(ctx.get_prefix_cls("affix", None), "ui-affix");
    }

    #[test]
    fn custom_prefix_is_verbatim() {
        let ctx = AffixContext::headless().with_root_prefix_cls("acme");
        assert_eq!(ctx.get_prefix_cls("affix", Some("sticky")), "sticky");
        assert_eq!(ctx.get_prefix_cls("affix", None), "acme-affix");
    }

    #[test]
    fn empty_suffix_yields_root() {
        let ctx = AffixContext::headless();
        assert_eq!(ctx.get_prefix_cls("", None), "ui");
    }

    #[test]
    fn default_is_headless() {
        let ctx = AffixContext::default();
        assert!(ctx.viewport().is_none());
        assert!(ctx.target_container().is_none());
        let ctx = AffixContext::new(Viewport::new(Size::new(10.0, 10.0)));
        assert!(ctx.viewport().is_some());
    }
}
