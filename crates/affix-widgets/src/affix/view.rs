#![forbid(unsafe_code)]

//! Declarative output of the affix widget.
//!
//! The host renders an [`AffixView`] as three nested boxes:
//!
//! ```text
//! placeholder            (class/style/attrs from props; resize-observed)
//! ├── spacer             (only while pinned; aria-hidden; keeps layout)
//! └── fixed              (pinned style + prefix class; resize-observed)
//!     └── children
//! ```

use std::fmt;

use v_htmlescape::escape;

/// Ordered inline style declarations (`prop: value`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a declaration, replacing an earlier one for the same property.
    #[must_use]
    pub fn with(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(prop, value);
        self
    }

    pub fn set(&mut self, prop: impl Into<String>, value: impl Into<String>) {
        let prop = prop.into();
        let value = value.into();
        match self.decls.iter_mut().find(|(p, _)| *p == prop) {
            Some(slot) => slot.1 = value,
            None => self.decls.push((prop, value)),
        }
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Serialize as a CSS declaration list.
    pub fn to_css(&self) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Format a pixel length the way the browser would serialize it.
pub(crate) fn px(value: f64) -> String {
    format!("{value}px")
}

/// Outer wrapper occupying the widget's natural layout footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderNode {
    pub class_name: Option<String>,
    pub style: InlineStyle,
    pub attrs: Vec<(String, String)>,
}

/// Invisible box that keeps the pinned content's space in flow.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacerNode {
    pub style: InlineStyle,
}

/// Inner wrapper that receives the fixed-position style.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedNode {
    pub class_name: Option<String>,
    pub style: InlineStyle,
}

/// Render output of one affix instance.
#[derive(Debug)]
pub struct AffixView<'a, C> {
    pub placeholder: PlaceholderNode,
    pub spacer: Option<SpacerNode>,
    pub fixed: FixedNode,
    pub children: &'a C,
}

impl<C> AffixView<'_, C> {
    /// Whether the view renders the pinned variant.
    pub fn is_pinned(&self) -> bool {
        self.spacer.is_some()
    }
}

fn write_open(
    f: &mut fmt::Formatter<'_>,
    class_name: Option<&str>,
    style: &InlineStyle,
    extra: &[(String, String)],
) -> fmt::Result {
    f.write_str("<div")?;
    if let Some(class_name) = class_name.filter(|c| !c.is_empty()) {
        write!(f, " class=\"{}\"", escape(class_name))?;
    }
    if !style.is_empty() {
        write!(f, " style=\"{}\"", escape(&style.to_css()))?;
    }
    for (name, value) in extra {
        write!(f, " {}=\"{}\"", escape(name), escape(value))?;
    }
    f.write_str(">")
}

/// HTML serialization; children are escaped text.
impl<C: fmt::Display> fmt::Display for AffixView<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_open(
            f,
            self.placeholder.class_name.as_deref(),
            &self.placeholder.style,
            &self.placeholder.attrs,
        )?;
        if let Some(spacer) = &self.spacer {
            let hidden = [("aria-hidden".to_owned(), "true".to_owned())];
            write_open(f, None, &spacer.style, &hidden)?;
            f.write_str("</div>")?;
        }
        write_open(f, self.fixed.class_name.as_deref(), &self.fixed.style, &[])?;
        write!(f, "{}", escape(&self.children.to_string()))?;
        f.write_str("</div></div>")
    }
}
