#![forbid(unsafe_code)]

//! Axis-aligned boxes in CSS pixel space.
//!
//! Layout coordinates are fractional (`f64`) because the host layout engine
//! reports sub-pixel positions. A [`Rect`] is stored as origin + size; the
//! edge accessors (`top`, `bottom`, `left`, `right`) are derived.

/// Width and height of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle, equivalent to a bounding client rect.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle anchored at the origin.
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
