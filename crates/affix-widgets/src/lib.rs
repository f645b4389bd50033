#![forbid(unsafe_code)]

//! Widgets for the Affix component library.

pub mod affix;

pub use affix::{
    Affix, AffixProps, AffixRuntime, AffixState, AffixStatus, AffixStyle, AffixView, Anchor,
    InlineStyle, Offsets, PlaceholderStyle,
};
