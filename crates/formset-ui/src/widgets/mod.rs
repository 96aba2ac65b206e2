//! Markup widgets

pub mod element;
pub mod fragment;
pub mod link;
pub mod nodes;
pub mod text;

pub use element::*;
pub use fragment::*;
pub use link::*;
pub use text::*;
