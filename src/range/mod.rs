//! Date-range selection: presets, the calendar widget, normalization and
//! global/local reconciliation

pub mod normalizer;
pub mod preset;
pub mod resolver;
pub mod widget;

pub use normalizer::{RangeNormalizer, Rejection};
pub use preset::{default_range, preset_range};
pub use resolver::{GlobalDateContext, GlobalRange, OverrideResolver};
pub use widget::{DayCell, RangeWidget, Selection};
