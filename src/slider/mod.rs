//! The size filter: logarithmic slider math, presets and the widget state
//! machine that keeps local drags and committed ranges from fighting.

mod control;
pub mod model;
mod presets;

pub use control::{DEFAULT_DEBOUNCE, DriveMode, SizeFilterControl};
pub use model::SliderPositions;
pub use presets::{
    KB, MB, SIZE_PRESETS, SizePreset, find_preset, selected_preset, toggle_preset,
};
