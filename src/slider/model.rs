//! Pure mapping between linear slider positions and a logarithmic byte scale.

use crate::state::SizeRange;

/// Exponent of the smallest representable size (10 bytes).
pub const MIN_EXPONENT: f64 = 1.0;
/// Exponent of the largest representable size (100 MB).
pub const MAX_EXPONENT: f64 = 8.0;
pub const MIN_POSITION: f64 = 0.0;
pub const MAX_POSITION: f64 = 100.0;
/// Sizes below this are clamped before taking a logarithm.
pub const MIN_BYTES: u64 = 10;

/// Largest position drift that is still attributed to float/log rounding.
///
/// Rounding bytes to an integer moves a position by at most ~0.3 at the low
/// end of the scale.
pub const SYNC_TOLERANCE: f64 = 0.5;

#[must_use]
pub fn position_to_log(position: f64) -> f64 {
    let position = position.clamp(MIN_POSITION, MAX_POSITION);
    MIN_EXPONENT + (MAX_EXPONENT - MIN_EXPONENT) * (position / MAX_POSITION)
}

#[must_use]
pub fn log_to_position(log: f64) -> f64 {
    (log - MIN_EXPONENT) / (MAX_EXPONENT - MIN_EXPONENT) * MAX_POSITION
}

#[must_use]
pub fn log_to_bytes(log: f64) -> u64 {
    // f64 -> u64 casts saturate, and sizes here stay far below 2^53.
    10_f64.powf(log).round() as u64
}

#[must_use]
pub fn bytes_to_log(bytes: u64) -> f64 {
    (bytes.max(MIN_BYTES) as f64).log10()
}

/// Handle positions of the dual slider, always ordered and within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderPositions {
    min: f64,
    max: f64,
}

impl Default for SliderPositions {
    fn default() -> Self {
        Self::FULL
    }
}

impl SliderPositions {
    /// Both handles at the extremes: no constraint.
    pub const FULL: Self = Self {
        min: MIN_POSITION,
        max: MAX_POSITION,
    };

    /// Normalise raw pointer input: clamp to the track and swap crossed
    /// handles.
    #[must_use]
    pub fn new(first: f64, second: f64) -> Self {
        let first = sanitize(first, MIN_POSITION);
        let second = sanitize(second, MAX_POSITION);
        if first <= second {
            Self {
                min: first,
                max: second,
            }
        } else {
            Self {
                min: second,
                max: first,
            }
        }
    }

    /// Positions implied by a committed range. Open edges sit at the track
    /// ends.
    #[must_use]
    pub fn from_range(range: Option<SizeRange>) -> Self {
        let Some(range) = range else {
            return Self::FULL;
        };
        let min = range
            .min()
            .map_or(MIN_POSITION, |bytes| log_to_position(bytes_to_log(bytes)));
        let max = range
            .max()
            .map_or(MAX_POSITION, |bytes| log_to_position(bytes_to_log(bytes)));
        Self::new(min, max)
    }

    /// Byte range for these positions. A handle resting on its extreme
    /// leaves that edge open, and a fully open range is no range at all.
    #[must_use]
    pub fn to_range(&self) -> Option<SizeRange> {
        let min = (self.min > MIN_POSITION).then(|| log_to_bytes(position_to_log(self.min)));
        let max = (self.max < MAX_POSITION).then(|| log_to_bytes(position_to_log(self.max)));
        SizeRange::new(min, max)
    }

    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Largest per-handle difference to `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.min - other.min).abs().max((self.max - other.max).abs())
    }
}

fn sanitize(position: f64, fallback: f64) -> f64 {
    if position.is_nan() {
        fallback
    } else {
        position.clamp(MIN_POSITION, MAX_POSITION)
    }
}
