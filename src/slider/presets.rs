use crate::facets::FacetCount;
use crate::state::SizeRange;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;

/// A one-click size range shown next to the slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePreset {
    pub label: &'static str,
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SizePreset {
    #[must_use]
    pub const fn new(label: &'static str, min: Option<u64>, max: Option<u64>) -> Self {
        Self { label, min, max }
    }

    #[must_use]
    pub fn range(&self) -> Option<SizeRange> {
        SizeRange::new(self.min, self.max)
    }

    /// Selected iff the committed bounds match this preset exactly.
    #[must_use]
    pub fn is_selected(&self, current: Option<SizeRange>) -> bool {
        current.map_or((None, None), |range| (range.min(), range.max())) == (self.min, self.max)
    }

    /// Count for this preset from the backend's size buckets, matched by
    /// label. No bucket means no badge.
    #[must_use]
    pub fn badge(&self, buckets: &[FacetCount]) -> Option<u64> {
        buckets
            .iter()
            .find(|bucket| bucket.value == self.label)
            .map(|bucket| bucket.count)
    }
}

/// Presets in display order. Labels double as the backend's bucket names.
pub const SIZE_PRESETS: [SizePreset; 6] = [
    SizePreset::new("< 1 KB", None, Some(KB)),
    SizePreset::new("1 KB – 10 KB", Some(KB), Some(10 * KB)),
    SizePreset::new("10 KB – 100 KB", Some(10 * KB), Some(100 * KB)),
    SizePreset::new("100 KB – 1 MB", Some(100 * KB), Some(MB)),
    SizePreset::new("1 MB – 10 MB", Some(MB), Some(10 * MB)),
    SizePreset::new("> 10 MB", Some(10 * MB), None),
];

/// Range to commit when `preset` is clicked: clicking the selected preset
/// clears the filter, any other preset replaces it.
#[must_use]
pub fn toggle_preset(preset: &SizePreset, current: Option<SizeRange>) -> Option<SizeRange> {
    if preset.is_selected(current) {
        None
    } else {
        preset.range()
    }
}

/// The preset matching `current`, if any.
#[must_use]
pub fn selected_preset(current: Option<SizeRange>) -> Option<&'static SizePreset> {
    SIZE_PRESETS.iter().find(|preset| preset.is_selected(current))
}

#[must_use]
pub fn find_preset(label: &str) -> Option<&'static SizePreset> {
    SIZE_PRESETS.iter().find(|preset| preset.label == label)
}
