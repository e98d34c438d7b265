use crate::colors::{Rgb, hex_css};

/// Travel-time color band, derived purely from a distance in minutes.
///
/// The first nine variants are ordered by their inclusive upper bound;
/// `NoData` stands for a missing or non-finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistanceCategory {
    Red,
    Orange,
    Yellow,
    LightGreen,
    Green,
    Teal,
    LightBlue,
    Blue,
    Purple,
    NoData,
}

/// Inclusive upper bounds, ascending. First match wins.
const THRESHOLDS: [(f64, DistanceCategory); 8] = [
    (10.0, DistanceCategory::Red),
    (20.0, DistanceCategory::Orange),
    (30.0, DistanceCategory::Yellow),
    (40.0, DistanceCategory::LightGreen),
    (50.0, DistanceCategory::Green),
    (60.0, DistanceCategory::Teal),
    (75.0, DistanceCategory::LightBlue),
    (90.0, DistanceCategory::Blue),
];

/// Classify a travel time in minutes.
///
/// Negative values fall into the smallest band. NaN and infinities are `NoData`.
pub fn classify(distance: f64) -> DistanceCategory {
    if !distance.is_finite() {
        return DistanceCategory::NoData;
    }
    THRESHOLDS
        .iter()
        .find(|(limit, _)| distance <= *limit)
        .map(|(_, category)| *category)
        .unwrap_or(DistanceCategory::Purple)
}

/// Tooltip text for a travel time, e.g. `17 min (11-20)`.
///
/// Minutes are rounded up so the number always falls inside the band label.
/// Non-finite values read as no data.
pub fn describe_minutes(distance: f64) -> String {
    let category = classify(distance);
    if category == DistanceCategory::NoData {
        return category.label().to_owned();
    }
    let whole = distance.max(0.0).ceil() as u64;
    format!("{whole} min ({})", category.label())
}

/// Classify a table lookup; an absent entry is `NoData`.
pub fn classify_entry(distance: Option<f64>) -> DistanceCategory {
    distance.map_or(DistanceCategory::NoData, classify)
}

impl DistanceCategory {
    /// Legend order: the nine bands followed by `NoData`.
    pub const ALL: [Self; 10] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::LightGreen,
        Self::Green,
        Self::Teal,
        Self::LightBlue,
        Self::Blue,
        Self::Purple,
        Self::NoData,
    ];

    pub fn rgb(self) -> Rgb {
        match self {
            Self::Red => (255, 0, 0),
            Self::Orange => (255, 165, 0),
            Self::Yellow => (255, 255, 0),
            Self::LightGreen => (144, 238, 144),
            Self::Green => (0, 128, 0),
            Self::Teal => (0, 128, 128),
            Self::LightBlue => (173, 216, 230),
            Self::Blue => (0, 0, 255),
            Self::Purple => (128, 0, 128),
            Self::NoData => (128, 128, 128),
        }
    }

    pub fn hex(self) -> String {
        hex_css(self.rgb())
    }

    /// Legend text for the band, in whole minutes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Red => "0-10",
            Self::Orange => "11-20",
            Self::Yellow => "21-30",
            Self::LightGreen => "31-40",
            Self::Green => "41-50",
            Self::Teal => "51-60",
            Self::LightBlue => "61-75",
            Self::Blue => "76-90",
            Self::Purple => ">90",
            Self::NoData => "No data",
        }
    }
}
