//! Satisfaction scale and derived presentation helpers.
//!
//! # Responsibility
//! - Define the fixed 0..=5 satisfaction scale and its label/emoji table.
//! - Derive averages, image buckets and display strings from levels.
//!
//! # Invariants
//! - Lookups for out-of-range raw values return the unknown sentinels,
//!   never panic.
//! - An empty sample has no average; `average_of` returns `None`, which is
//!   distinct from a real `0.0` average.
//! - Image buckets are always inside `0..=5`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Label returned for values outside the scale.
pub const UNKNOWN_LABEL: &str = "不明";
/// Emoji returned for values outside the scale.
pub const UNKNOWN_EMOJI: &str = "❓";

const MIN_LEVEL: u8 = 0;
const MAX_LEVEL: u8 = 5;

const LABELS: [&str; 6] = ["最悪", "悪い", "まあまあ", "普通", "良い", "最高"];
const EMOJIS: [&str; 6] = ["😣", "😞", "😐", "🙂", "😊", "😄"];

/// One point on the daily satisfaction scale, `0` worst and `5` best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SatisfactionLevel(u8);

/// Raised when a raw integer does not fit the satisfaction scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutOfRange(pub i64);

impl Display for LevelOutOfRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "satisfaction level {} is outside {MIN_LEVEL}..={MAX_LEVEL}",
            self.0
        )
    }
}

impl Error for LevelOutOfRange {}

impl SatisfactionLevel {
    pub const WORST: Self = Self(MIN_LEVEL);
    pub const BEST: Self = Self(MAX_LEVEL);

    /// Builds a level, rejecting values above `5`.
    pub fn new(value: u8) -> Result<Self, LevelOutOfRange> {
        if value > MAX_LEVEL {
            return Err(LevelOutOfRange(i64::from(value)));
        }
        Ok(Self(value))
    }

    /// All six levels in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (MIN_LEVEL..=MAX_LEVEL).map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        LABELS[usize::from(self.0)]
    }

    pub fn emoji(self) -> &'static str {
        EMOJIS[usize::from(self.0)]
    }
}

impl TryFrom<i64> for SatisfactionLevel {
    type Error = LevelOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|level| *level <= MAX_LEVEL)
            .map(Self)
            .ok_or(LevelOutOfRange(value))
    }
}

impl From<SatisfactionLevel> for u8 {
    fn from(level: SatisfactionLevel) -> Self {
        level.0
    }
}

impl From<SatisfactionLevel> for i64 {
    fn from(level: SatisfactionLevel) -> Self {
        i64::from(level.0)
    }
}

impl Display for SatisfactionLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label for a raw level, or [`UNKNOWN_LABEL`] outside `0..=5`.
pub fn label_for(level: i64) -> &'static str {
    SatisfactionLevel::try_from(level).map_or(UNKNOWN_LABEL, SatisfactionLevel::label)
}

/// Emoji for a raw level, or [`UNKNOWN_EMOJI`] outside `0..=5`.
pub fn emoji_for(level: i64) -> &'static str {
    SatisfactionLevel::try_from(level).map_or(UNKNOWN_EMOJI, SatisfactionLevel::emoji)
}

/// Arithmetic mean of the given levels.
///
/// Returns `None` for an empty sample so callers can render a "no data"
/// state instead of a misleading zero.
pub fn average_of<I>(levels: I) -> Option<f64>
where
    I: IntoIterator<Item = SatisfactionLevel>,
{
    let (sum, count) = levels
        .into_iter()
        .fold((0_u64, 0_u64), |(sum, count), level| {
            (sum + u64::from(level.value()), count + 1)
        });

    if count == 0 {
        return None;
    }
    Some(sum as f64 / count as f64)
}

/// Picks the image bucket for an average: rounded half away from zero and
/// clamped into `0..=5`.
pub fn image_bucket_for(average: f64) -> SatisfactionLevel {
    if average.is_nan() {
        return SatisfactionLevel::WORST;
    }
    let rounded = average.round().clamp(f64::from(MIN_LEVEL), f64::from(MAX_LEVEL));
    SatisfactionLevel(rounded as u8)
}

/// Static image path for an average, e.g. `/images/fig4.jpg`.
pub fn image_path_for(average: f64) -> String {
    format!("/images/fig{}.jpg", image_bucket_for(average))
}

/// Formats an average with exactly one decimal place.
pub fn format_average(average: f64) -> String {
    format!("{average:.1}")
}

/// Rounds to one decimal place, half away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Renders `"{emoji} {level} - {label}"`, or `"{emoji} {level}"` without the
/// label.
pub fn display(level: i64, show_label: bool) -> String {
    if show_label {
        format!("{} {level} - {}", emoji_for(level), label_for(level))
    } else {
        format!("{} {level}", emoji_for(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(values: &[u8]) -> Vec<SatisfactionLevel> {
        values
            .iter()
            .map(|value| SatisfactionLevel::new(*value).expect("level in range"))
            .collect()
    }

    #[test]
    fn labels_cover_both_ends_of_the_scale() {
        assert_eq!(label_for(0), "最悪");
        assert_eq!(label_for(5), "最高");
        assert_eq!(label_for(6), UNKNOWN_LABEL);
        assert_eq!(label_for(-1), UNKNOWN_LABEL);
    }

    #[test]
    fn emoji_out_of_range_is_unknown() {
        assert_eq!(emoji_for(0), "😣");
        assert_eq!(emoji_for(5), "😄");
        assert_eq!(emoji_for(42), UNKNOWN_EMOJI);
    }

    #[test]
    fn average_of_sample_and_empty() {
        assert_eq!(average_of(levels(&[3, 4, 2])), Some(3.0));
        assert_eq!(average_of(Vec::new()), None);
        assert_eq!(average_of(levels(&[0])), Some(0.0));
    }

    #[test]
    fn image_bucket_rounds_half_up_and_clamps() {
        assert_eq!(image_bucket_for(3.5).value(), 4);
        assert_eq!(image_bucket_for(3.49).value(), 3);
        assert_eq!(image_bucket_for(9.0).value(), 5);
        assert_eq!(image_bucket_for(-2.0).value(), 0);
        assert_eq!(image_bucket_for(f64::NAN).value(), 0);
        assert_eq!(image_path_for(2.6), "/images/fig3.jpg");
    }

    #[test]
    fn format_average_keeps_one_decimal() {
        assert_eq!(format_average(3.0), "3.0");
        assert_eq!(format_average(3.5), "3.5");
        assert_eq!(format_average(4.0), "4.0");
    }

    #[test]
    fn round_to_tenth_matches_stats_payloads() {
        assert_eq!(round_to_tenth(3.333_333), 3.3);
        assert_eq!(round_to_tenth(2.66), 2.7);
    }

    #[test]
    fn new_rejects_values_above_scale() {
        assert_eq!(SatisfactionLevel::new(6), Err(LevelOutOfRange(6)));
        assert_eq!(SatisfactionLevel::try_from(-3), Err(LevelOutOfRange(-3)));
        assert_eq!(SatisfactionLevel::all().count(), 6);
    }

    #[test]
    fn display_with_and_without_label() {
        assert_eq!(display(4, true), "😊 4 - 良い");
        assert_eq!(display(4, false), "😊 4");
        assert_eq!(display(9, true), "❓ 9 - 不明");
    }

    #[test]
    fn serde_rejects_out_of_range_levels() {
        let level: SatisfactionLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level.value(), 3);
        assert_eq!(serde_json::to_string(&level).unwrap(), "3");
        assert!(serde_json::from_str::<SatisfactionLevel>("7").is_err());
    }
}
