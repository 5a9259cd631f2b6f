use chrono::{DateTime, Datelike, Days, NaiveDate, TimeDelta, Utc, Weekday};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MAX_CLIP_PASSES: usize = 64;
const MAX_OCCURRENCES: usize = 100_000;
const WEEK_MS: f64 = 7.0 * 24.0 * 3600.0 * 1000.0;

/// An excluded interval of an axis' value domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Break {
    pub from: f64,
    pub to: f64,
    /// Visible width the break keeps in linear space.
    #[serde(default, rename = "breakSize", alias = "size")]
    pub size: f64,
    /// Period after which the break occurs again. `None` means once.
    #[serde(default)]
    pub repeat: Option<f64>,
    /// Whether points inside the break stay visible. Defaults per axis kind.
    #[serde(default)]
    pub show_points: Option<bool>,
    /// Include `to` in the break.
    #[serde(default)]
    pub inclusive: bool,
}

impl Break {
    pub fn new(from: f64, to: f64) -> Self {
        Self {
            from,
            to,
            size: 0.0,
            repeat: None,
            show_points: None,
            inclusive: false,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_repeat(mut self, repeat: f64) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn with_show_points(mut self, show_points: bool) -> Self {
        self.show_points = Some(show_points);
        self
    }

    pub fn inclusive(mut self) -> Self {
        self.inclusive = true;
        self
    }

    /// A break that hides `span` every week starting at `first`. Values are UTC milliseconds.
    pub fn weekly(first: DateTime<Utc>, span: TimeDelta) -> Self {
        let from = first.timestamp_millis() as f64;
        Self::new(from, from + span.num_milliseconds() as f64).with_repeat(WEEK_MS)
    }

    /// Hides every weekend, starting with the first Saturday on or after `date`.
    pub fn weekends_from(date: NaiveDate) -> Option<Self> {
        let offset = (Weekday::Sat.num_days_from_monday() + 7
            - date.weekday().num_days_from_monday())
            % 7;
        let saturday = date.checked_add_days(Days::new(offset as u64))?;
        let start = saturday.and_hms_opt(0, 0, 0)?.and_utc();
        Some(Self::weekly(start, TimeDelta::days(2)))
    }

    pub fn span(&self) -> f64 {
        self.to - self.from
    }

    /// Length removed from linear space by one occurrence.
    pub fn removed_length(&self) -> f64 {
        self.span() - self.size
    }

    /// Repeat period, infinite for a one-off break.
    pub fn period(&self) -> f64 {
        match self.repeat {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => f64::INFINITY,
        }
    }

    /// Offset of `value` from the start of the occurrence it falls after, if any.
    fn phase(&self, value: f64) -> Option<f64> {
        let period = self.period();
        if period.is_infinite() {
            (value >= self.from).then(|| value - self.from)
        } else {
            Some((value - self.from).rem_euclid(period))
        }
    }

    /// Membership test: `[from, to)`, or `[from, to]` when inclusive, per occurrence.
    pub fn contains(&self, value: f64) -> bool {
        let length = self.span();
        match self.phase(value) {
            Some(test) if self.inclusive => test <= length,
            Some(test) => test < length,
            None => false,
        }
    }

    /// Bounds of the occurrence containing `value`.
    pub fn occurrence_at(&self, value: f64) -> Option<(f64, f64)> {
        if !self.contains(value) {
            return None;
        }
        let start = value - self.phase(value)?;
        Some((start, start + self.span()))
    }
}

/// Parses a JSON array of breaks.
pub fn breaks_from_json(json: &str) -> Result<Vec<Break>> {
    serde_json::from_str(json).wrap_err("failed to parse axis breaks")
}

/// First break in `breaks` containing `value`.
pub fn find_break_at(value: f64, breaks: &[Break]) -> Option<&Break> {
    breaks.iter().find(|b| b.contains(value))
}

/// A concrete, disjoint break occurrence used for translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoalescedBreak {
    pub from: f64,
    pub to: f64,
    /// Length removed from linear space (`to - from - size`).
    pub len: f64,
    /// Total length removed by all breaks preceding this one.
    pub cumulative_before: f64,
}

impl CoalescedBreak {
    fn size(&self) -> f64 {
        self.to - self.from - self.len
    }

    fn linear_start(&self) -> f64 {
        self.from - self.cumulative_before
    }

    fn linear_end(&self) -> f64 {
        self.linear_start() + self.size()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Move {
    In,
    Out { size: f64 },
}

#[derive(Clone, Copy, Debug)]
struct Marker {
    value: f64,
    movement: Move,
}

/// Value <-> linear translation for one break set over one pair of extremes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakTranslation {
    breaks: Vec<CoalescedBreak>,
    min: f64,
    max: f64,
    removed: f64,
    unit_length: f64,
}

impl BreakTranslation {
    /// Translation without breaks.
    pub fn identity(min: f64, max: f64) -> Self {
        Self {
            breaks: Vec::new(),
            min,
            max,
            removed: 0.0,
            unit_length: max - min,
        }
    }

    /// Clips the extremes out of the breaks, expands repeats and coalesces
    /// overlapping occurrences into a disjoint sorted set.
    pub fn compute(breaks: &[Break], min: f64, max: f64) -> Self {
        if breaks.is_empty() {
            return Self::identity(min, max);
        }

        let (min, max) = clip_extremes(breaks, min, max);

        let mut markers = Vec::new();
        for brk in breaks {
            let period = brk.period();
            if let Some(repeat) = brk.repeat.filter(|r| r.is_finite() && *r <= 0.0) {
                warn!(repeat, "non-positive break repeat, treating break as one-off");
            }
            let mut start = if period.is_infinite() {
                brk.from
            } else {
                brk.from + ((min - brk.from) / period).ceil() * period
            };
            if start < min {
                continue;
            }
            let mut count = 0;
            while start < max {
                markers.push(Marker {
                    value: start,
                    movement: Move::In,
                });
                markers.push(Marker {
                    value: start + brk.span(),
                    movement: Move::Out { size: brk.size },
                });
                count += 1;
                if period.is_infinite() {
                    break;
                }
                if count >= MAX_OCCURRENCES {
                    warn!(count, "break repeats too often within the extremes, truncating");
                    break;
                }
                start += period;
            }
        }

        // Entries sort before exits at equal positions so touching breaks merge.
        markers.sort_by(|a, b| {
            a.value.total_cmp(&b.value).then_with(|| {
                let rank = |m: &Marker| matches!(m.movement, Move::Out { .. }) as u8;
                rank(a).cmp(&rank(b))
            })
        });

        let mut coalesced = Vec::new();
        let mut depth = 0i32;
        let mut start = min;
        let mut removed = 0.0;
        for marker in &markers {
            match marker.movement {
                Move::In => {
                    depth += 1;
                    if depth == 1 {
                        start = marker.value;
                    }
                }
                Move::Out { size } => {
                    depth -= 1;
                    if depth == 0 {
                        let len = marker.value - start - size;
                        coalesced.push(CoalescedBreak {
                            from: start,
                            to: marker.value,
                            len,
                            cumulative_before: removed,
                        });
                        removed += len;
                    }
                }
            }
        }

        let unit_length = (max - min - removed).max(0.0);
        debug!(
            input = breaks.len(),
            coalesced = coalesced.len(),
            min,
            max,
            unit_length,
            "recomputed axis breaks"
        );

        Self {
            breaks: coalesced,
            min,
            max,
            removed,
            unit_length,
        }
    }

    pub fn breaks(&self) -> &[CoalescedBreak] {
        &self.breaks
    }

    /// Minimum after clipping out of the breaks.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum after clipping out of the breaks.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Total length removed between the extremes.
    pub fn removed(&self) -> f64 {
        self.removed
    }

    /// Visible span of the axis in linear space.
    pub fn unit_length(&self) -> f64 {
        self.unit_length
    }

    /// Factor by which pixels per unit grow once the breaks are cut out.
    pub fn scale_factor(&self) -> f64 {
        if self.unit_length > 0.0 {
            (self.max - self.min) / self.unit_length
        } else {
            1.0
        }
    }

    /// Converts a value to linear (compressed) space.
    pub fn to_linear(&self, value: f64) -> f64 {
        let idx = self.breaks.partition_point(|b| b.to <= value);
        let removed = match idx.checked_sub(1).map(|i| &self.breaks[i]) {
            Some(prev) => prev.cumulative_before + prev.len,
            None => 0.0,
        };
        match self.breaks.get(idx) {
            // Inside a break -> pinned to the break start
            Some(brk) if brk.from <= value => brk.from - removed,
            _ => value - removed,
        }
    }

    /// Converts a linear value back to value space.
    pub fn to_value(&self, linear: f64) -> f64 {
        let idx = self.breaks.partition_point(|b| b.linear_end() < linear);
        match self.breaks.get(idx) {
            Some(brk) if linear <= brk.linear_start() => linear + brk.cumulative_before,
            // Within the visible stub of a sized break
            Some(brk) => brk.to - (brk.linear_end() - linear),
            None => linear + self.removed,
        }
    }
}

/// Moves `min` forward and `max` backward until neither sits inside a break.
fn clip_extremes(breaks: &[Break], mut min: f64, mut max: f64) -> (f64, f64) {
    for _ in 0..MAX_CLIP_PASSES {
        let mut changed = false;
        for brk in breaks {
            if let Some((_, end)) = brk.occurrence_at(min) {
                if end > min {
                    min = end;
                    changed = true;
                }
            }
            if let Some((start, _)) = brk.occurrence_at(max) {
                if start < max {
                    max = start;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    if max < min {
        max = min;
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_half_open() {
        let brk = Break::new(10.0, 20.0);
        assert!(brk.contains(10.0));
        assert!(brk.contains(19.9));
        assert!(!brk.contains(20.0));
        assert!(!brk.contains(9.9));
        assert!(brk.clone().inclusive().contains(20.0));
    }

    #[test]
    fn test_contains_repeating() {
        let brk = Break::new(5.0, 7.0).with_repeat(10.0);
        assert!(brk.contains(5.0));
        assert!(brk.contains(16.0));
        assert!(brk.contains(-4.0));
        assert!(!brk.contains(8.0));
        assert_eq!(brk.occurrence_at(26.5), Some((25.0, 27.0)));
    }

    #[test]
    fn test_non_positive_repeat_is_one_off() {
        let brk = Break::new(5.0, 7.0).with_repeat(0.0);
        assert!(brk.contains(6.0));
        assert!(!brk.contains(16.0));
    }

    #[test]
    fn test_merge_breaks() {
        let breaks = vec![
            Break::new(100.0, 200.0),
            Break::new(150.0, 250.0),
            Break::new(300.0, 400.0),
        ];
        let t = BreakTranslation::compute(&breaks, 0.0, 1000.0);
        assert_eq!(t.breaks().len(), 2);
        assert_eq!((t.breaks()[0].from, t.breaks()[0].to), (100.0, 250.0));
        assert_eq!((t.breaks()[1].from, t.breaks()[1].to), (300.0, 400.0));
        assert_eq!(t.removed(), 250.0);
        assert_eq!(t.unit_length(), 750.0);
    }

    #[test]
    fn test_adjacent_breaks_merge() {
        let breaks = vec![Break::new(10.0, 20.0), Break::new(20.0, 30.0)];
        let t = BreakTranslation::compute(&breaks, 0.0, 100.0);
        assert_eq!(t.breaks().len(), 1);
        assert_eq!(t.breaks()[0].to, 30.0);
    }

    #[test]
    fn test_mapping() {
        let t = BreakTranslation::compute(&[Break::new(100.0, 200.0)], 0.0, 1000.0);
        assert_eq!(t.to_linear(50.0), 50.0);
        assert_eq!(t.to_value(50.0), 50.0);
        assert_eq!(t.to_linear(150.0), 100.0);
        assert_eq!(t.to_linear(250.0), 150.0);
        assert_eq!(t.to_value(150.0), 250.0);
    }

    #[test]
    fn test_sized_break_keeps_stub() {
        let t = BreakTranslation::compute(&[Break::new(10.0, 20.0).with_size(2.0)], 0.0, 100.0);
        assert_eq!(t.breaks()[0].len, 8.0);
        assert_eq!(t.to_linear(25.0), 17.0);
        assert_eq!(t.to_value(17.0), 25.0);
        assert_eq!(t.to_linear(20.0), 12.0);
        assert_eq!(t.to_value(12.0), 20.0);
    }

    #[test]
    fn test_extremes_clipped_out_of_breaks() {
        let breaks = [Break::new(-5.0, 10.0), Break::new(90.0, 120.0)];
        let t = BreakTranslation::compute(&breaks, 0.0, 100.0);
        assert_eq!(t.min(), 10.0);
        assert_eq!(t.max(), 90.0);
        assert!(t.breaks().is_empty());
    }

    #[test]
    fn test_range_fully_inside_break() {
        let t = BreakTranslation::compute(&[Break::new(0.0, 100.0)], 10.0, 50.0);
        assert_eq!(t.min(), 100.0);
        assert_eq!(t.max(), 100.0);
        assert_eq!(t.unit_length(), 0.0);
        assert_eq!(t.scale_factor(), 1.0);
    }

    #[test]
    fn test_repeating_break_expanded() {
        let t = BreakTranslation::compute(&[Break::new(5.0, 7.0).with_repeat(10.0)], 0.0, 40.0);
        let froms: Vec<f64> = t.breaks().iter().map(|b| b.from).collect();
        assert_eq!(froms, vec![5.0, 15.0, 25.0, 35.0]);
        assert_eq!(t.to_linear(30.0), 24.0);
    }

    #[test]
    fn test_weekends_from() {
        // Wednesday Jan 14th 2026
        let date = NaiveDate::from_ymd_opt(2026, 1, 14).unwrap();
        let brk = Break::weekends_from(date).unwrap();
        // Saturday Jan 17th 2026 00:00 UTC
        assert_eq!(brk.from, 1768608000000.0);
        assert_eq!(brk.span(), 2.0 * 24.0 * 3600.0 * 1000.0);
        assert!(brk.contains(brk.from + WEEK_MS + 1.0));
    }

    #[test]
    fn test_breaks_from_json() {
        let breaks = breaks_from_json(
            r#"[{"from": 1, "to": 3, "breakSize": 0.5},
                {"from": 5, "to": 6, "size": 1, "showPoints": true}]"#,
        )
        .unwrap();
        assert_eq!(breaks[0].size, 0.5);
        assert_eq!(breaks[1].size, 1.0);
        assert_eq!(breaks[1].show_points, Some(true));
    }
}
