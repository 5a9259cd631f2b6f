use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::breaks::{self, Break, BreakTranslation};

/// Decides whether points inside a break stay visible by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisKind {
    /// Continuous value axis. Points in breaks are kept unless a break says otherwise.
    #[default]
    Value,
    /// Category axis, such as a tree grid. Points in breaks are hidden by default.
    Category,
}

impl AxisKind {
    fn default_show_points(self) -> bool {
        matches!(self, Self::Value)
    }
}

/// An axis with excluded intervals.
///
/// The coalesced translation is memoised against a generation counter that
/// advances whenever the breaks or the extremes change.
#[derive(Debug)]
pub struct BrokenAxis {
    kind: AxisKind,
    min: f64,
    max: f64,
    breaks: Vec<Break>,
    generation: u64,
    memo: RwLock<Option<(u64, Arc<BreakTranslation>)>>,
}

impl Clone for BrokenAxis {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            min: self.min,
            max: self.max,
            breaks: self.breaks.clone(),
            generation: self.generation,
            memo: RwLock::new(self.memo.read().clone()),
        }
    }
}

impl BrokenAxis {
    pub fn new(kind: AxisKind, min: f64, max: f64) -> Self {
        Self {
            kind,
            min,
            max,
            breaks: Vec::new(),
            generation: 0,
            memo: RwLock::new(None),
        }
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    /// Extremes as set, before clipping out of the breaks.
    pub fn extremes(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn set_extremes(&mut self, min: f64, max: f64) {
        if self.min != min || self.max != max {
            self.min = min;
            self.max = max;
            self.generation += 1;
        }
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn has_breaks(&self) -> bool {
        !self.breaks.is_empty()
    }

    pub fn set_breaks(&mut self, breaks: Vec<Break>) {
        self.breaks = breaks;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Coalesced translation for the current breaks and extremes, rebuilt lazily.
    pub fn translation(&self) -> Arc<BreakTranslation> {
        if let Some((generation, translation)) = self.memo.read().as_ref() {
            if *generation == self.generation {
                return translation.clone();
            }
        }
        let translation = Arc::new(BreakTranslation::compute(&self.breaks, self.min, self.max));
        *self.memo.write() = Some((self.generation, translation.clone()));
        translation
    }

    pub fn to_linear(&self, value: f64) -> f64 {
        if !self.has_breaks() {
            return value;
        }
        self.translation().to_linear(value)
    }

    pub fn to_value(&self, linear: f64) -> f64 {
        if !self.has_breaks() {
            return linear;
        }
        self.translation().to_value(linear)
    }

    /// Whether `value` falls in any break.
    ///
    /// With `test_keep`, a value is only reported when no containing break
    /// keeps its points visible.
    pub fn is_in_any_break(&self, value: f64, test_keep: bool) -> bool {
        let mut in_break = false;
        let mut keep = false;
        for brk in self.breaks.iter().filter(|b| b.contains(value)) {
            in_break = true;
            keep |= brk
                .show_points
                .unwrap_or_else(|| self.kind.default_show_points());
        }
        if test_keep {
            in_break && !keep
        } else {
            in_break
        }
    }

    pub fn find_break_at(&self, value: f64) -> Option<&Break> {
        breaks::find_break_at(value, &self.breaks)
    }

    /// Drops tick positions that sit in a break hiding its points.
    pub fn filter_ticks(&self, ticks: &[f64]) -> Vec<f64> {
        ticks
            .iter()
            .copied()
            .filter(|&t| !self.is_in_any_break(t, true))
            .collect()
    }
}
