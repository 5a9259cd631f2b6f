use std::sync::Arc;

use crate::breaks::BreakTranslation;
use crate::broken_axis::BrokenAxis;

/// Linear value -> pixel scale that skips the breaks of an axis.
#[derive(Clone, Debug)]
pub struct AxisScale {
    domain: (f64, f64),
    range: (f64, f64),
    breaks: Option<Arc<BreakTranslation>>,
}

impl AxisScale {
    pub fn new_linear(domain: (f64, f64), range: (f64, f64)) -> Self {
        let mut d_min = domain.0;
        let mut d_max = domain.1;
        if (d_max - d_min).abs() < f64::EPSILON {
            d_min -= 0.5;
            d_max += 0.5;
        }
        Self {
            domain: (d_min, d_max),
            range,
            breaks: None,
        }
    }

    /// Scale over the clipped extremes of `axis`, compressed by its breaks.
    pub fn for_axis(axis: &BrokenAxis, range: (f64, f64)) -> Self {
        if !axis.has_breaks() {
            return Self::new_linear(axis.extremes(), range);
        }
        let translation = axis.translation();
        Self::new_linear((translation.min(), translation.max()), range)
            .with_breaks(Some(translation))
    }

    pub fn with_breaks(mut self, breaks: Option<Arc<BreakTranslation>>) -> Self {
        self.breaks = breaks;
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    fn linear(&self, value: f64) -> f64 {
        match &self.breaks {
            Some(t) => t.to_linear(value),
            None => value,
        }
    }

    /// Length of the domain once breaks are removed.
    fn linear_span(&self) -> f64 {
        let span = self.linear(self.domain.1) - self.linear(self.domain.0);
        if span.abs() < f64::EPSILON {
            1.0
        } else {
            span
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        let ratio = (self.linear(value) - self.linear(self.domain.0)) / self.linear_span();
        let res = self.range.0 + ratio * (self.range.1 - self.range.0);
        if res.is_finite() {
            res
        } else {
            0.0
        }
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let r_span = self.range.1 - self.range.0;
        if r_span.abs() < f64::EPSILON {
            return self.domain.0;
        }
        let linear =
            self.linear(self.domain.0) + (pixel - self.range.0) / r_span * self.linear_span();
        match &self.breaks {
            Some(t) => t.to_value(linear),
            None => linear,
        }
    }

    /// Pixels per value unit, including the break correction.
    pub fn pixels_per_unit(&self) -> f64 {
        (self.range.1 - self.range.0) / self.linear_span()
    }
}
