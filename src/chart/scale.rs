use chrono::{Datelike, Duration, NaiveDate};

/// Maps calendar dates onto a pixel range. Dates sit at midnight, so a
/// fractional day position always belongs to the earlier date.
#[derive(Debug, Clone, Copy)]
pub struct TimeScale {
    domain: [NaiveDate; 2],
    range: [f64; 2],
}

impl TimeScale {
    pub fn new(domain: [NaiveDate; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    fn span_days(&self) -> f64 {
        ((self.domain[1] - self.domain[0]).num_days() as f64).max(1.0)
    }

    pub fn map(&self, date: NaiveDate) -> f64 {
        let days = (date - self.domain[0]).num_days() as f64;
        self.range[0] + days / self.span_days() * (self.range[1] - self.range[0])
    }

    /// Clamps `x` into the range and returns the date under it, truncated to
    /// the day.
    pub fn invert(&self, x: f64) -> NaiveDate {
        let (lo, hi) = (self.range[0].min(self.range[1]), self.range[0].max(self.range[1]));
        let x = x.clamp(lo, hi);
        let width = self.range[1] - self.range[0];
        let fraction = if width == 0.0 { 0.0 } else { (x - self.range[0]) / width };
        // Nudge before flooring so a pixel produced by `map` inverts to its own day.
        let days = (fraction * self.span_days() + 1e-9).floor() as i64;
        self.domain[0] + Duration::days(days)
    }

    /// First day of every month inside the domain.
    pub fn month_ticks(&self) -> Vec<NaiveDate> {
        let mut ticks = Vec::new();
        let start = self.domain[0];
        let mut cursor = if start.day() == 1 {
            Some(start)
        } else {
            next_month(start)
        };
        while let Some(date) = cursor {
            if date > self.domain[1] {
                break;
            }
            ticks.push(date);
            cursor = next_month(date);
        }
        ticks
    }
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        let span = self.domain[1] - self.domain[0];
        if span == 0.0 {
            return self.range[0];
        }
        self.range[0] + (value - self.domain[0]) / span * (self.range[1] - self.range[0])
    }

    /// Round tick values (steps of 1, 2 or 5 times a power of ten), about
    /// `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = (self.domain[0].min(self.domain[1]), self.domain[0].max(self.domain[1]));
        if count == 0 || lo == hi {
            return vec![lo];
        }
        let step = tick_step(lo, hi, count);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}
