//! Sliding-window statistics per sensor series.
//!
//! Each [`SensorKey`] owns a bounded FIFO of its most recent values. The
//! value under test is always judged against history that excludes itself:
//! [`SlidingWindowStatistics::ingest`] snapshots the window first and only
//! then appends.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::telemetry::{Field, SensorKey};

/// Default number of values kept per series
pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// Bounded FIFO of recent values for one series
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    last_updated: DateTime<Utc>,
}

impl SlidingWindow {
    pub fn new(capacity: usize, created_at: DateTime<Utc>) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            last_updated: created_at,
        }
    }

    /// Append `value`, evicting the oldest entry once full
    pub fn push(&mut self, value: f64, at: DateTime<Utc>) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.last_updated = at;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

/// Pre-insert view of a series handed back by [`SlidingWindowStatistics::ingest`]
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub history: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Sample mean and standard deviation (n - 1 denominator).
///
/// For fewer than two values the deviation is 0 and the mean is the lone
/// value, or 0 for an empty slice.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (values.first().copied().unwrap_or(0.0), 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, variance.sqrt())
}

/// Median of an already sorted slice; 0 when empty
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// (Q1, Q3) by the median-of-halves method. For odd lengths the middle
/// element belongs to neither half.
pub fn quartiles(values: &[f64]) -> (f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let mid = n / 2;
    let upper_start = if n % 2 == 1 { mid + 1 } else { mid };
    (median(&sorted[..mid]), median(&sorted[upper_start..]))
}

/// Digits needed to print any finite f64 exactly
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Round `value` to `places` decimals, ties to even on the exact binary value.
///
/// The decision is made on the full decimal expansion rather than on
/// `value * 10^places`, whose product is itself rounded. So 420.125 becomes
/// 420.12, while 2.675 (stored just below the tie) becomes 2.67.
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (int_part, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    if fraction.len() <= places {
        return value;
    }

    let Ok(mut scaled) = format!("{}{}", int_part, &fraction[..places]).parse::<i128>() else {
        // beyond i128 the value has no fractional precision left
        return value;
    };
    let next = fraction.as_bytes()[places] - b'0';
    let remainder_nonzero = fraction[places + 1..].bytes().any(|b| b != b'0');
    if next > 5 || (next == 5 && (remainder_nonzero || scaled % 2 == 1)) {
        scaled += 1;
    }

    let digits = format!("{:0>width$}", scaled, width = places + 1);
    let split = digits.len() - places;
    let text = if places == 0 {
        digits
    } else {
        format!("{}.{}", &digits[..split], &digits[split..])
    };
    let rounded = text.parse::<f64>().unwrap_or(value);
    rounded.copysign(value)
}

/// Lock-guarded map of sliding windows keyed by (sensor, field)
#[derive(Debug)]
pub struct SlidingWindowStatistics {
    capacity: usize,
    windows: Mutex<HashMap<SensorKey, SlidingWindow>>,
}

impl SlidingWindowStatistics {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot the series for `key`, then append `value` to it.
    ///
    /// The window is created on first use and is updated whatever the caller
    /// decides about the value.
    pub fn ingest(&self, key: &SensorKey, value: f64, at: DateTime<Utc>) -> WindowSnapshot {
        let mut windows = self.windows.lock();
        let window = windows
            .entry(key.clone())
            .or_insert_with(|| SlidingWindow::new(self.capacity, at));
        let history = window.to_vec();
        window.push(value, at);
        drop(windows);

        let (mean, std) = mean_std(&history);
        WindowSnapshot { history, mean, std }
    }

    /// Number of values currently held for `key`
    pub fn len_of(&self, key: &SensorKey) -> usize {
        self.windows.lock().get(key).map(SlidingWindow::len).unwrap_or(0)
    }

    /// Number of tracked series
    pub fn tracked(&self) -> usize {
        self.windows.lock().len()
    }

    /// Window occupancy grouped by sensor, then field
    pub fn occupancy(&self) -> BTreeMap<String, BTreeMap<Field, usize>> {
        let windows = self.windows.lock();
        let mut out: BTreeMap<String, BTreeMap<Field, usize>> = BTreeMap::new();
        for (key, window) in windows.iter() {
            out.entry(key.sensor_id.clone())
                .or_default()
                .insert(key.field, window.len());
        }
        out
    }

    /// Drop series that have not been updated within `timeout`
    pub fn evict_idle(&self, now: DateTime<Utc>, timeout: Duration) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, window| now - window.last_updated() < timeout);
        before - windows.len()
    }
}

impl Default for SlidingWindowStatistics {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
