// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics collector: labeled counters, gauges, histograms
//!
//! Histograms keep a bounded sliding window backing `sum`: when the window
//! is full the oldest recording is evicted and subtracted from `sum`.
//! `count` and the bucket counters track lifetime recordings and are never
//! decremented, so the `+Inf` bucket always equals `count`. Readers
//! computing `sum/count` averages will see biased results once eviction
//! begins; this is inherited behavior, kept deliberately.
//!
//! Export is Prometheus text format. HTTP serving is not this module's
//! concern; callers fetch the serialized text on request.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Fixed histogram bucket upper bounds, `+Inf` implied.
pub const DEFAULT_BUCKETS: [f64; 11] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Default sliding-window capacity per histogram.
pub const DEFAULT_WINDOW: usize = 10_000;

type LabelSet = Vec<(String, String)>;

#[derive(Debug, Default)]
struct CounterFamily {
    help: Option<String>,
    series: Vec<(LabelSet, f64)>,
}

impl CounterFamily {
    fn series_mut(&mut self, labels: LabelSet) -> &mut f64 {
        if let Some(idx) = self.series.iter().position(|(l, _)| *l == labels) {
            return &mut self.series[idx].1;
        }
        self.series.push((labels, 0.0));
        let idx = self.series.len() - 1;
        &mut self.series[idx].1
    }
}

#[derive(Debug)]
struct Histogram {
    window: VecDeque<f64>,
    capacity: usize,
    buckets: [u64; DEFAULT_BUCKETS.len()],
    sum: f64,
    count: u64,
}

impl Histogram {
    fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            buckets: [0; DEFAULT_BUCKETS.len()],
            sum: 0.0,
            count: 0,
        }
    }

    fn record(&mut self, value: f64) {
        if self.window.len() == self.capacity {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
        self.window.push_back(value);
        self.sum += value;
        self.count += 1;
        for (i, le) in DEFAULT_BUCKETS.iter().enumerate() {
            if value <= *le {
                self.buckets[i] += 1;
            }
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    counters: HashMap<String, CounterFamily>,
    counter_order: Vec<String>,
    gauges: HashMap<String, f64>,
    gauge_order: Vec<String>,
    histograms: HashMap<String, Histogram>,
    histogram_order: Vec<String>,
}

/// Thread-safe metrics registry, one per runtime.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    window: usize,
    inner: Mutex<Inner>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self { window: DEFAULT_WINDOW, inner: Mutex::new(Inner::default()) }
    }

    /// Override the histogram sliding-window capacity (test hook).
    pub fn with_window(window: usize) -> Self {
        Self { window: window.max(1), inner: Mutex::new(Inner::default()) }
    }

    /// Pre-declare a counter with help text. Counters touched without a
    /// declaration are auto-created without help.
    pub fn declare_counter(&self, name: &str, help: &str) {
        let mut inner = self.inner.lock();
        if !inner.counters.contains_key(name) {
            inner.counter_order.push(name.to_string());
        }
        let family = inner.counters.entry(name.to_string()).or_default();
        family.help = Some(help.to_string());
    }

    /// Increment a counter series by `by` (label tuple keys the series).
    pub fn increment(&self, name: &str, by: f64, labels: &[(&str, &str)]) {
        let key = normalize_labels(labels);
        let mut inner = self.inner.lock();
        if !inner.counters.contains_key(name) {
            inner.counter_order.push(name.to_string());
        }
        let family = inner.counters.entry(name.to_string()).or_default();
        *family.series_mut(key) += by;
    }

    /// Current value of a counter series; 0 if the series was never touched.
    pub fn get(&self, name: &str, labels: &[(&str, &str)]) -> f64 {
        let key = normalize_labels(labels);
        let inner = self.inner.lock();
        inner
            .counters
            .get(name)
            .and_then(|f| f.series.iter().find(|(l, _)| *l == key))
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    /// Set a gauge; last write wins.
    pub fn set_gauge(&self, name: &str, value: f64) {
        let mut inner = self.inner.lock();
        if !inner.gauges.contains_key(name) {
            inner.gauge_order.push(name.to_string());
        }
        inner.gauges.insert(name.to_string(), value);
    }

    pub fn get_gauge(&self, name: &str) -> Option<f64> {
        self.inner.lock().gauges.get(name).copied()
    }

    /// Record one histogram observation.
    pub fn record(&self, name: &str, value: f64) {
        let mut inner = self.inner.lock();
        if !inner.histograms.contains_key(name) {
            inner.histogram_order.push(name.to_string());
        }
        let window = self.window;
        inner
            .histograms
            .entry(name.to_string())
            .or_insert_with(|| Histogram::new(window))
            .record(value);
    }

    /// Histogram `(sum, count)` snapshot; `(0, 0)` when never recorded.
    pub fn histogram_stats(&self, name: &str) -> (f64, u64) {
        let inner = self.inner.lock();
        inner.histograms.get(name).map(|h| (h.sum, h.count)).unwrap_or((0.0, 0))
    }

    /// Drop every series. A reset followed by no operations exports as the
    /// empty string.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
    }

    /// Serialize in Prometheus text format: `# HELP` (when declared),
    /// `# TYPE`, then one line per series; empty label sets omit the brace
    /// group.
    pub fn export_prometheus(&self) -> String {
        let inner = self.inner.lock();
        let mut out = String::new();

        for name in &inner.counter_order {
            let Some(family) = inner.counters.get(name) else { continue };
            if let Some(help) = &family.help {
                out.push_str(&format!("# HELP {name} {help}\n"));
            }
            out.push_str(&format!("# TYPE {name} counter\n"));
            for (labels, value) in &family.series {
                out.push_str(&format!("{}{} {}\n", name, render_labels(labels), fmt_sample(*value)));
            }
        }

        for name in &inner.gauge_order {
            let Some(value) = inner.gauges.get(name) else { continue };
            out.push_str(&format!("# TYPE {name} gauge\n"));
            out.push_str(&format!("{} {}\n", name, fmt_sample(*value)));
        }

        for name in &inner.histogram_order {
            let Some(h) = inner.histograms.get(name) else { continue };
            out.push_str(&format!("# TYPE {name} histogram\n"));
            for (i, le) in DEFAULT_BUCKETS.iter().enumerate() {
                out.push_str(&format!(
                    "{name}_bucket{{le=\"{}\"}} {}\n",
                    fmt_sample(*le),
                    h.buckets[i]
                ));
            }
            out.push_str(&format!("{name}_bucket{{le=\"+Inf\"}} {}\n", h.count));
            out.push_str(&format!("{name}_sum {}\n", fmt_sample(h.sum)));
            out.push_str(&format!("{name}_count {}\n", h.count));
        }

        out
    }
}

/// Sort labels so the tuple keys a series regardless of argument order.
fn normalize_labels(labels: &[(&str, &str)]) -> LabelSet {
    let mut v: LabelSet =
        labels.iter().map(|(k, val)| (k.to_string(), val.to_string())).collect();
    v.sort();
    v
}

fn render_labels(labels: &LabelSet) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let body = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn fmt_sample(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
