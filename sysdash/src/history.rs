//! Rolling history for the performance chart.
//!
//! Every series shares one label axis (display time buckets). A series holds
//! at most one sample per label, and when the axis grows past capacity the
//! oldest label is dropped from the axis and from every series together.

use std::collections::{HashMap, VecDeque};

pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Display time bucket, e.g. `10:00:00`.
    pub timestamp: String,
    pub value: f64,
}

#[derive(Debug)]
pub struct HistoryBuffer {
    capacity: usize,
    labels: VecDeque<String>,
    series: HashMap<String, VecDeque<MetricSample>>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            labels: VecDeque::with_capacity(capacity + 1),
            series: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records `value` for `series` unless that series already has a sample
    /// for `label`. Returns whether a sample was added.
    pub fn append(&mut self, series: &str, label: &str, value: f64) -> bool {
        let samples = self.series.entry(series.to_string()).or_default();
        if samples.back().is_some_and(|last| last.timestamp == label) {
            return false;
        }
        samples.push_back(MetricSample {
            timestamp: label.to_string(),
            value,
        });

        if self.labels.back().is_none_or(|last| last != label) {
            self.labels.push_back(label.to_string());
        }
        while self.labels.len() > self.capacity {
            if let Some(evicted) = self.labels.pop_front() {
                self.evict(&evicted);
            }
        }
        true
    }

    fn evict(&mut self, label: &str) {
        for samples in self.series.values_mut() {
            while samples.front().is_some_and(|s| s.timestamp == label) {
                samples.pop_front();
            }
        }
    }

    /// Values of `series`, oldest first.
    pub fn snapshot(&self, series: &str) -> Vec<f64> {
        self.series
            .get(series)
            .map(|samples| samples.iter().map(|s| s.value).collect())
            .unwrap_or_default()
    }

    pub fn samples(&self, series: &str) -> Vec<MetricSample> {
        self.series
            .get(series)
            .map(|samples| samples.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The shared label axis, oldest first.
    pub fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(i: usize) -> String {
        format!("10:{:02}:{:02}", i / 60, i % 60)
    }

    #[test]
    fn keeps_the_most_recent_samples() {
        let mut buffer = HistoryBuffer::default();
        for i in 0..57 {
            buffer.append("cpu", &label(i), i as f64);
            assert!(buffer.snapshot("cpu").len() <= DEFAULT_CAPACITY);
        }
        let expected: Vec<f64> = (37..57).map(|i| i as f64).collect();
        assert_eq!(buffer.snapshot("cpu"), expected);
        assert_eq!(buffer.labels().first(), Some(&label(37)));
    }

    #[test]
    fn repeated_label_is_a_no_op() {
        let mut buffer = HistoryBuffer::default();
        assert!(buffer.append("cpu", "10:00:00", 5.0));
        assert!(!buffer.append("cpu", "10:00:00", 9.0));
        assert_eq!(buffer.snapshot("cpu"), vec![5.0]);
    }

    #[test]
    fn series_share_the_label_axis() {
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..5 {
            buffer.append("cpu", &label(i), i as f64);
            buffer.append("ram", &label(i), 10.0 + i as f64);
            buffer.append("disk", &label(i), 20.0 + i as f64);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.snapshot("cpu"), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.snapshot("ram"), vec![12.0, 13.0, 14.0]);
        assert_eq!(buffer.snapshot("disk"), vec![22.0, 23.0, 24.0]);
    }

    #[test]
    fn sparse_series_truncate_in_lockstep() {
        let mut buffer = HistoryBuffer::new(2);
        buffer.append("disk", "a", 1.0);
        buffer.append("cpu", "b", 2.0);
        buffer.append("cpu", "c", 3.0);
        assert_eq!(buffer.labels(), vec!["b".to_string(), "c".to_string()]);
        assert!(buffer.snapshot("disk").is_empty());
        assert_eq!(buffer.snapshot("cpu"), vec![2.0, 3.0]);
    }

    #[test]
    fn unknown_series_is_empty() {
        assert!(HistoryBuffer::default().snapshot("gpu").is_empty());
    }
}
