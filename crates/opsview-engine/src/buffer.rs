//! Bounded retention buffers for trend widgets.
//!
//! Two interchangeable strategies behind one trait: retain the last N
//! samples, or retain a trailing time window. Gap markers (samples with a
//! `None` value) are retained like any other sample.

use std::collections::VecDeque;

use chrono::Duration;
use opsview_model::Sample;

/// Contract shared by both retention strategies. `snapshot` returns samples
/// in chronological (push) order.
pub trait SampleBuffer {
    fn push(&mut self, sample: Sample);
    fn snapshot(&self) -> Vec<Sample>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps the most recent `capacity` samples; pushing past capacity evicts
/// the oldest.
#[derive(Debug)]
pub struct CircularBuffer {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl CircularBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }
}

impl SampleBuffer for CircularBuffer {
    fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Keeps every sample within `window` of the most recently pushed sample;
/// each push evicts everything older than the trailing window.
#[derive(Debug)]
pub struct ExpirationBuffer {
    window: Duration,
    samples: VecDeque<Sample>,
}

impl ExpirationBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn from_millis(window_ms: i64) -> Self {
        Self::new(Duration::milliseconds(window_ms))
    }
}

impl SampleBuffer for ExpirationBuffer {
    fn push(&mut self, sample: Sample) {
        let horizon = sample.time - self.window;
        self.samples.push_back(sample);
        while let Some(front) = self.samples.front() {
            if front.time < horizon {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64, value: f64) -> Sample {
        Sample::new(Utc.timestamp_opt(secs, 0).unwrap(), Some(value))
    }

    #[test]
    fn test_circular_retains_last_n() {
        let mut buffer = CircularBuffer::new(3);
        for i in 0..5 {
            buffer.push(at(i, i as f64));
        }
        let values: Vec<f64> = buffer
            .snapshot()
            .iter()
            .map(|s| s.value.unwrap())
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_expiration_trailing_window() {
        let mut buffer = ExpirationBuffer::new(Duration::seconds(60));
        for t in [10, 20, 30, 40] {
            buffer.push(at(t, t as f64));
        }
        assert_eq!(buffer.len(), 4);

        // newest lands at t=100; everything older than t=40 goes
        buffer.push(at(100, 100.0));
        let times: Vec<i64> = buffer
            .snapshot()
            .iter()
            .map(|s| s.time.timestamp())
            .collect();
        assert_eq!(times, vec![40, 100]);
    }

    #[test]
    fn test_gap_markers_preserved() {
        let mut buffer = CircularBuffer::new(4);
        buffer.push(at(1, 1.0));
        buffer.push(Sample::new(Utc.timestamp_opt(2, 0).unwrap(), None));
        buffer.push(at(3, 3.0));
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[1].value, None);
    }

    #[test]
    fn test_buffers_share_contract() {
        let mut buffers: Vec<Box<dyn SampleBuffer>> = vec![
            Box::new(CircularBuffer::new(10)),
            Box::new(ExpirationBuffer::from_millis(60_000)),
        ];
        for buffer in &mut buffers {
            buffer.push(at(5, 5.0));
            assert_eq!(buffer.snapshot().len(), 1);
        }
    }
}
