// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxEV.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::collections::VecDeque;

/// Sliding window over the last `capacity` availability samples
///
/// The window is the only anti-flicker mechanism in front of the switch:
/// the actuator compares its mean, never a single sample, against the threshold.
#[derive(Debug, Clone)]
pub struct SmoothingBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingBuffer {
    /// Create a window primed with `capacity` zero samples
    ///
    /// Automatic modes therefore ramp up over a full window after startup.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut samples = VecDeque::with_capacity(capacity);
        samples.extend(std::iter::repeat_n(0.0, capacity));
        Self { samples, capacity }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, sample: f64) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drop all history and keep only `sample`
    pub fn replace(&mut self, sample: f64) {
        self.samples.clear();
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Arithmetic mean of the window, `0.0` when empty
    #[expect(
        clippy::cast_precision_loss,
        reason = "window length is a handful of samples"
    )]
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_primed_with_zeros() {
        let buffer = SmoothingBuffer::new(5);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.mean(), 0.0);
    }

    #[test]
    fn test_overflow_keeps_last_k_in_order() {
        let mut buffer = SmoothingBuffer::new(5);
        for i in 1..=8 {
            buffer.push(f64::from(i));
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(
            buffer.samples().collect::<Vec<_>>(),
            vec![4.0, 5.0, 6.0, 7.0, 8.0]
        );
        assert_eq!(buffer.mean(), 6.0);
    }

    #[test]
    fn test_empty_mean_is_zero() {
        let mut buffer = SmoothingBuffer::new(3);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.mean(), 0.0);
    }

    #[test]
    fn test_replace_discards_history() {
        let mut buffer = SmoothingBuffer::new(5);
        for _ in 0..5 {
            buffer.push(9000.0);
        }
        buffer.replace(0.0);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.mean(), 0.0);
    }

    #[test]
    fn test_push_after_replace_grows_back_to_capacity() {
        let mut buffer = SmoothingBuffer::new(3);
        buffer.replace(2500.0);
        buffer.push(500.0);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.mean(), 1500.0);

        buffer.push(0.0);
        buffer.push(0.0);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.samples().collect::<Vec<_>>(), vec![500.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut buffer = SmoothingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push(7.0);
        buffer.push(9.0);
        assert_eq!(buffer.samples().collect::<Vec<_>>(), vec![9.0]);
    }
}
