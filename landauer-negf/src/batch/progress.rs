// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

/// Completion fraction shared by the workers of a batch.
///
/// Each worker thread adds to its own slot, the fraction is the sum over slots. Reads are
/// eventually consistent with the writes, reports handed to a sink never decrease.
pub(crate) struct ProgressTracker {
    slots: Vec<AtomicU64>,
    increment: f64,
    reported: Mutex<f64>,
}

impl ProgressTracker {
    /// A tracker for `count` equally weighted items
    pub(crate) fn new(count: usize) -> Self {
        // One slot per pool thread, and a final one for callers outside the pool
        let slots = (0..=rayon::current_num_threads())
            .map(|_| AtomicU64::new(0_f64.to_bits()))
            .collect();
        Self {
            slots,
            increment: if count == 0 { 1. } else { 1. / count as f64 },
            reported: Mutex::new(0.),
        }
    }

    /// Records one completed item against the calling worker
    pub(crate) fn complete_one(&self) {
        let last = self.slots.len() - 1;
        let slot = rayon::current_thread_index().map_or(last, |index| index.min(last));
        let _ = self.slots[slot].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f64::from_bits(bits) + self.increment).to_bits())
        });
    }

    /// The completed fraction, clamped into `[0, 1]`
    pub(crate) fn fraction(&self) -> f64 {
        self.slots
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .sum::<f64>()
            .clamp(0., 1.)
    }

    /// Hands the completed fraction to `report` if it exceeds every earlier report.
    ///
    /// Skipped while another worker is reporting, the batch closes with a report of `1.0`.
    pub(crate) fn report_with(&self, report: impl FnOnce(f64)) {
        if let Ok(mut reported) = self.reported.try_lock() {
            let fraction = self.fraction();
            if fraction > *reported {
                *reported = fraction;
                report(fraction);
            }
        }
    }
}
