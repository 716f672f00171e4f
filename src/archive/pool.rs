//! Bounded worker pool for per-entry compression and decompression
//!
//! A producer feeds item indices into a bounded channel, a fixed number of
//! workers pull from it, and each worker reports exactly once on a results
//! channel when the work channel runs dry. The aggregator returns only after
//! every worker has reported.

use crate::error::{BroccoliError, Result};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::debug;

/// Everything one worker produced
struct WorkerReport<R> {
    outputs: Vec<(usize, R)>,
    error: Option<BroccoliError>,
}

/// Fixed-size pool applying one transform to many independent items
#[derive(Debug, Clone, Copy)]
pub struct CompressionPool {
    workers: usize,
}

impl CompressionPool {
    /// Create a pool; `0` workers means one per logical CPU
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 {
            num_cpus::get()
        } else {
            workers
        };
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `job` to every item and return the outputs in input order.
    ///
    /// Once any job fails, workers stop starting new items but keep draining
    /// the channel, and the first error received is returned.
    pub fn run<T, R, F>(&self, items: &[T], job: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.workers.min(items.len());
        debug!(workers, items = items.len(), "starting worker pool");

        let (work_tx, work_rx) = bounded::<usize>(workers);
        let (report_tx, report_rx) = bounded::<WorkerReport<R>>(workers);
        let failed = AtomicBool::new(false);
        let job = &job;
        let failed = &failed;

        thread::scope(|s| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let report_tx = report_tx.clone();
                s.spawn(move || {
                    let mut report = WorkerReport {
                        outputs: Vec::new(),
                        error: None,
                    };
                    for index in work_rx {
                        if failed.load(Ordering::Relaxed) {
                            continue;
                        }
                        match job(&items[index]) {
                            Ok(output) => report.outputs.push((index, output)),
                            Err(e) => {
                                failed.store(true, Ordering::Relaxed);
                                report.error.get_or_insert(e);
                            }
                        }
                    }
                    // The aggregator outlives every worker, so this cannot fail
                    let _ = report_tx.send(report);
                });
            }
            drop(work_rx);
            drop(report_tx);

            s.spawn(move || {
                for index in 0..items.len() {
                    if work_tx.send(index).is_err() {
                        break;
                    }
                }
            });

            let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
            let mut first_error = None;
            for report in &report_rx {
                if first_error.is_none() {
                    first_error = report.error;
                }
                for (index, output) in report.outputs {
                    slots[index] = Some(output);
                }
            }

            if let Some(e) = first_error {
                return Err(e);
            }

            slots
                .into_iter()
                .enumerate()
                .map(|(index, slot)| {
                    slot.ok_or_else(|| {
                        BroccoliError::Internal(format!("no worker processed item {}", index))
                    })
                })
                .collect()
        })
    }
}

impl Default for CompressionPool {
    fn default() -> Self {
        Self::new(0)
    }
}
