//! Global parallelization and iteration policy
//!
//! Every kernel reads the installed [`Control`] once on entry. The policy only
//! changes how work is split across threads and never the computed result,
//! with the exception of `svd_max_iterations`, which bounds the SVD sweep
//! count.

use crate::parallel::{self, Parallelism};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

static CONTROL: RwLock<Option<Control>> = RwLock::new(None);

/// Thresholds and budgets shared by all kernels.
///
/// Missing fields fall back to their defaults when deserializing, so a host
/// configuration file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Worker budget for recursive splitting (1 = sequential)
    pub max_degree_of_parallelism: usize,
    /// GEMM recursion stops once `m + n` drops to this value
    pub parallelize_order: usize,
    /// Vector length at which elementwise kernels go parallel
    pub parallelize_elements: usize,
    /// Column count above which the Cholesky trailing update splits
    pub cholesky_split_columns: usize,
    /// Column count above which a Householder application splits
    pub qr_split_columns: usize,
    /// QR sweeps allowed per singular value
    pub svd_max_iterations: usize,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            max_degree_of_parallelism: parallel::available_threads(),
            parallelize_order: 64,
            parallelize_elements: 300,
            cholesky_split_columns: 200,
            qr_split_columns: 200,
            svd_max_iterations: 1000,
        }
    }
}

impl Control {
    /// Default thresholds with every kernel forced onto the calling thread.
    pub fn sequential() -> Self {
        Self {
            max_degree_of_parallelism: 1,
            ..Default::default()
        }
    }

    /// Set the worker budget (clamped to at least 1).
    pub fn with_max_degree_of_parallelism(mut self, workers: usize) -> Self {
        self.max_degree_of_parallelism = workers.max(1);
        self
    }

    /// Set the GEMM recursion threshold.
    pub fn with_parallelize_order(mut self, order: usize) -> Self {
        self.parallelize_order = order;
        self
    }

    /// Set the elementwise parallelization length.
    pub fn with_parallelize_elements(mut self, elements: usize) -> Self {
        self.parallelize_elements = elements;
        self
    }

    /// Set the Cholesky split threshold.
    pub fn with_cholesky_split_columns(mut self, columns: usize) -> Self {
        self.cholesky_split_columns = columns;
        self
    }

    /// Set the QR split threshold.
    pub fn with_qr_split_columns(mut self, columns: usize) -> Self {
        self.qr_split_columns = columns;
        self
    }

    /// Set the SVD sweep limit.
    pub fn with_svd_max_iterations(mut self, iterations: usize) -> Self {
        self.svd_max_iterations = iterations;
        self
    }

    /// The installed policy, or the defaults if none was installed.
    pub fn global() -> Control {
        let guard = CONTROL.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone().unwrap_or_default()
    }

    /// Replace the global policy.
    pub fn install(self) {
        log::debug!("installing kernel control: {self:?}");
        let mut guard = CONTROL
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(self);
    }

    /// Restore the default policy.
    pub fn reset() {
        let mut guard = CONTROL
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }

    /// Worker budget as a [`Parallelism`] value.
    pub fn parallelism(&self) -> Parallelism {
        if self.max_degree_of_parallelism > 1 && parallel::is_parallel_available() {
            Parallelism::Rayon(self.max_degree_of_parallelism)
        } else {
            Parallelism::None
        }
    }

    /// Whether a workload touching `elements` values should be spread across
    /// threads.
    pub fn worth_parallelizing(&self, elements: usize) -> bool {
        self.parallelism().is_parallel() && elements >= self.parallelize_elements
    }
}
