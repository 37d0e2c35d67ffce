//! Loss functions for preference training.
//!
//! | Function | Use case |
//! |---|---|
//! | [`dpo_loss`] | Direct Preference Optimization (sigmoid loss) |
//! | [`dpo_loss_with_config`] | DPO with label smoothing or the IPO objective |

pub mod dpo;

pub use dpo::{DpoConfig, DpoLossType, DpoMetrics, DpoOutput, dpo_loss, dpo_loss_with_config};

/// All dimension indices for a tensor (for full reductions).
fn all_dims(ndim: usize) -> Vec<usize> {
    (0..ndim).collect()
}
