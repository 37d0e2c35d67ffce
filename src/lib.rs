//! # dpo
//!
//! **Direct Preference Optimization loss built on numr.**
//!
//! Computes the per-example DPO loss and the implicit chosen/rejected rewards
//! from policy and reference log-probabilities. The loss is a numr `Var` on the
//! autograd graph; the rewards are plain tensors for logging.
//!
//! ```text
//! policy / reference model ──► logps ──► dpo_loss ──► losses ──► backward
//!                                                └──► rewards ──► metrics
//! ```
//!
//! ## Design
//!
//! - **Generic over runtimes**: every op takes a numr client and runs on any numr backend
//! - **Stable log-sigmoid**: custom autograd op, finite for any finite logit
//! - **No broadcasting**: inputs of different shapes are rejected, never padded

pub mod error;
pub mod nn;
pub mod ops;

pub use error::{Error, Result};
pub use nn::loss::{
    DpoConfig, DpoLossType, DpoMetrics, DpoOutput, dpo_loss, dpo_loss_with_config,
};
pub use ops::var_log_sigmoid;

// Re-export numr types that users will commonly need
pub use numr::autograd::Var;
pub use numr::dtype::DType;
pub use numr::runtime::{Runtime, RuntimeClient};
pub use numr::tensor::Tensor;

#[cfg(test)]
pub(crate) mod test_utils {
    use numr::runtime::cpu::{CpuClient, CpuDevice};

    /// Create a CPU client and device for use in unit tests.
    pub(crate) fn cpu_setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }
}
