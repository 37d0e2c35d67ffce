//! Direct Preference Optimization loss.
//!
//! Rafailov et al., "Direct Preference Optimization: Your Language Model is
//! Secretly a Reward Model", 2023.
//!
//! ```text
//! chosen_logratios   = policy_chosen_logps   - ref_chosen_logps
//! rejected_logratios = policy_rejected_logps - ref_rejected_logps
//! logits             = beta * (chosen_logratios - rejected_logratios)
//! losses             = -log(sigmoid(logits))
//! chosen_rewards     = beta * chosen_logratios      (detached)
//! rejected_rewards   = beta * rejected_logratios    (detached)
//! ```

pub mod config;
pub mod metrics;

pub use config::{DpoConfig, DpoLossType};
pub use metrics::DpoMetrics;

use super::all_dims;
use crate::error::{Error, Result};
use crate::ops::var_log_sigmoid;
use numr::autograd::{
    Var, var_add, var_add_scalar, var_mean, var_mul_scalar, var_pow_scalar, var_sub,
};
use numr::dtype::DType;
use numr::ops::{ScalarOps, TensorOps, TypeConversionOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Per-example DPO loss and implicit rewards.
///
/// `losses` stays on the autograd graph. The rewards are plain tensors with
/// no gradient history; they exist for logging only.
pub struct DpoOutput<R: Runtime> {
    /// `[N]` per-example loss
    pub losses: Var<R>,
    /// `[N]` `beta * (policy_chosen_logps - ref_chosen_logps)`
    pub chosen_rewards: Tensor<R>,
    /// `[N]` `beta * (policy_rejected_logps - ref_rejected_logps)`
    pub rejected_rewards: Tensor<R>,
}

impl<R: Runtime<DType = DType>> DpoOutput<R> {
    /// Batch size.
    pub fn len(&self) -> usize {
        self.losses.shape().iter().product()
    }

    /// True for a zero-example batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar mean of `losses`, attached to the graph for `backward`.
    pub fn mean_loss<C>(&self, client: &C) -> Result<Var<R>>
    where
        C: RuntimeClient<R> + TensorOps<R>,
        R::Client: TensorOps<R> + ScalarOps<R>,
    {
        var_mean(
            &self.losses,
            &all_dims(self.losses.shape().len()),
            false,
            client,
        )
        .map_err(Error::Numr)
    }

    /// Batch summary of losses and rewards.
    pub fn metrics<C>(&self, client: &C) -> Result<DpoMetrics>
    where
        C: RuntimeClient<R> + TypeConversionOps<R>,
    {
        let losses = to_f32_vec(client, self.losses.tensor())?;
        let chosen = to_f32_vec(client, &self.chosen_rewards)?;
        let rejected = to_f32_vec(client, &self.rejected_rewards)?;
        Ok(DpoMetrics::compute(&losses, &chosen, &rejected))
    }
}

fn to_f32_vec<R, C>(client: &C, t: &Tensor<R>) -> Result<Vec<f32>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + TypeConversionOps<R>,
{
    if t.dtype() == DType::F32 {
        Ok(t.to_vec())
    } else {
        let t = client.cast(t, DType::F32).map_err(Error::Numr)?;
        Ok(t.to_vec())
    }
}

/// DPO loss with the standard sigmoid objective and no label smoothing.
///
/// - `policy_chosen_logps`, `policy_rejected_logps`: `[N]` sequence log-probs from the
///   policy being trained. Gradients flow back into these.
/// - `ref_chosen_logps`, `ref_rejected_logps`: `[N]` log-probs from the frozen reference.
/// - `beta`: temperature. Typical: 0.1.
///
/// All four inputs must have the same shape; broadcasting is not applied.
pub fn dpo_loss<R, C>(
    client: &C,
    policy_chosen_logps: &Var<R>,
    policy_rejected_logps: &Var<R>,
    ref_chosen_logps: &Var<R>,
    ref_rejected_logps: &Var<R>,
    beta: f64,
) -> Result<DpoOutput<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + TensorOps<R> + ScalarOps<R>,
    R::Client: TensorOps<R> + ScalarOps<R>,
{
    dpo_loss_with_config(
        client,
        policy_chosen_logps,
        policy_rejected_logps,
        ref_chosen_logps,
        ref_rejected_logps,
        &DpoConfig::new(beta),
    )
}

/// DPO loss with an explicit [`DpoConfig`] (loss variant, label smoothing).
pub fn dpo_loss_with_config<R, C>(
    client: &C,
    policy_chosen_logps: &Var<R>,
    policy_rejected_logps: &Var<R>,
    ref_chosen_logps: &Var<R>,
    ref_rejected_logps: &Var<R>,
    config: &DpoConfig,
) -> Result<DpoOutput<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + TensorOps<R> + ScalarOps<R>,
    R::Client: TensorOps<R> + ScalarOps<R>,
{
    config.validate()?;

    let shape = policy_chosen_logps.shape();
    check_shape("policy_rejected_logps", shape, policy_rejected_logps)?;
    check_shape("ref_chosen_logps", shape, ref_chosen_logps)?;
    check_shape("ref_rejected_logps", shape, ref_rejected_logps)?;

    let beta = config.beta;

    let chosen_logratios =
        var_sub(policy_chosen_logps, ref_chosen_logps, client).map_err(Error::Numr)?;
    let rejected_logratios =
        var_sub(policy_rejected_logps, ref_rejected_logps, client).map_err(Error::Numr)?;

    let margin = var_sub(&chosen_logratios, &rejected_logratios, client).map_err(Error::Numr)?;
    let logits = var_mul_scalar(&margin, beta, client).map_err(Error::Numr)?;

    let losses = match config.loss_type {
        DpoLossType::Sigmoid => sigmoid_loss(client, &logits, config.label_smoothing)?,
        DpoLossType::Ipo => ipo_loss(client, &logits, beta)?,
    };

    // Rewards are computed from the raw tensors, off the graph
    let chosen_rewards = client
        .mul_scalar(chosen_logratios.tensor(), beta)
        .map_err(Error::Numr)?;
    let rejected_rewards = client
        .mul_scalar(rejected_logratios.tensor(), beta)
        .map_err(Error::Numr)?;

    tracing::debug!(
        batch = shape.iter().product::<usize>(),
        beta,
        loss_type = ?config.loss_type,
        label_smoothing = config.label_smoothing,
        "dpo loss"
    );

    Ok(DpoOutput {
        losses,
        chosen_rewards,
        rejected_rewards,
    })
}

fn check_shape<R: Runtime>(arg: &'static str, expected: &[usize], v: &Var<R>) -> Result<()> {
    if v.shape() != expected {
        return Err(Error::ShapeMismatch {
            arg,
            expected: expected.to_vec(),
            got: v.shape().to_vec(),
        });
    }
    Ok(())
}

/// `-(1 - s) * log_sigmoid(logits) - s * log_sigmoid(-logits)`
fn sigmoid_loss<R, C>(client: &C, logits: &Var<R>, label_smoothing: f64) -> Result<Var<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + TensorOps<R> + ScalarOps<R>,
    R::Client: TensorOps<R> + ScalarOps<R>,
{
    // var_neg's backward does not link to its input's grad_fn; negate by scaling instead
    let log_p = var_log_sigmoid(client, logits)?;
    let pos_loss = var_mul_scalar(&log_p, -1.0, client).map_err(Error::Numr)?;
    // -0.0 + 0.0 == +0.0 for logits large enough that log_sigmoid rounds to zero
    let pos_loss = var_add_scalar(&pos_loss, 0.0, client).map_err(Error::Numr)?;
    if label_smoothing == 0.0 {
        return Ok(pos_loss);
    }

    let neg_logits = var_mul_scalar(logits, -1.0, client).map_err(Error::Numr)?;
    let log_q = var_log_sigmoid(client, &neg_logits)?;
    let neg_loss = var_mul_scalar(&log_q, -1.0, client).map_err(Error::Numr)?;

    let pos = var_mul_scalar(&pos_loss, 1.0 - label_smoothing, client).map_err(Error::Numr)?;
    let neg = var_mul_scalar(&neg_loss, label_smoothing, client).map_err(Error::Numr)?;
    var_add(&pos, &neg, client).map_err(Error::Numr)
}

/// `(logits - 1 / (2 * beta))^2`
fn ipo_loss<R, C>(client: &C, logits: &Var<R>, beta: f64) -> Result<Var<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + TensorOps<R> + ScalarOps<R>,
    R::Client: TensorOps<R> + ScalarOps<R>,
{
    let diff = var_add_scalar(logits, -1.0 / (2.0 * beta), client).map_err(Error::Numr)?;
    var_pow_scalar(&diff, 2.0, client).map_err(Error::Numr)
}
