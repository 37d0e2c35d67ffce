//! Autograd integration for log-sigmoid
//!
//! `log(sigmoid(x))` evaluated as `min(x, 0) - log1p(exp(-|x|))` so that
//! large negative inputs neither overflow `exp(-x)` nor underflow `sigmoid(x)`
//! to zero before the log. `log1p` keeps the tail for large positive inputs,
//! where `1 + exp(-|x|)` would round to exactly one.

use crate::error::{Error, Result};
use numr::autograd::{GradFn, TensorId, Var};
use numr::dtype::DType;
use numr::ops::{ActivationOps, BinaryOps, ScalarOps, UnaryOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;
use std::sync::Arc;

/// Backward function for log-sigmoid.
///
/// Saved state: the forward input `x`.
/// `d/dx log(sigmoid(x)) = sigmoid(-x)`, which is bounded in `[0, 1]` for every `x`.
struct LogSigmoidBackward<R: Runtime> {
    input_ids: [TensorId; 1],
    saved_tensors: Vec<Tensor<R>>, // [x]
    input_grad_fns: [Option<Arc<dyn GradFn<R>>>; 1],
}

impl<R: Runtime> GradFn<R> for LogSigmoidBackward<R>
where
    R::Client: ActivationOps<R> + BinaryOps<R> + ScalarOps<R>,
{
    fn backward(&self, grad_output: &Tensor<R>) -> numr::error::Result<Vec<Option<Tensor<R>>>> {
        let client = R::default_client(grad_output.device());
        let x = &self.saved_tensors[0];

        let neg_x = client.mul_scalar(x, -1.0)?;
        let slope = client.sigmoid(&neg_x)?;
        let dx = client.mul(grad_output, &slope)?;

        Ok(vec![Some(dx)])
    }

    fn backward_var(&self, grad_output: &Var<R>) -> numr::error::Result<Vec<Option<Var<R>>>> {
        // First-order only
        let grads = self.backward(grad_output.tensor())?;
        Ok(grads
            .into_iter()
            .map(|g| g.map(|t| Var::new(t, false)))
            .collect())
    }

    fn inputs(&self) -> &[TensorId] {
        &self.input_ids
    }

    fn input_grad_fns(&self) -> Vec<Option<Arc<dyn GradFn<R>>>> {
        self.input_grad_fns.to_vec()
    }

    fn saved_tensors(&self) -> &[Tensor<R>] {
        &self.saved_tensors
    }

    fn name(&self) -> &'static str {
        "LogSigmoidBackward"
    }
}

/// Numerically stable `log(sigmoid(x))` on plain tensors.
///
/// Finite for every finite `x`: at `x = -100` this returns `-100`, not `-inf`.
pub fn log_sigmoid<R, C>(client: &C, x: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + BinaryOps<R> + UnaryOps<R> + ScalarOps<R>,
{
    let abs_x = client.abs(x).map_err(Error::Numr)?;

    // min(x, 0) = (x - |x|) / 2
    let diff = client.sub(x, &abs_x).map_err(Error::Numr)?;
    let min_x_0 = client.mul_scalar(&diff, 0.5).map_err(Error::Numr)?;

    // log1p(exp(-|x|)), exp argument is always <= 0
    let neg_abs = client.mul_scalar(&abs_x, -1.0).map_err(Error::Numr)?;
    let e = client.exp(&neg_abs).map_err(Error::Numr)?;
    let log_term = client.log1p(&e).map_err(Error::Numr)?;

    client.sub(&min_x_0, &log_term).map_err(Error::Numr)
}

/// Log-sigmoid with autograd tracking.
///
/// When `x` requires grad, the backward pass is registered; otherwise the
/// result is a leaf `Var`.
pub fn var_log_sigmoid<R, C>(client: &C, x: &Var<R>) -> Result<Var<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R> + BinaryOps<R> + UnaryOps<R> + ScalarOps<R>,
    R::Client: ActivationOps<R> + BinaryOps<R> + ScalarOps<R>,
{
    let output = log_sigmoid(client, x.tensor())?;

    if x.requires_grad() {
        let grad_fn = LogSigmoidBackward {
            input_ids: [x.id()],
            saved_tensors: vec![x.tensor().clone()],
            input_grad_fns: [x.grad_fn().cloned()],
        };
        Ok(Var::from_op(output, Arc::new(grad_fn)))
    } else {
        Ok(Var::new(output, false))
    }
}
