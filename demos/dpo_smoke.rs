//! Runs the DPO loss on a two-example batch.
//!
//! ```sh
//! DPO_LOG=dpo=debug cargo run --example dpo_smoke
//! ```

use dpo::{Result, dpo_loss};
use numr::autograd::Var;
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numr::tensor::Tensor;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

fn init_tracing() {
    let targets = std::env::var("DPO_LOG")
        .ok()
        .and_then(|v| v.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_target("dpo_smoke", tracing::Level::INFO));
    tracing_subscriber::registry()
        .with(targets)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn logps(values: &[f32], requires_grad: bool, device: &CpuDevice) -> Var<CpuRuntime> {
    Var::new(
        Tensor::<CpuRuntime>::from_slice(values, &[values.len()], device),
        requires_grad,
    )
}

fn main() -> Result<()> {
    init_tracing();

    let device = CpuDevice::new();
    let client = CpuClient::new(device.clone());

    let p_chosen = logps(&[-1.0, -0.5], true, &device);
    let p_rejected = logps(&[-2.0, -1.5], true, &device);
    let r_chosen = logps(&[-1.1, -0.6], false, &device);
    let r_rejected = logps(&[-2.1, -1.6], false, &device);

    let out = dpo_loss(&client, &p_chosen, &p_rejected, &r_chosen, &r_rejected, 0.1)?;
    let losses = out.losses.tensor().to_vec::<f32>();
    let metrics = out.metrics(&client)?;

    tracing::info!(?losses, "DPO loss calculated");
    tracing::info!(
        chosen_reward = metrics.chosen_reward,
        rejected_reward = metrics.rejected_reward,
        accuracy = metrics.accuracy,
        "rewards"
    );
    Ok(())
}
