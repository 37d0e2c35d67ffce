pub mod loss;

pub use loss::{DpoConfig, DpoLossType, DpoMetrics, DpoOutput, dpo_loss, dpo_loss_with_config};
