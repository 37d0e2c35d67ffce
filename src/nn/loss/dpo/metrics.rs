//! Batch summaries of DPO rewards for logging.

/// DPO training metrics for one batch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DpoMetrics {
    /// Mean loss over the batch
    pub loss: f64,
    /// Mean implicit reward of chosen responses
    pub chosen_reward: f64,
    /// Mean implicit reward of rejected responses
    pub rejected_reward: f64,
    /// `chosen_reward - rejected_reward`
    pub reward_margin: f64,
    /// Fraction of examples where the chosen reward beats the rejected one
    pub accuracy: f64,
}

impl DpoMetrics {
    /// Summarize per-example losses and rewards. An empty batch yields all zeros.
    pub fn compute(losses: &[f32], chosen_rewards: &[f32], rejected_rewards: &[f32]) -> Self {
        if losses.is_empty() {
            return Self::default();
        }

        let chosen_reward = mean(chosen_rewards);
        let rejected_reward = mean(rejected_rewards);
        let correct = chosen_rewards
            .iter()
            .zip(rejected_rewards)
            .filter(|(c, r)| c > r)
            .count();

        Self {
            loss: mean(losses),
            chosen_reward,
            rejected_reward,
            reward_margin: chosen_reward - rejected_reward,
            accuracy: correct as f64 / chosen_rewards.len() as f64,
        }
    }
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_compute() {
        let m = DpoMetrics::compute(&[0.5, 1.5], &[0.2, -0.1], &[0.1, 0.3]);
        assert!((m.loss - 1.0).abs() < 1e-6);
        assert!((m.chosen_reward - 0.05).abs() < 1e-6);
        assert!((m.rejected_reward - 0.2).abs() < 1e-6);
        assert!((m.reward_margin + 0.15).abs() < 1e-6);
        assert!((m.accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_empty_batch() {
        let m = DpoMetrics::compute(&[], &[], &[]);
        assert_eq!(m, DpoMetrics::default());
        assert_eq!(m.accuracy, 0.0);
    }
}
