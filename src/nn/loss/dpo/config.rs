//! DPO loss configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Preference loss applied to the DPO logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DpoLossType {
    /// `-log(sigmoid(logits))`, the loss from Rafailov et al., 2023.
    #[default]
    Sigmoid,
    /// `(logits - 1 / (2 * beta))^2`, Azar et al., 2023.
    Ipo,
}

/// DPO configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpoConfig {
    /// Temperature on the log-ratio difference. Typical: 0.1 to 0.5.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Probability that a preference label is flipped (conservative DPO).
    /// Sigmoid loss only, in `[0, 0.5]`.
    #[serde(default)]
    pub label_smoothing: f64,

    /// Objective applied to the scaled logits. Defaults to sigmoid.
    #[serde(default)]
    pub loss_type: DpoLossType,
}

fn default_beta() -> f64 {
    0.1
}

impl Default for DpoConfig {
    fn default() -> Self {
        Self {
            beta: default_beta(),
            label_smoothing: 0.0,
            loss_type: DpoLossType::Sigmoid,
        }
    }
}

impl DpoConfig {
    /// Sigmoid loss with the given `beta` and no label smoothing.
    pub fn new(beta: f64) -> Self {
        Self {
            beta,
            ..Self::default()
        }
    }

    /// Set the label-flip probability. Checked by [`DpoConfig::validate`].
    pub fn with_label_smoothing(mut self, label_smoothing: f64) -> Self {
        self.label_smoothing = label_smoothing;
        self
    }

    /// Select the sigmoid or IPO objective.
    pub fn with_loss_type(mut self, loss_type: DpoLossType) -> Self {
        self.loss_type = loss_type;
        self
    }

    /// Validate configuration constraints.
    ///
    /// The sign of `beta` is not checked: zero or negative values only rescale
    /// or flip the sigmoid loss.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.label_smoothing) {
            return Err(Error::InvalidArgument {
                arg: "label_smoothing",
                reason: format!("must be in [0, 0.5], got {}", self.label_smoothing),
            });
        }
        match self.loss_type {
            DpoLossType::Sigmoid => {}
            DpoLossType::Ipo => {
                if self.label_smoothing > 0.0 {
                    return Err(Error::InvalidArgument {
                        arg: "label_smoothing",
                        reason: "only supported by the sigmoid loss".into(),
                    });
                }
                if self.beta == 0.0 {
                    return Err(Error::InvalidArgument {
                        arg: "beta",
                        reason: "IPO target 1/(2*beta) is undefined for beta = 0".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Load and validate a configuration from a YAML file.
    ///
    /// IO and parse failures are `Error::Config`; constraint violations come
    /// from [`DpoConfig::validate`].
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            reason: format!("IO error: {e}"),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| Error::Config {
            reason: format!("YAML parse error: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            reason: format!("IO error: {e}"),
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::Config {
            reason: format!("JSON parse error: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }
}
