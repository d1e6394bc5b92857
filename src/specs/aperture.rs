use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::core::Float;

/// Specifies the system aperture: how real ray bundles are sized before
/// tracing (engine design §4 supplement).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum ApertureSpec {
    EntrancePupil { semi_diameter: Float },
}

impl ApertureSpec {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::EntrancePupil { semi_diameter } => {
                if !semi_diameter.is_finite() || *semi_diameter <= 0.0 {
                    return Err(anyhow!(
                        "entrance pupil semi-diameter must be finite and positive, got {semi_diameter}"
                    ));
                }
                Ok(())
            }
        }
    }
}
