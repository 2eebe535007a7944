//! Caller-facing generation request

use serde::{Deserialize, Serialize};

use crate::domain::image::Resolution;

/// Default influence of the reference image on the result
pub const DEFAULT_REFERENCE_WEIGHT: f64 = 0.5;

/// Everything the caller supplies to start a generation
///
/// The reference image must already be reachable by the provider over a
/// public URL; nothing is uploaded on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub reference_image_url: Option<String>,
    /// Influence of the reference image, within [0, 1]
    pub reference_weight: f64,
    pub resolution: Resolution,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image_url: None,
            reference_weight: DEFAULT_REFERENCE_WEIGHT,
            resolution: Resolution::default(),
        }
    }

    pub fn with_reference(mut self, url: impl Into<String>, weight: f64) -> Self {
        self.reference_image_url = Some(url.into());
        self.reference_weight = weight;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Checks the request before anything is signed or sent
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt cannot be empty".to_string());
        }

        if !self.reference_weight.is_finite() || !(0.0..=1.0).contains(&self.reference_weight) {
            return Err(format!(
                "reference weight must be within [0, 1], got {}",
                self.reference_weight
            ));
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(format!("resolution must be non-zero, got {}", self.resolution));
        }

        if let Some(url) = &self.reference_image_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("reference image must be an http:// or https:// URL".to_string());
            }
        }

        Ok(())
    }
}
