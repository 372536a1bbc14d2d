//! Crop recommendation with a multinomial logistic-regression model
//!
//! The model is exported once (scaler statistics, class labels, weights) to a
//! JSON artifact and evaluated here without any ML runtime:
//!
//! ```json
//! {
//!   "features": ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"],
//!   "scaler": { "mean": [...7], "scale": [...7] },
//!   "classes": ["rice", "maize", ...],
//!   "coefficients": [[...7], ...one row per class],
//!   "intercepts": [...one per class]
//! }
//! ```

use crate::error::{AgriError, AgriResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Column order the model was trained with
pub const FEATURE_ORDER: [&str; 7] = ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Soil measurements supplied by the farmer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub ph: f64,
}

/// Full classifier input: soil plus weather
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFeatures {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl CropFeatures {
    pub fn new(soil: SoilSample, temperature: f64, humidity: f64, rainfall: f64) -> Self {
        Self {
            n: soil.n,
            p: soil.p,
            k: soil.k,
            temperature,
            humidity,
            ph: soil.ph,
            rainfall,
        }
    }

    /// Values in [`FEATURE_ORDER`]
    pub fn to_vector(&self) -> [f64; 7] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// Ranks crop labels for a set of features
pub trait CropRecommender: Send + Sync {
    /// Up to `top_k` crop labels, most suitable first
    fn recommend(&self, features: &CropFeatures, top_k: usize) -> AgriResult<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropModel {
    pub features: Vec<String>,
    pub scaler: Scaler,
    pub classes: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl CropModel {
    /// Load and validate a model artifact
    pub fn from_file(path: &Path) -> AgriResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AgriError::Model(format!("Failed to read model '{}': {}", path.display(), e))
        })?;
        let model = Self::from_json(&content)
            .map_err(|e| AgriError::Model(format!("'{}': {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            classes = model.classes.len(),
            "crop model loaded"
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> AgriResult<Self> {
        let model: Self = serde_json::from_str(content)
            .map_err(|e| AgriError::Model(format!("Invalid model JSON: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    /// Check every dimension against the feature count and class count
    pub fn validate(&self) -> AgriResult<()> {
        let width = FEATURE_ORDER.len();
        let invalid = |msg: String| Err(AgriError::Model(msg));

        let names_match = self.features.len() == width
            && self
                .features
                .iter()
                .zip(FEATURE_ORDER)
                .all(|(a, b)| a.eq_ignore_ascii_case(b));
        if !names_match {
            return invalid(format!(
                "features must be {:?}, got {:?}",
                FEATURE_ORDER, self.features
            ));
        }
        if self.scaler.mean.len() != width || self.scaler.scale.len() != width {
            return invalid(format!("scaler must have {width} means and scales"));
        }
        if self.classes.is_empty() {
            return invalid("model has no classes".to_string());
        }
        if self.coefficients.len() != self.classes.len()
            || self.intercepts.len() != self.classes.len()
        {
            return invalid(format!(
                "expected {} coefficient rows and intercepts, got {} and {}",
                self.classes.len(),
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        if let Some(row) = self.coefficients.iter().position(|r| r.len() != width) {
            return invalid(format!("coefficient row {row} must have {width} weights"));
        }
        Ok(())
    }

    fn standardize(&self, features: &CropFeatures) -> Vec<f64> {
        features
            .to_vector()
            .iter()
            .zip(self.scaler.mean.iter().zip(&self.scaler.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect()
    }

    /// Class probabilities in class order
    pub fn predict_proba(&self, features: &CropFeatures) -> Vec<f64> {
        let x = self.standardize(features);
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();

        // Shift by the max logit so exp() cannot overflow
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }

    /// Labels paired with their probability, most probable first
    pub fn ranked(&self, features: &CropFeatures) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .classes
            .iter()
            .cloned()
            .zip(self.predict_proba(features))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl CropRecommender for CropModel {
    fn recommend(&self, features: &CropFeatures, top_k: usize) -> AgriResult<Vec<String>> {
        let ranked = self.ranked(features);
        if ranked.iter().any(|(_, p)| p.is_nan()) {
            return Err(AgriError::Model(
                "model produced non-finite probabilities".to_string(),
            ));
        }
        Ok(ranked
            .into_iter()
            .take(top_k.min(self.classes.len()))
            .map(|(label, _)| label)
            .collect())
    }
}
