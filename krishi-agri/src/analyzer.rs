//! Market-competition advice on top of a crop recommendation
//!
//! Given the crops the model recommended, asks the language model which one
//! is most profitable once neighbouring farms' plantings (market saturation)
//! and current per-hectare earnings are taken into account.

use crate::config::AgriConfig;
use crate::error::AgriResult;
use crate::llm::{ChatTurn, LanguageModel, LlmPrompt};
use crate::reference::{read_crop_prices, read_village_crops};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const ANALYSIS_TEMPERATURE: f32 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 150;

/// Prompt asking for one crop and a two-line justification
pub fn competition_prompt(
    surrounding_crops: &str,
    price_trends: &str,
    recommended_crops: &str,
) -> String {
    format!(
        "You are the Krishi AI Sahayak, a helpful agricultural expert who helps farmers decide what to plant.\n\
         Keep in mind that even a crop with high expected revenue may not earn it if many nearby farmers plant it too, \
         because the market will be saturated.\n\
         \n\
         Farmers around the user have chosen to plant the following crops:\n\
         {surrounding_crops}\n\
         \n\
         Current market earnings for various crops:\n\
         {price_trends}\n\
         \n\
         The farmer has been recommended the following crops:\n\
         {recommended_crops}\n\
         \n\
         Based on this information, choose the crop that would be most profitable for the farmer and tell them.\n\
         Only return the recommended crop name and a 2 line explanation."
    )
}

#[derive(Clone)]
pub struct CompetitionAnalyzer {
    llm: Arc<dyn LanguageModel>,
    neighbours_csv: PathBuf,
    crop_prices_csv: PathBuf,
}

impl CompetitionAnalyzer {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        neighbours_csv: impl Into<PathBuf>,
        crop_prices_csv: impl Into<PathBuf>,
    ) -> Self {
        Self {
            llm,
            neighbours_csv: neighbours_csv.into(),
            crop_prices_csv: crop_prices_csv.into(),
        }
    }

    pub fn from_config(llm: Arc<dyn LanguageModel>, config: &AgriConfig) -> Self {
        Self::new(
            llm,
            config.neighbours_csv.clone(),
            config.crop_prices_csv.clone(),
        )
    }

    /// Pick the most profitable of `recommended_crops`
    ///
    /// Reference tables are re-read on every call so edited CSVs take effect
    /// without a restart.
    pub async fn analyze(&self, recommended_crops: &[String]) -> AgriResult<String> {
        let village = read_village_crops(&self.neighbours_csv);
        let prices = read_crop_prices(&self.crop_prices_csv);

        let prompt = LlmPrompt {
            system: None,
            turns: vec![ChatTurn::user(competition_prompt(
                &village.summary,
                &prices.summary,
                &recommended_crops.join(", "),
            ))],
            temperature: ANALYSIS_TEMPERATURE,
            max_output_tokens: Some(ANALYSIS_MAX_TOKENS),
        };

        let analysis = self.llm.complete(&prompt).await?;
        info!(crops = recommended_crops.len(), llm = self.llm.name(), "competition analysis done");
        Ok(analysis)
    }
}

impl std::fmt::Debug for CompetitionAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompetitionAnalyzer")
            .field("llm", &self.llm.name())
            .field("neighbours_csv", &self.neighbours_csv)
            .field("crop_prices_csv", &self.crop_prices_csv)
            .finish()
    }
}
