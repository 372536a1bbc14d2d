//! Agriculture services behind the farmer assistant
//!
//! - [`weather`]: temperature, humidity and year-to-date rainfall from Open-Meteo
//! - [`recommender`]: logistic-regression crop ranking from soil and weather
//! - [`reference`]: neighbouring-farm acreage and crop price tables
//! - [`ecocrop`]: pH, rainfall and temperature tolerances by crop name
//! - [`llm`]: language-model seam and the Gemini client
//! - [`chat`]: farmer chatbot with bounded per-session memory
//! - [`analyzer`]: market-competition advice over a recommendation
//!
//! # Example
//!
//! ```ignore
//! use krishi_agri::{AgriConfig, CropFeatures, CropModel, CropRecommender, OpenMeteoClient, SoilSample, WeatherSource};
//!
//! let config = AgriConfig::from_env()?;
//! let weather = OpenMeteoClient::from_config(&config)?;
//! let model = CropModel::from_file(&config.crop_model_path)?;
//!
//! let report = weather.get_weather(26.91, 75.78, None).await?;
//! if let Some((temperature, humidity, rainfall)) = report.complete() {
//!     let soil = SoilSample { n: 90.0, p: 42.0, k: 43.0, ph: 6.5 };
//!     let crops = model.recommend(&CropFeatures::new(soil, temperature, humidity, rainfall), 5)?;
//!     println!("{crops:?}");
//! }
//! ```

pub mod analyzer;
pub mod chat;
pub mod config;
pub mod ecocrop;
pub mod error;
pub mod llm;
pub mod mock;
pub mod recommender;
pub mod reference;
pub mod weather;

pub use analyzer::CompetitionAnalyzer;
pub use chat::{ChatSessionStore, Chatbot};
pub use config::AgriConfig;
pub use ecocrop::{CropRanges, EcoCropTable};
pub use error::{AgriError, AgriResult};
pub use llm::{ChatTurn, GeminiClient, LanguageModel, LlmPrompt, Role};
pub use recommender::{CropFeatures, CropModel, CropRecommender, SoilSample};
pub use reference::{ReferenceTable, read_crop_prices, read_village_crops};
pub use weather::{OpenMeteoClient, WeatherReport, WeatherSource};
