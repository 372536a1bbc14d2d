use anyhow::Context;
use krishi_agri::{
    AgriConfig, Chatbot, CompetitionAnalyzer, CropModel, EcoCropTable, GeminiClient,
    LanguageModel, OpenMeteoClient,
};
use krishi_translate::TranslationConfig;
use krishi_web::{AppState, app, bind_address};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let translator = TranslationConfig::from_env()
        .and_then(|config| config.build())
        .context("Failed to initialize translation providers")?;

    let agri = AgriConfig::from_env().context("Invalid agriculture configuration")?;
    let weather = OpenMeteoClient::from_config(&agri).context("Failed to create weather client")?;
    let model = CropModel::from_file(&agri.crop_model_path).with_context(|| {
        format!(
            "Failed to load crop model (set CROP_MODEL_PATH, currently {})",
            agri.crop_model_path.display()
        )
    })?;

    let ecocrop = EcoCropTable::from_file(&agri.ecocrop_csv).unwrap_or_else(|e| {
        warn!(
            path = %agri.ecocrop_csv.display(),
            error = %e,
            "EcoCrop table unavailable; /crops/{{name}}/ranges will answer 404"
        );
        EcoCropTable::default()
    });

    let gemini = GeminiClient::from_config(&agri).context("Failed to create Gemini client")?;
    if !gemini.has_api_key() {
        warn!("GOOGLE_API_KEY not set; /chat and /analyze will answer 503");
    }
    let llm: Arc<dyn LanguageModel> = Arc::new(gemini);

    let state = AppState {
        translator: Arc::new(translator),
        weather: Arc::new(weather),
        recommender: Arc::new(model),
        chatbot: Arc::new(Chatbot::from_config(llm.clone(), &agri)),
        analyzer: Arc::new(CompetitionAnalyzer::from_config(llm, &agri)),
        ecocrop: Arc::new(ecocrop),
    };

    info!("🌾 Starting Krishi Sahayak API v{}", krishi_web::VERSION);

    let addr = bind_address(|key| std::env::var(key).ok()).map_err(anyhow::Error::msg)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🚀 Server running at http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
