//! HTTP API for the farmer assistant
//!
//! Routes are assembled by [`app`] over an [`AppState`] of shared services so
//! tests can drive the full router with in-process doubles.

use axum::{
    Json, Router,
    extract::{FromRequest, Path, Request, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use krishi_agri::{
    AgriError, ChatTurn, Chatbot, CompetitionAnalyzer, CropFeatures, CropRanges, CropRecommender,
    EcoCropTable, SoilSample, WeatherReport, WeatherSource,
};
use krishi_translate::{Language, TranslateError, TranslationOutcome, Translator, normalize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_TOP_K: i64 = 5;
pub const INCOMPLETE_WEATHER: &str =
    "Incomplete weather data retrieved. Missing temperature, humidity, or rainfall data.";

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// JSON body extractor whose rejections use the `{error}` shape with 400
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "rejected request body");
                Err(api_error(StatusCode::BAD_REQUEST, rejection.body_text()))
            }
        }
    }
}

fn translate_rejection(e: TranslateError) -> ApiError {
    let status = if e.is_request_rejection() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    api_error(status, e.to_string())
}

fn agri_failure(e: AgriError) -> ApiError {
    let status = match &e {
        AgriError::Weather(_) => StatusCode::BAD_REQUEST,
        AgriError::MissingApiKey | AgriError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        AgriError::Model(_) | AgriError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AgriError::Network(_)
        | AgriError::Timeout
        | AgriError::Api { .. }
        | AgriError::Parse(_)
        | AgriError::EmptyResponse => StatusCode::BAD_GATEWAY,
    };
    error!(error = %e, status = status.as_u16(), "upstream failure");
    api_error(status, e.to_string())
}

/// Shared services behind every handler
#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
    pub weather: Arc<dyn WeatherSource>,
    pub recommender: Arc<dyn CropRecommender>,
    pub chatbot: Arc<Chatbot>,
    pub analyzer: Arc<CompetitionAnalyzer>,
    pub ecocrop: Arc<EcoCropTable>,
}

/// Build the router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/translate", post(translate))
        .route("/translate/batch", post(translate_batch))
        .route("/translate/page", post(translate_page))
        .route("/weather", post(weather))
        .route("/recommend_crops", post(recommend_crops))
        .route("/crops/{name}/ranges", get(crop_ranges))
        .route("/analyze", post(analyze))
        .route("/chat", post(chat))
        .route("/chat/{session_id}/history", get(chat_history))
        .route("/chat/{session_id}", delete(clear_chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `HOST`/`PORT` through an arbitrary key lookup, defaulting to `0.0.0.0:8000`
pub fn bind_address<F>(lookup: F) -> Result<SocketAddr, String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("HOST")
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let port = lookup("PORT")
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "8000".to_string());
    format!("{}:{}", host.trim(), port.trim())
        .parse()
        .map_err(|e| format!("Invalid HOST/PORT {host}:{port}: {e}"))
}

// ========== Service Info ==========

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Krishi Sahayak API is running!",
        version: VERSION,
        endpoints: vec![
            "/health",
            "/languages",
            "/translate",
            "/translate/batch",
            "/translate/page",
            "/weather",
            "/recommend_crops",
            "/crops/{name}/ranges",
            "/analyze",
            "/chat",
        ],
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: VERSION,
    })
}

#[derive(Serialize)]
pub struct LanguageInfo {
    pub name: &'static str,
    pub iso639: &'static str,
    pub flores: &'static str,
}

#[derive(Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
}

async fn languages() -> Json<LanguagesResponse> {
    use krishi_translate::CodeScheme;

    Json(LanguagesResponse {
        languages: Language::all()
            .map(|lang| LanguageInfo {
                name: lang.name(),
                iso639: lang.code(CodeScheme::Iso639),
                flores: lang.code(CodeScheme::Flores),
            })
            .collect(),
    })
}

// ========== Translation ==========

fn default_source() -> String {
    "english".to_string()
}

#[derive(Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_source")]
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Deserialize)]
pub struct BatchTranslateRequest {
    pub texts: Vec<String>,
    #[serde(default = "default_source")]
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Serialize)]
pub struct BatchTranslateResponse {
    pub results: Vec<TranslationOutcome>,
}

#[derive(Deserialize)]
pub struct PageTranslateRequest {
    pub page_strings: BTreeMap<String, String>,
    #[serde(default = "default_source")]
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Serialize)]
pub struct PageTranslateResponse {
    pub translations: BTreeMap<String, TranslationOutcome>,
}

fn check_languages(source: &str, target: &str) -> Result<(), ApiError> {
    normalize(source).map_err(translate_rejection)?;
    normalize(target).map_err(translate_rejection)?;
    Ok(())
}

async fn translate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TranslateRequest>,
) -> ApiResult<TranslationOutcome> {
    state
        .translator
        .limits()
        .check_text(&request.text)
        .map_err(translate_rejection)?;
    check_languages(&request.source_lang, &request.target_lang)?;

    info!(
        source = %request.source_lang,
        target = %request.target_lang,
        chars = request.text.chars().count(),
        "translate request"
    );
    let outcome = state
        .translator
        .translate(&request.text, &request.source_lang, &request.target_lang)
        .await;
    if !outcome.success {
        warn!(error = ?outcome.error, "translation degraded");
    }
    Ok(Json(outcome))
}

async fn translate_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BatchTranslateRequest>,
) -> ApiResult<BatchTranslateResponse> {
    if request.texts.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "texts must not be empty"));
    }
    let limits = state.translator.limits();
    limits
        .check_batch(request.texts.len())
        .map_err(translate_rejection)?;
    for text in &request.texts {
        limits.check_text(text).map_err(translate_rejection)?;
    }
    check_languages(&request.source_lang, &request.target_lang)?;

    info!(
        source = %request.source_lang,
        target = %request.target_lang,
        count = request.texts.len(),
        "batch translate request"
    );
    let results = state
        .translator
        .translate_batch(&request.texts, &request.source_lang, &request.target_lang)
        .await
        .map_err(translate_rejection)?;
    Ok(Json(BatchTranslateResponse { results }))
}

async fn translate_page(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PageTranslateRequest>,
) -> ApiResult<PageTranslateResponse> {
    if request.page_strings.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "page_strings must not be empty",
        ));
    }
    let limits = state.translator.limits();
    limits
        .check_batch(request.page_strings.len())
        .map_err(translate_rejection)?;
    for text in request.page_strings.values() {
        limits.check_text(text).map_err(translate_rejection)?;
    }
    check_languages(&request.source_lang, &request.target_lang)?;

    info!(
        source = %request.source_lang,
        target = %request.target_lang,
        count = request.page_strings.len(),
        "page translate request"
    );
    let translations = state
        .translator
        .translate_page(
            &request.page_strings,
            &request.source_lang,
            &request.target_lang,
        )
        .await
        .map_err(translate_rejection)?;
    Ok(Json(PageTranslateResponse { translations }))
}

/// Translate generated English text when a non-English language is asked for
async fn localize(
    translator: &Translator,
    text: &str,
    language: Option<&str>,
) -> Option<TranslationOutcome> {
    let language = language?;
    match normalize(language) {
        Ok(Language::English) => None,
        _ => Some(translator.translate(text, "english", language).await),
    }
}

fn check_optional_language(language: Option<&str>) -> Result<(), ApiError> {
    match language {
        Some(lang) => normalize(lang).map(|_| ()).map_err(translate_rejection),
        None => Ok(()),
    }
}

fn check_coordinates(lat: f64, lon: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Latitude must be between -90 and 90",
        ));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Longitude must be between -180 and 180",
        ));
    }
    Ok(())
}

// ========== Weather ==========

#[derive(Debug, Deserialize)]
pub struct WeatherRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// ISO-8601; absent or unparseable means now
    pub timestamp: Option<String>,
}

async fn weather(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WeatherRequest>,
) -> ApiResult<WeatherReport> {
    let (Some(lat), Some(lon)) = (request.lat, request.lon) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "missing lat or lon"));
    };
    check_coordinates(lat, lon)?;

    info!(lat, lon, timestamp = ?request.timestamp, "weather request");
    let report = state
        .weather
        .get_weather(lat, lon, request.timestamp.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, "weather lookup failed");
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        })?;
    Ok(Json(report))
}

// ========== Crop Recommendation ==========

#[derive(Debug, Deserialize)]
pub struct CropRecommendationRequest {
    pub lat: f64,
    pub long: f64,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "Ph")]
    pub ph: f64,
    pub top_k: Option<i64>,
}

impl CropRecommendationRequest {
    fn validate(&self) -> Result<usize, ApiError> {
        let reject = |msg: &str| Err(api_error(StatusCode::BAD_REQUEST, msg));

        check_coordinates(self.lat, self.long)?;
        if !(0.0..=14.0).contains(&self.ph) {
            return reject("pH must be between 0 and 14");
        }
        let top_k = self.top_k.unwrap_or(DEFAULT_TOP_K);
        if !(1..=20).contains(&top_k) {
            return reject("top_k must be between 1 and 20");
        }
        Ok(top_k as usize)
    }
}

#[derive(Debug, Serialize)]
pub struct InputParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct CropRecommendationResponse {
    pub weather_data: WeatherReport,
    pub recommended_crops: Vec<String>,
    pub input_parameters: InputParameters,
}

async fn recommend_crops(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CropRecommendationRequest>,
) -> ApiResult<CropRecommendationResponse> {
    let top_k = request.validate()?;
    info!(lat = request.lat, long = request.long, top_k, "crop recommendation request");

    let weather_data = state
        .weather
        .get_weather(request.lat, request.long, None)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to retrieve weather data");
            api_error(StatusCode::BAD_REQUEST, "Failed to retrieve weather data")
        })?;

    let Some((temperature, humidity, rainfall)) = weather_data.complete() else {
        error!(?weather_data, "incomplete weather data retrieved");
        return Err(api_error(StatusCode::BAD_REQUEST, INCOMPLETE_WEATHER));
    };

    let soil = SoilSample {
        n: request.n,
        p: request.p,
        k: request.k,
        ph: request.ph,
    };
    let features = CropFeatures::new(soil, temperature, humidity, rainfall);
    let recommended_crops = state.recommender.recommend(&features, top_k).map_err(|e| {
        error!(error = %e, "crop model failed");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error occurred",
        )
    })?;

    info!(count = recommended_crops.len(), "recommendation ready");
    Ok(Json(CropRecommendationResponse {
        weather_data,
        recommended_crops,
        input_parameters: InputParameters {
            latitude: request.lat,
            longitude: request.long,
            nitrogen: request.n,
            phosphorus: request.p,
            potassium: request.k,
            ph: request.ph,
            top_k,
        },
    }))
}

#[derive(Serialize)]
pub struct CropRangesResponse {
    pub crop: String,
    pub ranges: Vec<CropRanges>,
}

async fn crop_ranges(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<CropRangesResponse> {
    let ranges = state.ecocrop.crop_ranges(&name);
    if ranges.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No EcoCrop entry for crop '{name}'"),
        ));
    }
    Ok(Json(CropRangesResponse { crop: name, ranges }))
}

// ========== Competition Analysis ==========

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub recommended_crops: Vec<String>,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOutcome>,
}

async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> ApiResult<AnalyzeResponse> {
    let crops: Vec<String> = request
        .recommended_crops
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if crops.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "recommended_crops must not be empty",
        ));
    }
    check_optional_language(request.language.as_deref())?;

    info!(crops = crops.len(), "competition analysis request");
    let analysis = state.analyzer.analyze(&crops).await.map_err(agri_failure)?;
    let translation = localize(&state.translator, &analysis, request.language.as_deref()).await;

    Ok(Json(AnalyzeResponse {
        analysis,
        translation,
    }))
}

// ========== Chat ==========

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOutcome>,
}

#[derive(Serialize)]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub turns: Vec<ChatTurn>,
}

#[derive(Serialize)]
pub struct ClearChatResponse {
    pub session_id: String,
    pub cleared: bool,
}

async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.session_id.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "session_id must not be empty"));
    }
    state
        .translator
        .limits()
        .check_text(&request.message)
        .map_err(translate_rejection)?;
    check_optional_language(request.language.as_deref())?;

    info!(session_id = %request.session_id, "chat request");
    let reply = state
        .chatbot
        .chat(&request.session_id, &request.message)
        .await
        .map_err(agri_failure)?;
    let translation = localize(&state.translator, &reply, request.language.as_deref()).await;

    Ok(Json(ChatResponse {
        session_id: request.session_id,
        reply,
        translation,
    }))
}

async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ChatHistoryResponse> {
    let turns = state.chatbot.history(&session_id);
    Json(ChatHistoryResponse { session_id, turns })
}

async fn clear_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ClearChatResponse> {
    let cleared = state.chatbot.clear(&session_id);
    info!(%session_id, cleared, "chat session cleared");
    Json(ClearChatResponse {
        session_id,
        cleared,
    })
}
