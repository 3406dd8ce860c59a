use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

const MAX_ACTIVITIES: usize = 3;
const MAX_PLACES: usize = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub description: String,
}

impl Place {
    fn new(name: &str, description: &str) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

/// Text suggestions for the trip form and the dashboard. Implementations
/// never fail; problems come back as a placeholder entry.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest_activities(&self, origin: &str, destination: &str) -> Vec<String>;

    async fn nearby_places(&self, latitude: f64, longitude: f64) -> Vec<Place>;
}

/// Gemini `generateContent` client asking for schema-constrained JSON.
pub struct GeminiSuggestions {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiSuggestions {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_endpoint(api_key, GEMINI_BASE_URL, GEMINI_MODEL)
    }

    pub fn with_endpoint(api_key: Option<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let api_key = api_key.filter(|key| !key.is_empty());
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set. Suggestions will not work.");
        }

        Self {
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn generate<T: DeserializeOwned>(&self, api_key: &str, prompt: String, schema: Value, temperature: f32) -> anyhow::Result<T> {
        let request = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature,
            },
        };

        let response = self.client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {error_text}");
        }

        let response: GenerateResponse = response.json().await?;
        parse_response(response)
    }
}

#[async_trait]
impl SuggestionService for GeminiSuggestions {
    async fn suggest_activities(&self, origin: &str, destination: &str) -> Vec<String> {
        let Some(api_key) = &self.api_key else {
            return vec!["API Key not configured".into()];
        };

        let prompt = format!(
            "Based on a trip in Kerala, India from \"{origin}\" to \"{destination}\", suggest 3 likely and concise activities. \
             Examples: \"Commuting to work\", \"Shopping trip\", \"Visiting relatives\", \"Leisure travel\"."
        );

        match self.generate::<ActivityResponse>(api_key, prompt, activity_schema(), 0.7).await {
            Ok(response) => response.suggestions.into_iter().take(MAX_ACTIVITIES).collect(),
            Err(err) => {
                tracing::error!("Error fetching activity suggestions: {err}");
                vec!["Could not fetch suggestions".into()]
            },
        }
    }

    async fn nearby_places(&self, latitude: f64, longitude: f64) -> Vec<Place> {
        let Some(api_key) = &self.api_key else {
            return vec![Place::new("API Key Error", "API Key not configured.")];
        };

        let prompt = format!(
            "Based on the current location (latitude: {latitude}, longitude: {longitude}) in India, list exactly 5 interesting \
             and diverse places, events, or activities nearby. Provide a short, engaging one-sentence description for each."
        );

        match self.generate::<NearbyResponse>(api_key, prompt, nearby_schema(), 0.8).await {
            Ok(response) => response.places.into_iter().take(MAX_PLACES).collect(),
            Err(err) => {
                tracing::error!("Error fetching nearby suggestions: {err}");
                vec![Place::new("Error", "Could not fetch suggestions from the AI.")]
            },
        }
    }
}

fn activity_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggestions": {
                "type": "ARRAY",
                "description": "A list of 3 concise travel activity suggestions.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["suggestions"]
    })
}

fn nearby_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "places": {
                "type": "ARRAY",
                "description": "A list of 5 interesting places or events happening nearby.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "The name of the place or event." },
                        "description": { "type": "STRING", "description": "A short, engaging one-sentence description." }
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["places"]
    })
}

/// The model's JSON answer is the text of the first candidate part.
fn parse_response<T: DeserializeOwned>(response: GenerateResponse) -> anyhow::Result<T> {
    let text = response.candidates.into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| anyhow::anyhow!("Gemini returned no candidates"))?;

    Ok(serde_json::from_str(&text)?)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    places: Vec<Place>,
}
