//! Hosted text generation through the Vertex AI `:predict` REST endpoint.
//!
//! The answer carries a heuristic confidence score. It is illustrative only and
//! not a calibrated probability.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::{Answer, Responder};
use crate::config::VertexConfig;

pub const APOLOGY: &str = "I apologize, but I'm unable to generate an answer at this time.";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

pub const ANSWER_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.7,
    max_output_tokens: 512,
    top_k: 40,
    top_p: 0.8,
};

const HEALTH_PROMPT: &str = "Hello, are you operational?";

pub const HEALTH_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.1,
    max_output_tokens: 10,
    ..ANSWER_PARAMS
};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: SamplingParams,
}

#[derive(Debug, Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VertexError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Vertex AI error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Vertex AI returned no predictions")]
    Empty,
}

pub struct VertexResponder {
    client: reqwest::Client,
    predict_url: String,
    access_token: Option<String>,
}

impl VertexResponder {
    pub fn new(cfg: &VertexConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        info!(project = %cfg.project_id, location = %cfg.location, model = %cfg.model, "vertex responder initialized");
        Ok(Self {
            client,
            predict_url: cfg.predict_url(),
            access_token: cfg.access_token.clone(),
        })
    }

    async fn predict(&self, prompt: &str, parameters: SamplingParams) -> Result<String, VertexError> {
        let body = PredictRequest {
            instances: [Instance { prompt }],
            parameters,
        };
        let mut req = self.client.post(&self.predict_url).json(&body);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VertexError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PredictResponse = response.json().await?;
        parsed
            .predictions
            .into_iter()
            .next()
            .map(|p| p.content)
            .ok_or(VertexError::Empty)
    }
}

#[async_trait]
impl Responder for VertexResponder {
    #[instrument(skip_all)]
    async fn answer(&self, question: &str, context: Option<&str>) -> Answer {
        let prompt = build_prompt(question, context);
        match self.predict(&prompt, ANSWER_PARAMS).await {
            Ok(text) => {
                let confidence = confidence(&text, question);
                info!(confidence, "generated answer");
                Answer {
                    text,
                    confidence: Some(confidence),
                }
            }
            Err(e) => {
                error!(error = %e, "vertex predict failed");
                Answer {
                    text: APOLOGY.to_string(),
                    confidence: Some(0.0),
                }
            }
        }
    }

    #[instrument(skip_all)]
    async fn health_check(&self) -> bool {
        match self.predict(HEALTH_PROMPT, HEALTH_PARAMS).await {
            Ok(text) => !text.is_empty(),
            Err(e) => {
                error!(error = %e, "vertex health check failed");
                false
            }
        }
    }
}

pub fn build_prompt(question: &str, context: Option<&str>) -> String {
    match context.filter(|c| !c.is_empty()) {
        Some(context) => format!(
            "Based on the following context, please answer the question comprehensively.\n\n\
             Context: {context}\n\n\
             Question: {question}\n\n\
             Please provide a detailed and accurate answer:"
        ),
        None => format!(
            "Please answer the following question based on your knowledge:\n\n\
             Question: {question}\n\n\
             Please provide a comprehensive and accurate answer:"
        ),
    }
}

pub fn confidence(answer: &str, question: &str) -> f64 {
    let mut score: f64 = 0.5;
    let len = answer.chars().count();
    if len > 100 {
        score += 0.2;
    }
    if len > 300 {
        score += 0.1;
    }

    let q = answer_words(question);
    let a = answer_words(answer);
    if q.intersection(&a).count() > 2 {
        score += 0.2;
    }
    score.min(1.0)
}

fn answer_words(s: &str) -> HashSet<String> {
    s.to_lowercase().split_whitespace().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PREDICT_PATH: &str =
        "/v1/projects/lab/locations/us-central1/publishers/google/models/text-bison:predict";

    fn cfg(endpoint: &str) -> VertexConfig {
        VertexConfig {
            project_id: "lab".into(),
            location: "us-central1".into(),
            model: "text-bison".into(),
            endpoint: endpoint.into(),
            access_token: Some("test-token".into()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn prompt_depends_on_context() {
        let with = build_prompt("What is XSS?", Some("XSS is script injection."));
        assert!(with.starts_with("Based on the following context"));
        assert!(with.contains("Context: XSS is script injection."));
        assert!(with.contains("Question: What is XSS?"));

        let without = build_prompt("What is XSS?", None);
        assert!(without.starts_with("Please answer the following question"));
        assert!(!without.contains("Context:"));
        assert_eq!(build_prompt("q", Some("")), build_prompt("q", None));
    }

    #[test]
    fn confidence_heuristic() {
        assert_eq!(confidence("short", "unrelated"), 0.5);
        assert!((confidence(&"x".repeat(101), "q") - 0.7).abs() < 1e-9);
        assert!((confidence(&"x".repeat(301), "q") - 0.8).abs() < 1e-9);

        let q = "how do I stop sql injection";
        assert!((confidence("You stop SQL injection with parameters", q) - 0.7).abs() < 1e-9);

        let long = format!("{} how do i stop sql injection", "word ".repeat(80));
        assert!((confidence(&long, q) - 1.0).abs() < 1e-9);
        assert!(confidence(&long, q) <= 1.0);
    }

    #[test]
    fn two_shared_words_do_not_count() {
        assert_eq!(confidence("sql injection", "what is sql injection"), 0.5);
    }

    #[tokio::test]
    async fn answer_uses_prediction_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "parameters": {"maxOutputTokens": 512, "topK": 40}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"content": "Use parameterized queries."}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let responder = VertexResponder::new(&cfg(&server.uri())).unwrap();
        let a = responder.answer("How to avoid sqli?", None).await;
        assert_eq!(a.text, "Use parameterized queries.");
        assert_eq!(a.confidence, Some(0.5));
    }

    #[tokio::test]
    async fn upstream_error_degrades_to_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let responder = VertexResponder::new(&cfg(&server.uri())).unwrap();
        let a = responder.answer("anything", Some("ctx")).await;
        assert_eq!(a.text, APOLOGY);
        assert_eq!(a.confidence, Some(0.0));
    }

    #[tokio::test]
    async fn empty_predictions_degrade_to_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": []})))
            .mount(&server)
            .await;

        let responder = VertexResponder::new(&cfg(&server.uri())).unwrap();
        let a = responder.answer("anything", None).await;
        assert_eq!(a.text, APOLOGY);
        assert_eq!(a.confidence, Some(0.0));
    }

    #[tokio::test]
    async fn health_check_sends_short_low_temperature_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .and(body_partial_json(json!({
                "instances": [{"prompt": "Hello, are you operational?"}],
                "parameters": {"maxOutputTokens": 10}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"content": "Yes."}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let responder = VertexResponder::new(&cfg(&server.uri())).unwrap();
        assert!(responder.health_check().await);
    }

    #[tokio::test]
    async fn health_check_is_false_on_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let responder = VertexResponder::new(&cfg(&server.uri())).unwrap();
        assert!(!responder.health_check().await);
    }

    #[tokio::test]
    async fn health_check_is_false_on_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"content": ""}]
            })))
            .mount(&server)
            .await;

        let responder = VertexResponder::new(&cfg(&server.uri())).unwrap();
        assert!(!responder.health_check().await);
    }

    #[test]
    fn health_params_only_change_temperature_and_length() {
        assert_eq!(HEALTH_PARAMS.temperature, 0.1);
        assert_eq!(HEALTH_PARAMS.max_output_tokens, 10);
        assert_eq!(HEALTH_PARAMS.top_k, ANSWER_PARAMS.top_k);
    }
}
