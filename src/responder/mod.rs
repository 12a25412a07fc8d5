use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ResponderConfig;

pub mod keyword;
pub mod vertex;

pub use keyword::KeywordResponder;
pub use vertex::VertexResponder;

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Only produced by strategies that can estimate one.
    pub confidence: Option<f64>,
}

/// Produces an answer for a chat question. Never fails: strategies degrade to
/// a fixed text instead.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn answer(&self, question: &str, context: Option<&str>) -> Answer;

    /// Whether the strategy can currently produce answers.
    async fn health_check(&self) -> bool;
}

pub fn from_config(cfg: &ResponderConfig) -> anyhow::Result<Arc<dyn Responder>> {
    let responder: Arc<dyn Responder> = match cfg {
        ResponderConfig::Keyword => Arc::new(KeywordResponder),
        ResponderConfig::Vertex(v) => Arc::new(VertexResponder::new(v)?),
    };
    Ok(responder)
}
