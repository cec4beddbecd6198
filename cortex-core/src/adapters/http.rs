//! Thin HTTP-backed Analyzer/Embedder adapters for a configured external
//! endpoint. `spec.md` §1 treats the LLM and embedding model as two
//! abstract capabilities and explicitly puts any particular provider out
//! of scope, so this is a generic JSON client, not a vendor SDK — the same
//! role the teacher's feature-gated `openai`/`mistral` clients play for
//! `memory-core`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::analyzer::{AnalyzeHints, AnalyzeOutput, Analyzer, Chunk};
use super::embedder::Embedder;
use crate::error::{Error, Result};

/// HTTP-backed `Analyze` adapter. Expects the endpoint to accept
/// `{"text", "hints"}` and return `{"chunks", "warnings"}` matching
/// [`Chunk`]'s shape.
pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAnalyzer {
    #[must_use]
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    hints: &'a AnalyzeHints,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    chunks: Vec<Chunk>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, text: &str, hints: &AnalyzeHints) -> Result<AnalyzeOutput> {
        let response = self
            .request(&format!("{}/analyze", self.endpoint))
            .json(&AnalyzeRequest { text, hints })
            .send()
            .await
            .map_err(|e| Error::Analyzer(e.to_string()))?;

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| Error::Analyzer(format!("malformed analyzer response: {e}")))?;

        Ok(AnalyzeOutput {
            chunks: body.chunks,
            warnings: body.warnings,
        })
    }

    async fn summarize(
        &self,
        instruction: &str,
        evidence: &[String],
    ) -> Result<(String, Vec<String>)> {
        #[derive(Serialize)]
        struct Req<'a> {
            instruction: &'a str,
            evidence: &'a [String],
        }
        #[derive(Deserialize)]
        struct Resp {
            summary: String,
            bullets: Vec<String>,
        }

        let response = self
            .request(&format!("{}/summarize", self.endpoint))
            .json(&Req {
                instruction,
                evidence,
            })
            .send()
            .await
            .map_err(|e| Error::Analyzer(e.to_string()))?;

        let body: Resp = response
            .json()
            .await
            .map_err(|e| Error::Analyzer(format!("malformed analyzer response: {e}")))?;

        Ok((body.summary, body.bullets))
    }
}

/// HTTP-backed `Embed` adapter. Expects the endpoint to accept
/// `{"texts": [...]}` and return `{"embeddings": [[f32; D]; N]}`.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HttpEmbedder {
    #[must_use]
    pub fn new(endpoint: String, api_key: Option<String>, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            dimension,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut builder = self.client.post(format!("{}/embed", self.endpoint));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| Error::Embedder(e.to_string()))?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedder(format!("malformed embedder response: {e}")))?;

        if body.embeddings.len() != texts.len() {
            return Err(Error::Embedder(
                "embedder response cardinality mismatch".to_string(),
            ));
        }

        Ok(body.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
