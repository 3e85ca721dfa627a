//! Generative vector service client.
//!
//! The service turns a natural-language command plus canvas context into a
//! list of self-contained vector-fragment markup elements.

use log::debug;
use serde::{Deserialize, Serialize};

use mergeboard_core::Batch;

use crate::VoiceError;

/// Canvas dimensions sent as generation context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanvasDims {
    pub width: u32,
    pub height: u32,
}

/// Request payload for the generative vector service.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub command: String,
    pub canvas: CanvasDims,
    pub existing_items: Vec<Batch>,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    svgs: Vec<String>,
}

/// Produces vector fragments from a command and canvas context.
pub trait VectorGenerator: Send + Sync {
    /// Returns the ordered fragment strings. A missing or malformed `svgs`
    /// field is a [`VoiceError::MalformedResponse`].
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, VoiceError>;
}

/// HTTP client for the generative vector service.
pub struct HttpVectorGenerator {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpVectorGenerator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl VectorGenerator for HttpVectorGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, VoiceError> {
        debug!(
            "requesting generation for command {:?} ({} existing batches)",
            request.command,
            request.existing_items.len()
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| VoiceError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(VoiceError::Generation(format!("{status}: {body}")));
        }

        let body: GenerationResponse = response
            .json()
            .map_err(|e| VoiceError::MalformedResponse(e.to_string()))?;
        Ok(body.svgs)
    }
}
