//! Transcription service client.

use log::debug;
use serde::Deserialize;

use crate::VoiceError;

/// Turns recorded audio into text.
pub trait Transcriber: Send + Sync {
    /// Transcribe a WAV-contained recording. An HTTP error status or an
    /// unreadable body is a [`VoiceError::Transcription`]; an empty result
    /// is returned as an empty string and aborted by the pipeline.
    fn transcribe(&self, wav: &[u8], language: &str) -> Result<String, VoiceError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptBody {
    text: String,
}

/// HTTP transcription client: multipart audio blob plus a language hint.
pub struct HttpTranscriber {
    url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpTranscriber {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Transcriber for HttpTranscriber {
    fn transcribe(&self, wav: &[u8], language: &str) -> Result<String, VoiceError> {
        let part = reqwest::blocking::multipart::Part::bytes(wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .text("language", language.to_string())
            .part("file", part);

        debug!(
            "sending {} bytes of audio to {} (language {language})",
            wav.len(),
            self.url
        );

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request
            .send()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(VoiceError::Transcription(format!("{status}: {body}")));
        }

        let body: TranscriptBody = response
            .json()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        Ok(body.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_body_parsing() {
        let body: TranscriptBody =
            serde_json::from_str("{\"text\": \" draw a cat \"}").unwrap();
        assert_eq!(body.text.trim(), "draw a cat");
    }
}
