//! Blocking client for the Gemini REST API: PDF upload, chapter planning, and speech.

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::foundation::error::{RecapError, RecapResult};
use crate::plan::segment::{Segment, parse_segments};
use crate::providers::{AudioBuffer, NarrationSynthesizer, SegmentPlanner};

const API_KEY_HEADER: &str = "x-goog-api-key";
const FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const FILE_POLL_LIMIT: u32 = 600;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub(crate) content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    pub(crate) text: Option<String>,
    pub(crate) inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub(crate) mime_type: Option<String>,
    #[serde(default)]
    pub(crate) data: String,
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: FileInfo,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    name: String,
    uri: String,
    mime_type: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Gemini-backed [`SegmentPlanner`] and [`NarrationSynthesizer`].
#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
    base_url: String,
    vision_model: String,
    tts_model: String,
    voice_name: String,
}

impl GeminiClient {
    /// Create a client. Fails with `MissingCredential` when no key is supplied.
    pub fn new(api_key: Option<String>, cfg: &ProviderConfig) -> RecapResult<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RecapError::missing_credential("GEMINI_API_KEY"))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| RecapError::provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            http,
            base_url: cfg.gemini_base_url.trim_end_matches('/').to_string(),
            vision_model: cfg.vision_model.clone(),
            tts_model: cfg.tts_model.clone(),
            voice_name: cfg.voice_name.clone(),
        })
    }

    #[tracing::instrument(skip(self))]
    fn upload_file(&self, path: &Path) -> RecapResult<FileInfo> {
        let bytes = std::fs::read(path)
            .map_err(|e| RecapError::media(format!("read '{}': {e}", path.display())))?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chapter.pdf".to_string());

        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", "application/pdf")
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .map_err(http_error)?;
        let start = check_status(start)?;
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| RecapError::provider("upload session returned no upload URL"))?;

        let finished = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .map_err(http_error)?;
        let envelope: FileEnvelope = check_status(finished)?.json().map_err(http_error)?;
        info!(uri = %envelope.file.uri, "file uploaded");
        self.wait_until_active(envelope.file)
    }

    fn wait_until_active(&self, mut file: FileInfo) -> RecapResult<FileInfo> {
        let mut polls = 0;
        while file.state.as_deref() == Some("PROCESSING") {
            if polls >= FILE_POLL_LIMIT {
                return Err(RecapError::provider(format!(
                    "file '{}' still processing after {polls} polls",
                    file.name
                )));
            }
            debug!(name = %file.name, "file still processing");
            std::thread::sleep(FILE_POLL_INTERVAL);
            let resp = self
                .http
                .get(format!("{}/v1beta/{}", self.base_url, file.name))
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .map_err(http_error)?;
            file = check_status(resp)?.json().map_err(http_error)?;
            polls += 1;
        }
        if file.state.as_deref() == Some("FAILED") {
            return Err(RecapError::provider(format!(
                "file processing failed for '{}'",
                file.name
            )));
        }
        Ok(file)
    }

    fn generate(&self, model: &str, body: &Value) -> RecapResult<GenerateContentResponse> {
        let resp = self
            .http
            .post(format!(
                "{}/v1beta/models/{model}:generateContent",
                self.base_url
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .map_err(http_error)?;
        check_status(resp)?.json().map_err(http_error)
    }
}

impl SegmentPlanner for GeminiClient {
    fn plan(&self, pdf: &Path, context: &str) -> RecapResult<Vec<Segment>> {
        info!(pdf = %pdf.display(), "uploading chapter");
        let file = self.upload_file(pdf)?;
        info!(model = %self.vision_model, "analyzing chapter");
        let body = planning_request_body(&file.uri, file.mime_type.as_deref(), context);
        let resp = self.generate(&self.vision_model, &body)?;
        parse_segments(&response_text(&resp)?)
    }
}

impl NarrationSynthesizer for GeminiClient {
    fn synthesize(&self, script: &str, style: &str) -> RecapResult<AudioBuffer> {
        let preview: String = script.chars().take(50).collect();
        info!(script = %preview, "synthesizing narration");
        let body = speech_request_body(&speech_prompt(script, style), &self.voice_name);
        let resp = self.generate(&self.tts_model, &body)?;
        response_audio(&resp)
    }
}

fn http_error(e: reqwest::Error) -> RecapError {
    match e.status() {
        Some(status) if status.as_u16() == 429 => RecapError::quota(e.to_string()),
        _ => RecapError::provider(format!("http request failed: {e}")),
    }
}

fn check_status(resp: Response) -> RecapResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(classify_api_error(status.as_u16(), &body))
}

/// Map a non-success response to the quota/provider split the retry loop depends on.
pub(crate) fn classify_api_error(status: u16, body: &str) -> RecapError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let exhausted = status == 429
        || body.contains("RESOURCE_EXHAUSTED")
        || parsed
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .is_some_and(|s| s == "RESOURCE_EXHAUSTED");
    let message = parsed
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    if exhausted {
        RecapError::quota(format!("HTTP {status}: {message}"))
    } else {
        RecapError::provider(format!("HTTP {status}: {message}"))
    }
}

/// Concatenated text parts of the first candidate.
pub(crate) fn response_text(resp: &GenerateContentResponse) -> RecapResult<String> {
    let text: String = first_parts(resp)
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.trim().is_empty() {
        return Err(RecapError::provider("model returned no text"));
    }
    Ok(text)
}

/// Decoded inline audio of the first candidate; the last declared MIME type wins.
pub(crate) fn response_audio(resp: &GenerateContentResponse) -> RecapResult<AudioBuffer> {
    let mut data = Vec::new();
    let mut mime_type = "audio/wav".to_string();
    for inline in first_parts(resp).iter().filter_map(|p| p.inline_data.as_ref()) {
        let chunk = BASE64_STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| RecapError::provider(format!("invalid base64 audio payload: {e}")))?;
        data.extend_from_slice(&chunk);
        if let Some(m) = inline.mime_type.as_deref().filter(|m| !m.is_empty()) {
            mime_type = m.to_string();
        }
    }
    if data.is_empty() {
        return Err(RecapError::provider("no audio data received from Gemini"));
    }
    Ok(AudioBuffer { data, mime_type })
}

fn first_parts(resp: &GenerateContentResponse) -> &[Part] {
    resp.candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or(&[])
}

pub(crate) fn speech_prompt(script: &str, style: &str) -> String {
    format!("STYLE: {style}\n\nTEXT TO SPEAK: {script}")
}

pub(crate) fn speech_request_body(prompt: &str, voice_name: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": 1,
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice_name } }
            }
        }
    })
}

pub(crate) fn planning_request_body(
    file_uri: &str,
    mime_type: Option<&str>,
    context: &str,
) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "fileData": { "mimeType": mime_type.unwrap_or("application/pdf"), "fileUri": file_uri } },
                { "text": planning_prompt(context) }
            ]
        }],
        "generationConfig": { "responseMimeType": "application/json", "temperature": 1 }
    })
}

pub(crate) fn planning_prompt(context: &str) -> String {
    let context_block = if context.trim().is_empty() {
        String::new()
    } else {
        format!(
            "Background gathered from the web. Use it to name characters and plot points \
             correctly:\n{}\n---\n\n",
            context.trim()
        )
    };
    format!(
        "You write YouTube manga recap scripts for an Arabic-speaking audience. \
         Read the whole chapter in the attached PDF.\n\n\
         {context_block}\
         Split the story into narrative segments (scenes). For every segment return:\n\
         1. \"start_page\": first page of the segment (1-based).\n\
         2. \"end_page\": last page of the segment (inclusive).\n\
         3. \"script\": a 40-120 word narration in Arabic (Modern Standard or the mixed register \
         recap channels use). Name every main character, summarize the key dialogue, and tell it \
         as a gripping story for listeners who cannot see the panels.\n\
         4. \"mood\": one of [\"Action\", \"Suspense\", \"Sad\", \"Happy\", \"Neutral\"].\n\
         5. \"style_instructions\": directions for the voice actor, in English.\n\n\
         Respond with a JSON array only, for example:\n\
         [{{\"start_page\": 1, \"end_page\": 2, \"script\": \"...\", \"mood\": \"Action\", \
         \"style_instructions\": \"...\"}}]"
    )
}

#[cfg(test)]
#[path = "../../tests/unit/providers/gemini.rs"]
mod tests;
