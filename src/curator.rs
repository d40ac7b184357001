//! LLM curation boundary: ask the model for the k most valuable candidate
//! texts and map its free-text reply back to row ordinals.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Chat-completion seam; the pipeline needs exactly one reply per run.
pub trait ChatModel {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

pub struct OpenAiChat {
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            api_key,
            model,
            client,
        })
    }
}

impl ChatModel for OpenAiChat {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let resp = self
            .client
            .post(OPENAI_URL)
            .headers(headers)
            .json(&body)
            .send()
            .context("failed to call OpenAI chat completions")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("OpenAI returned {}: {}", status, text);
        }
        let parsed: ChatResponse = resp.json().context("failed to parse OpenAI response")?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(reply)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

/// Ask the model for the `k` most valuable texts. Returns 1-based positions
/// into `texts` in the order the model mentioned them, or `None` when the
/// call fails or yields nothing usable. The caller never fabricates a
/// selection out of a failed call.
pub fn select_best<M: ChatModel>(model: &M, texts: &[String], k: usize) -> Option<Vec<usize>> {
    if texts.is_empty() {
        return None;
    }

    let reply = match model.complete(&system_prompt(k), &user_prompt(texts)) {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Curation request failed: {:#}", e);
            return None;
        }
    };

    let positions = validate_positions(&extract_ordinals(&reply), texts.len());
    if positions.is_empty() {
        warn!("Curation reply contained no usable positions: {:?}", reply);
        return None;
    }
    info!(
        "Model selected {} of {} candidates",
        positions.len(),
        texts.len()
    );
    Some(positions)
}

fn system_prompt(k: usize) -> String {
    format!(
        "You are an expert curator of AI news. You will be given a numbered list \
         of texts. Pick the {} texts that carry the most valuable information about \
         new developments, trends or important events in AI. Reply with exactly \
         those {} positions as a bare comma-separated list of numbers and nothing \
         else.",
        k, k
    )
}

fn user_prompt(texts: &[String]) -> String {
    let mut out = String::from("Candidate texts:\n");
    for (i, text) in texts.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, text));
    }
    out
}

/// Every maximal signed integer in the reply, in encountered order. The
/// model is asked for a bare list but is not trusted to produce one.
fn extract_ordinals(reply: &str) -> Vec<i64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"-?\d+").unwrap());
    re.find_iter(reply)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .collect()
}

/// Drop anything outside 1..=len; repeats pass through unchanged.
fn validate_positions(candidates: &[i64], len: usize) -> Vec<usize> {
    candidates
        .iter()
        .filter(|&&p| p >= 1 && p <= len as i64)
        .map(|&p| p as usize)
        .collect()
}
