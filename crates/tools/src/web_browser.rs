//! Web browser tool: reads a page and answers a question about it.
//!
//! The input is `"url","task"`. The page is fetched with `reqwest`, turned
//! into plain text with `html2text`, and split into overlapping chunks.
//! With a task, chunks are ranked against it by embedding similarity;
//! without one, the leading chunks are summarised. The reasoning model
//! writes the answer and the page's first links are appended.

use async_trait::async_trait;
use persanna_config::BrowserConfig;
use persanna_core::error::ToolError;
use persanna_core::message::Message;
use persanna_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use persanna_core::tool::Tool;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const TOOL_NAME: &str = "web-browser";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub struct WebBrowserTool {
    provider: Arc<dyn Provider>,
    model: String,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    settings: BrowserConfig,
    client: reqwest::Client,
}

impl WebBrowserTool {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
        settings: BrowserConfig,
    ) -> Self {
        let client = http_client(&settings).unwrap_or_else(|e| {
            warn!(error = %e, "Browser HTTP client build failed; using defaults without timeout");
            reqwest::Client::new()
        });

        Self {
            provider,
            model: model.into(),
            embedder,
            embedding_model: embedding_model.into(),
            settings,
            client,
        }
    }

    async fn fetch(&self, url: &Url) -> Result<(String, bool), ToolError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html, application/xhtml+xml;q=0.9, */*;q=0.1")
            .send()
            .await
            .map_err(|e| ToolError::failed(TOOL_NAME, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ToolError::failed(
                TOOL_NAME,
                format!("server returned status {}", response.status()),
            ));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::failed(TOOL_NAME, format!("failed to read body: {e}")))?;

        Ok((body, is_html))
    }

    /// Pick the chunks the model gets to see.
    async fn select_chunks(&self, chunks: Vec<String>, task: &str) -> Result<Vec<String>, ToolError> {
        let top_k = self.settings.top_k.max(1);
        if task.is_empty() || chunks.len() <= top_k {
            return Ok(chunks.into_iter().take(top_k).collect());
        }

        let mut inputs = Vec::with_capacity(chunks.len() + 1);
        inputs.push(task.to_string());
        inputs.extend(chunks.iter().cloned());

        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs,
            })
            .await
            .map_err(|e| ToolError::failed(TOOL_NAME, format!("embedding failed: {e}")))?;

        if response.embeddings.len() != chunks.len() + 1 {
            return Err(ToolError::failed(
                TOOL_NAME,
                format!(
                    "expected {} embeddings, got {}",
                    chunks.len() + 1,
                    response.embeddings.len()
                ),
            ));
        }

        let (query, vectors) = response.embeddings.split_at(1);
        let ranked = rank_by_similarity(&query[0], vectors, top_k);
        debug!(chunks = chunks.len(), selected = ranked.len(), "Ranked page chunks");

        let mut chunks: Vec<Option<String>> = chunks.into_iter().map(Some).collect();
        Ok(ranked
            .into_iter()
            .filter_map(|idx| chunks[idx].take())
            .collect())
    }
}

#[async_trait]
impl Tool for WebBrowserTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "useful for when you need to find something on or summarize a webpage. input should be a \
         comma separated list of \"ONE valid http URL including protocol\",\"what you want to find \
         on the page or empty string for a summary\"."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let (raw_url, task) = parse_input(input);
        if raw_url.is_empty() {
            return Err(ToolError::invalid(TOOL_NAME, "missing URL"));
        }
        let url = Url::parse(&raw_url)
            .map_err(|e| ToolError::invalid(TOOL_NAME, format!("invalid URL `{raw_url}`: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ToolError::invalid(
                TOOL_NAME,
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }

        debug!(url = %url, task = %task, "Browsing page");
        let (body, is_html) = self.fetch(&url).await?;

        let (text, links) = if is_html {
            let text = html2text::from_read(body.as_bytes(), 120)
                .map_err(|e| ToolError::failed(TOOL_NAME, format!("could not read page: {e}")))?;
            (text, extract_links(&body, &url, self.settings.max_links))
        } else {
            (body, Vec::new())
        };

        let text = truncate_chars(text.trim(), self.settings.max_page_chars);
        let chunks = split_chunks(text, self.settings.chunk_size, self.settings.chunk_overlap);
        if chunks.is_empty() {
            return Err(ToolError::failed(TOOL_NAME, "page has no readable text"));
        }

        let context = self.select_chunks(chunks, &task).await?.join("\n");
        let wanted = if task.is_empty() { "a summary" } else { task.as_str() };
        let prompt = format!("Text:{context}\n\nI need {wanted} from the above text.");

        let mut request = ProviderRequest::new(&self.model, vec![Message::user(prompt)]);
        request.max_tokens = Some(self.settings.summary_max_tokens);
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ToolError::failed(TOOL_NAME, format!("summary failed: {e}")))?;

        let mut output = response.message.content.trim().to_string();
        if !links.is_empty() {
            output.push_str("\n\nRelevant Links:");
            for (text, href) in &links {
                output.push_str(&format!("\n- [{text}]({href})"));
            }
        }
        Ok(output)
    }
}

fn http_client(settings: &BrowserConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

/// Split `"url","task"` into its two parts, dropping quotes and whitespace.
pub fn parse_input(input: &str) -> (String, String) {
    fn clean(part: &str) -> String {
        let t = part.trim();
        let t = t.strip_prefix('"').unwrap_or(t);
        let t = t.strip_suffix('"').unwrap_or(t);
        t.trim().to_string()
    }

    let mut parts = input.splitn(2, ',');
    let url = parts.next().map(clean).unwrap_or_default();
    let task = parts.next().map(clean).unwrap_or_default();
    (url, task)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Split text into overlapping windows of at most `size` characters,
/// preferring to break on whitespace.
pub fn split_chunks(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    let overlap = overlap.min(size - 1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + size).min(chars.len());
        if end < chars.len() {
            if let Some(ws) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                if ws > size / 2 {
                    end = start + ws;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Cosine similarity between two vectors. Mismatched or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Indices of the `top_k` vectors closest to `query`, best first.
fn rank_by_similarity(query: &[f32], vectors: &[Vec<f32>], top_k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine_similarity(query, v)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(top_k).map(|(i, _)| i).collect()
}

/// Collect up to `max` distinct http(s) links as `(text, absolute_url)`.
pub fn extract_links(html: &str, base: &Url, max: usize) -> Vec<(String, String)> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    for link in document.select(&anchor) {
        if links.len() >= max {
            break;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);
        let absolute = resolved.to_string();
        if !seen.insert(absolute.clone()) {
            continue;
        }

        let text: String = link.text().collect();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let text = if text.is_empty() { absolute.clone() } else { text };
        links.push((text, absolute));
    }

    links
}
