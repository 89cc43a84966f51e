//! Link-card metadata resolution.
//!
//! A URL is normalized, classified against a fixed platform set, then run
//! through a chain of metadata sources. The chain stops at the first source
//! yielding both a title and a description; if every source fails, the card
//! falls back to hostname-derived fields, so insertion always stays
//! possible. A generation counter keeps stale responses from overwriting a
//! newer input's preview.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("metadata endpoint returned status {0}")]
    BadStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub url: String,
    pub host: String,
}

/// Prefix `https://` when the input has no scheme, then parse. `None` means
/// the input cannot become a URL at all.
pub fn normalize_url(input: &str) -> Option<NormalizedUrl> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = reqwest::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_string();
    Some(NormalizedUrl {
        url: with_scheme,
        host,
    })
}

/// The fixed set of recognized platforms; anything else renders as a
/// generic card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Vimeo,
    Twitter,
    Instagram,
    Spotify,
    GitHub,
    Generic,
}

impl Platform {
    pub fn classify(host: &str) -> Platform {
        let host = host.strip_prefix("www.").unwrap_or(host);
        match host {
            "youtube.com" | "youtu.be" | "m.youtube.com" => Platform::YouTube,
            "vimeo.com" => Platform::Vimeo,
            "twitter.com" | "x.com" => Platform::Twitter,
            "instagram.com" => Platform::Instagram,
            "open.spotify.com" | "spotify.com" => Platform::Spotify,
            "github.com" | "gist.github.com" => Platform::GitHub,
            _ => Platform::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Vimeo => "vimeo",
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::Spotify => "spotify",
            Platform::GitHub => "github",
            Platform::Generic => "generic",
        }
    }
}

/// Whatever one source managed to find. Field names tolerate both snake and
/// camel case on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "siteName")]
    pub site_name: Option<String>,
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, url: &str) -> Result<PartialMetadata, MetadataError>;
}

/// The application's own metadata endpoint: `POST { url }`.
pub struct ApiMetadataSource {
    client: reqwest::Client,
    endpoint: String,
}

impl ApiMetadataSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MetadataSource for ApiMetadataSource {
    fn name(&self) -> &str {
        "api"
    }

    async fn fetch(&self, url: &str) -> Result<PartialMetadata, MetadataError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MetadataError::BadStatus(response.status().as_u16()));
        }
        Ok(response.json::<PartialMetadata>().await?)
    }
}

/// The resolved card, ready to become `link_card` node attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CardMetadata {
    pub href: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub site_name: String,
    pub domain: String,
    pub card_type: &'static str,
}

impl CardMetadata {
    /// Args for the core's `link_card.insert` command.
    pub fn insert_args(&self) -> serde_json::Value {
        let mut args = serde_json::json!({
            "href": self.href,
            "title": self.title,
            "description": self.description,
            "site_name": self.site_name,
            "domain": self.domain,
            "card_type": self.card_type,
        });
        if let Some(image) = &self.image {
            args["image"] = serde_json::Value::String(image.clone());
        }
        args
    }
}

/// Run the source chain for one normalized URL. Partial results merge
/// field-wise (first non-empty wins); hostname fallbacks fill whatever is
/// still missing at the end.
pub async fn resolve_metadata(
    sources: &[Box<dyn MetadataSource>],
    normalized: &NormalizedUrl,
) -> CardMetadata {
    let mut merged = PartialMetadata::default();

    for source in sources {
        match source.fetch(&normalized.url).await {
            Ok(partial) => {
                merged.title = merged.title.or(partial.title);
                merged.description = merged.description.or(partial.description);
                merged.image = merged.image.or(partial.image);
                merged.site_name = merged.site_name.or(partial.site_name);
                if merged.title.is_some() && merged.description.is_some() {
                    break;
                }
            }
            Err(err) => {
                log::warn!("metadata source '{}' failed: {err}", source.name());
            }
        }
    }

    CardMetadata {
        href: normalized.url.clone(),
        title: merged.title.unwrap_or_else(|| normalized.host.clone()),
        description: merged.description.unwrap_or_else(|| normalized.url.clone()),
        image: merged.image,
        site_name: merged.site_name.unwrap_or_else(|| normalized.host.clone()),
        domain: normalized.host.clone(),
        card_type: Platform::classify(&normalized.host).as_str(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ResolveState {
    Idle,
    Pending,
    Ready(CardMetadata),
}

/// Preview state for the link-card insert dialog. `begin` on every input
/// change; `complete` with the ticket the matching `begin` returned — a
/// stale ticket is ignored, so the newest input always wins.
pub struct CardResolver {
    sources: Vec<Box<dyn MetadataSource>>,
    generation: u64,
    state: ResolveState,
}

impl CardResolver {
    pub fn new(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self {
            sources,
            generation: 0,
            state: ResolveState::Idle,
        }
    }

    pub fn sources(&self) -> &[Box<dyn MetadataSource>] {
        &self.sources
    }

    /// Register a new input. Unparseable input clears the preview and
    /// returns `None`.
    pub fn begin(&mut self, input: &str) -> Option<(u64, NormalizedUrl)> {
        self.generation += 1;
        match normalize_url(input) {
            Some(normalized) => {
                self.state = ResolveState::Pending;
                Some((self.generation, normalized))
            }
            None => {
                self.state = ResolveState::Idle;
                None
            }
        }
    }

    /// Land a resolution. Returns false (and changes nothing) when a newer
    /// `begin` superseded this ticket.
    pub fn complete(&mut self, ticket: u64, metadata: CardMetadata) -> bool {
        if ticket != self.generation {
            log::debug!("link card: dropping stale resolution (ticket {ticket})");
            return false;
        }
        self.state = ResolveState::Ready(metadata);
        true
    }

    /// Insertion is blocked while resolution is pending or absent.
    pub fn can_insert(&self) -> bool {
        matches!(self.state, ResolveState::Ready(_))
    }

    pub fn preview(&self) -> Option<&CardMetadata> {
        match &self.state {
            ResolveState::Ready(metadata) => Some(metadata),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = ResolveState::Idle;
    }
}
