use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vellum_media::link_card::{
    CardResolver, MetadataError, MetadataSource, PartialMetadata, Platform, normalize_url,
    resolve_metadata,
};

struct StaticSource {
    name: &'static str,
    metadata: PartialMetadata,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    fn new(name: &'static str, metadata: PartialMetadata) -> Self {
        Self {
            name,
            metadata,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl MetadataSource for StaticSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _url: &str) -> Result<PartialMetadata, MetadataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metadata.clone())
    }
}

struct FailingSource;

#[async_trait]
impl MetadataSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self, _url: &str) -> Result<PartialMetadata, MetadataError> {
        Err(MetadataError::BadStatus(503))
    }
}

fn full_metadata(title: &str) -> PartialMetadata {
    PartialMetadata {
        title: Some(title.to_string()),
        description: Some(format!("{title} description")),
        image: Some("https://example.com/og.png".to_string()),
        site_name: Some("Example".to_string()),
    }
}

#[test]
fn normalize_prefixes_https_when_schemeless() {
    let normalized = normalize_url("example.com/page").unwrap();
    assert_eq!(normalized.url, "https://example.com/page");
    assert_eq!(normalized.host, "example.com");

    let normalized = normalize_url("http://example.com").unwrap();
    assert_eq!(normalized.url, "http://example.com");

    assert!(normalize_url("   ").is_none());
    assert!(normalize_url("https://").is_none());
}

#[test]
fn hostname_classification_covers_known_platforms() {
    assert_eq!(Platform::classify("www.youtube.com"), Platform::YouTube);
    assert_eq!(Platform::classify("youtu.be"), Platform::YouTube);
    assert_eq!(Platform::classify("x.com"), Platform::Twitter);
    assert_eq!(Platform::classify("github.com"), Platform::GitHub);
    assert_eq!(Platform::classify("example.com"), Platform::Generic);
}

#[tokio::test]
async fn all_sources_failing_falls_back_to_hostname_fields() {
    let sources: Vec<Box<dyn MetadataSource>> =
        vec![Box::new(FailingSource), Box::new(FailingSource)];
    let normalized = normalize_url("example.com/article").unwrap();

    let card = resolve_metadata(&sources, &normalized).await;
    assert_eq!(card.title, "example.com");
    assert_eq!(card.site_name, "example.com");
    assert_eq!(card.description, "https://example.com/article");
    assert_eq!(card.domain, "example.com");
    assert_eq!(card.card_type, "generic");
    assert!(card.image.is_none());

    // Fallback metadata is still fully insertable.
    let args = card.insert_args();
    assert_eq!(args["href"], "https://example.com/article");
    assert_eq!(args["title"], "example.com");
}

#[tokio::test]
async fn chain_stops_at_the_first_complete_source() {
    let first = StaticSource::new("first", full_metadata("First"));
    let second = StaticSource::new("second", full_metadata("Second"));
    let second_calls = second.counter();
    let sources: Vec<Box<dyn MetadataSource>> = vec![Box::new(first), Box::new(second)];

    let normalized = normalize_url("https://example.com").unwrap();
    let card = resolve_metadata(&sources, &normalized).await;

    assert_eq!(card.title, "First");
    assert_eq!(card.description, "First description");
    // The second source was never consulted.
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partial_sources_merge_field_wise() {
    let title_only = StaticSource::new(
        "title-only",
        PartialMetadata {
            title: Some("Only title".to_string()),
            ..PartialMetadata::default()
        },
    );
    let description_only = StaticSource::new(
        "description-only",
        PartialMetadata {
            description: Some("Found later".to_string()),
            site_name: Some("Later".to_string()),
            ..PartialMetadata::default()
        },
    );
    let sources: Vec<Box<dyn MetadataSource>> =
        vec![Box::new(title_only), Box::new(description_only)];

    let normalized = normalize_url("https://example.com").unwrap();
    let card = resolve_metadata(&sources, &normalized).await;
    assert_eq!(card.title, "Only title");
    assert_eq!(card.description, "Found later");
    assert_eq!(card.site_name, "Later");
}

#[tokio::test]
async fn stale_resolutions_never_overwrite_newer_input() {
    let sources: Vec<Box<dyn MetadataSource>> = vec![Box::new(FailingSource)];
    let mut resolver = CardResolver::new(sources);

    let (first_ticket, first_url) = resolver.begin("first.example.com").unwrap();
    let (second_ticket, second_url) = resolver.begin("second.example.com").unwrap();
    assert!(!resolver.can_insert());

    // The slower, older fetch lands after the newer one began.
    let second_card = resolve_metadata(resolver.sources(), &second_url).await;
    let first_card = resolve_metadata(resolver.sources(), &first_url).await;

    assert!(resolver.complete(second_ticket, second_card));
    assert!(!resolver.complete(first_ticket, first_card));

    let preview = resolver.preview().expect("newest preview");
    assert_eq!(preview.domain, "second.example.com");
    assert!(resolver.can_insert());
}

#[test]
fn insertion_is_blocked_until_resolution_lands() {
    let resolver = CardResolver::new(Vec::new());
    assert!(!resolver.can_insert());
    assert!(resolver.preview().is_none());
}

#[test]
fn unparseable_input_clears_the_preview() {
    let mut resolver = CardResolver::new(Vec::new());
    assert!(resolver.begin("   ").is_none());
    assert!(!resolver.can_insert());
}
