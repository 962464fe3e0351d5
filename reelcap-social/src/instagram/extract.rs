//! Caption extraction pipeline.
//!
//! Each strategy is a pure `fn(&str) -> Option<Candidate>` over the raw
//! response body. [`STRATEGIES`] lists them from the most to the least
//! structurally reliable source and [`first_success`] returns the first one
//! whose caption survives [`normalize_caption`].
use std::sync::LazyLock;

use regex::Regex;
use reelcap_common::{ExtractionMethod, ExtractionResult};
use serde::Deserialize as _;
use serde_json::Value;

use super::decode::{decode_entities, normalize_caption};
use super::types::{ApiPayload, Media};

/// Username reported when the structured payload has no owner.
pub const UNKNOWN_USERNAME: &str = "Unknown";

static LD_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("LD_JSON_RE should compile")
});

// stops at the first nested <div> (comment counters) or the closing tag
static CAPTION_DIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class\s*=\s*["'][^"']*\bCaption\b[^"']*["'][^>]*>(.*?)(?:<div\b|</div>)"#)
        .expect("CAPTION_DIV_RE should compile")
});

static CAPTION_USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]*class\s*=\s*["'][^"']*\bCaptionUsername\b[^"']*["'][^>]*>(.*?)</a>"#)
        .expect("CAPTION_USER_RE should compile")
});

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("BR_RE should compile"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("TAG_RE should compile"));

static OG_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta[^>]*property\s*=\s*["']og:description["'][^>]*content\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("OG_DESC_RE should compile")
});

static OG_DESC_RE2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta[^>]*content\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*property\s*=\s*["']og:description["']"#)
        .expect("OG_DESC_RE2 should compile")
});

// "1,234 likes, 56 comments - natgeo on March 1, 2024: "caption""
static OG_POST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^\s*([\d.,]+[KkMm]?)\s+likes?,\s*[\d.,]+[KkMm]?\s+comments?\s+-\s+([A-Za-z0-9._]+)\s+on\s+[^:]+:\s*(?:&quot;|"|“)(.*?)(?:&quot;|"|”)\.?\s*$"#)
        .expect("OG_POST_RE should compile")
});

// "natgeo on Instagram: "caption""
static OG_USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^\s*([A-Za-z0-9._]+)\s+on\s+Instagram:\s*(?:&quot;|"|“)(.*?)(?:&quot;|"|”)\s*$"#)
        .expect("OG_USER_RE should compile")
});

static INLINE_CAPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""caption"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("INLINE_CAPTION_RE should compile")
});

static SHARED_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\._sharedData\s*=\s*(\{.*?\})\s*;\s*</script>")
        .expect("SHARED_DATA_RE should compile")
});

const SHARED_DATA_MEDIA_POINTER: &str = "/entry_data/PostPage/0/graphql/shortcode_media";

/// Raw output of one strategy, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub caption: String,
    pub username: Option<String>,
    pub likes: Option<u64>,
}

impl Candidate {
    fn caption(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            ..Default::default()
        }
    }
}

/// A normalized, non-empty caption and whatever could be attributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub caption: String,
    pub username: Option<String>,
    pub likes: Option<u64>,
    pub method: ExtractionMethod,
}

impl From<Extraction> for ExtractionResult {
    fn from(found: Extraction) -> Self {
        ExtractionResult::success(found.caption, found.method)
            .with_username(found.username)
            .with_likes(found.likes)
    }
}

/// One self-contained extraction attempt.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub method: ExtractionMethod,
    pub run: fn(&str) -> Option<Candidate>,
}

pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        method: ExtractionMethod::Api,
        run: structured_payload,
    },
    Strategy {
        method: ExtractionMethod::LdJson,
        run: ld_json_script,
    },
    Strategy {
        method: ExtractionMethod::CaptionMarkup,
        run: caption_markup,
    },
    Strategy {
        method: ExtractionMethod::MetaTags,
        run: og_description,
    },
    Strategy {
        method: ExtractionMethod::InlineJson,
        run: inline_caption_fragment,
    },
    Strategy {
        method: ExtractionMethod::SharedData,
        run: shared_data_blob,
    },
];

/// Run the full pipeline over a response body.
pub fn extract_caption(body: &str) -> Option<Extraction> {
    first_success(STRATEGIES, body)
}

/// Evaluate `strategies` in order and keep the first normalized, non-empty caption.
pub fn first_success(strategies: &[Strategy], body: &str) -> Option<Extraction> {
    strategies.iter().find_map(|strategy| {
        let candidate = (strategy.run)(body)?;
        let Some(caption) = normalize_caption(&candidate.caption) else {
            tracing::debug!(method = %strategy.method, "strategy matched an empty caption");
            return None;
        };
        tracing::debug!(method = %strategy.method, caption_len = caption.len(), "caption extracted");
        Some(Extraction {
            caption,
            username: candidate
                .username
                .map(|name| decode_entities(name.trim()).into_owned())
                .filter(|name| !name.is_empty()),
            likes: candidate.likes,
            method: strategy.method,
        })
    })
}

// ==============================
// Strategies
// ==============================

fn media_candidate(media: &Media) -> Option<Candidate> {
    Some(Candidate {
        caption: media.caption_text()?.to_string(),
        username: Some(media.username().unwrap_or(UNKNOWN_USERNAME).to_string()),
        likes: Some(media.likes()),
    })
}

/// JSON API payload: `items[0]` or `graphql.shortcode_media`.
pub fn structured_payload(body: &str) -> Option<Candidate> {
    let payload: ApiPayload = serde_json::from_str(body.trim()).ok()?;
    media_candidate(payload.media()?)
}

/// `caption` of the first JSON-LD block that has one.
pub fn ld_json_script(body: &str) -> Option<Candidate> {
    LD_JSON_RE
        .captures_iter(body)
        .filter_map(|caps| serde_json::from_str::<Value>(caps[1].trim()).ok())
        .find_map(|doc| ld_caption(&doc))
}

fn ld_caption(doc: &Value) -> Option<Candidate> {
    match doc {
        Value::Array(nodes) => nodes.iter().find_map(ld_caption),
        Value::Object(map) => {
            if let Some(caption) = map
                .get("caption")
                .and_then(Value::as_str)
                .filter(|c| !c.trim().is_empty())
            {
                let username = map
                    .get("author")
                    .and_then(|a| a.get("alternateName"))
                    .and_then(Value::as_str)
                    .map(|name| name.trim_start_matches('@').to_string());
                return Some(Candidate {
                    caption: caption.to_string(),
                    username,
                    likes: None,
                });
            }
            map.get("@graph").and_then(ld_caption)
        }
        _ => None,
    }
}

/// Inner text of the embed page's `Caption` container.
pub fn caption_markup(body: &str) -> Option<Candidate> {
    let inner = CAPTION_DIV_RE.captures(body)?.get(1)?.as_str();
    let username = CAPTION_USER_RE
        .captures(inner)
        .and_then(|caps| caps.get(1))
        .map(|m| TAG_RE.replace_all(m.as_str(), "").trim().to_string());
    let text = CAPTION_USER_RE.replace(inner, "");
    let text = BR_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    Some(Candidate {
        caption: text.into_owned(),
        username,
        likes: None,
    })
}

/// `og:description` content, split into parts when it has Instagram's
/// "N likes, M comments - user on DATE: "caption"" shape.
pub fn og_description(body: &str) -> Option<Candidate> {
    let caps = OG_DESC_RE
        .captures(body)
        .or_else(|| OG_DESC_RE2.captures(body))?;
    let content = caps.get(1).or_else(|| caps.get(2))?.as_str();

    if let Some(post) = OG_POST_RE.captures(content) {
        return Some(Candidate {
            caption: post[3].to_string(),
            username: Some(post[2].to_string()),
            likes: parse_count(&post[1]),
        });
    }
    if let Some(post) = OG_USER_RE.captures(content) {
        return Some(Candidate {
            caption: post[2].to_string(),
            username: Some(post[1].to_string()),
            likes: None,
        });
    }
    Some(Candidate::caption(content))
}

/// First non-blank inline `"caption":"..."` string literal, JSON-unescaped.
pub fn inline_caption_fragment(body: &str) -> Option<Candidate> {
    INLINE_CAPTION_RE
        .captures_iter(body)
        .map(|caps| {
            let raw = &caps[1];
            serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
        })
        .find(|text| !text.trim().is_empty())
        .map(Candidate::caption)
}

/// Legacy `window._sharedData` blob embedding the GraphQL media node.
pub fn shared_data_blob(body: &str) -> Option<Candidate> {
    let raw = SHARED_DATA_RE.captures(body)?.get(1)?.as_str();
    let doc: Value = serde_json::from_str(raw).ok()?;
    let node = doc.pointer(SHARED_DATA_MEDIA_POINTER)?;
    let media = Media::deserialize(node).ok()?;
    media_candidate(&media)
}

/// "1,234" → 1234, "1.2K" → 1200, "3M" → 3000000.
fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim().replace(',', "");
    let (digits, factor) = match raw.chars().last()? {
        'k' | 'K' => (&raw[..raw.len() - 1], 1_000.0),
        'm' | 'M' => (&raw[..raw.len() - 1], 1_000_000.0),
        _ => (raw.as_str(), 1.0),
    };
    let value: f64 = digits.parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| (value * factor).round() as u64)
}
