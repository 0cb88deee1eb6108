//! Embed resolution: maps a resource URL to something an inline frame can render.
//!
//! Providers are plain data: a name, an applicability test and a transform.
//! `resolve` walks the table in order and returns the first provider whose
//! transform succeeds. A `can_embed = true` result is only a prediction; the
//! frame may still refuse to load, which the player tracks separately.

pub mod youtube;

use reqwest::Url;
use serde::Serialize;

pub struct Provider {
    pub name: &'static str,
    matches: fn(&str) -> bool,
    embed: fn(&str) -> Option<String>,
}

impl Provider {
    pub fn matches(&self, url: &str) -> bool {
        (self.matches)(url)
    }

    pub fn embed(&self, url: &str) -> Option<String> {
        (self.embed)(url)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedResolution {
    pub embed_url: String,
    pub can_embed: bool,
    pub provider: Option<&'static str>,
}

impl EmbedResolution {
    fn not_embeddable(url: &str) -> Self {
        Self {
            embed_url: url.to_string(),
            can_embed: false,
            provider: None,
        }
    }
}

/// Alternatives offered when a resource cannot be shown inline.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FallbackLinks {
    pub open_in_new_tab: String,
    pub reader_mode: Option<String>,
    pub copy_url: String,
}

// Embed-form matchers come before the matchers that rewrite into them.
pub static PROVIDERS: &[Provider] = &[
    Provider {
        name: "youtube-watch",
        matches: is_youtube_watch,
        embed: youtube_watch,
    },
    Provider {
        name: "youtube-short-link",
        matches: is_youtube_short_link,
        embed: youtube_short_link,
    },
    Provider {
        name: "youtube-embed",
        matches: is_youtube_embed,
        embed: unchanged,
    },
    Provider {
        name: "youtube-shorts",
        matches: is_youtube_shorts,
        embed: youtube_shorts,
    },
    Provider {
        name: "vimeo",
        matches: is_vimeo,
        embed: vimeo,
    },
    Provider {
        name: "codepen-embed",
        matches: is_codepen_embed,
        embed: unchanged,
    },
    Provider {
        name: "codesandbox-embed",
        matches: is_codesandbox_embed,
        embed: unchanged,
    },
    Provider {
        name: "pdf",
        matches: is_pdf,
        embed: unchanged,
    },
    Provider {
        name: "google-docs",
        matches: is_google_docs,
        embed: google_docs,
    },
    Provider {
        name: "scrimba",
        matches: is_scrimba,
        embed: scrimba,
    },
    Provider {
        name: "stackblitz",
        matches: is_stackblitz,
        embed: stackblitz,
    },
    Provider {
        name: "jsfiddle",
        matches: is_jsfiddle,
        embed: jsfiddle,
    },
];

/// Resolves `url` against the provider table.
pub fn resolve(url: &str) -> EmbedResolution {
    let candidate = url.trim();
    if candidate.is_empty() {
        return EmbedResolution::not_embeddable(url);
    }

    PROVIDERS
        .iter()
        .filter(|p| p.matches(candidate))
        .find_map(|p| {
            p.embed(candidate).map(|embed_url| EmbedResolution {
                embed_url,
                can_embed: true,
                provider: Some(p.name),
            })
        })
        .unwrap_or_else(|| EmbedResolution::not_embeddable(url))
}

pub fn fallbacks(url: &str) -> FallbackLinks {
    FallbackLinks {
        open_in_new_tab: url.to_string(),
        reader_mode: reader_mode_url(url),
        copy_url: url.to_string(),
    }
}

/// Archived copy of the page, for hosts that refuse framing.
fn reader_mode_url(url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return None;
    }
    let mut reader = Url::parse("https://archive.is/newest/").ok()?;
    reader
        .path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push(url.trim());
    Some(reader.to_string())
}

/// Text after `marker` up to the next `?` or `/`.
fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = url.split_once(marker)?;
    let id = rest.split(['?', '/']).next().unwrap_or_default();
    (!id.is_empty()).then_some(id)
}

fn unchanged(url: &str) -> Option<String> {
    Some(url.to_string())
}

fn is_youtube_watch(url: &str) -> bool {
    url.contains("youtube.com/watch")
}

fn youtube_watch(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let (_, id) = parsed.query_pairs().find(|(key, _)| key == "v")?;
    if id.is_empty() {
        return None;
    }
    Some(youtube::embed_url(&id))
}

fn is_youtube_short_link(url: &str) -> bool {
    url.contains("youtu.be/")
}

fn youtube_short_link(url: &str) -> Option<String> {
    segment_after(url, "youtu.be/").map(youtube::embed_url)
}

fn is_youtube_embed(url: &str) -> bool {
    url.contains("youtube.com/embed/")
}

fn is_youtube_shorts(url: &str) -> bool {
    url.contains("youtube.com/shorts/")
}

fn youtube_shorts(url: &str) -> Option<String> {
    segment_after(url, "youtube.com/shorts/").map(youtube::embed_url)
}

fn is_vimeo(url: &str) -> bool {
    url.contains("vimeo.com/")
}

fn vimeo(url: &str) -> Option<String> {
    let id = segment_after(url, "vimeo.com/")?;
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("https://player.vimeo.com/video/{id}"))
}

fn is_codepen_embed(url: &str) -> bool {
    url.contains("codepen.io") && url.contains("/embed/")
}

fn is_codesandbox_embed(url: &str) -> bool {
    url.contains("codesandbox.io/embed/")
}

fn is_pdf(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.ends_with(".pdf") || lower.contains(".pdf?")
}

fn is_google_docs(url: &str) -> bool {
    url.contains("docs.google.com") || url.contains("drive.google.com")
}

fn google_docs(url: &str) -> Option<String> {
    if url.contains("/preview") || url.contains("/embed") {
        return Some(url.to_string());
    }
    Some(url.replacen("/view", "/preview", 1))
}

fn is_scrimba(url: &str) -> bool {
    url.contains("scrimba.com")
}

fn scrimba(url: &str) -> Option<String> {
    if url.contains("/embed/") {
        return Some(url.to_string());
    }
    let (_, rest) = url.split_once("scrimba.com/")?;
    let rest = rest.strip_prefix("learn/").unwrap_or(rest);
    let slug = rest.split(['?', '/']).next().unwrap_or_default();
    (!slug.is_empty()).then(|| format!("https://scrimba.com/embed/{slug}"))
}

fn is_stackblitz(url: &str) -> bool {
    url.contains("stackblitz.com")
}

fn stackblitz(url: &str) -> Option<String> {
    if url.contains("/embed/") {
        return Some(url.to_string());
    }
    Some(url.replacen("stackblitz.com/", "stackblitz.com/edit/", 1))
}

fn is_jsfiddle(url: &str) -> bool {
    url.contains("jsfiddle.net")
}

fn jsfiddle(url: &str) -> Option<String> {
    if url.contains("/embedded/") {
        return Some(url.to_string());
    }
    Some(format!(
        "{}/embedded/result,html,css,js/",
        url.trim_end_matches('/')
    ))
}
