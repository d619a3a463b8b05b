//! HTML templates for post cards and embeds
//!
//! Rendering is a pure data-to-markup transform: every value taken from a
//! [`ContentItem`] passes through maud's escaping, so post text, names and
//! handles can never inject markup into the page Chrome loads.

use crate::engine::SizingPolicy;
use crate::model::ContentItem;
use crate::Viewport;
use chrono::{DateTime, Utc};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::Deserialize;

/// Script that upgrades `blockquote.twitter-tweet` into a rendered embed
pub const WIDGETS_SCRIPT_URL: &str = "https://platform.twitter.com/widgets.js";

/// Selector of an embed once the widget script has replaced the blockquote
pub const RENDERED_EMBED_SELECTOR: &str = ".twitter-tweet-rendered";

/// Visual style of a rendered item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    /// 1350×1350 card, sized for image feeds
    #[default]
    Square,
    /// Narrow card whose height follows the text
    Compact,
    /// The platform's own embed widget, cropped to the widget
    Embed,
}

impl LayoutVariant {
    /// Default capture policy for this variant
    pub fn sizing_policy(self) -> SizingPolicy {
        match self {
            LayoutVariant::Square => SizingPolicy::Fixed(Viewport {
                width: 1350,
                height: 1350,
            }),
            LayoutVariant::Compact => SizingPolicy::FitContent { width: 650 },
            LayoutVariant::Embed => SizingPolicy::FitElement {
                selector: RENDERED_EMBED_SELECTOR.to_string(),
                viewport: Viewport {
                    width: 1024,
                    height: 768,
                },
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutVariant::Square => "square",
            LayoutVariant::Compact => "compact",
            LayoutVariant::Embed => "embed",
        }
    }
}

/// Render one item into a standalone HTML document.
pub fn render(item: &ContentItem, variant: LayoutVariant) -> String {
    let body = match variant {
        LayoutVariant::Square => square_card(item),
        LayoutVariant::Compact => compact_card(item),
        LayoutVariant::Embed => embed(item),
    };
    let css = match variant {
        LayoutVariant::Square => SQUARE_CSS,
        LayoutVariant::Compact => COMPACT_CSS,
        LayoutVariant::Embed => EMBED_CSS,
    };
    document(css, body).into_string()
}

/// `Oct 19, 2026, 3:04 PM`
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %-I:%M %p").to_string()
}

fn document(css: &'static str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                style { (PreEscaped(css)) }
            }
            body {
                (body)
            }
        }
    }
}

fn square_card(item: &ContentItem) -> Markup {
    let author = &item.author;
    html! {
        div.tweet-container {
            div.profile-section {
                img.profile-image src=(author.resolved_avatar_url()) alt=(author.display_name);
                div.user-info {
                    span.user-name { (author.display_name) }
                    span.user-handle { "@" (author.handle) }
                }
            }
            div.tweet-text { (item.text) }
            @if let Some(at) = &item.created_at {
                div.tweet-time { (format_timestamp(at)) }
            }
        }
    }
}

fn compact_card(item: &ContentItem) -> Markup {
    let author = &item.author;
    html! {
        div.band {
            div.card {
                div.header {
                    img.avatar src=(author.resolved_avatar_url()) alt=(author.display_name);
                    div {
                        div.names {
                            span.name { (author.display_name) }
                            span.handle { "@" (author.handle) }
                        }
                        @if let Some(at) = &item.created_at {
                            div.time { (format_timestamp(at)) }
                        }
                    }
                }
                div.text { (item.text) }
            }
        }
    }
}

fn embed(item: &ContentItem) -> Markup {
    let href = embed_href(&item.text);
    html! {
        blockquote.twitter-tweet data-dnt="true" {
            @match &href {
                Some(href) => {
                    a href=(href) {}
                }
                None => {
                    p { (item.text) }
                }
            }
        }
        script async src=(WIDGETS_SCRIPT_URL) charset="utf-8" {}
    }
}

/// Normalize a post URL for the widget. `x.com` links are rewritten to
/// `twitter.com`; anything that is not an http(s) URL yields `None`.
fn embed_href(raw: &str) -> Option<String> {
    let mut url = url::Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if matches!(url.host_str(), Some("x.com") | Some("www.x.com")) {
        url.set_host(Some("twitter.com")).ok()?;
    }
    Some(url.to_string())
}

const SQUARE_CSS: &str = r#"
body { margin: 0; width: 1350px; height: 1350px; background: #000000; }
.tweet-container { width: 1350px; height: 1350px; padding: 60px; box-sizing: border-box; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; display: flex; flex-direction: column; }
.profile-section { display: flex; align-items: center; margin-bottom: 48px; }
.profile-image { width: 150px; height: 150px; border-radius: 50%; margin-right: 40px; }
.user-info { display: flex; flex-direction: column; gap: 12px; }
.user-name { color: #e7e9ea; font-weight: 700; font-size: 56px; line-height: 1.2; }
.user-handle { color: rgb(113, 118, 123); font-size: 44px; line-height: 1.2; }
.tweet-text { color: #e7e9ea; font-size: 60px; line-height: 1.5; white-space: pre-wrap; margin-bottom: 48px; flex-grow: 1; overflow-wrap: anywhere; }
.tweet-time { color: rgb(113, 118, 123); font-size: 36px; line-height: 1.2; margin-top: auto; }
"#;

const COMPACT_CSS: &str = r#"
body { margin: 0; }
.band { background-color: #2e1065; padding: 20px; }
.card { background: #000000; border-radius: 16px; padding: 12px 16px; margin-bottom: 16px; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; width: 598px; box-sizing: border-box; }
.header { display: flex; align-items: center; margin-bottom: 12px; }
.avatar { width: 48px; height: 48px; border-radius: 50%; margin-right: 12px; }
.names { display: flex; align-items: center; gap: 4px; }
.name { color: #e7e9ea; font-weight: 700; font-size: 15px; }
.handle, .time { color: rgb(113, 118, 123); font-size: 15px; }
.text { color: #e7e9ea; font-size: 15px; line-height: 1.5; white-space: pre-wrap; margin-bottom: 12px; overflow-wrap: anywhere; }
"#;

const EMBED_CSS: &str = "body { margin: 0; background: transparent; }";
