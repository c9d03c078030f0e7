// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use tracing::debug;
use url::Url;

use crate::error::FeedError;

/// Title given to feed entries that do not carry one
pub const UNTITLED_EPISODE: &str = "Untitled Episode";

/// A single downloadable podcast episode
///
/// Only entries with an `audio/*` link become episodes, so `audio_url` is
/// always present and absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub title: String,
    pub description: String,
    /// Publication date exactly as the feed wrote it
    pub published: String,
    /// Provider display format such as `"42:17"` or `"2537"`
    pub duration: String,
    pub audio_url: Url,
    pub mime_type: String,
    /// Declared size of the audio file, if the feed states one
    pub length: Option<u64>,
}

impl Episode {
    /// Best-effort interpretation of [`Episode::published`] as a timestamp
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(&self.published)
    }
}

/// A link or enclosure attached to a feed entry
struct MediaLink<'a> {
    href: &'a str,
    mime_type: &'a str,
    length: Option<&'a str>,
}

/// Parse RSS or Atom feed bytes into the episodes they describe
///
/// RSS 2.0 is tried first, then Atom. Relative audio links are resolved
/// against `base_url`. Entry order is preserved.
pub fn parse_feed(xml_bytes: &[u8], base_url: &Url) -> Result<Vec<Episode>, FeedError> {
    match rss::Channel::read_from(xml_bytes) {
        Ok(channel) => {
            debug!(items = channel.items().len(), "parsed feed as RSS");
            Ok(channel
                .items()
                .iter()
                .filter_map(|item| parse_rss_item(item, base_url))
                .collect())
        }
        Err(rss) => {
            debug!(error = %rss, "not an RSS document, trying Atom");
            match atom_syndication::Feed::read_from(xml_bytes) {
                Ok(feed) => {
                    debug!(entries = feed.entries().len(), "parsed feed as Atom");
                    Ok(feed
                        .entries()
                        .iter()
                        .filter_map(|entry| parse_atom_entry(entry, base_url))
                        .collect())
                }
                Err(atom) => Err(FeedError::Parse { rss, atom }),
            }
        }
    }
}

fn parse_rss_item(item: &rss::Item, base_url: &Url) -> Option<Episode> {
    let title = title_or_placeholder(item.title());
    let itunes = item.itunes_ext();

    let enclosure = item.enclosure().map(|enclosure| MediaLink {
        href: enclosure.url(),
        mime_type: enclosure.mime_type(),
        length: Some(enclosure.length()),
    });
    let candidates = enclosure.into_iter().chain(media_contents(item.extensions()));

    let Some((audio_url, mime_type, length)) = first_audio_link(candidates, base_url) else {
        debug!(title = %title, "skipping RSS item without audio link");
        return None;
    };

    let description = item
        .description()
        .or_else(|| itunes.and_then(|ext| ext.summary()))
        .unwrap_or_default();

    Some(Episode {
        title,
        description: description.to_string(),
        published: item.pub_date().unwrap_or_default().to_string(),
        duration: itunes
            .and_then(|ext| ext.duration())
            .unwrap_or_default()
            .to_string(),
        audio_url,
        mime_type,
        length,
    })
}

/// Media RSS `<media:content>` elements, both bare and inside `<media:group>`
fn media_contents(extensions: &rss::extension::ExtensionMap) -> Vec<MediaLink<'_>> {
    let Some(media) = extensions.get("media") else {
        return Vec::new();
    };

    let bare = media.get("content").into_iter().flatten();
    let grouped = media
        .get("group")
        .into_iter()
        .flatten()
        .flat_map(|group| group.children().get("content").into_iter().flatten());

    bare.chain(grouped)
        .filter_map(|content| {
            let attrs = content.attrs();
            Some(MediaLink {
                href: attrs.get("url")?.as_str(),
                mime_type: attrs.get("type").map(String::as_str).unwrap_or_default(),
                length: attrs.get("fileSize").map(String::as_str),
            })
        })
        .collect()
}

fn parse_atom_entry(entry: &atom_syndication::Entry, base_url: &Url) -> Option<Episode> {
    let title = title_or_placeholder(Some(entry.title().as_str()));

    let links = entry.links().iter().map(|link| MediaLink {
        href: link.href(),
        mime_type: link.mime_type().unwrap_or_default(),
        length: link.length(),
    });

    let Some((audio_url, mime_type, length)) = first_audio_link(links, base_url) else {
        debug!(title = %title, "skipping Atom entry without audio link");
        return None;
    };

    let description = entry
        .summary()
        .map(|summary| summary.as_str().to_string())
        .or_else(|| {
            entry
                .content()
                .and_then(|content| content.value().map(String::from))
        })
        .unwrap_or_default();

    let duration = entry
        .extensions()
        .get("itunes")
        .and_then(|itunes| itunes.get("duration"))
        .and_then(|values| values.first())
        .and_then(|ext| ext.value())
        .unwrap_or_default();

    Some(Episode {
        title,
        description,
        published: entry
            .published()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        duration: duration.to_string(),
        audio_url,
        mime_type,
        length,
    })
}

fn title_or_placeholder(title: Option<&str>) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_EPISODE)
        .to_string()
}

/// Pick the first link declaring an `audio/*` type that resolves to a URL
fn first_audio_link<'a>(
    links: impl IntoIterator<Item = MediaLink<'a>>,
    base_url: &Url,
) -> Option<(Url, String, Option<u64>)> {
    links
        .into_iter()
        .filter(|link| is_audio_type(link.mime_type))
        .find_map(|link| {
            let url = base_url.join(link.href.trim()).ok()?;
            let length = link.length.and_then(|l| l.trim().parse().ok());
            Some((url, link.mime_type.trim().to_string(), length))
        })
}

fn is_audio_type(mime_type: &str) -> bool {
    mime_type.trim().to_ascii_lowercase().starts_with("audio/")
}

/// Parse the date formats podcast feeds use in practice
fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt);
    }

    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    formats
        .iter()
        .find_map(|format| DateTime::parse_from_str(date_str, format).ok())
}
