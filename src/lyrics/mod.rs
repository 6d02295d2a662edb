//! Lyrics: parsing, active line lookup and sourcing raw LRC text
//!
//! This module provides:
//! - LRC format parser producing sorted, timed lines
//! - Active line resolution for a playback position
//! - LRCLIB API client and a cached lookup service on top of it
//! - Local file / stdin loading

pub mod lrclib;
pub mod parser;
pub mod resolver;

pub use lrclib::{LrclibClient, TrackQuery};
pub use parser::{LyricLine, ParsedLyrics};
pub use resolver::{LyricsWindow, active_index};

use anyhow::Context;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Something that can hand out raw lyrics text for a track.
pub trait LyricsSource {
    fn fetch_raw(
        &self,
        query: &TrackQuery,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

impl LyricsSource for LrclibClient {
    async fn fetch_raw(&self, query: &TrackQuery) -> anyhow::Result<Option<String>> {
        let response = self.get_lyrics(query).await?;
        Ok(response.and_then(|r| r.best_text().map(str::to_string)))
    }
}

/// Looks lyrics up through a source, remembering recent answers.
///
/// "Not found" is cached too, so a track without lyrics isn't re-queried on
/// every track change. The cache is bounded and belongs to the service.
pub struct LyricsService<S> {
    source: S,
    cache: LruCache<TrackQuery, Option<ParsedLyrics>>,
}

impl<S: LyricsSource> LyricsService<S> {
    pub fn new(source: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            cache: LruCache::new(capacity),
        }
    }

    pub async fn lookup(&mut self, query: &TrackQuery) -> anyhow::Result<Option<ParsedLyrics>> {
        if let Some(cached) = self.cache.get(query) {
            tracing::debug!(title = %query.title, "lyrics cache hit");
            return Ok(cached.clone());
        }

        let raw = self.source.fetch_raw(query).await?;
        let lyrics = raw.map(|text| ParsedLyrics::parse(&text));
        match &lyrics {
            Some(l) if l.is_empty() => {
                tracing::warn!(title = %query.title, "lyrics found but nothing parsed")
            }
            Some(l) => tracing::info!(title = %query.title, lines = l.len(), "lyrics loaded"),
            None => tracing::info!(title = %query.title, "no lyrics found"),
        }

        self.cache.put(query.clone(), lyrics.clone());
        Ok(lyrics)
    }
}

/// Read lyrics from a file, or stdin when `path` is `-`
pub async fn load_raw(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("read stdin")?;
        return Ok(raw);
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    // Lyrics files in the wild aren't always valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
