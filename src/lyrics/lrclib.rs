//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// LRCLIB API response (only the fields we read)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LrclibResponse {
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

impl LrclibResponse {
    /// Raw lyrics text, synced preferred over plain
    pub fn best_text(&self) -> Option<&str> {
        [&self.synced_lyrics, &self.plain_lyrics]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
    }
}

/// Track fields LRCLIB matches on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackQuery {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<u32>,
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = concat!("lrcsync/", env!("CARGO_PKG_VERSION"));

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get lyrics by track info: exact match first, then search
    pub async fn get_lyrics(&self, query: &TrackQuery) -> anyhow::Result<Option<LrclibResponse>> {
        if let Some(lyrics) = self.get_exact(query).await? {
            return Ok(Some(lyrics));
        }
        tracing::debug!(title = %query.title, "no exact lrclib match, searching");
        self.search(query).await
    }

    async fn get_exact(&self, query: &TrackQuery) -> anyhow::Result<Option<LrclibResponse>> {
        let response = self
            .client
            .get(self.get_url(query))
            .send()
            .await
            .context("lrclib get")?;

        if response.status().is_success() {
            let lyrics: LrclibResponse = response.json().await.context("decode lrclib get")?;
            Ok(Some(lyrics))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }

    async fn search(&self, query: &TrackQuery) -> anyhow::Result<Option<LrclibResponse>> {
        let response = self
            .client
            .get(self.search_url(query))
            .send()
            .await
            .context("lrclib search")?;

        if response.status().is_success() {
            let results: Vec<LrclibResponse> =
                response.json().await.context("decode lrclib search")?;

            // First result with synced lyrics, or any result
            let best = results
                .iter()
                .find(|r| r.synced_lyrics.is_some())
                .or_else(|| results.first());

            Ok(best.cloned())
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }
    }

    fn get_url(&self, query: &TrackQuery) -> String {
        let mut url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(&query.title),
            urlencoding::encode(&query.artist)
        );
        if let Some(album) = &query.album {
            url.push_str(&format!("&album_name={}", urlencoding::encode(album)));
        }
        if let Some(duration) = query.duration_secs {
            url.push_str(&format!("&duration={}", duration));
        }
        url
    }

    fn search_url(&self, query: &TrackQuery) -> String {
        let q = format!("{} {}", query.title, query.artist);
        format!("{}/search?q={}", self.base_url, urlencoding::encode(&q))
    }
}
