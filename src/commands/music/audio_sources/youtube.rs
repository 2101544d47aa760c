//! Implements `TrackSearch` on top of the `yt-dlp` command-line tool.

use serde::Deserialize;
use serenity::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;

use super::{AudioSource, SearchResult, Track, TrackSearch};

/// Searches YouTube and loads YouTube links through `yt-dlp`.
pub struct YtDlp {
    path: String,
    search_limit: usize,
}

impl YtDlp {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.ytdlp_path.clone(),
            search_limit: config.search_limit,
        }
    }

    /// Argument passed to `yt-dlp`: URLs as-is, anything else as a search.
    fn target(&self, query: &str) -> String {
        if AudioSource::is_url(query) {
            query.to_string()
        } else {
            format!("ytsearch{}:{}", self.search_limit, query)
        }
    }
}

#[async_trait]
impl TrackSearch for YtDlp {
    async fn search(&self, query: &str) -> SearchResult {
        let target = self.target(query);
        debug!("Loading '{}' with yt-dlp", target);

        let output = match Command::new(&self.path)
            .args(["-J", "--flat-playlist", "--no-warnings", &target])
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run yt-dlp: {}", e);
                return SearchResult::Error(format!("Failed to run yt-dlp: {}", e));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp exited with {}: {}", output.status, stderr.trim());
            return SearchResult::Error(stderr.trim().to_string());
        }

        parse_output(&String::from_utf8_lossy(&output.stdout), !AudioSource::is_url(query))
    }
}

/// Subset of the `yt-dlp -J` document used to build tracks.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    entries: Vec<YtDlpInfo>,
}

impl YtDlpInfo {
    fn into_track(self) -> Option<Track> {
        let identifier = self.id?;
        let title = self.title?;

        let uri = self
            .webpage_url
            .or(self.url.filter(|url| url.starts_with("http")))
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", identifier));

        Some(Track {
            author: self.channel.or(self.uploader).unwrap_or_default(),
            duration: self
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            identifier,
            title,
            uri,
            requester: None,
        })
    }
}

/// Classify the JSON printed by `yt-dlp -J --flat-playlist`.
pub fn parse_output(json: &str, is_search: bool) -> SearchResult {
    let info: YtDlpInfo = match serde_json::from_str(json) {
        Ok(info) => info,
        Err(e) => return SearchResult::Error(format!("Failed to parse yt-dlp output: {}", e)),
    };

    if info.kind.as_deref() != Some("playlist") {
        return match info.into_track() {
            Some(track) => SearchResult::Track(track),
            None => SearchResult::Empty,
        };
    }

    let name = info.title.unwrap_or_default();
    let tracks: Vec<Track> = info
        .entries
        .into_iter()
        .filter_map(YtDlpInfo::into_track)
        .collect();

    if tracks.is_empty() {
        SearchResult::Empty
    } else if is_search {
        SearchResult::Search(tracks)
    } else {
        SearchResult::Playlist { name, tracks }
    }
}
