//! YouTube Data API v3 client.
//!
//! Three read endpoints are consumed: `search` (free-text query), `videos`
//! by id (parts snippet/statistics/contentDetails), and `videos` with
//! `chart=mostPopular` (trending). The two endpoints disagree about the
//! shape of the `id` field — `search` nests it in an object, `videos`
//! returns a bare string — so every response is normalized into [`Video`]
//! here and the raw shape never leaves this module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants::constants;

/// Errors surfaced by the API client. The app layer turns these into a
/// single user-visible message plus a retry hint; nothing here is retried
/// automatically.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("No API key configured. Set YOUTUBE_API_KEY or add api_key to prefs.toml.")]
  NoApiKey,
  #[error("YouTube API error {status}: {message}")]
  Upstream { status: u16, message: String },
  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),
  #[error("No video found for id {0}")]
  NotFound(String),
}

// --- Normalized domain model ---

/// A normalized catalog video. Invariants: `id` is a non-empty plain string
/// and `snippet.thumbnails` always carries a `default` entry; statistics and
/// content details may be absent and render as unknown, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
  pub id: String,
  pub snippet: Snippet,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub statistics: Option<Statistics>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub channel_id: String,
  #[serde(default)]
  pub channel_title: String,
  #[serde(default)]
  pub published_at: String,
  /// Thumbnail URLs keyed by size tier (default/medium/high/...).
  #[serde(default)]
  pub thumbnails: BTreeMap<String, Thumbnail>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tags: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnail {
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub width: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub height: Option<u32>,
}

/// All counts are transmitted as decimal strings and parsed lazily by the
/// formatters, so a missing or garbled field costs nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub view_count: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub like_count: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentDetails {
  /// ISO-8601 duration token, e.g. `PT1H2M3S`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dimension: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub definition: Option<String>,
}

impl Video {
  /// The smallest available thumbnail URL, preferring the `default` tier.
  /// The normalizer guarantees at least one entry exists.
  pub fn thumbnail_url(&self) -> &str {
    for tier in ["default", "medium", "high", "standard", "maxres"] {
      if let Some(t) = self.snippet.thumbnails.get(tier) {
        return &t.url;
      }
    }
    self.snippet.thumbnails.values().next().map(|t| t.url.as_str()).unwrap_or("")
  }
}

/// Canonical watch-page URL for handing off to a player or browser.
pub fn watch_url(video_id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Embeddable player URL for the same video.
pub fn embed_url(video_id: &str) -> String {
  format!("https://www.youtube.com/embed/{}", video_id)
}

// --- Wire model (private; normalized away at this boundary) ---

#[derive(Debug, Deserialize)]
struct ListResponse {
  #[serde(default)]
  items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
  #[serde(default)]
  id: Option<WireId>,
  #[serde(default)]
  snippet: Option<Snippet>,
  #[serde(default)]
  statistics: Option<Statistics>,
  #[serde(default)]
  content_details: Option<ContentDetails>,
}

/// The `videos` endpoint returns `id` as a plain string, `search` nests it
/// in an object. Erased into `Video::id` by [`WireItem::into_video`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
  Plain(String),
  Nested {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
  },
}

impl WireId {
  fn into_string(self) -> Option<String> {
    match self {
      WireId::Plain(id) => Some(id),
      WireId::Nested { video_id } => video_id,
    }
  }
}

impl WireItem {
  /// Normalize one wire item. Items without a usable video id (e.g. channel
  /// or playlist results) are dropped rather than reported.
  fn into_video(self) -> Option<Video> {
    let id = self.id?.into_string().filter(|id| !id.is_empty())?;
    let mut snippet = self.snippet.unwrap_or_default();
    if !snippet.thumbnails.contains_key("default") {
      // Every video has a predictable default thumbnail even when the
      // API response omits the tier.
      snippet.thumbnails.insert(
        "default".to_string(),
        Thumbnail { url: format!("https://i.ytimg.com/vi/{}/default.jpg", id), width: Some(120), height: Some(90) },
      );
    }
    Some(Video { id, snippet, statistics: self.statistics, content_details: self.content_details })
  }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: String,
}

// --- Client ---

pub struct ApiClient {
  http: reqwest::Client,
  api_key: Option<String>,
  base_url: String,
}

impl ApiClient {
  pub fn new(api_key: Option<String>) -> Self {
    Self::with_base_url(api_key, constants().api_base.clone())
  }

  /// Construct against an alternate base URL (tests, proxies).
  pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
    let http = reqwest::Client::builder()
      .user_agent(concat!("tubeview/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(constants().request_timeout_secs))
      .build()
      .unwrap_or_default();
    Self { http, api_key, base_url: base_url.into() }
  }

  pub fn has_api_key(&self) -> bool {
    self.api_key.is_some()
  }

  async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<Video>, ApiError> {
    let key = self.api_key.as_deref().ok_or(ApiError::NoApiKey)?;
    let url = format!("{}/{}", self.base_url, endpoint);
    debug!(endpoint, "api request");

    let response = self.http.get(&url).query(&[("key", key)]).query(params).send().await?;
    let status = response.status();
    if !status.is_success() {
      let message = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => status.canonical_reason().unwrap_or("request failed").to_string(),
      };
      return Err(ApiError::Upstream { status: status.as_u16(), message });
    }

    let list: ListResponse = response.json().await?;
    Ok(list.items.into_iter().filter_map(WireItem::into_video).collect())
  }

  /// Free-text search, relevance-ordered, embeddable-only, moderate safe
  /// search. Returns snippet-only items; statistics and durations come from
  /// a follow-up [`ApiClient::get_video_details`] call.
  pub async fn search_videos(
    &self,
    query: &str,
    max_results: u32,
    page_token: Option<&str>,
  ) -> Result<Vec<Video>, ApiError> {
    let max = max_results.to_string();
    let mut params = vec![
      ("part", "snippet"),
      ("type", "video"),
      ("q", query),
      ("maxResults", max.as_str()),
      ("order", "relevance"),
      ("safeSearch", "moderate"),
      ("videoEmbeddable", "true"),
    ];
    if let Some(token) = page_token {
      params.push(("pageToken", token));
    }
    self.get("search", &params).await
  }

  /// Full resources (snippet + statistics + contentDetails) for the given
  /// ids. Ids the service doesn't know are omitted from the result, not
  /// reported individually.
  pub async fn get_video_details(&self, ids: &[String]) -> Result<Vec<Video>, ApiError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let joined = ids.join(",");
    self.get("videos", &[("part", "snippet,statistics,contentDetails"), ("id", joined.as_str())]).await
  }

  /// Platform-curated most-popular chart for a region/category. These items
  /// already carry plain string ids; normalization makes them
  /// indistinguishable from search results downstream.
  pub async fn get_trending_videos(
    &self,
    max_results: u32,
    region_code: &str,
    category_id: &str,
  ) -> Result<Vec<Video>, ApiError> {
    let max = max_results.to_string();
    self
      .get("videos", &[
        ("part", "snippet,statistics,contentDetails"),
        ("chart", "mostPopular"),
        ("maxResults", max.as_str()),
        ("regionCode", region_code),
        ("videoCategoryId", category_id),
      ])
      .await
  }

  /// Best-effort related videos. The upstream API no longer exposes a
  /// related-videos signal, so this searches for the source video's channel
  /// name — a deliberate approximation that can also surface videos from
  /// other channels mentioning that name. Any failure along the way falls
  /// back to the trending chart.
  pub async fn get_related_videos(&self, video_id: &str, max_results: u32) -> Result<Vec<Video>, ApiError> {
    match self.related_by_channel(video_id, max_results).await {
      Ok(videos) => Ok(videos),
      Err(e) => {
        debug!(video_id, err = %e, "related lookup failed, falling back to trending");
        self.get_trending_videos(max_results, "US", "0").await
      }
    }
  }

  async fn related_by_channel(&self, video_id: &str, max_results: u32) -> Result<Vec<Video>, ApiError> {
    let details = self.get_video_details(&[video_id.to_string()]).await?;
    let source = details.into_iter().next().ok_or_else(|| ApiError::NotFound(video_id.to_string()))?;
    self.search_videos(&source.snippet.channel_title, max_results, None).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- Wire normalization (canned JSON, no network) ---

  #[test]
  fn search_item_nested_id_is_flattened() {
    let json = r#"{
      "items": [{
        "id": { "kind": "youtube#video", "videoId": "abc123" },
        "snippet": {
          "title": "A Video",
          "channelTitle": "Chan",
          "publishedAt": "2024-01-01T00:00:00Z",
          "thumbnails": { "default": { "url": "https://t/d.jpg", "width": 120, "height": 90 } }
        }
      }]
    }"#;
    let list: ListResponse = serde_json::from_str(json).unwrap();
    let videos: Vec<Video> = list.items.into_iter().filter_map(WireItem::into_video).collect();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "abc123");
    assert_eq!(videos[0].snippet.title, "A Video");
    assert!(videos[0].statistics.is_none());
  }

  #[test]
  fn videos_item_plain_id_passes_through() {
    let json = r#"{
      "items": [{
        "id": "xyz789",
        "snippet": { "title": "T", "thumbnails": {} },
        "statistics": { "viewCount": "1500000" },
        "contentDetails": { "duration": "PT4M13S" }
      }]
    }"#;
    let list: ListResponse = serde_json::from_str(json).unwrap();
    let videos: Vec<Video> = list.items.into_iter().filter_map(WireItem::into_video).collect();
    assert_eq!(videos[0].id, "xyz789");
    assert_eq!(videos[0].statistics.as_ref().unwrap().view_count.as_deref(), Some("1500000"));
    assert_eq!(videos[0].content_details.as_ref().unwrap().duration.as_deref(), Some("PT4M13S"));
  }

  #[test]
  fn items_without_video_id_are_dropped() {
    // A channel result from the search endpoint has no videoId
    let json = r#"{
      "items": [
        { "id": { "kind": "youtube#channel" }, "snippet": { "title": "Some Channel" } },
        { "id": { "kind": "youtube#video", "videoId": "keepme" }, "snippet": { "title": "Keep" } }
      ]
    }"#;
    let list: ListResponse = serde_json::from_str(json).unwrap();
    let videos: Vec<Video> = list.items.into_iter().filter_map(WireItem::into_video).collect();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "keepme");
  }

  #[test]
  fn missing_default_thumbnail_is_synthesized() {
    let json = r#"{ "items": [{ "id": "vid1", "snippet": { "title": "T", "thumbnails": {} } }] }"#;
    let list: ListResponse = serde_json::from_str(json).unwrap();
    let videos: Vec<Video> = list.items.into_iter().filter_map(WireItem::into_video).collect();
    assert_eq!(videos[0].thumbnail_url(), "https://i.ytimg.com/vi/vid1/default.jpg");
  }

  #[test]
  fn video_roundtrips_through_json() {
    // Collections persist Videos as JSON; make sure the normalized shape survives.
    let json = r#"{ "items": [{ "id": "vid1", "snippet": { "title": "T", "thumbnails": {} },
      "statistics": { "viewCount": "7" } }] }"#;
    let list: ListResponse = serde_json::from_str(json).unwrap();
    let video = list.items.into_iter().filter_map(WireItem::into_video).next().unwrap();
    let stored = serde_json::to_string(&video).unwrap();
    let back: Video = serde_json::from_str(&stored).unwrap();
    assert_eq!(back.id, "vid1");
    assert_eq!(back.statistics.unwrap().view_count.as_deref(), Some("7"));
  }

  // --- Endpoint behavior against a local stub server ---

  mod stub {
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    fn video_json(id: &str, title: &str, channel: &str) -> String {
      format!(
        r#"{{ "id": "{id}", "snippet": {{ "title": "{title}", "channelId": "c-{id}",
           "channelTitle": "{channel}", "publishedAt": "2024-01-01T00:00:00Z",
           "thumbnails": {{ "default": {{ "url": "https://t/{id}.jpg" }} }} }},
           "statistics": {{ "viewCount": "100" }},
           "contentDetails": {{ "duration": "PT1M" }} }}"#
      )
    }

    fn search_item_json(id: &str, title: &str) -> String {
      format!(
        r#"{{ "id": {{ "kind": "youtube#video", "videoId": "{id}" }},
           "snippet": {{ "title": "{title}", "channelTitle": "Channel One",
           "thumbnails": {{ "default": {{ "url": "https://t/{id}.jpg" }} }} }} }}"#
      )
    }

    fn query_param<'a>(query: &'a str, name: &str) -> Option<String> {
      let prefix = format!("{}=", name);
      query
        .split('&')
        .find_map(|p| p.strip_prefix(prefix.as_str()))
        .map(|v| v.replace("%2C", ",").replace("%20", " ").replace('+', " "))
    }

    async fn handle(req: Request<hyper::body::Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
      let path = req.uri().path().to_string();
      let query = req.uri().query().unwrap_or("").to_string();

      // Every request must carry the API key as a query parameter, exactly
      // as the real service requires.
      if query_param(&query, "key").as_deref() != Some("k") {
        let body = r#"{ "error": { "code": 400, "message": "API key missing" } }"#;
        return Ok(
          Response::builder()
            .status(400)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .expect("response build"),
        );
      }

      let body = match path.as_str() {
        "/search" => {
          let q = query_param(&query, "q").unwrap_or_default();
          if q == "Channel One" {
            format!(
              r#"{{ "items": [{}, {}] }}"#,
              search_item_json("rel1", "Related A"),
              search_item_json("rel2", "Related B")
            )
          } else {
            format!(r#"{{ "items": [{}] }}"#, search_item_json("srch1", "Search Hit"))
          }
        }
        "/videos" if query.contains("chart=mostPopular") => {
          format!(
            r#"{{ "items": [{}, {}] }}"#,
            video_json("trend1", "Trending A", "Pop"),
            video_json("trend2", "Trending B", "Pop")
          )
        }
        "/videos" => {
          let ids = query_param(&query, "id").unwrap_or_default();
          // Only "vid1" exists upstream; all other ids are omitted.
          if ids.split(',').any(|id| id == "vid1") {
            format!(r#"{{ "items": [{}] }}"#, video_json("vid1", "Known Video", "Channel One"))
          } else {
            r#"{ "items": [] }"#.to_string()
          }
        }
        _ => r#"{ "items": [] }"#.to_string(),
      };

      Ok(
        Response::builder()
          .header("content-type", "application/json")
          .body(Full::new(Bytes::from(body)))
          .expect("response build"),
      )
    }

    /// Bind a throwaway local HTTP server and return its base URL.
    pub async fn start() -> String {
      let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
      let addr = listener.local_addr().expect("stub addr");
      tokio::spawn(async move {
        loop {
          let Ok((stream, _)) = listener.accept().await else { break };
          tokio::spawn(async move {
            let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), service_fn(handle)).await;
          });
        }
      });
      format!("http://{}", addr)
    }
  }

  fn ids(videos: &[Video]) -> Vec<&str> {
    videos.iter().map(|v| v.id.as_str()).collect()
  }

  #[tokio::test]
  async fn search_returns_normalized_ids() {
    let base = stub::start().await;
    let client = ApiClient::with_base_url(Some("k".into()), base);
    let videos = client.search_videos("rust", 5, None).await.unwrap();
    assert_eq!(ids(&videos), ["srch1"]);
  }

  #[tokio::test]
  async fn trending_ids_are_plain_strings() {
    let base = stub::start().await;
    let client = ApiClient::with_base_url(Some("k".into()), base);
    let videos = client.get_trending_videos(5, "US", "0").await.unwrap();
    assert_eq!(ids(&videos), ["trend1", "trend2"]);
  }

  #[tokio::test]
  async fn details_omits_unknown_ids() {
    let base = stub::start().await;
    let client = ApiClient::with_base_url(Some("k".into()), base);
    let videos = client.get_video_details(&["vid1".into(), "missing".into()]).await.unwrap();
    assert_eq!(ids(&videos), ["vid1"]);
  }

  #[tokio::test]
  async fn related_searches_by_channel_name() {
    let base = stub::start().await;
    let client = ApiClient::with_base_url(Some("k".into()), base);
    let videos = client.get_related_videos("vid1", 5).await.unwrap();
    assert_eq!(ids(&videos), ["rel1", "rel2"]);
  }

  #[tokio::test]
  async fn related_falls_back_to_trending_when_details_empty() {
    let base = stub::start().await;
    let client = ApiClient::with_base_url(Some("k".into()), base.clone());
    let related = client.get_related_videos("ghost123", 5).await.unwrap();
    let trending = client.get_trending_videos(5, "US", "0").await.unwrap();
    assert_eq!(ids(&related), ids(&trending));
  }

  #[tokio::test]
  async fn key_is_sent_as_query_parameter() {
    let base = stub::start().await;
    // The stub rejects any request whose key parameter isn't "k", so a
    // wrong key surfaces the parsed upstream error message.
    let client = ApiClient::with_base_url(Some("wrong".into()), base);
    let err = client.get_trending_videos(5, "US", "0").await.unwrap_err();
    match err {
      ApiError::Upstream { status, message } => {
        assert_eq!(status, 400);
        assert_eq!(message, "API key missing");
      }
      other => panic!("expected upstream error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn missing_key_is_a_config_error() {
    let base = stub::start().await;
    let client = ApiClient::with_base_url(None, base);
    let err = client.search_videos("rust", 5, None).await.unwrap_err();
    assert!(matches!(err, ApiError::NoApiKey));
  }
}
