// src/api.rs

use crate::error::StatsError;
use crate::stats::{StatsEntry, VideoStatistics};
use crate::video_id::VideoId;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Hard ceiling on ids per request imposed by the statistics API.
pub const MAX_BATCH_SIZE: usize = 50;

const STATISTICS_FIELDS: &str = "items(id,statistics(likeCount,dislikeCount))";

/// Source of like/dislike counts for a batch of videos.
pub trait StatsApi: Send + Sync + 'static {
    /// Ids without usable statistics are simply absent from the result.
    fn fetch_statistics(
        &self,
        ids: &[VideoId],
    ) -> impl Future<Output = Result<Vec<VideoStatistics>, StatsError>> + Send;
}

pub struct YoutubeDataApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl YoutubeDataApi {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn query<'a>(&'a self, joined_ids: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("part", "statistics"),
            ("fields", STATISTICS_FIELDS),
            ("key", self.api_key.as_str()),
            ("id", joined_ids),
        ]
    }
}

impl StatsApi for YoutubeDataApi {
    async fn fetch_statistics(&self, ids: &[VideoId]) -> Result<Vec<VideoStatistics>, StatsError> {
        let joined = ids
            .iter()
            .map(VideoId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        debug!(count = ids.len(), "Fetching video statistics");

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&self.query(&joined))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StatsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        parse_statistics(&body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    statistics: Option<Statistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    like_count: Option<Value>,
    #[serde(default)]
    dislike_count: Option<Value>,
}

/// The API encodes counts as decimal strings; non-negative integers are accepted as well.
/// Anything else is not a count.
fn count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Parses a `videos.list` body. Missing or null `items` means no data; items that are
/// malformed or lack numeric counts are skipped with a diagnostic.
pub fn parse_statistics(body: &str) -> Result<Vec<VideoStatistics>, StatsError> {
    let response: VideoListResponse = serde_json::from_str(body)?;

    let stats = response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| {
            let item: VideoItem = match serde_json::from_value(raw) {
                Ok(item) => item,
                Err(err) => {
                    warn!(error = %err, "Malformed statistics item, skipping");
                    return None;
                }
            };
            let stats = item.statistics.unwrap_or_default();
            let likes = count(stats.like_count.as_ref());
            let dislikes = count(stats.dislike_count.as_ref());
            match (likes, dislikes) {
                (Some(likes), Some(dislikes)) => Some(VideoStatistics {
                    id: VideoId::new(item.id),
                    entry: StatsEntry::new(likes, dislikes),
                }),
                _ => {
                    warn!(id = %item.id, ?likes, ?dislikes, "Statistics unavailable, skipping");
                    None
                }
            }
        })
        .collect();

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers exactly one request with `status` and `body`; the handle yields the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/videos", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (endpoint, handle)
    }

    fn ids(raw: &[&str]) -> Vec<VideoId> {
        raw.iter().map(|id| VideoId::new(*id)).collect()
    }

    #[tokio::test]
    async fn fetches_statistics_over_http() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"items":[{"id":"a1","statistics":{"likeCount":"5","dislikeCount":"1"}}]}"#,
        )
        .await;
        let api = YoutubeDataApi::new(&endpoint, "secret");

        let stats = api.fetch_statistics(&ids(&["a1", "b2"])).await.unwrap();
        assert_eq!(
            stats,
            vec![VideoStatistics {
                id: VideoId::new("a1"),
                entry: StatsEntry::new(5, 1),
            }]
        );

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /videos?part=statistics"), "{request_line}");
        assert!(request_line.contains("key=secret"), "{request_line}");
        assert!(request_line.contains("id=a1%2Cb2"), "{request_line}");
    }

    #[tokio::test]
    async fn error_status_becomes_api_error() {
        let (endpoint, server) = serve_once(
            "403 Forbidden",
            r#"{"error":{"code":403,"message":"quotaExceeded"}}"#,
        )
        .await;
        let api = YoutubeDataApi::new(&endpoint, "secret");

        match api.fetch_statistics(&ids(&["a1"])).await {
            Err(StatsError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("quotaExceeded"), "{message}");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_api_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/videos", listener.local_addr().unwrap());
        drop(listener);
        let api = YoutubeDataApi::new(&endpoint, "SECRET-KEY-123");

        let err = api.fetch_statistics(&ids(&["a1"])).await.unwrap_err();
        assert!(matches!(err, StatsError::Network(_)), "{err:?}");
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");
        assert!(!format!("{err:?}").contains("SECRET-KEY-123"), "{err:?}");
    }

    #[test]
    fn parses_string_and_numeric_counts() {
        let body = r#"{
            "items": [
                { "id": "a1", "statistics": { "likeCount": "10", "dislikeCount": "2" } },
                { "id": "b2", "statistics": { "likeCount": 7, "dislikeCount": 0 } }
            ]
        }"#;

        let stats = parse_statistics(body).unwrap();
        assert_eq!(
            stats,
            vec![
                VideoStatistics {
                    id: VideoId::new("a1"),
                    entry: StatsEntry::new(10, 2),
                },
                VideoStatistics {
                    id: VideoId::new("b2"),
                    entry: StatsEntry::new(7, 0),
                },
            ]
        );
    }

    #[test]
    fn missing_or_empty_items_is_no_data() {
        assert!(parse_statistics("{}").unwrap().is_empty());
        assert!(parse_statistics(r#"{"items": []}"#).unwrap().is_empty());
        assert!(parse_statistics(r#"{"items": null}"#).unwrap().is_empty());
    }

    #[test]
    fn skips_items_without_numeric_statistics() {
        let body = r#"{
            "items": [
                { "id": "a1", "statistics": { "likeCount": "4" } },
                { "id": "b2" },
                { "id": "c3", "statistics": { "likeCount": "many", "dislikeCount": "1" } },
                { "id": "d4", "statistics": { "likeCount": "3", "dislikeCount": "1" } },
                { "id": "e5", "statistics": { "likeCount": 1.5, "dislikeCount": 1 } },
                { "id": "f6", "statistics": { "likeCount": -2, "dislikeCount": 1 } },
                { "id": "g7", "statistics": { "likeCount": true, "dislikeCount": 1 } },
                { "id": "h8", "statistics": { "likeCount": { "n": 1 }, "dislikeCount": 1 } },
                { "id": 9, "statistics": { "likeCount": "1", "dislikeCount": "1" } },
                "not an item",
                { "id": "j0", "statistics": { "likeCount": " 8 ", "dislikeCount": 0 } }
            ]
        }"#;

        let stats = parse_statistics(body).unwrap();
        let ids: Vec<&str> = stats.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["d4", "j0"]);
        assert_eq!(stats[1].entry, StatsEntry::new(8, 0));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(
            parse_statistics("<html>quota exceeded</html>"),
            Err(StatsError::Parse(_))
        ));
    }

    #[test]
    fn query_requests_only_statistics() {
        let api = YoutubeDataApi::new("https://example.test/videos/", "secret");
        let query = api.query("a1,b2");
        assert_eq!(api.endpoint, "https://example.test/videos");
        assert_eq!(query[0], ("part", "statistics"));
        assert_eq!(query[1].1, STATISTICS_FIELDS);
        assert_eq!(query[2], ("key", "secret"));
        assert_eq!(query[3], ("id", "a1,b2"));
    }
}
