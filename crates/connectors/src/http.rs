//! REST transport.

use std::time::Duration;

use barfeed_core::{Error, Result, VenueConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-mbx-apikey");

/// Thin JSON-over-HTTP client bound to one REST base URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    /// Build a client from a venue section.
    pub fn new(venue: &VenueConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = venue.api_key.as_deref() {
            let value = HeaderValue::from_str(key)
                .map_err(|e| Error::config(format!("api_key is not a valid header value: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .user_agent(concat!("barfeed/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_millis(venue.timeout_ms))
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .build()
            .map_err(|e| Error::transport(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: venue.rest_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with `query` and decode the JSON body.
    ///
    /// Non-success statuses become [`Error::Api`]; an undecodable body is a
    /// [`Error::Conversion`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::transport(format!("GET {path}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("reading {path} response: {e}")))?;
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::conversion(format!("decoding {path} response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_default_venue_builds() {
        let client = RestClient::new(&VenueConfig::binance_spot()).unwrap();
        assert_eq!(client.base_url(), "https://api.binance.com");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let venue = VenueConfig {
            rest_base_url: "http://localhost:8080/".to_string(),
            ..VenueConfig::binance_futures()
        };
        assert_eq!(RestClient::new(&venue).unwrap().base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_api_key_with_newline_rejected() {
        let venue = VenueConfig::binance_spot().with_api_key("abc\ndef");
        assert!(matches!(RestClient::new(&venue), Err(Error::Config(_))));
    }

    /// Answer one request with `status` and `body`, returning the base URL.
    async fn respond_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tokio::spawn(async move {
            let (mut tcp, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 4096];
            let _ = tcp.read(&mut request).await;
            tcp.write_all(response.as_bytes()).await.unwrap();
            let _ = tcp.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn local_client(base_url: String) -> RestClient {
        let venue = VenueConfig {
            rest_base_url: base_url,
            ..VenueConfig::binance_spot()
        };
        RestClient::new(&venue).unwrap()
    }

    #[tokio::test]
    async fn test_get_json_decodes_body() {
        let client = local_client(respond_once("200 OK", "[1,2,3]").await);
        let values: Vec<u32> = client
            .get_json("/api/v3/trades", &[("symbol", "BTCUSDT".to_string())])
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let body = r#"{"code":-1003,"msg":"Too many requests."}"#;
        let client = local_client(respond_once("429 Too Many Requests", body).await);
        let result = client.get_json::<Vec<u32>>("/api/v3/klines", &[]).await;

        match result {
            Err(Error::Api { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("-1003"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_conversion_error() {
        let client = local_client(respond_once("200 OK", r#"[{"id": "#).await);
        let result = client.get_json::<Vec<u32>>("/api/v3/trades", &[]).await;
        assert!(matches!(result, Err(Error::Conversion(_))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = local_client(format!("http://{addr}"));
        let result = client.get_json::<Vec<u32>>("/api/v3/trades", &[]).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
