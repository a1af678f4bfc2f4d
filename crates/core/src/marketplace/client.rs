//! reqwest-backed marketplace client.
//!
//! One `WbClient` holds a single connection pool for the whole run. Card,
//! feedback and photo URLs come from `crate::hosts`. The search endpoint is
//! configurable, and a CDN base URL can replace the routed hosts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::hosts::{build_url, resource_path, UrlKind};

use super::parse::{parse_card, parse_feedbacks, parse_search_page};
use super::types::{ItemId, PhotoId, ProductId, SearchPage};
use super::{FetchError, MarketplaceClient};

/// Catalog search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://u-search.wb.ru/exactmatch/ru/common/v18/search";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Fixed search parameters; only `page` and `query` vary per request.
const SEARCH_PARAMS: [(&str, &str); 6] = [
    ("curr", "rub"),
    ("dest", "-5551776"),
    ("inheritFilters", "false"),
    ("lang", "ru"),
    ("resultset", "catalog"),
    ("sort", "popular"),
];

/// Client configuration.
#[derive(Debug, Clone)]
pub struct WbClientConfig {
    /// Catalog search endpoint.
    pub search_url: String,
    /// Timeout applied to every individual request. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Serve card, feedback and photo requests from this base instead of the
    /// sharded hosts. Paths stay the same.
    pub cdn_base_url: Option<String>,
}

impl Default for WbClientConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: None,
            cdn_base_url: None,
        }
    }
}

/// Marketplace client talking to the live backend.
pub struct WbClient {
    client: Client,
    search_url: String,
    cdn_base_url: Option<String>,
}

impl WbClient {
    /// Create a client. Fails only if the HTTP session cannot be built.
    pub fn new(config: WbClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        // Accept-Encoding (gzip, deflate) is added and decoded by reqwest.

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            search_url: config.search_url,
            cdn_base_url: config
                .cdn_base_url
                .map(|base| base.trim_end_matches('/').to_string()),
        })
    }

    fn resource_url(&self, id: u64, kind: UrlKind) -> String {
        match &self.cdn_base_url {
            Some(base) => format!("{}{}", base, resource_path(id, kind)),
            None => build_url(id, kind),
        }
    }

    /// GET `url` and return the body of a successful response.
    async fn get_bytes(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "GET");

        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {} from {}", status, url)));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl MarketplaceClient for WbClient {
    async fn search_page(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        let mut params: Vec<(&str, String)> = SEARCH_PARAMS
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        params.push(("page", page.to_string()));
        params.push(("query", query.to_string()));

        let body = self.get_bytes(&self.search_url, &params).await?;
        parse_search_page(&body)
    }

    async fn item_id(&self, product_id: ProductId) -> Result<Option<ItemId>, FetchError> {
        let url = self.resource_url(product_id, UrlKind::ProductInfo);
        let body = self.get_bytes(&url, &[]).await?;
        parse_card(&body)
    }

    async fn photo_ids(&self, item_id: ItemId) -> Result<Vec<PhotoId>, FetchError> {
        let url = self.resource_url(item_id, UrlKind::FeedbackList);
        let body = self.get_bytes(&url, &[]).await?;
        parse_feedbacks(&body)
    }

    async fn photo_bytes(&self, photo_id: PhotoId) -> Result<Vec<u8>, FetchError> {
        let url = self.resource_url(photo_id, UrlKind::PhotoBinary);
        self.get_bytes(&url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::ItemOwner;
    use crate::pipeline::{discover_photos, IssueKind};
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_PATH: &str = "/exactmatch/ru/common/v18/search";

    fn client_for(server: &MockServer, timeout: Option<Duration>) -> WbClient {
        WbClient::new(WbClientConfig {
            search_url: format!("{}{}", server.uri(), SEARCH_PATH),
            timeout,
            cdn_base_url: Some(format!("{}/", server.uri())),
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = WbClientConfig::default();
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert!(config.timeout.is_none());
        assert!(config.cdn_base_url.is_none());
    }

    #[test]
    fn test_routed_urls_without_base_override() {
        let client = WbClient::new(WbClientConfig::default()).unwrap();
        assert_eq!(
            client.resource_url(124_170_265, UrlKind::ProductInfo),
            build_url(124_170_265, UrlKind::ProductInfo)
        );
    }

    #[tokio::test]
    async fn test_search_sends_fixed_params_page_and_query() {
        let server = MockServer::start().await;
        let mut mock = Mock::given(method("GET")).and(path(SEARCH_PATH));
        for (key, value) in SEARCH_PARAMS {
            mock = mock.and(query_param(key, value));
        }
        mock.and(query_param("page", "2"))
            .and(query_param("query", "purple mug"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"products": [{"id": 100}, {"id": 200, "sizes": null}]}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server, None)
            .search_page("purple mug", 2)
            .await
            .unwrap();

        let ids: Vec<u64> = page.rows.iter().map(|r| r.product_id).collect();
        assert_eq!(ids, vec![100, 200]);
    }

    #[tokio::test]
    async fn test_browser_headers_and_compression_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(resource_path(1001, UrlKind::PhotoBinary)))
            .and(header_regex("user-agent", "^Mozilla/5.0"))
            .and(header_regex("accept-language", "ru-RU"))
            .and(header_regex("accept-encoding", "gzip"))
            .and(header_regex("accept-encoding", "deflate"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\xFF\xD8jpeg".to_vec()))
            .mount(&server)
            .await;

        let bytes = client_for(&server, None).photo_bytes(1001).await.unwrap();
        assert_eq!(bytes, b"\xFF\xD8jpeg");
    }

    #[tokio::test]
    async fn test_card_item_id_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(resource_path(100, UrlKind::ProductInfo)))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"imt_id": 999}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(resource_path(200, UrlKind::ProductInfo)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert_eq!(client.item_id(100).await.unwrap(), Some(999));
        assert!(matches!(
            client.item_id(200).await.unwrap_err(),
            FetchError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(resource_path(999, UrlKind::FeedbackList)))
            .respond_with(ResponseTemplate::new(503).set_body_string(r#"{"photo": [1]}"#))
            .mount(&server)
            .await;

        let err = client_for(&server, None).photo_ids(999).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_invalid_feedback_json_is_recoverable_parse_issue() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(resource_path(999, UrlKind::FeedbackList)))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"photo": [1001, 1002]}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(resource_path(555, UrlKind::FeedbackList)))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let owners = [
            ItemOwner {
                product_id: 100,
                item_id: 999,
            },
            ItemOwner {
                product_id: 300,
                item_id: 555,
            },
        ];
        let cancel = CancellationToken::new();
        let output = discover_photos(&client, &owners, 2, &cancel).await;

        assert_eq!(output.items.len(), 1);
        assert_eq!(output.items[0].photos, vec![1001, 1002]);
        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].kind, IssueKind::Parse);
        assert_eq!(output.issues[0].subject, 555);
    }

    #[tokio::test]
    async fn test_request_timeout_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(resource_path(100, UrlKind::ProductInfo)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"imt_id": 999}"#)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some(Duration::from_millis(100)));
        let err = client.item_id(100).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
