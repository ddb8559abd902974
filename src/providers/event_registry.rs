//! Keyword article search against the Event Registry REST API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::NewsSource;
use super::http_client::HttpClient;
use crate::config::NewsConfig;
use crate::error::FetchError;
use crate::models::Article;

const PROVIDER: &str = "eventregistry";

/// Hard per-request limit of the getArticles endpoint.
const MAX_PAGE_SIZE: usize = 100;

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    #[serde(default)]
    articles: Option<ArticlesPage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticlesPage {
    #[serde(default)]
    results: Vec<Article>,
    #[serde(default)]
    pages: u32,
}

// ── Source ────────────────────────────────────────────────────────────────────

pub struct EventRegistrySource {
    client: HttpClient,
    endpoint: Url,
    api_key: String,
}

impl EventRegistrySource {
    pub fn new(config: &NewsConfig) -> Result<Self, FetchError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FetchError::Config("news.api_key is not set (INGEST__NEWS__API_KEY)".into()))?
            .to_string();

        let endpoint = Url::parse(&format!(
            "{}/api/v1/article/getArticles",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| FetchError::Config(format!("bad news base_url: {}", e)))?;

        Ok(Self {
            client: HttpClient::new(PROVIDER, &config.user_agent, &config.http)?,
            endpoint,
            api_key,
        })
    }

    async fn fetch_page(
        &self,
        keyword: &str,
        page: u32,
        count: usize,
        dedupe: bool,
    ) -> Result<ArticlesPage, FetchError> {
        let body = json!({
            "action": "getArticles",
            "keyword": keyword,
            "dataType": ["news"],
            "isDuplicateFilter": if dedupe { "skipDuplicates" } else { "keepAll" },
            "resultType": "articles",
            "articlesSortBy": "date",
            "articlesPage": page,
            "articlesCount": count,
            "apiKey": self.api_key,
        });

        let text = self
            .client
            .send_text(&format!("POST articles {} p{}", keyword, page), |c| {
                c.post(self.endpoint.clone()).json(&body)
            })
            .await?;

        parse_articles_page(keyword, &text)
    }
}

#[async_trait]
impl NewsSource for EventRegistrySource {
    async fn search_articles(
        &self,
        keyword: &str,
        max_items: usize,
        dedupe: bool,
    ) -> Result<Vec<Article>, FetchError> {
        let mut articles = Vec::new();
        let mut page = 1u32;
        // the provider offsets pages by (page - 1) * count, so count must not change between pages
        let count = max_items.min(MAX_PAGE_SIZE);

        while articles.len() < max_items {
            let batch = self.fetch_page(keyword, page, count, dedupe).await?;
            let got = batch.results.len();

            articles.extend(batch.results);
            debug!("{}: page {}/{} → {} articles", keyword, page, batch.pages, got);

            if got == 0 || page >= batch.pages {
                break;
            }
            page += 1;
        }

        articles.truncate(max_items);
        Ok(articles)
    }
}

fn parse_articles_page(keyword: &str, body: &str) -> Result<ArticlesPage, FetchError> {
    let resp: ArticlesResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::provider(PROVIDER, format!("{}: malformed response: {}", keyword, e))
    })?;

    if let Some(err) = resp.error {
        return Err(FetchError::provider(PROVIDER, format!("{}: {}", keyword, err)));
    }

    resp.articles
        .ok_or_else(|| FetchError::provider(PROVIDER, format!("{}: response has no articles", keyword)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use mockito::Matcher;

    fn config(base_url: String) -> NewsConfig {
        NewsConfig {
            base_url,
            api_key: Some("test-key".into()),
            user_agent: "test".into(),
            http: HttpConfig {
                timeout_secs: 5,
                request_delay_ms: 0,
                jitter_ms: 0,
                max_retries: 0,
            },
        }
    }

    fn page_body(titles: &[(&str, &str)], pages: u32) -> String {
        let results: Vec<_> = titles
            .iter()
            .map(|(t, l)| json!({"uri": "1", "title": t, "lang": l, "body": "…"}))
            .collect();
        json!({"articles": {"results": results, "totalResults": 0, "page": 1, "pages": pages}})
            .to_string()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let cfg = NewsConfig {
            api_key: Some("  ".into()),
            ..NewsConfig::default()
        };
        assert!(matches!(EventRegistrySource::new(&cfg), Err(FetchError::Config(_))));
    }

    #[test]
    fn test_error_payload() {
        let err = parse_articles_page("AAPL", r#"{"error":"Invalid API key"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_search_sends_query_and_parses_articles() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/article/getArticles")
            .match_body(Matcher::PartialJson(json!({
                "keyword": "AAPL",
                "isDuplicateFilter": "skipDuplicates",
                "articlesCount": 100,
                "apiKey": "test-key",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page_body(&[("Apple rises", "eng"), ("Apple steigt", "deu")], 1))
            .expect(1)
            .create_async()
            .await;

        let source = EventRegistrySource::new(&config(server.url())).unwrap();
        let articles = source.search_articles("AAPL", 100, true).await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Apple rises");
        assert_eq!(articles[1].lang, "deu");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_pages_until_cap() {
        let titles: Vec<String> = (0..200).map(|i| format!("headline {}", i)).collect();
        let rows: Vec<(&str, &str)> = titles.iter().map(|t| (t.as_str(), "eng")).collect();

        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/api/v1/article/getArticles")
            .match_body(Matcher::PartialJson(json!({"articlesPage": 1, "articlesCount": 100})))
            .with_body(page_body(&rows[..100], 3))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/api/v1/article/getArticles")
            .match_body(Matcher::PartialJson(json!({"articlesPage": 2, "articlesCount": 100})))
            .with_body(page_body(&rows[100..], 3))
            .expect(1)
            .create_async()
            .await;

        let source = EventRegistrySource::new(&config(server.url())).unwrap();
        let articles = source.search_articles("XLK", 150, true).await.unwrap();

        assert_eq!(articles.len(), 150);
        assert_eq!(articles[99].title, "headline 99");
        assert_eq!(articles[100].title, "headline 100");
        assert_eq!(articles[149].title, "headline 149");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_small_cap_uses_one_page_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/article/getArticles")
            .match_body(Matcher::PartialJson(json!({"articlesPage": 1, "articlesCount": 3})))
            .with_body(page_body(&[("a", "eng"), ("b", "eng"), ("c", "eng")], 5))
            .expect(1)
            .create_async()
            .await;

        let source = EventRegistrySource::new(&config(server.url())).unwrap();
        let articles = source.search_articles("XLV", 3, true).await.unwrap();

        assert_eq!(articles.len(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_items_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/article/getArticles")
            .expect(0)
            .create_async()
            .await;

        let source = EventRegistrySource::new(&config(server.url())).unwrap();
        assert!(source.search_articles("XLE", 0, true).await.unwrap().is_empty());
        mock.assert_async().await;
    }
}
