//! DuckDuckGo web and news search.
//!
//! Web search scrapes the HTML results page, which needs no API key. News
//! search goes through the JSON endpoint, which needs a per-query `vqd`
//! token taken from the regular search page.

use super::{optional_count, required_str, ToolDefinition, Toolkit};
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const TOKEN_URL: &str = "https://duckduckgo.com/";
const NEWS_URL: &str = "https://duckduckgo.com/news.js";
const MAX_RESULTS: usize = 20;

/// A single search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A single news story.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: Option<String>,
    pub image: Option<String>,
    /// Publication time, RFC 3339.
    pub date: Option<String>,
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Run a query and return at most `count` hits.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchItem>>;

    /// Search recent news and return at most `count` stories.
    async fn news(&self, query: &str, count: usize) -> Result<Vec<NewsHit>>;
}

/// DuckDuckGo HTML search.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    parser: ResultParser,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("samtale/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            parser: ResultParser::new(),
        })
    }

    async fn get_text(&self, tool: &str, url: url::Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SamtaleError::tool(
                tool,
                format!("search returned status {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| SamtaleError::tool(tool, e.to_string()))
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchItem>> {
        let url = url::Url::parse_with_params(SEARCH_URL, &[("q", query)])
            .map_err(|e| SamtaleError::tool("duckduckgo_search", e.to_string()))?;

        let html = self.get_text("duckduckgo_search", url).await?;

        let items = self.parser.parse(&html, count);
        debug!("DuckDuckGo returned {} results", items.len());
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn news(&self, query: &str, count: usize) -> Result<Vec<NewsHit>> {
        let token_url = url::Url::parse_with_params(TOKEN_URL, &[("q", query)])
            .map_err(|e| SamtaleError::tool("duckduckgo_news", e.to_string()))?;
        let page = self.get_text("duckduckgo_news", token_url).await?;
        let vqd = self
            .parser
            .vqd(&page)
            .ok_or_else(|| SamtaleError::tool("duckduckgo_news", "no search token in response"))?;

        let news_url = url::Url::parse_with_params(
            NEWS_URL,
            &[
                ("l", "us-en"),
                ("o", "json"),
                ("noamp", "1"),
                ("p", "-1"),
                ("q", query),
                ("vqd", vqd.as_str()),
            ],
        )
        .map_err(|e| SamtaleError::tool("duckduckgo_news", e.to_string()))?;
        let body = self.get_text("duckduckgo_news", news_url).await?;

        let stories = parse_news(&body, count)?;
        debug!("DuckDuckGo returned {} news stories", stories.len());
        Ok(stories)
    }
}

/// Extracts results from the DuckDuckGo HTML page.
struct ResultParser {
    link: Regex,
    snippet: Regex,
    tag: Regex,
    vqd: Regex,
}

impl ResultParser {
    fn new() -> Self {
        Self {
            link: Regex::new(r#"<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>([\s\S]*?)</a>"#)
                .expect("Invalid regex"),
            snippet: Regex::new(r#"<a[^>]*class="result__snippet"[^>]*>([\s\S]*?)</a>"#)
                .expect("Invalid regex"),
            tag: Regex::new(r"<[^>]+>").expect("Invalid regex"),
            vqd: Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("Invalid regex"),
        }
    }

    fn vqd(&self, page: &str) -> Option<String> {
        self.vqd.captures(page).map(|cap| cap[1].to_string())
    }

    fn parse(&self, html: &str, max_results: usize) -> Vec<SearchItem> {
        html.split("result__body")
            .skip(1)
            .filter_map(|block| {
                let link = self.link.captures(block)?;
                let title = self.strip(&link[2]);
                let snippet = self
                    .snippet
                    .captures(block)
                    .map(|cap| self.strip(&cap[1]))
                    .unwrap_or_default();

                Some(SearchItem {
                    title,
                    url: resolve_redirect(&decode_entities(&link[1])),
                    snippet,
                })
            })
            .take(max_results)
            .collect()
    }

    fn strip(&self, fragment: &str) -> String {
        decode_entities(self.tag.replace_all(fragment, "").trim())
    }
}

/// DuckDuckGo wraps result links as `//duckduckgo.com/l/?uddg=<target>`.
fn resolve_redirect(raw: &str) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    url::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// `&amp;` goes last so escaped entities stay literal.
fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
/// Parse the news endpoint's `{"results": [...]}` payload.
fn parse_news(body: &str, max_results: usize) -> Result<Vec<NewsHit>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SamtaleError::tool("duckduckgo_news", format!("unexpected response: {}", e)))?;

    let text = |story: &serde_json::Value, key: &str| {
        story[key]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| decode_entities(s.trim()))
    };

    Ok(value["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|story| {
                    Some(NewsHit {
                        title: text(story, "title")?,
                        url: text(story, "url")?,
                        snippet: text(story, "excerpt").unwrap_or_default(),
                        source: text(story, "source"),
                        image: text(story, "image"),
                        date: story["date"]
                            .as_i64()
                            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                            .map(|dt| dt.to_rfc3339()),
                    })
                })
                .take(max_results)
                .collect()
        })
        .unwrap_or_default())
}

/// Web search toolkit exposed to agents.
pub struct DuckDuckGoTools {
    provider: Arc<dyn SearchProvider>,
    default_results: usize,
}

impl DuckDuckGoTools {
    pub fn new(provider: Arc<dyn SearchProvider>, default_results: usize) -> Self {
        Self {
            provider,
            default_results: default_results.clamp(1, MAX_RESULTS),
        }
    }

    async fn search(&self, args: &serde_json::Value) -> Result<String> {
        let query = required_str("duckduckgo_search", args, "query")?;
        let count = optional_count(args, "max_results", self.default_results, MAX_RESULTS);

        let items = self.provider.search(query, count).await?;
        Ok(serde_json::to_string_pretty(
            &items
                .iter()
                .map(|i| serde_json::json!({ "title": i.title, "href": i.url, "body": i.snippet }))
                .collect::<Vec<_>>(),
        )?)
    }

    async fn news(&self, args: &serde_json::Value) -> Result<String> {
        let query = required_str("duckduckgo_news", args, "query")?;
        let count = optional_count(args, "max_results", self.default_results, MAX_RESULTS);

        let stories = self.provider.news(query, count).await?;
        Ok(serde_json::to_string_pretty(
            &stories
                .iter()
                .map(|n| {
                    serde_json::json!({
                        "date": n.date,
                        "title": n.title,
                        "body": n.snippet,
                        "url": n.url,
                        "image": n.image,
                        "source": n.source,
                    })
                })
                .collect::<Vec<_>>(),
        )?)
    }
}

#[async_trait]
impl Toolkit for DuckDuckGoTools {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let parameters = serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search for"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 5)"
                }
            },
            "required": ["query"]
        });

        vec![
            ToolDefinition::new(
                "duckduckgo_search",
                "Search the web with DuckDuckGo. Returns a JSON list of results with title, href and body.",
                parameters.clone(),
            ),
            ToolDefinition::new(
                "duckduckgo_news",
                "Get the latest news from DuckDuckGo. Returns a JSON list of stories with date, title, body, url and source.",
                parameters,
            ),
        ]
    }

    async fn invoke(&self, function: &str, arguments: &serde_json::Value) -> Result<String> {
        match function {
            "duckduckgo_search" => self.search(arguments).await,
            "duckduckgo_news" => self.news(arguments).await,
            other => Err(SamtaleError::tool_argument(other, "not provided by duckduckgo")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="result__body">
          <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">The <b>Rust</b> Programming Language</a>
          <a class="result__snippet" href="x">A language empowering everyone to build <b>reliable</b> software.</a>
        </div>
        <div class="result__body">
          <a rel="nofollow" class="result__a" href="https://doc.rust-lang.org/book/">The Book &amp; more</a>
        </div>
    "#;

    #[test]
    fn test_parse_results() {
        let items = ResultParser::new().parse(PAGE, 10);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "The Rust Programming Language");
        assert_eq!(items[0].url, "https://www.rust-lang.org/");
        assert_eq!(items[0].snippet, "A language empowering everyone to build reliable software.");
        assert_eq!(items[1].title, "The Book & more");
        assert_eq!(items[1].url, "https://doc.rust-lang.org/book/");
        assert!(items[1].snippet.is_empty());
    }

    #[test]
    fn test_decode_entities_once() {
        assert_eq!(decode_entities("&amp;lt;b&amp;gt;"), "&lt;b&gt;");
        assert_eq!(decode_entities("Q&amp;A &lt;3 &quot;x&quot;"), "Q&A <3 \"x\"");
    }

    #[test]
    fn test_parse_respects_max_results() {
        assert_eq!(ResultParser::new().parse(PAGE, 1).len(), 1);
        assert!(ResultParser::new().parse("", 5).is_empty());
    }

    struct FixedSearch;

    #[async_trait]
    impl SearchProvider for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchItem>> {
            Ok((0..count)
                .map(|i| SearchItem {
                    title: format!("{} {}", query, i),
                    url: format!("https://example.com/{}", i),
                    snippet: String::new(),
                })
                .collect())
        }

        async fn news(&self, query: &str, count: usize) -> Result<Vec<NewsHit>> {
            Ok((0..count)
                .map(|i| NewsHit {
                    title: format!("{} story {}", query, i),
                    url: format!("https://news.example.com/{}", i),
                    snippet: "Details".to_string(),
                    source: Some("Example Wire".to_string()),
                    image: None,
                    date: None,
                })
                .collect())
        }
    }

    #[test]
    fn test_vqd_token() {
        let parser = ResultParser::new();
        assert_eq!(
            parser.vqd(r#"<script>DDG.deep.initialize('/d.js?q=rust&vqd="4-1234567890"&l=us-en')</script>"#),
            Some("4-1234567890".to_string())
        );
        assert_eq!(parser.vqd("vqd=4-98765&kl=wt-wt").as_deref(), Some("4-98765"));
        assert!(parser.vqd("<html>no token</html>").is_none());
    }

    #[test]
    fn test_parse_news() {
        let body = r#"{"results": [
            {"date": 1700000000, "title": "Rust 2.0 &amp; beyond", "excerpt": "Big news", "url": "https://news.example.com/a", "source": "Example Wire", "image": ""},
            {"title": "No link"},
            {"date": 1700003600, "title": "Second", "excerpt": "", "url": "https://news.example.com/b"}
        ]}"#;

        let stories = parse_news(body, 10).unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].title, "Rust 2.0 & beyond");
        assert_eq!(stories[0].source.as_deref(), Some("Example Wire"));
        assert!(stories[0].image.is_none());
        assert_eq!(stories[0].date.as_deref(), Some("2023-11-14T22:13:20+00:00"));
        assert!(stories[1].snippet.is_empty());

        assert_eq!(parse_news(body, 1).unwrap().len(), 1);
        assert!(parse_news(r#"{"results": []}"#, 5).unwrap().is_empty());
        assert!(parse_news("<html>", 5).is_err());
    }

    #[tokio::test]
    async fn test_news_tool_output() {
        let tools = DuckDuckGoTools::new(Arc::new(FixedSearch), 5);
        let output = tools
            .invoke("duckduckgo_news", &serde_json::json!({"query": "ollama", "max_results": 3}))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(parsed[0]["title"], "ollama story 0");
        assert_eq!(parsed[0]["source"], "Example Wire");
        assert!(parsed[0]["date"].is_null());
    }

    #[tokio::test]
    async fn test_search_tool_output() {
        let tools = DuckDuckGoTools::new(Arc::new(FixedSearch), 5);
        let output = tools
            .invoke("duckduckgo_search", &serde_json::json!({"query": "ollama", "max_results": 2}))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["title"], "ollama 0");
        assert_eq!(parsed[1]["href"], "https://example.com/1");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let tools = DuckDuckGoTools::new(Arc::new(FixedSearch), 5);
        let err = tools
            .invoke("duckduckgo_search", &serde_json::json!({"query": "  "}))
            .await
            .unwrap_err();
        assert!(matches!(err, SamtaleError::ToolArgument { .. }));
    }
}
