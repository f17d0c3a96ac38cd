//! Financial data tools.
//!
//! Stock quotes, analyst recommendations, company profiles and news, backed by
//! a [`MarketData`] source (Yahoo Finance in production).

mod yahoo;

pub use yahoo::YahooFinance;

use super::{optional_count, required_str, ToolDefinition, Toolkit};
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Latest trading data for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: Option<String>,
    pub price: f64,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub previous_close: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<u64>,
}

/// Descriptive company data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

/// Analyst rating counts for one period ("0m" = current month, "-1m" = last month...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// A news headline about a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Trait for market data sources.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    async fn profile(&self, symbol: &str) -> Result<CompanyProfile>;

    async fn recommendations(&self, symbol: &str) -> Result<Vec<Recommendation>>;

    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsItem>>;
}

/// Which finance functions an agent gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinanceFeatures {
    pub stock_price: bool,
    pub analyst_recommendations: bool,
    pub company_info: bool,
    pub company_news: bool,
}

impl FinanceFeatures {
    pub fn all() -> Self {
        Self {
            stock_price: true,
            analyst_recommendations: true,
            company_info: true,
            company_news: true,
        }
    }
}

impl Default for FinanceFeatures {
    /// Only the price lookup.
    fn default() -> Self {
        Self {
            stock_price: true,
            analyst_recommendations: false,
            company_info: false,
            company_news: false,
        }
    }
}

/// Finance toolkit exposed to agents.
pub struct FinanceTools {
    data: Arc<dyn MarketData>,
    features: FinanceFeatures,
}

impl FinanceTools {
    pub fn new(data: Arc<dyn MarketData>, features: FinanceFeatures) -> Self {
        Self { data, features }
    }

    fn enabled(&self, function: &str) -> bool {
        match function {
            "get_current_stock_price" => self.features.stock_price,
            "get_analyst_recommendations" => self.features.analyst_recommendations,
            "get_company_info" => self.features.company_info,
            "get_company_news" => self.features.company_news,
            _ => false,
        }
    }
}

/// Normalize a ticker symbol. Accepts letters, digits and `.^=-`.
pub fn normalize_symbol(tool: &str, raw: &str) -> Result<String> {
    let symbol = raw.trim().trim_start_matches('$').to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));

    if valid {
        Ok(symbol)
    } else {
        Err(SamtaleError::tool_argument(tool, format!("invalid ticker symbol '{}'", raw)))
    }
}

fn symbol_schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "symbol": {
                "type": "string",
                "description": description
            }
        },
        "required": ["symbol"]
    })
}

#[async_trait]
impl Toolkit for FinanceTools {
    fn name(&self) -> &str {
        "yfinance"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = Vec::new();

        if self.features.stock_price {
            definitions.push(ToolDefinition::new(
                "get_current_stock_price",
                "Get the current stock price for a ticker symbol.",
                symbol_schema("The stock symbol, e.g. AAPL"),
            ));
        }
        if self.features.analyst_recommendations {
            definitions.push(ToolDefinition::new(
                "get_analyst_recommendations",
                "Get analyst buy/hold/sell recommendation counts for a stock.",
                symbol_schema("The stock symbol"),
            ));
        }
        if self.features.company_info {
            definitions.push(ToolDefinition::new(
                "get_company_info",
                "Get company name, sector, industry, exchange and key trading figures.",
                symbol_schema("The stock symbol"),
            ));
        }
        if self.features.company_news {
            definitions.push(ToolDefinition::new(
                "get_company_news",
                "Get recent news headlines for a company.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "symbol": { "type": "string", "description": "The stock symbol" },
                        "num_stories": {
                            "type": "integer",
                            "description": "Number of stories to return (default: 3)"
                        }
                    },
                    "required": ["symbol"]
                }),
            ));
        }

        definitions
    }

    async fn invoke(&self, function: &str, arguments: &serde_json::Value) -> Result<String> {
        if !self.enabled(function) {
            return Err(SamtaleError::tool_argument(function, "not enabled for this agent"));
        }

        let symbol = normalize_symbol(function, required_str(function, arguments, "symbol")?)?;

        match function {
            "get_current_stock_price" => {
                let quote = self.data.quote(&symbol).await?;
                Ok(format!("{:.4}", quote.price))
            }
            "get_analyst_recommendations" => {
                let recommendations = self.data.recommendations(&symbol).await?;
                Ok(serde_json::to_string_pretty(&recommendations)?)
            }
            "get_company_info" => {
                let profile = self.data.profile(&symbol).await?;
                let quote = match self.data.quote(&symbol).await {
                    Ok(quote) => Some(quote),
                    Err(e) => {
                        warn!("No quote for {} in company info: {}", symbol, e);
                        None
                    }
                };
                Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "profile": profile,
                    "quote": quote,
                }))?)
            }
            "get_company_news" => {
                let count = optional_count(arguments, "num_stories", 3, 20);
                let news = self.data.news(&symbol, count).await?;
                Ok(serde_json::to_string_pretty(&news)?)
            }
            other => Err(SamtaleError::tool_argument(other, "not provided by yfinance")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixtureMarket;

    #[async_trait]
    impl MarketData for FixtureMarket {
        async fn quote(&self, symbol: &str) -> Result<Quote> {
            Ok(Quote {
                symbol: symbol.to_string(),
                name: Some("Acme Corp".to_string()),
                price: 123.45,
                currency: Some("USD".to_string()),
                exchange: Some("NMS".to_string()),
                previous_close: Some(120.0),
                day_high: None,
                day_low: None,
                fifty_two_week_high: None,
                fifty_two_week_low: None,
                volume: Some(1_000),
            })
        }

        async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
            Err(SamtaleError::tool("get_company_info", format!("no profile for {}", symbol)))
        }

        async fn recommendations(&self, _symbol: &str) -> Result<Vec<Recommendation>> {
            Ok(vec![Recommendation {
                period: "0m".to_string(),
                strong_buy: 5,
                buy: 10,
                hold: 3,
                sell: 1,
                strong_sell: 0,
            }])
        }

        async fn news(&self, _symbol: &str, count: usize) -> Result<Vec<NewsItem>> {
            Ok((0..count)
                .map(|i| NewsItem {
                    title: format!("Story {}", i),
                    publisher: None,
                    link: format!("https://news.example.com/{}", i),
                    published_at: None,
                })
                .collect())
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("t", " acme ").unwrap(), "ACME");
        assert_eq!(normalize_symbol("t", "$brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_symbol("t", "^GSPC").unwrap(), "^GSPC");
        assert!(normalize_symbol("t", "../etc/passwd").is_err());
        assert!(normalize_symbol("t", "").is_err());
    }

    #[test]
    fn test_definitions_follow_features() {
        let tools = FinanceTools::new(Arc::new(FixtureMarket), FinanceFeatures::default());
        let names: Vec<_> = tools.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["get_current_stock_price"]);

        let tools = FinanceTools::new(Arc::new(FixtureMarket), FinanceFeatures::all());
        assert_eq!(tools.definitions().len(), 4);
    }

    #[tokio::test]
    async fn test_stock_price() {
        let tools = FinanceTools::new(Arc::new(FixtureMarket), FinanceFeatures::all());
        let price = tools
            .invoke("get_current_stock_price", &serde_json::json!({"symbol": "acme"}))
            .await
            .unwrap();
        assert_eq!(price, "123.4500");
    }

    #[tokio::test]
    async fn test_disabled_function_rejected() {
        let tools = FinanceTools::new(Arc::new(FixtureMarket), FinanceFeatures::default());
        let err = tools
            .invoke("get_company_news", &serde_json::json!({"symbol": "ACME"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SamtaleError::ToolArgument { .. }));
    }

    #[tokio::test]
    async fn test_company_info_propagates_source_error() {
        let tools = FinanceTools::new(Arc::new(FixtureMarket), FinanceFeatures::all());
        let err = tools
            .invoke("get_company_info", &serde_json::json!({"symbol": "ACME"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SamtaleError::ToolInvocation { .. }));
    }

    /// Knows company profiles but has no live prices.
    struct ProfileOnlyMarket;

    #[async_trait]
    impl MarketData for ProfileOnlyMarket {
        async fn quote(&self, symbol: &str) -> Result<Quote> {
            Err(SamtaleError::tool("get_current_stock_price", format!("no price for {}", symbol)))
        }

        async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
            Ok(CompanyProfile {
                symbol: symbol.to_string(),
                name: Some("Acme Corp".to_string()),
                exchange: None,
                quote_type: Some("EQUITY".to_string()),
                sector: Some("Industrials".to_string()),
                industry: None,
            })
        }

        async fn recommendations(&self, _symbol: &str) -> Result<Vec<Recommendation>> {
            Ok(Vec::new())
        }

        async fn news(&self, _symbol: &str, _count: usize) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_company_info_without_quote() {
        let tools = FinanceTools::new(Arc::new(ProfileOnlyMarket), FinanceFeatures::all());
        let output = tools
            .invoke("get_company_info", &serde_json::json!({"symbol": "acme"}))
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["profile"]["name"], "Acme Corp");
        assert!(parsed["quote"].is_null());
    }

    #[tokio::test]
    async fn test_news_count() {
        let tools = FinanceTools::new(Arc::new(FixtureMarket), FinanceFeatures::all());
        let output = tools
            .invoke("get_company_news", &serde_json::json!({"symbol": "ACME", "num_stories": 2}))
            .await
            .unwrap();
        let parsed: Vec<NewsItem> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}
