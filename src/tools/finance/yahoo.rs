//! Yahoo Finance market data source.

use super::{CompanyProfile, MarketData, NewsItem, Quote, Recommendation};
use crate::config::FinanceSettings;
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, instrument};

/// Yahoo Finance public JSON endpoints.
pub struct YahooFinance {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinance {
    pub fn new(settings: &FinanceSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; samtale)")
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, tool: &str, url: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("request failed: {}", e)))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("invalid response: {}", e)))?;

        // Yahoo reports lookups of unknown symbols as 404 with an error body.
        if !status.is_success() && body.is_null() {
            return Err(SamtaleError::tool(tool, format!("status {}", status)));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketData for YahooFinance {
    #[instrument(skip(self))]
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let body = self
            .get_json(
                "get_current_stock_price",
                &url,
                &[("range", "1d".to_string()), ("interval", "1d".to_string())],
            )
            .await?;
        parse_chart(symbol, &body)
    }

    #[instrument(skip(self))]
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let body = self
            .get_json(
                "get_company_info",
                &url,
                &[
                    ("q", symbol.to_string()),
                    ("quotesCount", "5".to_string()),
                    ("newsCount", "0".to_string()),
                ],
            )
            .await?;
        parse_profile(symbol, &body)
    }

    #[instrument(skip(self))]
    async fn recommendations(&self, symbol: &str) -> Result<Vec<Recommendation>> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let body = self
            .get_json(
                "get_analyst_recommendations",
                &url,
                &[("modules", "recommendationTrend".to_string())],
            )
            .await?;
        parse_recommendations(symbol, &body)
    }

    #[instrument(skip(self))]
    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsItem>> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let body = self
            .get_json(
                "get_company_news",
                &url,
                &[
                    ("q", symbol.to_string()),
                    ("quotesCount", "0".to_string()),
                    ("newsCount", count.to_string()),
                ],
            )
            .await?;
        Ok(parse_news(&body, count))
    }
}

fn parse_chart(symbol: &str, body: &serde_json::Value) -> Result<Quote> {
    let tool = "get_current_stock_price";
    if let Some(description) = body["chart"]["error"]["description"].as_str() {
        return Err(SamtaleError::tool(tool, format!("{}: {}", symbol, description)));
    }

    let meta = &body["chart"]["result"][0]["meta"];
    let price = meta["regularMarketPrice"]
        .as_f64()
        .ok_or_else(|| SamtaleError::tool(tool, format!("no price available for {}", symbol)))?;

    Ok(Quote {
        symbol: meta["symbol"].as_str().unwrap_or(symbol).to_string(),
        name: meta["longName"]
            .as_str()
            .or_else(|| meta["shortName"].as_str())
            .map(str::to_string),
        price,
        currency: meta["currency"].as_str().map(str::to_string),
        exchange: meta["fullExchangeName"]
            .as_str()
            .or_else(|| meta["exchangeName"].as_str())
            .map(str::to_string),
        previous_close: meta["chartPreviousClose"]
            .as_f64()
            .or_else(|| meta["previousClose"].as_f64()),
        day_high: meta["regularMarketDayHigh"].as_f64(),
        day_low: meta["regularMarketDayLow"].as_f64(),
        fifty_two_week_high: meta["fiftyTwoWeekHigh"].as_f64(),
        fifty_two_week_low: meta["fiftyTwoWeekLow"].as_f64(),
        volume: meta["regularMarketVolume"].as_u64(),
    })
}

fn parse_profile(symbol: &str, body: &serde_json::Value) -> Result<CompanyProfile> {
    let quote = body["quotes"]
        .as_array()
        .and_then(|quotes| {
            quotes
                .iter()
                .find(|q| q["symbol"].as_str().is_some_and(|s| s.eq_ignore_ascii_case(symbol)))
        })
        .ok_or_else(|| SamtaleError::tool("get_company_info", format!("company not found: {}", symbol)))?;

    let text = |key: &str| quote[key].as_str().map(str::to_string);

    Ok(CompanyProfile {
        symbol: symbol.to_string(),
        name: text("longname").or_else(|| text("shortname")),
        exchange: text("exchDisp").or_else(|| text("exchange")),
        quote_type: text("quoteType"),
        sector: text("sectorDisp").or_else(|| text("sector")),
        industry: text("industryDisp").or_else(|| text("industry")),
    })
}

fn parse_recommendations(symbol: &str, body: &serde_json::Value) -> Result<Vec<Recommendation>> {
    let tool = "get_analyst_recommendations";
    if let Some(description) = body["quoteSummary"]["error"]["description"].as_str() {
        return Err(SamtaleError::tool(tool, format!("{}: {}", symbol, description)));
    }
    if let Some(description) = body["finance"]["error"]["description"].as_str() {
        return Err(SamtaleError::tool(tool, description.to_string()));
    }

    let trend = body["quoteSummary"]["result"][0]["recommendationTrend"]["trend"]
        .as_array()
        .ok_or_else(|| SamtaleError::tool(tool, format!("no recommendations for {}", symbol)))?;

    let count = |entry: &serde_json::Value, key: &str| entry[key].as_u64().unwrap_or(0) as u32;

    Ok(trend
        .iter()
        .map(|entry| Recommendation {
            period: entry["period"].as_str().unwrap_or_default().to_string(),
            strong_buy: count(entry, "strongBuy"),
            buy: count(entry, "buy"),
            hold: count(entry, "hold"),
            sell: count(entry, "sell"),
            strong_sell: count(entry, "strongSell"),
        })
        .collect())
}

fn parse_news(body: &serde_json::Value, count: usize) -> Vec<NewsItem> {
    body["news"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(NewsItem {
                        title: item["title"].as_str()?.to_string(),
                        publisher: item["publisher"].as_str().map(str::to_string),
                        link: item["link"].as_str()?.to_string(),
                        published_at: item["providerPublishTime"]
                            .as_i64()
                            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
                    })
                })
                .take(count)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "ACME",
                        "currency": "USD",
                        "longName": "Acme Corporation",
                        "fullExchangeName": "NasdaqGS",
                        "regularMarketPrice": 187.32,
                        "chartPreviousClose": 185.1,
                        "regularMarketVolume": 5230000
                    }
                }],
                "error": null
            }
        });

        let quote = parse_chart("ACME", &body).unwrap();
        assert_eq!(quote.price, 187.32);
        assert_eq!(quote.name.as_deref(), Some("Acme Corporation"));
        assert_eq!(quote.exchange.as_deref(), Some("NasdaqGS"));
        assert_eq!(quote.previous_close, Some(185.1));
        assert_eq!(quote.volume, Some(5_230_000));
    }

    #[test]
    fn test_parse_chart_error() {
        let body = serde_json::json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });

        let err = parse_chart("ZZZZ", &body).unwrap_err();
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn test_parse_profile_picks_matching_symbol() {
        let body = serde_json::json!({
            "quotes": [
                { "symbol": "ACME.L", "shortname": "Acme London" },
                { "symbol": "ACME", "longname": "Acme Corporation", "exchDisp": "NASDAQ",
                  "quoteType": "EQUITY", "sectorDisp": "Industrials", "industryDisp": "Tools" }
            ]
        });

        let profile = parse_profile("ACME", &body).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Acme Corporation"));
        assert_eq!(profile.sector.as_deref(), Some("Industrials"));
        assert_eq!(profile.industry.as_deref(), Some("Tools"));

        assert!(parse_profile("NOPE", &body).is_err());
    }

    #[test]
    fn test_parse_recommendations() {
        let body = serde_json::json!({
            "quoteSummary": {
                "result": [{
                    "recommendationTrend": {
                        "trend": [
                            { "period": "0m", "strongBuy": 8, "buy": 20, "hold": 6, "sell": 1, "strongSell": 0 },
                            { "period": "-1m", "strongBuy": 7, "buy": 21, "hold": 6, "sell": 1, "strongSell": 1 }
                        ]
                    }
                }],
                "error": null
            }
        });

        let recs = parse_recommendations("ACME", &body).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].strong_buy, 8);
        assert_eq!(recs[1].strong_sell, 1);
    }

    #[test]
    fn test_parse_news() {
        let body = serde_json::json!({
            "news": [
                { "title": "Acme beats estimates", "publisher": "Reuters",
                  "link": "https://example.com/a", "providerPublishTime": 1700000000 },
                { "title": "missing link" },
                { "title": "Acme hires CFO", "link": "https://example.com/b" }
            ]
        });

        let news = parse_news(&body, 10);
        assert_eq!(news.len(), 2);
        assert!(news[0].published_at.is_some());
        assert_eq!(news[1].publisher, None);
        assert_eq!(parse_news(&body, 1).len(), 1);
    }
}
