// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Mutual fund NAV and gold price feeds.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::models::NavQuote;
use crate::utils::http_client;

pub const NAV_FEED_URL: &str = "https://www.amfiindia.com/spages/NAVAll.txt";
pub const GOLD_PRICE_URL: &str = "https://ibja.co";

static NAV_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^;]+;[^;]+;[^;]+;[^;]+;[^;]+;[^;]+").unwrap());
static GOLD_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span[^>]*id="lblDate"[^>]*>([^<]*)</span>"#).unwrap());
static GOLD_999: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span[^>]*id="lblFineGold999"[^>]*>([^<]*)</span>"#).unwrap());

/// Parses the `;`-separated NAV feed, keeping only the scheme codes asked for.
///
/// Header and section lines do not have six fields and are skipped. NAVs that
/// are not numbers (the feed uses `N.A.` for suspended schemes) are skipped too.
pub fn parse_nav_feed(text: &str, codes: &[String]) -> Vec<NavQuote> {
    let mut quotes = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if !NAV_LINE.is_match(line) {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        let code = fields[0].trim();
        if !codes.iter().any(|c| c == code) {
            continue;
        }
        let Ok(nav) = fields[4].trim().parse::<Decimal>() else {
            debug!(code, raw = fields[4], "skipping unparsable NAV");
            continue;
        };
        quotes.push(NavQuote {
            code: code.to_string(),
            nav: nav.round_dp(4),
            nav_date: fields[5].trim().to_string(),
        });
    }
    quotes
}

/// Extracts the fine gold (999) price and its date from the rates page.
///
/// The date is given as `DD/MM/YYYY` and returned as `DD-Mon-YYYY`; the price
/// is the second whitespace-separated field of its span.
pub fn parse_gold_page(html: &str) -> Result<(Decimal, String)> {
    let raw_date = GOLD_DATE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| LedgerError::Feed("gold price date not found".into()))?;
    let date = NaiveDate::parse_from_str(&raw_date, "%d/%m/%Y")
        .map_err(|e| LedgerError::Feed(format!("bad gold price date '{}': {}", raw_date, e)))?;

    let price_text = GOLD_999
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LedgerError::Feed("fine gold price not found".into()))?;
    let price = price_text
        .split_whitespace()
        .nth(1)
        .and_then(|p| p.replace(',', "").parse::<Decimal>().ok())
        .ok_or_else(|| LedgerError::Feed(format!("bad fine gold price '{}'", price_text.trim())))?;

    Ok((price, date.format("%d-%b-%Y").to_string()))
}

pub fn fetch_nav_quotes(codes: &[String]) -> Result<Vec<NavQuote>> {
    debug!(url = NAV_FEED_URL, codes = codes.len(), "fetching NAV feed");
    let client = http_client()?;
    let body = client.get(NAV_FEED_URL).send()?.error_for_status()?.text()?;
    let quotes = parse_nav_feed(&body, codes);
    debug!(matched = quotes.len(), "NAV feed parsed");
    Ok(quotes)
}

pub fn fetch_gold_price() -> Result<(Decimal, String)> {
    debug!(url = GOLD_PRICE_URL, "fetching gold price page");
    let client = http_client()?;
    let body = client.get(GOLD_PRICE_URL).send()?.error_for_status()?.text()?;
    parse_gold_page(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
Scheme Code;ISIN Div Payout/ ISIN Growth;ISIN Div Reinvestment;Scheme Name;Net Asset Value;Date

Open Ended Schemes(Debt Scheme - Banking and PSU Fund)

119551;INF209KA12Z1;INF209KA13Z9;Bluechip Fund - Direct Plan-Growth;101.123456;17-Oct-2026
120503;INF846K01EW2;-;Index Fund - Direct Plan;N.A.;17-Oct-2026
120716;INF109K016L0;-;Liquid Fund - Growth;2450.5;17-Oct-2026
";

    #[test]
    fn nav_feed_keeps_requested_codes_only() {
        let codes = vec!["119551".to_string(), "120503".to_string()];
        let quotes = parse_nav_feed(FEED, &codes);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].code, "119551");
        assert_eq!(quotes[0].nav, Decimal::from_str_exact("101.1235").unwrap());
        assert_eq!(quotes[0].nav_date, "17-Oct-2026");
    }

    #[test]
    fn gold_page_date_is_reformatted() {
        let html = r#"<div><span id="lblDate">16/10/2026</span>
            <span id="lblFineGold999" class="rate">999 7,245.50</span></div>"#;
        let (price, date) = parse_gold_page(html).unwrap();
        assert_eq!(price, Decimal::from_str_exact("7245.50").unwrap());
        assert_eq!(date, "16-Oct-2026");
    }

    #[test]
    fn gold_page_without_price_is_a_feed_error() {
        let html = r#"<span id="lblDate">16/10/2026</span>"#;
        assert!(matches!(parse_gold_page(html), Err(LedgerError::Feed(_))));
    }
}
