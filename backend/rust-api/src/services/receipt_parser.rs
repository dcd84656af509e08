//! Heuristic field extraction from raw OCR text of a printed receipt.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Confidence reported for text that went through the heuristics.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Only the first few lines are considered when looking for the merchant name.
const MERCHANT_SCAN_LINES: usize = 5;

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?\s*(\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?)").expect("amount regex")
});

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").expect("date regex"));

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedReceipt {
    pub merchant: Option<String>,
    pub total_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub confidence: f64,
}

pub fn parse_receipt_text(text: &str) -> ParsedReceipt {
    ParsedReceipt {
        merchant: find_merchant(text),
        total_amount: find_total(text),
        date: find_date(text),
        confidence: DEFAULT_CONFIDENCE,
    }
}

/// First early line that reads like a name: longer than 3 chars and digit-free.
fn find_merchant(text: &str) -> Option<String> {
    text.lines()
        .take(MERCHANT_SCAN_LINES)
        .map(str::trim)
        .find(|line| line.chars().count() > 3 && !line.chars().any(|c| c.is_ascii_digit()))
        .map(String::from)
}

/// Prefer the last line that mentions a total; otherwise the first amount anywhere.
fn find_total(text: &str) -> Option<f64> {
    let total_line = text
        .lines()
        .filter(|line| line.to_lowercase().contains("total"))
        .filter_map(|line| amounts(line).last())
        .last();

    total_line.or_else(|| amounts(text).next())
}

fn amounts(haystack: &str) -> impl Iterator<Item = f64> + '_ {
    AMOUNT_RE
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

/// Day-month-year with `/` or `-`; two-digit years are read as 20xx.
fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_RE.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year_raw = &caps[3];
        let year: i32 = match year_raw.len() {
            2 => 2000 + year_raw.parse::<i32>().ok()?,
            4 => year_raw.parse().ok()?,
            _ => return None,
        };
        NaiveDate::from_ymd_opt(year, month, day)
    })
}
