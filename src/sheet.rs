//! Public-spreadsheet catalog import.
//!
//! The owner maintains the menu in a Google Sheet; its `gviz` CSV export
//! is fetched without auth and parsed into products. Google serves an
//! HTML login page instead of CSV when the sheet is not public, so the
//! body is sniffed before parsing.
//!
//! The parser is deliberately small: gviz output is regular enough that
//! quote-aware comma splitting plus a digits-only price scrub covers
//! everything the sheet has ever produced.

use reqwest::Client;
use tracing::{debug, info};

use crate::catalog::Product;
use crate::config::DEFAULT_TIMEOUT;
use crate::error::PosError;

/// Fetches and parses the published CSV export at `csv_url`.
pub async fn fetch_sheet_products(csv_url: &str) -> Result<Vec<Product>, PosError> {
    let client = Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| PosError::Sheet(format!("HTTP client error: {e}")))?;

    let resp = client
        .get(csv_url)
        .header("Accept", "text/csv")
        .send()
        .await
        .map_err(|e| PosError::Sheet(format!("Could not reach the spreadsheet: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(PosError::Sheet(format!(
            "Spreadsheet responded with status {}",
            status.as_u16()
        )));
    }

    let text = resp
        .text()
        .await
        .map_err(|e| PosError::Sheet(format!("Reading spreadsheet response failed: {e}")))?;

    // A private sheet answers with Google's login page, not CSV.
    if text.contains("<!DOCTYPE html>") || text.contains("login") {
        return Err(PosError::Sheet(
            "The spreadsheet is not publicly accessible. Enable \"Anyone with the link\" \
             and publish it to the web."
                .to_string(),
        ));
    }

    let products = parse_sheet_csv(&text);
    info!(count = products.len(), "sheet catalog loaded");
    Ok(products)
}

/// Parses gviz CSV into products. Line 0 is the header. Rows are skipped
/// when they have fewer than three fields, an empty item name, or no
/// digits in the price field; skipped and blank lines still advance the
/// line index, so synthesised `prod-N` ids stay stable as the sheet grows.
pub fn parse_sheet_csv(csv: &str) -> Vec<Product> {
    let mut products = Vec::new();
    for (idx, raw_line) in csv.split('\n').enumerate() {
        if idx == 0 {
            continue;
        }
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let parts = split_csv_line(line);
        if parts.len() < 3 {
            debug!(line = idx, "sheet row has too few columns; skipping");
            continue;
        }

        let item = clean_field(&parts[0]);
        let description = clean_field(&parts[1]);
        let digits: String = clean_field(&parts[2])
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let Ok(price) = digits.parse::<i64>() else {
            continue;
        };
        if item.is_empty() {
            continue;
        }

        products.push(Product {
            id: Some(format!("prod-{idx}")),
            item,
            description,
            price,
        });
    }
    products
}

/// Splits on commas that sit outside double quotes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Strips one wrapping quote pair, then whitespace.
fn clean_field(raw: &str) -> String {
    let inner = raw.strip_prefix('"').unwrap_or(raw);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    inner.trim().to_string()
}
