//! Indonesian-locale display formatting.
//!
//! Mirrors the `id-ID` formats the cashier UI renders: rupiah amounts with
//! dot grouping and no decimals, long dates for history group headers, and
//! medium date + short time for individual records.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

const MONTHS_LONG: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Format an amount in whole rupiah: `15000` -> `"Rp 15.000"`.
pub fn format_rupiah(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{sign}Rp {grouped}")
}

/// Long date used as a history group header: `"25 Agustus 2026"`.
pub fn format_date_long(date: NaiveDate) -> String {
    let month = MONTHS_LONG[date.month0() as usize];
    format!("{} {} {}", date.day(), month, date.year())
}

/// Medium date with short time: `"25 Agu 2026, 14.30"`.
pub fn format_date_time(dt: NaiveDateTime) -> String {
    let month = MONTHS_SHORT[dt.month0() as usize];
    format!(
        "{} {} {}, {:02}.{:02}",
        dt.day(),
        month,
        dt.year(),
        dt.hour(),
        dt.minute()
    )
}
