//! Human-readable file sizes ("2.5 MB") as written into attachment comments

use regex::Regex;
use std::sync::OnceLock;

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const STEP: f64 = 1024.0;

static SIZE_REGEX: OnceLock<Regex> = OnceLock::new();

fn size_regex() -> &'static Regex {
    SIZE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(Bytes|KB|MB|GB)").expect("Invalid file size regex")
    })
}

/// Parse a size such as `"2.5 MB"` into bytes.
///
/// Units are Bytes/KB/MB/GB (case-insensitive), 1024 per step. Anything
/// unrecognized yields 0.
pub fn parse_file_size(text: &str) -> u64 {
    let Some(captures) = size_regex().captures(text) else {
        return 0;
    };
    let Ok(value) = captures[1].parse::<f64>() else {
        return 0;
    };
    let exponent = match captures[2].to_ascii_uppercase().as_str() {
        "BYTES" => 0,
        "KB" => 1,
        "MB" => 2,
        "GB" => 3,
        _ => return 0,
    };
    (value * STEP.powi(exponent)).round() as u64
}

/// Format bytes with the largest unit that keeps the value at or above 1,
/// two decimals at most.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= STEP && unit < UNITS.len() - 1 {
        value /= STEP;
        unit += 1;
    }
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
