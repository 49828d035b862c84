use std::collections::BTreeSet;
use std::sync::OnceLock;

use docket_core::ExtractedFields;
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// DD/MM/YYYY or MM/DD/YYYY, `/` or `-`
re!(re_date_day_first,
    r"(?i)\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b");
// YYYY/MM/DD
re!(re_date_year_first,
    r"(?i)\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b");
// Mon DD, YYYY
re!(re_date_month_name,
    r"(?i)\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* (\d{1,2}),? (\d{4})\b");

re!(re_amount_symbol_prefix,
    r"[$€₹£¥]\s*(\d+[,.]?\d*[,.]?\d*)");
re!(re_amount_symbol_suffix,
    r"(\d+[,.]?\d*[,.]?\d*)\s*[$€₹£¥]");
re!(re_amount_code_prefix,
    r"\b(USD|EUR|INR|GBP|JPY):?\s*(\d+[,.]?\d*[,.]?\d*)");

re!(re_email,
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b");

// ── Public extraction API ─────────────────────────────────────────────────────

/// Runs every pattern bank over `text`. Never fails; an empty text gives
/// empty fields.
pub fn extract_fields(text: &str) -> ExtractedFields {
    ExtractedFields {
        dates: extract_dates(text),
        amounts: extract_amounts(text),
        emails: extract_emails(text),
    }
}

/// Literal date substrings from all three formats, deduplicated.
pub fn extract_dates(text: &str) -> BTreeSet<String> {
    [re_date_day_first(), re_date_year_first(), re_date_month_name()]
        .into_iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Literal amount substrings, trimmed and deduplicated. `$500` and `500 $`
/// stay distinct.
pub fn extract_amounts(text: &str) -> BTreeSet<String> {
    [re_amount_symbol_prefix(), re_amount_symbol_suffix(), re_amount_code_prefix()]
        .into_iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Every email match in order of appearance, duplicates kept.
pub fn extract_emails(text: &str) -> Vec<String> {
    re_email()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
