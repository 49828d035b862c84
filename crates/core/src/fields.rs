use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structured values pulled out of a document's OCR text.
///
/// Dates and amounts are sets of the literal matched substrings. Emails keep
/// every match in order of appearance, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub dates: BTreeSet<String>,
    pub amounts: BTreeSet<String>,
    pub emails: Vec<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.amounts.is_empty() && self.emails.is_empty()
    }

    /// `(dates, amounts, emails)` counts, in report order.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.dates.len(), self.amounts.len(), self.emails.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_serialize_all_keys() {
        let json = serde_json::to_value(ExtractedFields::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        for key in ["dates", "amounts", "emails"] {
            assert_eq!(obj[key], serde_json::json!([]), "key {key}");
        }
    }

    #[test]
    fn counts_follow_report_order() {
        let fields = ExtractedFields {
            dates: ["15/01/2024".to_string()].into(),
            amounts: BTreeSet::new(),
            emails: vec!["a@b.com".into(), "a@b.com".into()],
        };
        assert_eq!(fields.counts(), (1, 0, 2));
        assert!(!fields.is_empty());
    }
}
