//! Internal helpers for validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and normalization so every operation enforces the same rules.

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Trim a user supplied name and reject empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed)
}

/// Comparison key for names that must be unique per owner.
///
/// NFKC folds compatibility forms (full-width letters, ligatures) so that
/// visually identical names collide; case is ignored.
pub(crate) fn normalize_name_key(display: &str) -> String {
    display
        .nfkc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `None` keeps the stored value, `Some("")` clears it.
pub(crate) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

pub(crate) fn apply_optional_datetime_patch(
    existing: DateTime<Utc>,
    patch: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    patch.unwrap_or(existing)
}

/// Ledger amounts are stored unsigned; the sign comes from the category.
pub(crate) fn ensure_positive_amount(amount: MoneyCents) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_name_collapses_whitespace() {
        assert_eq!(
            normalize_required_name("  Main   Bank ", "account").unwrap(),
            "Main Bank"
        );
        assert_eq!(
            normalize_required_name("   ", "account"),
            Err(EngineError::InvalidName(
                "account name must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn name_key_folds_case_and_compatibility_forms() {
        assert_eq!(normalize_name_key("Transfer  In"), "transfer in");
        assert_eq!(normalize_name_key("ＣＡＳＨ"), "cash");
        assert_eq!(normalize_name_key("ﬁnance"), "finance");
    }

    #[test]
    fn text_patch_semantics() {
        let existing = Some("Dinner".to_string());
        assert_eq!(apply_optional_text_patch(existing.clone(), None), existing);
        assert_eq!(apply_optional_text_patch(existing.clone(), Some("  ")), None);
        assert_eq!(
            apply_optional_text_patch(existing, Some(" Lunch ")),
            Some("Lunch".to_string())
        );
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(ensure_positive_amount(MoneyCents::new(1)).is_ok());
        assert!(ensure_positive_amount(MoneyCents::ZERO).is_err());
        assert!(ensure_positive_amount(MoneyCents::new(-100)).is_err());
    }
}
