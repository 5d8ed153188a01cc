//! Deterministic name derivation for model and field schemas.
//!
//! Type names, table names and column names are always re-derived from the
//! user-chosen schema name; nothing here is stored.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s-]").expect("valid slug pattern");
    static ref SEPARATORS: Regex = Regex::new(r"[-\s]+").expect("valid separator pattern");
}

/// Folds `input` to ASCII, lowercases it, drops punctuation and collapses
/// runs of whitespace and hyphens into a single hyphen. Leading and trailing
/// hyphens and underscores are stripped.
pub fn slugify(input: &str) -> String {
    let folded: String = input.nfkd().filter(char::is_ascii).collect();
    let lowered = folded.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    SEPARATORS
        .replace_all(&stripped, "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

/// Slug with underscores, usable as a SQL identifier.
pub fn sql_identifier(input: &str) -> String {
    slugify(input).replace('-', "_")
}

/// Column name for a field schema called `field_name`.
pub fn column_name(field_name: &str) -> String {
    sql_identifier(field_name)
}

/// Table name for a model schema called `model_name`.
pub fn table_name(model_name: &str, prefix: Option<&str>) -> String {
    let base = sql_identifier(model_name);
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}_{}", sql_identifier(prefix), base),
        _ => base,
    }
}

/// Title-cases every word of `model_name` and strips the spaces:
/// `"sales invoice"` becomes `"SalesInvoice"`.
pub fn type_name(model_name: &str) -> String {
    let mut result = String::with_capacity(model_name.len());
    let mut at_word_start = true;
    for ch in model_name.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            if ch != ' ' {
                result.push(ch);
            }
            at_word_start = true;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Simple Model"), "simple-model");
        assert_eq!(slugify("  Hello,   World! "), "hello-world");
        assert_eq!(slugify("a--b"), "a-b");
    }

    #[test]
    fn test_slugify_folds_accents_and_trims_underscores() {
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("_tmp_"), "tmp");
        assert_eq!(table_name("Crème Brûlée", None), "creme_brulee");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_table_and_column_names() {
        assert_eq!(table_name("Sales Invoice", None), "sales_invoice");
        assert_eq!(table_name("invoice", Some("dyn")), "dyn_invoice");
        assert_eq!(column_name("Unit Price"), "unit_price");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name("simple model"), "SimpleModel");
        assert_eq!(type_name("INVOICE"), "Invoice");
        assert_eq!(type_name("line-item 2"), "Line-Item2");
    }
}
