//! Column name standardization.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("Invalid regex: non-word"));

/// Lowercase, replace spaces with underscores and drop non-word characters.
pub(crate) fn clean_column_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace(' ', "_");
    NON_WORD.replace_all(&lowered, "").into_owned()
}

/// Clean every name, then make the result non-empty and unique.
pub(crate) fn standardize_names(names: &[String]) -> Vec<String> {
    let cleaned: Vec<String> = names.iter().map(|n| clean_column_name(n)).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(cleaned.len());

    for (i, name) in cleaned.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("column_{}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_column_name() {
        assert_eq!(clean_column_name("  First Name "), "first_name");
        assert_eq!(clean_column_name("Price ($)"), "price_");
        assert_eq!(clean_column_name("e-mail"), "email");
        assert_eq!(clean_column_name("already_clean"), "already_clean");
    }

    #[test]
    fn test_standardize_names_handles_collisions() {
        let names: Vec<String> = ["Total", "total", "TOTAL", "%%", "Zip Code"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            standardize_names(&names),
            vec!["total", "total_1", "total_2", "column_3", "zip_code"]
        );
    }
}
