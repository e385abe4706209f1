//! Catalog name normalization
//!
//! The catalog packs model, trim, engine, and year into one free-text
//! field. This module splits that string into clean fields using positional
//! heuristics and an ordered table of strip rules. All functions are pure
//! and deterministic; extraction that finds nothing yields `None`, never a
//! guessed value.

use crate::models::{CatalogItem, FuelType, ProcessedModel, ProcessedVersion};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// One named stripping rule applied to a version string
struct StripRule {
    name: &'static str,
    pattern: Regex,
}

impl StripRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("invalid strip rule pattern"),
        }
    }
}

/// Ordered strip rules for version names
///
/// Order matters: door counts must go before the generic alphanumeric-code
/// rule, and word-vocabulary stripping runs after the numeric rules so that
/// "Aut." and "Flex" are removed as whole words.
static VERSION_STRIP_RULES: Lazy<Vec<StripRule>> = Lazy::new(|| {
    vec![
        // Engine displacements: "1.0", "2.0L"
        StripRule::new("engine-displacement", r"(?i)\b\d\.\d\s*(?:l\b)?"),
        // Door counts: "4p", "2P."
        StripRule::new("door-count", r"(?i)\b\d\s*p\b\.?"),
        // Mixed letter/digit technical codes: "16V", "200TSI", "T270"
        StripRule::new(
            "alphanumeric-code",
            r"(?i)\b(?:\d+[a-z][a-z0-9]*|[a-z]+\d[a-z0-9]*)\b",
        ),
        // Drivetrain markers
        StripRule::new("drivetrain", r"(?i)\b4x[24]\b"),
        // Transmission, fuel, and engine-family vocabulary
        StripRule::new(
            "word-vocabulary",
            r"(?i)\b(?:manual|autom[aá]tico|aut|mec[aâ]nico|mec|total\s+flex|flex|gasolina|diesel|etanol|[aá]lcool|h[ií]brido|el[eé]trico|turbo|tsi|tfsi|mpi|gdi)\b\.?",
        ),
        // Bare model-year tokens
        StripRule::new("year-token", r"\b(?:19|20)\d{2}\b"),
    ]
});

/// First 4-digit run that looks like a model year
static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("invalid year pattern"));

/// Any 4-digit run, fallback when no 19xx/20xx token exists
static ANY_FOUR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}").expect("invalid digit pattern"));

/// Fuel vocabulary in match-priority order
const FUEL_VOCABULARY: [FuelType; 6] = [
    FuelType::Flex,
    FuelType::Gasolina,
    FuelType::Diesel,
    FuelType::Etanol,
    FuelType::Hibrido,
    FuelType::Eletrico,
];

/// Lowercase and fold Portuguese accents for matching
pub fn fold_for_match(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Case-insensitive prefix strip; returns the remainder of `s` after
/// `prefix` when `s` starts with it
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut s_chars = s.char_indices();
    let mut p_chars = prefix.chars();

    loop {
        let Some(pc) = p_chars.next() else {
            return match s_chars.next() {
                Some((idx, _)) => Some(&s[idx..]),
                None => Some(""),
            };
        };
        match s_chars.next() {
            Some((_, sc)) if sc.to_lowercase().eq(pc.to_lowercase()) => continue,
            _ => return None,
        }
    }
}

fn starts_with_ci(s: &str, prefix: &str) -> bool {
    strip_prefix_ci(s, prefix).is_some()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    fold_for_match(haystack).contains(&fold_for_match(needle))
}

/// Extract the clean model name from a full manufacturer string
///
/// First whitespace-delimited token; when that token is shorter than
/// 3 characters the first two tokens are joined ("C3 Picasso" stays
/// recognizable instead of collapsing to "C3").
pub fn extract_model_name(full_name: &str) -> String {
    let mut tokens = full_name.split_whitespace();
    let Some(first) = tokens.next() else {
        return String::new();
    };

    if first.chars().count() < 3 {
        if let Some(second) = tokens.next() {
            return format!("{} {}", first, second);
        }
    }
    first.to_string()
}

/// Case-insensitive prefix test: does this version string belong to the model?
pub fn is_version_of_model(version_name: &str, model_name: &str) -> bool {
    starts_with_ci(version_name, model_name)
}

/// Extract a clean version name by stripping the model prefix and then the
/// technical-token vocabulary
///
/// Falls back to the original full string when stripping leaves fewer than
/// 2 characters.
pub fn extract_version_name(full_name: &str, model_name: &str) -> String {
    let without_model = strip_prefix_ci(full_name, model_name).unwrap_or(full_name);

    let mut stripped = without_model.to_string();
    for rule in VERSION_STRIP_RULES.iter() {
        let replaced = rule.pattern.replace_all(&stripped, " ");
        if replaced != stripped {
            tracing::trace!(rule = rule.name, "strip rule applied");
        }
        stripped = replaced.into_owned();
    }

    // Collapse whitespace and drop leftover punctuation-only tokens
    let cleaned: String = stripped
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(|token| token.trim_matches(|c: char| c == '.' || c == '-' || c == '/'))
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.chars().count() < 2 {
        full_name.trim().to_string()
    } else {
        cleaned
    }
}

/// First fuel-vocabulary substring found in the string, if any
pub fn extract_fuel_type(name: &str) -> Option<FuelType> {
    let folded = fold_for_match(name);
    FUEL_VOCABULARY
        .iter()
        .copied()
        .find(|fuel| folded.contains(&fold_for_match(fuel.label())))
}

/// First recoverable 4-digit year in the string
///
/// Prefers a 19xx/20xx token; falls back to any 4-digit run. Returns `None`
/// when the string carries no year at all; callers decide what an absent
/// year means.
pub fn extract_year(name: &str) -> Option<i32> {
    if let Some(m) = YEAR_PATTERN.find(name) {
        return m.as_str().parse().ok();
    }
    ANY_FOUR_DIGITS
        .find(name)
        .and_then(|m| m.as_str().parse().ok())
}

/// Group raw models by clean name, keeping the first occurrence per group
///
/// Input order determines which raw record represents each group.
pub fn process_models(raw_models: &[CatalogItem]) -> Vec<ProcessedModel> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut processed = Vec::new();

    for raw in raw_models {
        let clean = extract_model_name(&raw.name);
        if clean.is_empty() {
            continue;
        }
        if seen.insert(fold_for_match(&clean)) {
            processed.push(ProcessedModel {
                name: clean,
                code: raw.code.clone(),
                full_name: raw.name.clone(),
            });
        }
    }

    processed
}

/// Versions of the selected model, with clean fields extracted
pub fn process_versions(raw_versions: &[CatalogItem], selected_model: &str) -> Vec<ProcessedVersion> {
    raw_versions
        .iter()
        .filter(|raw| is_version_of_model(&raw.name, selected_model))
        .map(|raw| ProcessedVersion {
            name: extract_version_name(&raw.name, selected_model),
            code: raw.code.clone(),
            full_name: raw.name.clone(),
            fuel_type: extract_fuel_type(&raw.name),
            year: extract_year(&raw.name),
        })
        .collect()
}

/// Distinct model years for the selected model, descending
///
/// Three-tier fallback search: strict prefix match, then
/// substring-contains, then the whole input set. Entries with no
/// recoverable year are excluded.
pub fn unique_years(raw_years: &[CatalogItem], selected_model: &str) -> Vec<i32> {
    let prefix_matched: Vec<&CatalogItem> = raw_years
        .iter()
        .filter(|raw| is_version_of_model(&raw.name, selected_model))
        .collect();

    let matched: Vec<&CatalogItem> = if !prefix_matched.is_empty() {
        prefix_matched
    } else {
        let contains_matched: Vec<&CatalogItem> = raw_years
            .iter()
            .filter(|raw| contains_ci(&raw.name, selected_model))
            .collect();
        if !contains_matched.is_empty() {
            contains_matched
        } else {
            raw_years.iter().collect()
        }
    };

    let mut years: Vec<i32> = matched
        .iter()
        .filter_map(|raw| extract_year(&raw.name))
        .collect();
    years.sort_unstable();
    years.dedup();
    years.reverse();
    years
}

/// Versions prefix-matched to the model whose extracted year equals the target
pub fn versions_by_year(
    raw_years: &[CatalogItem],
    selected_model: &str,
    target_year: i32,
) -> Vec<ProcessedVersion> {
    process_versions(raw_years, selected_model)
        .into_iter()
        .filter(|version| version.year == Some(target_year))
        .collect()
}

/// Resolve a clean model selection back to a raw model code
///
/// Exact clean-name match first, then prefix match on the raw string.
pub fn best_model_match(raw_models: &[CatalogItem], selected_model: &str) -> Option<String> {
    let selected_folded = fold_for_match(selected_model);

    raw_models
        .iter()
        .find(|raw| fold_for_match(&extract_model_name(&raw.name)) == selected_folded)
        .or_else(|| {
            raw_models
                .iter()
                .find(|raw| starts_with_ci(&raw.name, selected_model))
        })
        .map(|raw| raw.code.clone())
}
