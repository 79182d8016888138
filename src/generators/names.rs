//! Name conversions used when naming generated files and identifiers.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid regex"))
}

fn separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^a-zA-Z0-9])+(.)?").expect("valid regex"))
}

/// The four spellings of a user-supplied name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub name: String,
    /// `my-function`
    pub file_name: String,
    /// `MyFunction`
    pub class_name: String,
    /// `myFunction`
    pub property_name: String,
    /// `MY_FUNCTION`
    pub constant_name: String,
}

pub fn names(name: &str) -> Names {
    let property_name = property_name(name);
    Names {
        name: name.to_string(),
        file_name: file_name(name),
        class_name: capitalize(&property_name),
        constant_name: constant_name(name),
        property_name,
    }
}

/// kebab-case; a leading underscore is kept.
pub fn file_name(s: &str) -> String {
    let lowered = camel_boundary().replace_all(s, "$1-$2").to_lowercase();
    lowered
        .char_indices()
        .map(|(i, c)| match c {
            '_' if i == 0 => '_',
            ' ' | '_' => '-',
            other => other,
        })
        .collect()
}

pub fn property_name(s: &str) -> String {
    let joined = separator_run().replace_all(s, |caps: &Captures| {
        caps.get(2)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_default()
    });
    let cleaned: String = joined.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            first.to_ascii_lowercase().to_string() + chars.as_str()
        }
        _ => cleaned,
    }
}

pub fn constant_name(s: &str) -> String {
    let normalized = if s.to_uppercase() == s {
        s.to_string()
    } else {
        file_name(s)
    };
    file_name(&property_name(&normalized))
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_uppercase()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `file_name` with dashes turned into underscores, for SQL file names.
pub fn snake_file_name(s: &str) -> String {
    file_name(s).replace('-', "_")
}
