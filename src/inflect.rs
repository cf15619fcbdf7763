//! Naming-convention helpers mapping entity names to table names and back.
//!
//! Only the English rules needed for conventional table names are covered.

use convert_case::{Case, Casing};

/// Irregular singular/plural pairs
const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("status", "statuses"),
    ("alias", "aliases"),
    ("quiz", "quizzes"),
];

/// Words with identical singular and plural forms
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "metadata",
    "data",
    "series",
    "species",
    "news",
    "sheep",
    "fish",
];

/// `UserProfile` -> `user_profile`; namespaces become `/`
pub fn underscore(name: &str) -> String {
    name.split("::")
        .map(|segment| segment.to_case(Case::Snake))
        .collect::<Vec<_>>()
        .join("/")
}

/// `user_profile` -> `UserProfile`
pub fn camelize(name: &str) -> String {
    name.split('/')
        .map(|segment| segment.to_case(Case::Pascal))
        .collect::<Vec<_>>()
        .join("::")
}

/// Plural form of a lowercase word (the last `_` segment is inflected)
pub fn pluralize(word: &str) -> String {
    inflect_last_segment(word, pluralize_word)
}

/// Singular form of a lowercase word (the last `_` segment is inflected)
pub fn singularize(word: &str) -> String {
    inflect_last_segment(word, singularize_word)
}

/// Conventional table name for an entity: `UserProfile` -> `user_profiles`.
/// Namespaces are dropped: `Admin::User` -> `users`.
pub fn tableize(entity: &str) -> String {
    let base = entity.rsplit("::").next().unwrap_or(entity);
    pluralize(&underscore(base))
}

/// Conventional entity name for a table: `user_profiles` -> `UserProfile`
pub fn classify(table: &str) -> String {
    camelize(&singularize(table))
}

fn inflect_last_segment(word: &str, f: fn(&str) -> String) -> String {
    match word.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, f(last)),
        None => f(word),
    }
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULARS.iter().find(|(s, p)| *s == lower || *p == lower) {
        return (*plural).to_string();
    }

    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULARS.iter().find(|(s, p)| *p == lower || *s == lower) {
        return (*singular).to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_and_camelize() {
        assert_eq!(underscore("UserProfile"), "user_profile");
        assert_eq!(underscore("Admin::User"), "admin/user");
        assert_eq!(camelize("user_profile"), "UserProfile");
        assert_eq!(camelize("admin/user"), "Admin::User");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("line_item"), "line_items");
        assert_eq!(pluralize("news"), "news");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("houses"), "house");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("order_items"), "order_item");
        assert_eq!(singularize("class"), "class");
    }

    #[test]
    fn test_tableize_and_classify() {
        assert_eq!(tableize("User"), "users");
        assert_eq!(tableize("LineItem"), "line_items");
        assert_eq!(tableize("Admin::Category"), "categories");
        assert_eq!(classify("line_items"), "LineItem");
        assert_eq!(classify("people"), "Person");
    }
}
