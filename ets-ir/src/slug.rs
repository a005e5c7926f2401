use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern"));

/// Lowercase, hyphen-separated identifier for a human-readable name.
///
/// Anything outside `[a-z0-9]` collapses into a single hyphen, so
/// `"Küche Licht"` becomes `"k-che-licht"`. An empty result falls back to
/// `"device"`.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let slug = NON_SLUG.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "device".to_string()
    } else {
        slug.to_string()
    }
}

/// Title-case each whitespace-separated word.
pub fn clean_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Living Room"), "living-room");
        assert_eq!(slugify("Küche Licht"), "k-che-licht");
        assert_eq!(slugify("  Ground Floor / EG "), "ground-floor-eg");
        assert_eq!(slugify("!!!"), "device");
        assert_eq!(slugify(""), "device");
    }

    #[test]
    fn title_case() {
        assert_eq!(clean_name("kitchen LIGHT"), "Kitchen Light");
        assert_eq!(clean_name("  ch-3 -  blinds "), "Ch-3 - Blinds");
        assert_eq!(clean_name("über licht"), "Über Licht");
    }
}
