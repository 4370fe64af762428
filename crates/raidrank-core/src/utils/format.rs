/// A roster entry split into character name and realm slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterId {
    pub name: String,
    pub realm: String,
}

/// Normalize a realm name to its API slug: lowercase, apostrophes removed,
/// spaces replaced with dashes.
pub fn normalize_realm(realm: &str) -> String {
    realm
        .trim()
        .to_lowercase()
        .replace('\'', "")
        .replace(' ', "-")
}

/// Normalize a group name for use as a storage or display key.
pub fn normalize_group_name(name: &str) -> String {
    normalize_realm(name)
        .replace('"', "")
        .replace(['/', '\\'], "-")
}

/// Parse a roster entry of the form `name` or `name/Realm Name`.
/// Entries without a realm use `default_realm`.
pub fn parse_character_id(entry: &str, default_realm: &str) -> CharacterId {
    match entry.split_once('/') {
        Some((name, realm)) if !realm.trim().is_empty() => CharacterId {
            name: name.trim().to_string(),
            realm: normalize_realm(realm),
        },
        Some((name, _)) => CharacterId {
            name: name.trim().to_string(),
            realm: normalize_realm(default_realm),
        },
        None => CharacterId {
            name: entry.trim().to_string(),
            realm: normalize_realm(default_realm),
        },
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_realm() {
        assert_eq!(normalize_realm("Aerie Peak"), "aerie-peak");
        assert_eq!(normalize_realm("Kil'jaeden"), "kiljaeden");
        assert_eq!(normalize_realm("Blade's Edge"), "blades-edge");
    }

    #[test]
    fn test_normalize_group_name() {
        assert_eq!(normalize_group_name("The \"Best\" Group"), "the-best-group");
        assert_eq!(normalize_group_name("Raided-X"), "raided-x");
        assert_eq!(normalize_group_name("AM/PM"), "am-pm");
    }

    #[test]
    fn test_parse_character_id() {
        assert_eq!(
            parse_character_id("Tankadin", "Aerie Peak"),
            CharacterId {
                name: "Tankadin".to_string(),
                realm: "aerie-peak".to_string()
            }
        );
        assert_eq!(parse_character_id("Healz/Blade's Edge", "aerie-peak").realm, "blades-edge");
        assert_eq!(parse_character_id("Odd/", "aerie-peak").realm, "aerie-peak");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}
