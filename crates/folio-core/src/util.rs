/// Parse a boolean-like flag value.
/// Accepts 1/0, true/false, yes/no, on/off (case-insensitive).
pub fn parse_bool_flag(raw: &str) -> Option<bool> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read an environment variable as a boolean flag via [`parse_bool_flag`].
/// Unset or unparseable values yield `None` so callers keep their default.
pub fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_bool_flag(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_flag_accepts_common_spellings() {
        assert_eq!(parse_bool_flag("1"), Some(true));
        assert_eq!(parse_bool_flag(" ON "), Some(true));
        assert_eq!(parse_bool_flag("false"), Some(false));
        assert_eq!(parse_bool_flag("No"), Some(false));
        assert_eq!(parse_bool_flag("2"), None);
        assert_eq!(parse_bool_flag(""), None);
    }

    #[test]
    fn env_bool_falls_back_to_none() {
        std::env::set_var("FOLIO_TEST_FLAG", "yes");
        assert_eq!(env_bool("FOLIO_TEST_FLAG"), Some(true));
        std::env::set_var("FOLIO_TEST_FLAG", "off");
        assert_eq!(env_bool("FOLIO_TEST_FLAG"), Some(false));
        std::env::remove_var("FOLIO_TEST_FLAG");
        assert_eq!(env_bool("FOLIO_TEST_FLAG"), None);
    }
}
