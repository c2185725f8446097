use super::ApiError;

const MAX_LANGUAGE_LEN: usize = 50;

/// Language names end up inside a GitHub search query, so only characters
/// that appear in real language names are let through (`c++`, `c#`,
/// `objective-c`, `vim_script`, `.net`).
pub fn validate_language(language: &str) -> Result<&str, ApiError> {
    let trimmed = language.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Language cannot be empty"));
    }

    if trimmed.len() > MAX_LANGUAGE_LEN {
        return Err(ApiError::validation(format!(
            "Language must be {} characters or less",
            MAX_LANGUAGE_LEN
        )));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '.' | '-' | '_'))
    {
        return Err(ApiError::validation(format!(
            "Invalid language: {}. Only letters, digits and + # . - _ are allowed",
            trimmed
        )));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language() {
        assert_eq!(validate_language("rust").unwrap(), "rust");
        assert_eq!(validate_language(" go ").unwrap(), "go");
        assert!(validate_language("c++").is_ok());
        assert!(validate_language("c#").is_ok());
        assert!(validate_language("objective-c").is_ok());
        assert!(validate_language("vim_script").is_ok());
    }

    #[test]
    fn test_validate_language_rejects_query_injection() {
        assert!(validate_language("").is_err());
        assert!(validate_language("   ").is_err());
        assert!(validate_language("rust stars:>0").is_err());
        assert!(validate_language("go\"").is_err());
        assert!(validate_language("a:b").is_err());
        assert!(validate_language(&"x".repeat(51)).is_err());
    }
}
