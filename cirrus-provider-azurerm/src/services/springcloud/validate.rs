//! Validators for Spring Cloud attributes

use regex::Regex;

pub fn spring_cloud_service_name(value: &str) -> Result<(), String> {
    let re = Regex::new(r"^[a-z][a-z0-9-]{2,30}[a-z0-9]$").map_err(|e| e.to_string())?;
    if !re.is_match(value) {
        return Err(format!(
            "{:?} must be between 4 and 32 characters long, contain only lowercase letters, numbers and hyphens, start with a letter and end with a letter or number",
            value
        ));
    }
    Ok(())
}

/// Git repository URI: HTTP(S) or SSH
pub fn config_server_uri(value: &str) -> Result<(), String> {
    const SCHEMES: &[&str] = &["http://", "https://", "git@", "ssh://"];
    if SCHEMES.iter().any(|scheme| value.starts_with(scheme)) {
        return Ok(());
    }
    Err(format!(
        "{:?} is not a valid git repository URI, it must start with `http://`, `https://`, `git@` or `ssh://`",
        value
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_cloud_service_name() {
        for valid in ["abcd", "example-spring", "a23456789012345678901234567890bc"] {
            assert!(spring_cloud_service_name(valid).is_ok(), "{}", valid);
        }
        for invalid in ["abc", "1abc", "abc-", "Abcd", "ab_cd", &"a".repeat(33)] {
            assert!(spring_cloud_service_name(invalid).is_err(), "{}", invalid);
        }
    }

    #[test]
    fn test_config_server_uri() {
        assert!(config_server_uri("https://github.com/Azure-Samples/piggymetrics").is_ok());
        assert!(config_server_uri("git@bitbucket.org:Azure-Samples/piggymetrics.git").is_ok());
        assert!(config_server_uri("ssh://git@github.com/Azure-Samples/piggymetrics.git").is_ok());
        assert!(config_server_uri("ftp://example.com/repo").is_err());
        assert!(config_server_uri("").is_err());
    }
}
