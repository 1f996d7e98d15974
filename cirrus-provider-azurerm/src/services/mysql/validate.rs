//! Validators for MySQL Flexible Server attributes

use regex::Regex;

const RESERVED_LOGINS: &[&str] = &[
    "azure_superuser",
    "admin",
    "administrator",
    "root",
    "guest",
    "public",
];

fn matches(pattern: &str, value: &str) -> Result<bool, String> {
    let re = Regex::new(pattern).map_err(|e| e.to_string())?;
    Ok(re.is_match(value))
}

pub fn flexible_server_name(value: &str) -> Result<(), String> {
    if !matches(r"^[a-z0-9][-a-z0-9]{1,61}[a-z0-9]$", value)? {
        return Err(format!(
            "{:?} must be 3 - 63 characters long, contain only lowercase letters, numbers and hyphens, and must not start or end with a hyphen",
            value
        ));
    }
    Ok(())
}

pub fn administrator_login(value: &str) -> Result<(), String> {
    if !matches(r"^[a-zA-Z][a-zA-Z0-9_]{0,31}$", value)? {
        return Err(format!(
            "{:?} must be 1 - 32 characters long, start with a letter and contain only letters, numbers and underscores",
            value
        ));
    }
    if RESERVED_LOGINS.contains(&value.to_ascii_lowercase().as_str()) {
        return Err(format!(
            "{:?} is a reserved name and cannot be used, it must not be one of: {}",
            value,
            RESERVED_LOGINS.join(", ")
        ));
    }
    Ok(())
}

pub fn administrator_password(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if !(8..=128).contains(&len) {
        return Err("length should be between 8 and 128".to_string());
    }

    let classes = [
        value.chars().any(|c| c.is_ascii_uppercase()),
        value.chars().any(|c| c.is_ascii_lowercase()),
        value.chars().any(|c| c.is_ascii_digit()),
        value.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    if classes.iter().filter(|present| **present).count() < 3 {
        return Err(
            "must contain characters from three of the categories: uppercase letters, lowercase letters, numbers and non-alphanumeric characters"
                .to_string(),
        );
    }
    Ok(())
}

pub fn sku_name(value: &str) -> Result<(), String> {
    if !matches(r"^(B|GP|MO)_[A-Za-z0-9]+(_[A-Za-z0-9]+)*$", value)? {
        return Err(format!(
            "{:?} is not a valid sku name, expected a `B_`, `GP_` or `MO_` prefix (e.g. GP_Standard_D2ds_v4)",
            value
        ));
    }
    Ok(())
}

/// Server parameter names are lowercase words joined by underscores
pub fn configuration_name(value: &str) -> Result<(), String> {
    if !matches(r"^[a-z][a-z0-9_.]*$", value)? {
        return Err(format!("{:?} is not a valid server parameter name", value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flexible_server_name() {
        for valid in ["abc", "example-server-1", &"a".repeat(63)] {
            assert!(flexible_server_name(valid).is_ok(), "{}", valid);
        }
        for invalid in ["ab", "-abc", "abc-", "Example", "a_b_c", &"a".repeat(64)] {
            assert!(flexible_server_name(invalid).is_err(), "{}", invalid);
        }
    }

    #[test]
    fn test_administrator_login() {
        assert!(administrator_login("mysqladmin").is_ok());
        assert!(administrator_login("a").is_ok());
        assert!(administrator_login("1admin").is_err());
        assert!(administrator_login("my-admin").is_err());
        assert!(administrator_login(&"a".repeat(33)).is_err());

        let err = administrator_login("Admin").unwrap_err();
        assert!(err.contains("reserved"));
        assert!(administrator_login("azure_superuser").is_err());
    }

    #[test]
    fn test_administrator_password() {
        assert!(administrator_password("QAZwsx123").is_ok());
        assert!(administrator_password("qazwsx12!").is_ok());
        assert!(administrator_password("Short1!").is_err());
        assert!(administrator_password("alllowercase").is_err());
        assert!(administrator_password("lowerUPPER").is_err());
        assert!(administrator_password(&"Aa1".repeat(43)).is_err());
    }

    #[test]
    fn test_sku_name() {
        assert!(sku_name("B_Standard_B1s").is_ok());
        assert!(sku_name("GP_Standard_D2ds_v4").is_ok());
        assert!(sku_name("MO_Standard_E2ds_v4").is_ok());
        assert!(sku_name("Standard_D2ds_v4").is_err());
        assert!(sku_name("XX_Standard_D2ds_v4").is_err());
        assert!(sku_name("GP_").is_err());
    }

    #[test]
    fn test_configuration_name() {
        assert!(configuration_name("max_connections").is_ok());
        assert!(configuration_name("innodb_buffer_pool_size").is_ok());
        assert!(configuration_name("Max Connections").is_err());
    }
}
