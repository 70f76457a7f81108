use crate::ConfigResult;

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a timeout is reasonable
    pub fn validate_timeout_seconds(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 3600 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600"
            )));
        }
        Ok(())
    }

    /// Validate that a count is reasonable
    pub fn validate_count(count: usize, field_name: &str) -> ConfigResult<()> {
        if count == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > 10000 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 10000"
            )));
        }
        Ok(())
    }

    /// Validate a `host:port` bind address
    pub fn validate_bind_address(address: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(address, field_name)?;
        match address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => match port.parse::<u16>() {
                Ok(0) => Err(crate::ConfigError::Validation(format!(
                    "{field_name}: port cannot be 0"
                ))),
                Ok(_) => Ok(()),
                Err(_) => Err(crate::ConfigError::Validation(format!(
                    "{field_name}: invalid port '{port}'"
                ))),
            },
            _ => Err(crate::ConfigError::Validation(format!(
                "{field_name} must be in host:port form"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(ValidationUtils::validate_not_empty("value", "field").is_ok());
        assert!(ValidationUtils::validate_not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_timeout_seconds() {
        assert!(ValidationUtils::validate_timeout_seconds(30, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(0, "t").is_err());
        assert!(ValidationUtils::validate_timeout_seconds(3601, "t").is_err());
    }

    #[test]
    fn test_validate_bind_address() {
        assert!(ValidationUtils::validate_bind_address("0.0.0.0:8080", "api.bind_address").is_ok());
        assert!(ValidationUtils::validate_bind_address("[::1]:3000", "api.bind_address").is_ok());
        assert!(ValidationUtils::validate_bind_address("localhost", "api.bind_address").is_err());
        assert!(ValidationUtils::validate_bind_address("localhost:0", "api.bind_address").is_err());
        assert!(ValidationUtils::validate_bind_address(":8080", "api.bind_address").is_err());
    }
}
