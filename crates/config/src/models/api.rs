use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub cors_enabled: bool,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub max_request_size_mb: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: 30,
            max_request_size_mb: 10,
        }
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_bind_address(&self.bind_address, "api.bind_address")?;
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "api.request_timeout_seconds",
        )?;

        if self.max_request_size_mb == 0 || self.max_request_size_mb > 100 {
            return Err(crate::ConfigError::Validation(
                "api.max_request_size_mb must be between 1 and 100".to_string(),
            ));
        }

        if self.cors_enabled && self.cors_origins.is_empty() {
            return Err(crate::ConfigError::Validation(
                "api.cors_origins cannot be empty when CORS is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
