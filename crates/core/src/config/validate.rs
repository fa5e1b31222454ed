use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Unit price is positive
/// - Placeholder name is not blank
/// - At least one payment method, none blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.sales.unit_price <= 0 {
        return Err(ConfigError::ValidationError(
            "sales.unit_price must be positive".to_string(),
        ));
    }

    if config.sales.placeholder_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "sales.placeholder_name cannot be blank".to_string(),
        ));
    }

    if config.sales.payment_methods.is_empty() {
        return Err(ConfigError::ValidationError(
            "sales.payment_methods cannot be empty".to_string(),
        ));
    }

    if config
        .sales
        .payment_methods
        .iter()
        .any(|m| m.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "sales.payment_methods cannot contain blank labels".to_string(),
        ));
    }

    Ok(())
}
