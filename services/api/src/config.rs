use std::net::SocketAddr;
use std::path::PathBuf;
use techsupport_core::directory::SpecialistDirectory;
use techsupport_core::ticket::DEFAULT_TICKET_BASE;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Path prefix the agent is served under, e.g. `/support`.
    pub route: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub ticket_counter_start: u64,
    pub specialists: SpecialistDirectory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            route: "/support".to_string(),
            log_level: Level::INFO,
            prompts_path: PathBuf::from("./prompts"),
            ticket_counter_start: DEFAULT_TICKET_BASE,
            specialists: SpecialistDirectory::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(value) => value.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let route = std::env::var("AGENT_ROUTE").unwrap_or(defaults.route);
        if !route.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "AGENT_ROUTE".to_string(),
                format!("'{}' must start with '/'", route),
            ));
        }
        let route = match route.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.prompts_path);

        let ticket_counter_start = match std::env::var("TICKET_COUNTER_START") {
            Ok(value) => value.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("TICKET_COUNTER_START".to_string(), e.to_string())
            })?,
            Err(_) => defaults.ticket_counter_start,
        };

        let specialists = SpecialistDirectory {
            billing: specialist_number("SPECIALIST_BILLING", defaults.specialists.billing)?,
            technical: specialist_number("SPECIALIST_TECHNICAL", defaults.specialists.technical)?,
            account: specialist_number("SPECIALIST_ACCOUNT", defaults.specialists.account)?,
        };

        Ok(Self {
            bind_address,
            route,
            log_level,
            prompts_path,
            ticket_counter_start,
            specialists,
        })
    }
}

/// Reads a specialist contact number, which must look like an E.164 number.
fn specialist_number(var: &str, default: String) -> Result<String, ConfigError> {
    let Ok(value) = std::env::var(var) else {
        return Ok(default);
    };
    let value = value.trim().to_string();
    let valid = value.len() > 1
        && value.starts_with('+')
        && value[1..].chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("'{}' is not an E.164 phone number", value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("AGENT_ROUTE");
            env::remove_var("RUST_LOG");
            env::remove_var("PROMPTS_PATH");
            env::remove_var("TICKET_COUNTER_START");
            env::remove_var("SPECIALIST_BILLING");
            env::remove_var("SPECIALIST_TECHNICAL");
            env::remove_var("SPECIALIST_ACCOUNT");
        }
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.route, "/support");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.prompts_path, PathBuf::from("./prompts"));
        assert_eq!(config.ticket_counter_start, 1000);
        assert_eq!(config.specialists, SpecialistDirectory::default());
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("AGENT_ROUTE", "/helpdesk/");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
            env::set_var("TICKET_COUNTER_START", "5000");
            env::set_var("SPECIALIST_BILLING", "+15559998888");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.route, "/helpdesk");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, PathBuf::from("/custom/prompts"));
        assert_eq!(config.ticket_counter_start, 5000);
        assert_eq!(config.specialists.billing, "+15559998888");
        assert_eq!(config.specialists.technical, "+15552222222");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "BIND_ADDRESS");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "RUST_LOG");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_route() {
        clear_env_vars();
        unsafe {
            env::set_var("AGENT_ROUTE", "support");
        }

        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "AGENT_ROUTE");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_ticket_counter_and_specialist() {
        clear_env_vars();
        unsafe {
            env::set_var("TICKET_COUNTER_START", "-1");
        }
        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "TICKET_COUNTER_START");

        clear_env_vars();
        unsafe {
            env::set_var("SPECIALIST_ACCOUNT", "call bob");
        }
        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "SPECIALIST_ACCOUNT");
        clear_env_vars();
    }
}
