use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `Agent` locates the identity agent admin API
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Agent {
    pub(super) base_url: String,
    pub(super) api_key: String,

    #[serde(default = "default_timeout")]
    pub(super) timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Agent {
    pub fn base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    pub fn api_key(&self) -> String {
        self.api_key.to_owned()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            base_url: "".to_string(),
            api_key: "".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ToValidate for Agent {
    fn validate(&self) -> Result<(), CommonError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CommonError::ValidationError(
                "config: agent:base_url must be an http(s) url".to_string(),
            ));
        }

        if self.api_key.is_empty() {
            return Err(CommonError::ValidationError(
                "config: agent:api_key is missing".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: agent:timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};

    use crate::common::helpers::{self, testdb};

    #[test]
    fn test_parse_agent_config() -> Result<(), ConfigError> {
        let config_toml: Result<Agent, ConfigError> =
            Builder::new(from_file(testdb::fixture_path("config_agent.toml")))
                .fetch()?
                .parse(use_toml);

        let agent = config_toml.unwrap();
        assert_eq!(agent.base_url(), "http://localhost:8031");
        assert_eq!(agent.api_key(), "agent-admin-key");
        assert_eq!(agent.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert!(helpers::validate(agent).is_ok());
        Ok(())
    }

    #[test]
    fn test_validation_failed() {
        let validation = helpers::validate(Agent::default());
        assert!(validation.unwrap_err().to_string().contains("agent:base_url"));

        let agent = Agent {
            base_url: "http://localhost:8031".to_string(),
            ..Agent::default()
        };
        let validation = helpers::validate(agent);
        assert!(validation.unwrap_err().to_string().contains("agent:api_key"));
    }
}
