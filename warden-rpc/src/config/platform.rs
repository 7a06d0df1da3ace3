use rst_common::standard::serde::{self, Deserialize};

use prople_warden_core::identity::types::Context;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Platform {
    pub(super) base_bpn: String,
    pub(super) base_name: String,
    pub(super) status_list_base_url: String,
    pub(super) membership_organization: String,
    pub(super) credential_validity_days: i64,
    pub(super) workers: usize,
}

impl Platform {
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// `to_context` turns the platform section into the settings threaded through the
    /// core usecases
    pub fn to_context(&self) -> Context {
        Context::new(
            self.base_bpn.to_owned(),
            self.base_name.to_owned(),
            self.status_list_base_url.trim_end_matches('/').to_string(),
            self.membership_organization.to_owned(),
            self.credential_validity_days,
        )
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            base_bpn: "".to_string(),
            base_name: "".to_string(),
            status_list_base_url: "".to_string(),
            membership_organization: "".to_string(),
            credential_validity_days: 365,
            workers: 8,
        }
    }
}

impl ToValidate for Platform {
    fn validate(&self) -> Result<(), CommonError> {
        if self.base_bpn.is_empty() {
            return Err(CommonError::ValidationError(
                "config: platform:base_bpn is missing".to_string(),
            ));
        }

        if self.base_name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: platform:base_name is missing".to_string(),
            ));
        }

        if !self.status_list_base_url.starts_with("http://")
            && !self.status_list_base_url.starts_with("https://")
        {
            return Err(CommonError::ValidationError(
                "config: platform:status_list_base_url must be an http(s) url".to_string(),
            ));
        }

        if self.membership_organization.is_empty() {
            return Err(CommonError::ValidationError(
                "config: platform:membership_organization is missing".to_string(),
            ));
        }

        if self.credential_validity_days < 0 {
            return Err(CommonError::ValidationError(
                "config: platform:credential_validity_days must not be negative".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(CommonError::ValidationError(
                "config: platform:workers must be positive".to_string(),
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
    fn test_parse_platform_config() -> Result<(), ConfigError> {
        let config_toml: Result<Platform, ConfigError> =
            Builder::new(from_file(testdb::fixture_path("config_platform.toml")))
                .fetch()?
                .parse(use_toml);

        let platform = config_toml.unwrap();
        assert_eq!(platform.workers(), 4);

        let ctx = platform.to_context();
        assert_eq!(ctx.base_bpn(), "BPNL000000000000");
        assert_eq!(ctx.membership_organization(), "Catena-X");
        assert_eq!(
            ctx.status_list_url("BPNL000000000000"),
            "https://warden.example/status/BPNL000000000000"
        );
        Ok(())
    }

    #[test]
    fn test_validation_failed() {
        let validation = helpers::validate(Platform::default());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("platform:base_bpn"));

        let platform = Platform {
            base_bpn: "BPNL000000000000".to_string(),
            base_name: "Operator".to_string(),
            status_list_base_url: "ftp://status".to_string(),
            ..Platform::default()
        };
        let validation = helpers::validate(platform);
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("platform:status_list_base_url"));
    }
}
