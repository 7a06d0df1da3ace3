use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct App {
    pub(super) host: String,
    pub(super) port: String,
}

impl App {
    pub fn get_app_config(&self) -> (String, String) {
        (self.host.to_owned(), self.port.to_owned())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
        }
    }
}

impl ToValidate for App {
    fn validate(&self) -> Result<(), CommonError> {
        if self.host.is_empty() {
            return Err(CommonError::ValidationError(
                "config: app:host is missing".to_string(),
            ));
        }

        if self.port.parse::<u16>().is_err() {
            return Err(CommonError::ValidationError(format!(
                "config: app:port is not a valid port: {}",
                self.port
            )));
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
    use table_test::table_test;

    #[test]
    fn test_parse_app_config() -> Result<(), ConfigError> {
        let config_toml: Result<App, ConfigError> =
            Builder::new(from_file(testdb::fixture_path("config_app.toml")))
                .fetch()?
                .parse(use_toml);

        assert!(!config_toml.is_err());

        let config_app = config_toml.unwrap();
        assert_eq!(config_app.host, "localhost".to_string());
        assert_eq!(config_app.port, "8181".to_string());
        assert_eq!(config_app.listen_addr(), "localhost:8181".to_string());
        Ok(())
    }

    #[test]
    fn test_validation() {
        let table = vec![
            (("localhost", "http"), Some("app:port")),
            (("localhost", "70000"), Some("app:port")),
            (("", "8181"), Some("app:host")),
            (("localhost", "8181"), None),
        ];

        for (validator, (host, port), expected) in table_test!(table) {
            let app = App {
                host: host.to_string(),
                port: port.to_string(),
            };

            let failure = helpers::validate(app)
                .err()
                .map(|err| err.to_string())
                .and_then(|msg| expected.filter(|field| msg.contains(field)));

            validator
                .given(&format!("{}:{}", host, port))
                .when("validate app config")
                .then("report the offending field")
                .assert_eq(expected, failure);
        }
    }
}
