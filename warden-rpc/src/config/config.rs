use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{Agent, App, Bpdm, Database, Platform, Scheduler};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) app: App,
    pub(super) database: Database,
    pub(super) agent: Agent,
    pub(super) platform: Platform,
    pub(super) bpdm: Bpdm,

    #[serde(default)]
    pub(super) scheduler: Scheduler,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn db(&self) -> &Database {
        &self.database
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn bpdm(&self) -> &Bpdm {
        &self.bpdm
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        self.app.validate()?;
        self.database.validate()?;
        self.agent.validate()?;
        self.platform.validate()?;
        self.bpdm.validate()?;
        self.scheduler.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers;

    #[test]
    fn test_validation_failed() {
        let validation = helpers::validate(Config::new());
        assert!(matches!(
            validation.unwrap_err(),
            CommonError::ValidationError(_)
        ))
    }
}
