use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

/// `Scheduler` drives the periodic jobs of the daemon. Every interval is in seconds
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde", default)]
pub struct Scheduler {
    pub(super) status_list_interval_secs: u64,
    pub(super) bpdm_pull_interval_secs: u64,
    pub(super) callback_purge_interval_secs: u64,
    pub(super) callback_retention_secs: i64,
}

impl Scheduler {
    pub fn status_list_interval(&self) -> Duration {
        Duration::from_secs(self.status_list_interval_secs)
    }

    pub fn bpdm_pull_interval(&self) -> Duration {
        Duration::from_secs(self.bpdm_pull_interval_secs)
    }

    pub fn callback_purge_interval(&self) -> Duration {
        Duration::from_secs(self.callback_purge_interval_secs)
    }

    pub fn callback_retention_secs(&self) -> i64 {
        self.callback_retention_secs
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            status_list_interval_secs: 300,
            bpdm_pull_interval_secs: 3600,
            callback_purge_interval_secs: 3600,
            callback_retention_secs: 86400,
        }
    }
}

impl ToValidate for Scheduler {
    fn validate(&self) -> Result<(), CommonError> {
        let intervals = [
            ("status_list_interval_secs", self.status_list_interval_secs),
            ("bpdm_pull_interval_secs", self.bpdm_pull_interval_secs),
            ("callback_purge_interval_secs", self.callback_purge_interval_secs),
        ];

        for (name, secs) in intervals {
            if secs == 0 {
                return Err(CommonError::ValidationError(format!(
                    "config: scheduler:{name} must be positive"
                )));
            }
        }

        if self.callback_retention_secs < 0 {
            return Err(CommonError::ValidationError(
                "config: scheduler:callback_retention_secs must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers;

    #[test]
    fn test_zero_interval_rejected() {
        let scheduler = Scheduler {
            bpdm_pull_interval_secs: 0,
            ..Scheduler::default()
        };

        let validation = helpers::validate(scheduler);
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("scheduler:bpdm_pull_interval_secs"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let scheduler: Scheduler = toml::from_str(
            r#"
            bpdm_pull_interval_secs = 60
            callback_retention_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(scheduler.bpdm_pull_interval(), Duration::from_secs(60));
        assert_eq!(scheduler.callback_retention_secs(), 600);
        assert_eq!(scheduler.status_list_interval(), Duration::from_secs(300));
        assert_eq!(scheduler.callback_purge_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_default_is_valid() {
        let scheduler = Scheduler::default();
        assert_eq!(scheduler.status_list_interval(), Duration::from_secs(300));
        assert!(helpers::validate(scheduler).is_ok());
    }
}
