use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Bpdm {
    pub(super) base_url: String,
}

impl Bpdm {
    pub fn base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

impl ToValidate for Bpdm {
    fn validate(&self) -> Result<(), CommonError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CommonError::ValidationError(
                "config: bpdm:base_url must be an http(s) url".to_string(),
            ));
        }

        Ok(())
    }
}
