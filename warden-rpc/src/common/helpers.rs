use super::types::{CommonError, ToValidate};

pub fn validate(validator: impl ToValidate) -> Result<(), CommonError> {
    validator.validate()
}

/// `build_key` joins an entity prefix and a value into a storage key
pub fn build_key(prefix: &str, val: &str) -> String {
    format!("{}:{}", prefix, val)
}
