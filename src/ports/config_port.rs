//! Configuration access port trait.

use crate::domain::error::NlmaError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Like `get_string`, but a missing or blank value is an error.
    fn require_string(&self, section: &str, key: &str) -> Result<String, NlmaError> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| NlmaError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
