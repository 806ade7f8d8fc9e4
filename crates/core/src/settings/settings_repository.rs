//! Repository traits for settings.

use async_trait::async_trait;

use crate::errors::Result;

/// Key/value store for application settings.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Get all stored settings as `(key, value)` pairs.
    fn get_all_settings(&self) -> Result<Vec<(String, String)>>;

    /// Get a single setting value by key.
    ///
    /// Returns `DatabaseError::NotFound` when the key is absent.
    fn get_setting(&self, setting_key: &str) -> Result<String>;

    /// Insert or replace a single setting.
    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()>;

    /// Insert or replace several settings in one write.
    async fn update_settings(&self, settings: Vec<(String, String)>) -> Result<()>;
}
