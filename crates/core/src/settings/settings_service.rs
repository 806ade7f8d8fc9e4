use super::SettingsRepositoryTrait;
use crate::constants::{MAX_CURRENCY_AMOUNT, MAX_PERCENTAGE};
use crate::errors::{DatabaseError, Error, Result, ValidationError};
use crate::settings::{CommissionSettings, CommissionSettingsUpdate};
use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    /// Current commission settings. Missing keys fall back to defaults.
    fn get_commission_settings(&self) -> Result<CommissionSettings>;

    async fn update_commission_settings(&self, update: &CommissionSettingsUpdate) -> Result<()>;

    /// Get a single setting value by key. Returns None if not found.
    fn get_setting_value(&self, key: &str) -> Result<Option<String>>;

    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()>;
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_commission_settings(&self) -> Result<CommissionSettings> {
        let pairs = self.settings_repository.get_all_settings()?;
        match CommissionSettings::from_pairs(&pairs) {
            Ok(settings) => Ok(settings),
            Err(Error::InvalidConfigValue(detail)) => {
                warn!(
                    "Ignoring malformed commission setting ({}), using defaults",
                    detail
                );
                Ok(CommissionSettings::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn update_commission_settings(&self, update: &CommissionSettingsUpdate) -> Result<()> {
        validate_update(update)?;
        let pairs = update.to_pairs();
        if pairs.is_empty() {
            return Ok(());
        }
        debug!("Updating {} commission settings", pairs.len());
        self.settings_repository.update_settings(pairs).await
    }

    fn get_setting_value(&self, key: &str) -> Result<Option<String>> {
        match self.settings_repository.get_setting(key) {
            Ok(value) => Ok(Some(value)),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()> {
        self.settings_repository.update_setting(key, value).await
    }
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        SettingsService {
            settings_repository,
        }
    }
}

fn validate_update(update: &CommissionSettingsUpdate) -> Result<()> {
    let percentages = [
        ("defaultCommissionRate", update.default_commission_rate),
        ("defaultSplitPercentage", update.default_split_percentage),
    ];
    for (name, value) in percentages {
        if let Some(value) = value {
            if value < Decimal::ZERO || value > MAX_PERCENTAGE {
                return Err(ValidationError::InvalidInput(format!(
                    "{} must be between 0 and 100",
                    name
                ))
                .into());
            }
        }
    }

    let amounts = [
        ("defaultTransactionFee", update.default_transaction_fee),
        ("defaultTcFee", update.default_tc_fee),
    ];
    for (name, value) in amounts {
        if let Some(value) = value {
            if value < Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "{} cannot be negative",
                    name
                ))
                .into());
            }
            if value > MAX_CURRENCY_AMOUNT {
                return Err(ValidationError::InvalidInput(format!(
                    "{} exceeds the maximum amount",
                    name
                ))
                .into());
            }
        }
    }

    if let Some(symbol) = &update.currency_symbol {
        if symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("currencySymbol".to_string()).into());
        }
    }
    Ok(())
}
