//! Commission settings.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COMMISSION_RATE, DEFAULT_CURRENCY_SYMBOL, DEFAULT_SPLIT_PERCENTAGE, DEFAULT_TC_FEE,
    DEFAULT_TRANSACTION_FEE,
};
use crate::errors::{Error, Result};
use crate::financials::{DisplayOptions, FinancialDefaults};

pub const SETTING_DEFAULT_COMMISSION_RATE: &str = "default_commission_rate";
pub const SETTING_DEFAULT_SPLIT_PERCENTAGE: &str = "default_split_percentage";
pub const SETTING_DEFAULT_TRANSACTION_FEE: &str = "default_transaction_fee";
pub const SETTING_DEFAULT_TC_FEE: &str = "default_tc_fee";
pub const SETTING_CURRENCY_SYMBOL: &str = "currency_symbol";
pub const SETTING_MASK_COMMISSIONS: &str = "mask_commissions";

/// Configurable defaults and display preferences for the commission engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSettings {
    pub default_commission_rate: Decimal,
    pub default_split_percentage: Decimal,
    pub default_transaction_fee: Decimal,
    pub default_tc_fee: Decimal,
    pub currency_symbol: String,
    pub mask_commissions: bool,
}

impl Default for CommissionSettings {
    fn default() -> Self {
        Self {
            default_commission_rate: DEFAULT_COMMISSION_RATE,
            default_split_percentage: DEFAULT_SPLIT_PERCENTAGE,
            default_transaction_fee: DEFAULT_TRANSACTION_FEE,
            default_tc_fee: DEFAULT_TC_FEE,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            mask_commissions: false,
        }
    }
}

impl CommissionSettings {
    /// Builds settings from stored key/value pairs.
    ///
    /// Unknown keys are ignored; malformed values are reported.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let mut settings = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                SETTING_DEFAULT_COMMISSION_RATE => {
                    settings.default_commission_rate = parse_decimal(key, value)?
                }
                SETTING_DEFAULT_SPLIT_PERCENTAGE => {
                    settings.default_split_percentage = parse_decimal(key, value)?
                }
                SETTING_DEFAULT_TRANSACTION_FEE => {
                    settings.default_transaction_fee = parse_decimal(key, value)?
                }
                SETTING_DEFAULT_TC_FEE => settings.default_tc_fee = parse_decimal(key, value)?,
                SETTING_CURRENCY_SYMBOL => settings.currency_symbol = value.clone(),
                SETTING_MASK_COMMISSIONS => settings.mask_commissions = value.parse().unwrap_or(false),
                _ => {}
            }
        }
        Ok(settings)
    }

    pub fn financial_defaults(&self) -> FinancialDefaults {
        FinancialDefaults {
            commission_rate: self.default_commission_rate,
            split_percentage: self.default_split_percentage,
            transaction_fee: self.default_transaction_fee,
            tc_fee: self.default_tc_fee,
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            currency_symbol: self.currency_symbol.clone(),
            mask_commissions: self.mask_commissions,
        }
    }
}

/// Partial update of commission settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSettingsUpdate {
    pub default_commission_rate: Option<Decimal>,
    pub default_split_percentage: Option<Decimal>,
    pub default_transaction_fee: Option<Decimal>,
    pub default_tc_fee: Option<Decimal>,
    pub currency_symbol: Option<String>,
    pub mask_commissions: Option<bool>,
}

impl CommissionSettingsUpdate {
    /// Key/value pairs for the fields that are set.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        };
        push(
            SETTING_DEFAULT_COMMISSION_RATE,
            self.default_commission_rate.map(|d| d.to_string()),
        );
        push(
            SETTING_DEFAULT_SPLIT_PERCENTAGE,
            self.default_split_percentage.map(|d| d.to_string()),
        );
        push(
            SETTING_DEFAULT_TRANSACTION_FEE,
            self.default_transaction_fee.map(|d| d.to_string()),
        );
        push(SETTING_DEFAULT_TC_FEE, self.default_tc_fee.map(|d| d.to_string()));
        push(SETTING_CURRENCY_SYMBOL, self.currency_symbol.clone());
        push(
            SETTING_MASK_COMMISSIONS,
            self.mask_commissions.map(|b| b.to_string()),
        );
        pairs
    }
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|_| Error::InvalidConfigValue(format!("{} = '{}'", key, value)))
}
