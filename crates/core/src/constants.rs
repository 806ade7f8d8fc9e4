use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for currency amounts (cents)
pub const CURRENCY_DECIMAL_PRECISION: u32 = 2;

/// Decimal precision kept for percentage inputs
pub const PERCENT_DECIMAL_PRECISION: u32 = 4;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Largest amount accepted from a currency input
pub const MAX_CURRENCY_AMOUNT: Decimal = dec!(999999999.99);

/// Upper bound for percentage fields
pub const MAX_PERCENTAGE: Decimal = dec!(100);

/// Group key under which financial fields are persisted
pub const FINANCIALS_PATH_PREFIX: &str = "financials";

/// Default commission rate (percent of purchase price)
pub const DEFAULT_COMMISSION_RATE: Decimal = dec!(2.5);

/// Default agent split percentage
pub const DEFAULT_SPLIT_PERCENTAGE: Decimal = dec!(75);

/// Split used when no split rule matches the agent's YTD GCI
pub const FALLBACK_SPLIT_PERCENTAGE: Decimal = dec!(70);

/// Default flat transaction fee charged to the agent
pub const DEFAULT_TRANSACTION_FEE: Decimal = dec!(285);

/// Default flat transaction coordinator fee
pub const DEFAULT_TC_FEE: Decimal = dec!(250);

/// Default currency symbol used for display
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// YTD GCI at which an agent leaves the pre-cap tier
pub const MID_TIER_GCI_THRESHOLD: Decimal = dec!(50000);

/// YTD GCI at which an agent is considered capped
pub const POST_CAP_GCI_THRESHOLD: Decimal = dec!(100000);

/// Lead source used by split rules that apply to every lead
pub const DEFAULT_LEAD_SOURCE: &str = "default";
