//! Database model for application settings.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One `app_settings` key/value row.
#[derive(Queryable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::app_settings)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingDB {
    pub setting_key: String,
    pub setting_value: String,
}

impl From<(String, String)> for AppSettingDB {
    fn from((setting_key, setting_value): (String, String)) -> Self {
        Self {
            setting_key,
            setting_value,
        }
    }
}
