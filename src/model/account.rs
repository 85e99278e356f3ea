//! Account record browsed by the demo screen

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::Closed => "CLOSED",
        }
    }

    pub fn all() -> [AccountStatus; 3] {
        [
            AccountStatus::Active,
            AccountStatus::Suspended,
            AccountStatus::Closed,
        ]
    }
}

/// One customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: AccountStatus,
    pub plan: String,
    pub created: NaiveDate,
    pub balance: f64,
    /// Reports pulled for this account
    #[serde(default)]
    pub reports: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Account {
    /// Text the search box matches against
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.email.to_lowercase().contains(&query)
            || self.id.to_lowercase().contains(&query)
    }

    pub fn status_icon(&self) -> &'static str {
        match self.status {
            AccountStatus::Active => "●",
            AccountStatus::Suspended => "◐",
            AccountStatus::Closed => "○",
        }
    }
}
