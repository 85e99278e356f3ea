//! Account queries
//!
//! Filters, sort and pagination all live in the `Location`, so a query is
//! fully described by it and the same location always yields the same page.

use chrono::NaiveDate;

use crate::model::account::{Account, AccountStatus};
use crate::model::filter::{range_from_key, range_to_key, FilterValues};
use crate::model::pagination::{Location, PaginationSnapshot};
use crate::model::sort::{sorted_indices, SortDirection, SortState};

pub const SEARCH_KEY: &str = "q";
pub const STATUS_KEY: &str = "status";
pub const PLAN_KEY: &str = "plan";
pub const CREATED_KEY: &str = "created";
const SORT_KEY: &str = "sort";
const DIR_KEY: &str = "dir";

/// Every filter value key mirrored into the location
pub fn filter_keys() -> Vec<String> {
    vec![
        SEARCH_KEY.to_string(),
        STATUS_KEY.to_string(),
        PLAN_KEY.to_string(),
        range_from_key(CREATED_KEY),
        range_to_key(CREATED_KEY),
    ]
}

/// Committed filter values read back from a location
pub fn filter_values(location: &Location) -> FilterValues {
    filter_keys()
        .into_iter()
        .filter_map(|key| location.param(&key).map(|v| (key.clone(), v.to_string())))
        .collect()
}

/// `location` with `values` written into it, back on page 1
pub fn with_filters(location: &Location, values: &FilterValues) -> Location {
    let mut next = location.clone();
    for key in filter_keys() {
        next.set_param(&key, values.get(&key));
    }
    next.with_page(1)
}

pub fn sort_of(location: &Location) -> Option<SortState> {
    let key = location.param(SORT_KEY).filter(|k| !k.is_empty())?;
    let direction = location
        .param(DIR_KEY)
        .and_then(SortDirection::parse)
        .unwrap_or(SortDirection::Asc);
    Some(SortState::new(key, direction))
}

/// `location` sorted by `sort`, back on page 1
pub fn with_sort(location: &Location, sort: Option<&SortState>) -> Location {
    let (key, dir) = match sort {
        Some(sort) => (sort.key.as_str(), sort.direction.as_str()),
        None => ("", ""),
    };
    location
        .clone()
        .with_param(SORT_KEY, key)
        .with_param(DIR_KEY, dir)
        .with_page(1)
}

/// One page of matching accounts
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Account>,
    pub pagination: PaginationSnapshot,
}

/// Parsed form of a location
#[derive(Debug, Clone, PartialEq)]
pub struct AccountQuery {
    pub search: String,
    pub status: Option<AccountStatus>,
    pub plan: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub sort: Option<SortState>,
    pub page: usize,
    pub limit: usize,
}

impl AccountQuery {
    /// Unknown statuses and malformed dates are ignored rather than rejected
    pub fn from_location(location: &Location, default_limit: usize) -> Self {
        let date = |key: String| {
            location
                .param(&key)
                .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        };
        Self {
            search: location.param(SEARCH_KEY).unwrap_or_default().trim().to_string(),
            status: location.param(STATUS_KEY).and_then(|v| {
                AccountStatus::all()
                    .into_iter()
                    .find(|s| s.as_str().eq_ignore_ascii_case(v))
            }),
            plan: location
                .param(PLAN_KEY)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            created_from: date(range_from_key(CREATED_KEY)),
            created_to: date(range_to_key(CREATED_KEY)),
            sort: sort_of(location),
            page: location.page(),
            limit: location.limit(default_limit),
        }
    }

    fn matches(&self, account: &Account) -> bool {
        (self.search.is_empty() || account.matches_search(&self.search))
            && self.status.map_or(true, |s| account.status == s)
            && self.plan.as_ref().map_or(true, |p| account.plan == *p)
            && self.created_from.map_or(true, |d| account.created >= d)
            && self.created_to.map_or(true, |d| account.created <= d)
    }

    /// Filter, sort and slice `accounts`
    pub fn run(&self, accounts: &[Account]) -> QueryResult {
        let matching: Vec<&Account> = accounts.iter().filter(|a| self.matches(a)).collect();
        let order = sorted_indices(&matching, self.sort.as_ref());
        let pagination = PaginationSnapshot::new(self.page, self.limit, matching.len());
        let rows = order[pagination.offset_range()]
            .iter()
            .map(|&i| matching[i].clone())
            .collect();
        QueryResult { rows, pagination }
    }
}
