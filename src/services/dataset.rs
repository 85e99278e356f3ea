//! Account dataset loading
//!
//! Accounts come from a CSV file with a header row matching the `Account`
//! field names, or from a built-in deterministic sample.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use std::fs::File;
use std::path::Path;

use crate::config::Config;
use crate::model::account::{Account, AccountStatus};

/// Size of the built-in sample
pub const SAMPLE_SIZE: usize = 47;

const COMPANIES: [&str; 16] = [
    "ACME Corp",
    "Globex",
    "Initech",
    "Umbrella",
    "Hooli",
    "Stark Industries",
    "Wayne Enterprises",
    "Wonka Industries",
    "Soylent",
    "Tyrell",
    "Cyberdyne",
    "Aperture Labs",
    "Vandelay Imports",
    "Dunder Mifflin",
    "Prestige Worldwide",
    "Oceanic Air",
];

const REGIONS: [&str; 3] = ["", "West", "Labs"];
const PLANS: [&str; 3] = ["free", "pro", "enterprise"];

/// Read accounts from the CSV file at `path`
pub fn load_csv(path: &Path) -> Result<Vec<Account>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open dataset {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut accounts = Vec::new();
    for (line, result) in reader.deserialize::<Account>().enumerate() {
        // Header is line 1
        let account = result.with_context(|| {
            format!("Invalid account on line {} of {}", line + 2, path.display())
        })?;
        accounts.push(account);
    }
    log::info!("loaded {} accounts from {}", accounts.len(), path.display());
    Ok(accounts)
}

/// Write `accounts` as CSV, header row included
pub fn save_csv(path: &Path, accounts: &[Account]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for account in accounts {
        writer.serialize(account)?;
    }
    writer.flush()?;
    Ok(())
}

/// The dataset named by the config, or the sample
pub fn load(config: &Config) -> Result<Vec<Account>> {
    match &config.dataset_path {
        Some(path) => load_csv(Path::new(path)),
        None => Ok(sample_accounts()),
    }
}

/// Deterministic sample of `SAMPLE_SIZE` accounts
pub fn sample_accounts() -> Vec<Account> {
    let epoch = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default();
    (0..SAMPLE_SIZE)
        .map(|i| {
            let company = COMPANIES[i % COMPANIES.len()];
            let region = REGIONS[(i / COMPANIES.len()) % REGIONS.len()];
            let name = if region.is_empty() {
                company.to_string()
            } else {
                format!("{} {}", company, region)
            };
            let slug: String = name
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            let status = match i % 7 {
                5 => AccountStatus::Suspended,
                6 => AccountStatus::Closed,
                _ => AccountStatus::Active,
            };

            Account {
                id: format!("acc-{:03}", i + 1),
                name,
                email: format!("billing@{}.test", slug),
                status,
                plan: PLANS[i % PLANS.len()].to_string(),
                created: epoch + Duration::days(i as i64 * 11),
                balance: ((i * 7919) % 100_000) as f64 / 100.0,
                reports: (i % 9) as u32,
                notes: (i % 5 == 0).then(|| format!("Onboarded by team {}", i % 4 + 1)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_is_deterministic_and_unique() {
        let a = sample_accounts();
        let b = sample_accounts();
        assert_eq!(a, b);
        assert_eq!(a.len(), SAMPLE_SIZE);

        let mut ids: Vec<&str> = a.iter().map(|acc| acc.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), SAMPLE_SIZE);
        assert!(a.iter().any(|acc| acc.status == AccountStatus::Suspended));
        assert!(a.iter().any(|acc| acc.status == AccountStatus::Closed));
    }

    #[test]
    fn test_csv_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.csv");
        let accounts: Vec<Account> = sample_accounts().into_iter().take(5).collect();

        save_csv(&path, &accounts).unwrap();
        assert_eq!(load_csv(&path).unwrap(), accounts);
    }

    #[test]
    fn test_csv_without_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.csv");
        std::fs::write(
            &path,
            "id,name,email,status,plan,created,balance\n\
             a1,Globex,ap@globex.test,SUSPENDED,pro,2024-02-29,10.5\n",
        )
        .unwrap();

        let accounts = load_csv(&path).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].status, AccountStatus::Suspended);
        assert_eq!(accounts[0].reports, 0);
        assert_eq!(accounts[0].notes, None);
    }

    #[test]
    fn test_bad_row_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.csv");
        std::fs::write(
            &path,
            "id,name,email,status,plan,created,balance\n\
             a1,Globex,ap@globex.test,ACTIVE,pro,2024-02-29,10.5\n\
             a2,Initech,ap@initech.test,PAUSED,pro,2024-03-01,1\n",
        )
        .unwrap();

        let err = load_csv(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }
}
