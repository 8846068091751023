//! Accounts and trips used to fill the row selectors.

use api_types::{account::Account, trip::Trip};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Directory {
    accounts: Vec<Account>,
    trips: Vec<Trip>,
}

impl Directory {
    pub fn new(accounts: Vec<Account>, trips: Vec<Trip>) -> Self {
        Self { accounts, trips }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn account(&self, account_id: i64) -> Option<&Account> {
        self.accounts.iter().find(|a| a.account_id == account_id)
    }

    /// `"<name> (<institution>)"`, or `"Unknown"` for unset/unknown ids.
    pub fn account_label(&self, account_id: Option<i64>) -> String {
        account_id
            .and_then(|id| self.account(id))
            .map(|a| format!("{} ({})", a.account_name, a.institution))
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn trip_label(&self, trip_id: Option<i64>) -> String {
        trip_id
            .and_then(|id| self.trips.iter().find(|t| t.trip_id == id))
            .map(|t| t.trip_name.clone())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Accounts a transfer from `source` may go to.
    pub fn transfer_targets(&self, source: Option<i64>) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|a| Some(a.account_id) != source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        let account = |id, name: &str, institution: &str| Account {
            account_id: id,
            account_name: name.to_string(),
            account_type: "current".to_string(),
            institution: institution.to_string(),
            currency_code: "GBP".to_string(),
        };
        Directory::new(
            vec![account(1, "Main", "Monzo"), account(2, "Savings", "Revolut")],
            vec![Trip {
                trip_id: 4,
                trip_name: "Lisbon".to_string(),
                start_date: None,
                end_date: None,
                location: None,
                description: None,
            }],
        )
    }

    #[test]
    fn labels() {
        let directory = directory();
        assert_eq!(directory.account_label(Some(2)), "Savings (Revolut)");
        assert_eq!(directory.account_label(Some(9)), "Unknown");
        assert_eq!(directory.account_label(None), "Unknown");
        assert_eq!(directory.trip_label(Some(4)), "Lisbon");
        assert_eq!(directory.trip_label(None), "-");
    }

    #[test]
    fn transfer_targets_skip_source() {
        let directory = directory();
        let targets: Vec<i64> = directory
            .transfer_targets(Some(1))
            .into_iter()
            .map(|a| a.account_id)
            .collect();
        assert_eq!(targets, vec![2]);
        assert_eq!(directory.transfer_targets(None).len(), 2);
    }
}
