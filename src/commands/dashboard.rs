use serde::Deserialize;
use std::collections::BTreeSet;

use crate::models::{DashboardStats, FilterOptions, FilterSelection};
use crate::services::state::AppState;

/// Filter widgets' state. `None` means "whatever the widget offers by
/// default", i.e. the first year and every month and company in it.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub year: Option<i32>,
    pub months: Option<Vec<u32>>,
    pub companies: Option<Vec<String>>,
}

pub fn get_dashboard_stats(query: DashboardQuery, state: &AppState) -> Result<DashboardStats, String> {
    state.reload().map_err(|e| e.to_string())?;
    let selection = resolve_selection(query, state)?;
    state.dashboard(&selection).map_err(|e| e.to_string())
}

pub fn get_filter_options(
    year: Option<i32>,
    months: Option<Vec<u32>>,
    state: &AppState,
) -> Result<FilterOptions, String> {
    state.reload().map_err(|e| e.to_string())?;
    let months: Option<BTreeSet<u32>> = months.map(|m| m.into_iter().collect());
    state
        .filter_options(year, months.as_ref())
        .map_err(|e| e.to_string())
}

fn resolve_selection(query: DashboardQuery, state: &AppState) -> Result<FilterSelection, String> {
    let years = state
        .filter_options(None, None)
        .map_err(|e| e.to_string())?
        .years;
    let year = match query.year {
        Some(year) => year,
        None => years
            .first()
            .copied()
            .ok_or_else(|| "No fiscal years available".to_string())?,
    };

    let months: BTreeSet<u32> = match query.months {
        Some(months) => months.into_iter().collect(),
        None => state
            .filter_options(Some(year), None)
            .map_err(|e| e.to_string())?
            .months
            .into_iter()
            .collect(),
    };

    let companies: BTreeSet<String> = match query.companies {
        Some(companies) => companies.into_iter().collect(),
        None => state
            .filter_options(Some(year), Some(&months))
            .map_err(|e| e.to_string())?
            .companies
            .into_iter()
            .collect(),
    };

    Ok(FilterSelection {
        year,
        months,
        companies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::NaiveDate;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn state_with_ledger(dir: &TempDir, rows: &str) -> AppState {
        let invoice_file = dir.path().join("invoices.csv");
        fs::write(
            &invoice_file,
            format!("company,amount,datetime,entered_by\n{}", rows),
        )
        .unwrap();
        let config = AppConfig {
            invoice_file,
            settings_file: dir.path().join("settings.json"),
            credentials_file: dir.path().join("users.csv"),
            credentials_ttl: Duration::from_secs(60),
            today: NaiveDate::from_ymd_opt(2025, 1, 15),
        };
        AppState::new(&config).unwrap()
    }

    #[test]
    fn defaults_select_first_year_everything() {
        let dir = TempDir::new().unwrap();
        let state = state_with_ledger(
            &dir,
            "Acme,100,2024-05-01 00:00:00,a\nGlobex,200,2024-06-01 00:00:00,a\nAcme,400,2025-01-01 00:00:00,a\n",
        );
        let stats = get_dashboard_stats(DashboardQuery::default(), &state).unwrap();
        assert_eq!(stats.selection.year, 2024);
        assert_eq!(stats.selection.months.len(), 2);
        assert_eq!(stats.filtered_invoices, 2);
        assert_eq!(stats.achieved_total, 700.0);
        assert_eq!(stats.revenue_over_time.len(), 2);
    }

    #[test]
    fn explicit_empty_months_show_nothing() {
        let dir = TempDir::new().unwrap();
        let state = state_with_ledger(&dir, "Acme,100,2024-05-01 00:00:00,a\n");
        let query = DashboardQuery {
            year: Some(2024),
            months: Some(vec![]),
            companies: None,
        };
        let stats = get_dashboard_stats(query, &state).unwrap();
        assert_eq!(stats.filtered_invoices, 0);
        assert!(stats.monthly_breakdown.is_empty());
        assert_eq!(stats.achieved_total, 100.0);
    }

    #[test]
    fn options_follow_year() {
        let dir = TempDir::new().unwrap();
        let state = state_with_ledger(
            &dir,
            "Acme,100,2024-05-01 00:00:00,a\nGlobex,400,2025-01-01 00:00:00,a\n",
        );
        let options = get_filter_options(Some(2025), None, &state).unwrap();
        assert_eq!(options.years, vec![2024, 2025]);
        assert_eq!(options.months, vec![1]);
        assert_eq!(options.companies, vec!["Globex"]);
    }
}
