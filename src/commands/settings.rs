use serde::Deserialize;

use crate::models::{ActionOutcome, QuarterTargets, Settings};
use crate::services::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnnualTargetPayload {
    pub annual_target: f64,
}

pub fn get_settings(state: &AppState) -> Result<Settings, String> {
    state.reload().map_err(|e| e.to_string())?;
    state.settings().map_err(|e| e.to_string())
}

pub fn save_annual_target(payload: AnnualTargetPayload, state: &AppState) -> Result<ActionOutcome, String> {
    state
        .set_annual_target(payload.annual_target)
        .map_err(|e| e.to_string())
}

pub fn save_quarterly_targets(payload: QuarterTargets, state: &AppState) -> Result<ActionOutcome, String> {
    state.reload().map_err(|e| e.to_string())?;
    state
        .set_quarterly_targets(payload)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn admin_state(dir: &TempDir) -> AppState {
        let credentials_file = dir.path().join("users.csv");
        fs::write(&credentials_file, "username,password,role\nroot,toor,admin\n").unwrap();
        let config = AppConfig {
            invoice_file: dir.path().join("invoices.csv"),
            settings_file: dir.path().join("settings.json"),
            credentials_file,
            credentials_ttl: Duration::from_secs(60),
            today: None,
        };
        let state = AppState::new(&config).unwrap();
        state.login("root", "toor").unwrap();
        state
    }

    #[test]
    fn annual_target_then_quarters() {
        let dir = TempDir::new().unwrap();
        let state = admin_state(&dir);

        let outcome = save_annual_target(
            AnnualTargetPayload {
                annual_target: 10_000_000.0,
            },
            &state,
        )
        .unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(get_settings(&state).unwrap().quarter_values.q3, 2_800_000.0);

        let payload: QuarterTargets = serde_json::from_str(
            r#"{"Q1": 2500000, "Q2": 2500000, "Q3": 2500000, "Q4": 2500000}"#,
        )
        .unwrap();
        assert!(save_quarterly_targets(payload, &state).unwrap().is_accepted());
        assert_eq!(get_settings(&state).unwrap().quarter_values.q1, 2_500_000.0);
    }

    #[test]
    fn mismatch_reports_warning() {
        let dir = TempDir::new().unwrap();
        let state = admin_state(&dir);
        let payload = QuarterTargets {
            q1: 1.0,
            q2: 1.0,
            q3: 1.0,
            q4: 1.0,
        };
        match save_quarterly_targets(payload, &state).unwrap() {
            ActionOutcome::Rejected { warning } => assert!(warning.contains("doesn't match")),
            ActionOutcome::Accepted => panic!("mismatched quarters were accepted"),
        }
    }
}
