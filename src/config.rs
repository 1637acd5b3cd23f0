use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved file locations and runtime knobs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub invoice_file: PathBuf,
    pub settings_file: PathBuf,
    pub credentials_file: PathBuf,
    pub credentials_ttl: Duration,
    /// Pins "today" for pacing and default filters. `None` uses the local clock.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Base directory for the ledger, settings and credential files
    #[arg(long, env = "SALES_DASHBOARD_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Invoice ledger CSV [default: <data-dir>/data/invoices.csv]
    #[arg(long, env = "SALES_DASHBOARD_INVOICES")]
    pub invoices: Option<PathBuf>,

    /// Settings JSON [default: <data-dir>/settings.json]
    #[arg(long, env = "SALES_DASHBOARD_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Credential CSV with username,password,role [default: <data-dir>/user_credentials.csv]
    #[arg(long, env = "SALES_DASHBOARD_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Seconds before cached credentials are re-read
    #[arg(long, env = "SALES_DASHBOARD_CREDENTIALS_TTL", default_value_t = 300)]
    pub credentials_ttl_secs: u64,

    /// Override today's date (YYYY-MM-DD)
    #[arg(long, env = "SALES_DASHBOARD_TODAY")]
    pub today: Option<NaiveDate>,
}

impl ConfigArgs {
    pub fn resolve(self) -> AppConfig {
        let data_dir = self.data_dir;
        AppConfig {
            invoice_file: self
                .invoices
                .unwrap_or_else(|| data_dir.join("data").join("invoices.csv")),
            settings_file: self
                .settings
                .unwrap_or_else(|| data_dir.join("settings.json")),
            credentials_file: self
                .credentials
                .unwrap_or_else(|| data_dir.join("user_credentials.csv")),
            credentials_ttl: Duration::from_secs(self.credentials_ttl_secs),
            today: self.today,
        }
    }
}
