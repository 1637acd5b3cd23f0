use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::ValidationError;
use crate::models::{
    ActionOutcome, DashboardStats, FilterOptions, FilterSelection, Invoice, InvoiceAmount,
    InvoiceTimestamp, NewInvoice, QuarterTargets, Role, Session, Settings,
};
use crate::services::aggregation::{build_dashboard, filter_options};
use crate::services::auth::{require_role, CredentialCache};
use crate::services::targets;
use crate::store::credentials::CredentialStore;
use crate::store::ledger::{Ledger, LedgerStore};
use crate::store::settings::SettingsStore;

/// Everything one dashboard session owns. The ledger mutex is the single
/// writer lock: every accepted append rewrites the file while holding it.
pub struct AppState {
    ledger_store: LedgerStore,
    settings_store: SettingsStore,
    ledger: Mutex<Ledger>,
    settings: Mutex<Settings>,
    credentials: Mutex<CredentialCache>,
    session: Mutex<Option<Session>>,
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let ledger_store = LedgerStore::new(config.invoice_file.clone());
        let settings_store = SettingsStore::new(config.settings_file.clone());
        let credentials = CredentialCache::new(
            CredentialStore::new(config.credentials_file.clone()),
            config.credentials_ttl,
        );

        let ledger = ledger_store.load()?;
        let settings = load_settings_or_default(&settings_store);

        Ok(AppState {
            ledger_store,
            settings_store,
            ledger: Mutex::new(ledger),
            settings: Mutex::new(settings),
            credentials: Mutex::new(credentials),
            session: Mutex::new(None),
            today: config.today,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Re-reads ledger and settings from disk, picking up edits made outside
    /// this process.
    pub fn reload(&self) -> Result<()> {
        let ledger = self.ledger_store.load()?;
        let settings = load_settings_or_default(&self.settings_store);
        *self.ledger.lock().map_err(|_| anyhow!("Ledger lock"))? = ledger;
        *self.settings.lock().map_err(|_| anyhow!("Settings lock"))? = settings;
        Ok(())
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let session = {
            let mut credentials = self
                .credentials
                .lock()
                .map_err(|_| anyhow!("Credentials lock"))?;
            credentials.authenticate(username, password)?
        };
        *self.session.lock().map_err(|_| anyhow!("Session lock"))? = Some(session.clone());
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        let mut session = self.session.lock().map_err(|_| anyhow!("Session lock"))?;
        if let Some(previous) = session.take() {
            info!(username = %previous.username, "logged out");
        }
        Ok(())
    }

    pub fn session(&self) -> Result<Option<Session>> {
        Ok(self
            .session
            .lock()
            .map_err(|_| anyhow!("Session lock"))?
            .clone())
    }

    fn require(&self, action: &'static str, allowed: impl Fn(Role) -> bool) -> Result<Session> {
        let session = self.session()?;
        Ok(require_role(session.as_ref(), action, allowed)?)
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self
            .settings
            .lock()
            .map_err(|_| anyhow!("Settings lock"))?
            .clone())
    }

    pub fn dashboard(&self, selection: &FilterSelection) -> Result<DashboardStats> {
        let settings = self.settings()?;
        let ledger = self.ledger.lock().map_err(|_| anyhow!("Ledger lock"))?;
        Ok(build_dashboard(
            ledger.invoices(),
            &settings,
            selection,
            self.today(),
        ))
    }

    pub fn filter_options(
        &self,
        year: Option<i32>,
        months: Option<&BTreeSet<u32>>,
    ) -> Result<FilterOptions> {
        let ledger = self.ledger.lock().map_err(|_| anyhow!("Ledger lock"))?;
        Ok(filter_options(ledger.invoices(), year, months, self.today()))
    }

    pub fn invoices(&self) -> Result<Vec<Invoice>> {
        self.require("view invoices", |_| true)?;
        let ledger = self.ledger.lock().map_err(|_| anyhow!("Ledger lock"))?;
        Ok(ledger.newest_first())
    }

    /// Appends one invoice and rewrites the ledger file. Refused while any row
    /// failed to load, since the rewrite would drop it. If the write fails the
    /// in-memory ledger is rolled back.
    pub fn add_invoice(&self, new_invoice: NewInvoice) -> Result<ActionOutcome> {
        let session = self.require("add invoices", Role::can_add_invoices)?;
        let invoice = Invoice {
            company: new_invoice.company.trim().to_string(),
            amount: InvoiceAmount::from(new_invoice.amount),
            datetime: InvoiceTimestamp::from(new_invoice.datetime),
            entered_by: session.username,
        };

        let mut ledger = self.ledger.lock().map_err(|_| anyhow!("Ledger lock"))?;
        if ledger.skipped_rows() > 0 {
            return Ok(rejected(ValidationError::UnreadableLedger {
                count: ledger.skipped_rows(),
            }));
        }
        let previous_len = ledger.len();
        if let Err(rejection) = ledger.append(invoice) {
            return Ok(rejected(rejection));
        }
        if let Err(err) = self.ledger_store.save(&ledger) {
            ledger.truncate(previous_len);
            return Err(err);
        }
        info!(rows = ledger.len(), "invoice added");
        Ok(ActionOutcome::Accepted)
    }

    pub fn set_annual_target(&self, annual_target: f64) -> Result<ActionOutcome> {
        self.require("edit targets", Role::can_edit_targets)?;
        match targets::set_annual_target(annual_target) {
            Ok(updated) => self.apply_settings(updated),
            Err(rejection) => Ok(rejected(rejection)),
        }
    }

    pub fn set_quarterly_targets(&self, inputs: QuarterTargets) -> Result<ActionOutcome> {
        self.require("edit targets", Role::can_edit_targets)?;
        let current = self.settings()?;
        match targets::set_quarterly_targets(&current, inputs) {
            Ok(updated) => self.apply_settings(updated),
            Err(rejection) => Ok(rejected(rejection)),
        }
    }

    fn apply_settings(&self, updated: Settings) -> Result<ActionOutcome> {
        let mut settings = self.settings.lock().map_err(|_| anyhow!("Settings lock"))?;
        self.settings_store.save(&updated)?;
        *settings = updated;
        Ok(ActionOutcome::Accepted)
    }

    pub fn export_invoices(&self, dest: &Path) -> Result<usize> {
        self.require("export invoices", Role::can_edit_targets)?;
        let ledger = self.ledger.lock().map_err(|_| anyhow!("Ledger lock"))?;
        self.ledger_store.export(&ledger, dest)?;
        Ok(ledger.len())
    }
}

fn load_settings_or_default(store: &SettingsStore) -> Settings {
    store.load().unwrap_or_else(|err| {
        warn!(path = %store.path().display(), error = %err, "unreadable settings, using defaults");
        Settings::default()
    })
}

fn rejected(rejection: ValidationError) -> ActionOutcome {
    warn!(reason = %rejection, "submission rejected");
    ActionOutcome::Rejected {
        warning: rejection.to_string(),
    }
}
