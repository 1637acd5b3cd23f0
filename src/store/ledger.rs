use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::models::{Invoice, InvoiceAmount};
use crate::store::replace_file;

pub const LEDGER_COLUMNS: [&str; 4] = ["company", "amount", "datetime", "entered_by"];

/// The full invoice table, held in memory and rewritten wholesale on change.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    invoices: Vec<Invoice>,
    skipped_rows: usize,
}

impl Ledger {
    pub fn new(invoices: Vec<Invoice>) -> Self {
        Ledger {
            invoices,
            skipped_rows: 0,
        }
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Rows that could not be read at all (missing columns, wrong field
    /// count). A rewrite would lose them.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn append(&mut self, invoice: Invoice) -> Result<(), ValidationError> {
        validate_invoice(&invoice)?;
        self.invoices.push(invoice);
        Ok(())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.invoices.truncate(len);
    }

    /// Newest first; rows without a usable timestamp go last.
    pub fn newest_first(&self) -> Vec<Invoice> {
        let mut sorted = self.invoices.clone();
        sorted.sort_by(|a, b| b.datetime.datetime().cmp(&a.datetime.datetime()));
        sorted
    }
}

pub fn validate_invoice(invoice: &Invoice) -> Result<(), ValidationError> {
    if invoice.company.trim().is_empty() {
        return Err(ValidationError::MissingCompany);
    }
    match invoice.amount {
        InvoiceAmount::Parsed(amount) if amount.is_finite() && amount > 0.0 => Ok(()),
        _ => Err(ValidationError::NonPositiveAmount),
    }
}

pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: PathBuf) -> Self {
        LedgerStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty ledger.
    pub fn load(&self) -> Result<Ledger> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "ledger file missing, starting empty");
            return Ok(Ledger::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
            .with_context(|| format!("Open ledger {}", self.path.display()))?;

        let mut ledger = Ledger::default();
        for result in reader.deserialize::<Invoice>() {
            match result {
                Ok(invoice) => ledger.invoices.push(invoice),
                Err(err) => {
                    warn!(path = %self.path.display(), error = %err, "skipping unreadable ledger row");
                    ledger.skipped_rows += 1;
                }
            }
        }

        info!(
            path = %self.path.display(),
            rows = ledger.len(),
            skipped = ledger.skipped_rows,
            "ledger loaded"
        );
        Ok(ledger)
    }

    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        replace_file(&self.path, |tmp| write_csv(tmp, ledger.invoices()))?;
        info!(path = %self.path.display(), rows = ledger.len(), "ledger written");
        Ok(())
    }

    pub fn export(&self, ledger: &Ledger, dest: &Path) -> Result<()> {
        replace_file(dest, |tmp| write_csv(tmp, ledger.invoices()))?;
        info!(dest = %dest.display(), rows = ledger.len(), "ledger exported");
        Ok(())
    }
}

fn write_csv(path: &Path, invoices: &[Invoice]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Create {}", path.display()))?;
    writer.write_record(LEDGER_COLUMNS)?;
    for invoice in invoices {
        writer.serialize(invoice)?;
    }
    writer.flush()?;
    Ok(())
}
