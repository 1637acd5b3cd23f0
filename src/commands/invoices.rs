use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::path::Path;

use crate::models::{ActionOutcome, Invoice, NewInvoice};
use crate::services::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddInvoicePayload {
    pub company: String,
    pub amount: f64,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// Defaults to the current time.
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct ExportPayload {
    pub path: String,
}

pub fn get_invoices(state: &AppState) -> Result<Vec<Invoice>, String> {
    state.reload().map_err(|e| e.to_string())?;
    state.invoices().map_err(|e| e.to_string())
}

pub fn add_invoice(payload: AddInvoicePayload, state: &AppState) -> Result<ActionOutcome, String> {
    let now = Local::now().naive_local();
    let date = payload.date.unwrap_or_else(|| state.today());
    let time = payload.time.unwrap_or_else(|| now.time());

    // Pick up rows other sessions wrote since our last read.
    state.reload().map_err(|e| e.to_string())?;
    state
        .add_invoice(NewInvoice {
            company: payload.company,
            amount: payload.amount,
            datetime: date.and_time(time),
        })
        .map_err(|e| e.to_string())
}

pub fn export_invoices(payload: ExportPayload, state: &AppState) -> Result<usize, String> {
    state.reload().map_err(|e| e.to_string())?;
    state
        .export_invoices(Path::new(&payload.path))
        .map_err(|e| e.to_string())
}
