//! Sales forecasting over an invoice ledger: fiscal-year pacing, annual and
//! quarterly target tracking, and chart series for a year/month/company
//! selection.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
