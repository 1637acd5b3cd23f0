use thiserror::Error;

use crate::models::Role;

/// User-facing rejections. These abort the action without touching any state
/// and are surfaced as warnings, never as failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Company name is required")]
    MissingCompany,
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Annual target must be a non-negative number")]
    InvalidTarget,
    #[error("Invoice file has {count} unreadable row(s); fix it before adding invoices")]
    UnreadableLedger { count: usize },
    #[error("Total {total} doesn't match annual target {annual_target}")]
    QuarterSumMismatch { total: String, annual_target: String },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Login required")]
    NotLoggedIn,
    #[error("Role '{role}' may not {action}")]
    Forbidden { role: Role, action: &'static str },
    #[error("Credential store unavailable: {0}")]
    Store(#[from] anyhow::Error),
}
