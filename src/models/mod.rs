use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::services::fiscal::fiscal_quarter;
use crate::utils::{format_timestamp, parse_timestamp};

pub const DEFAULT_ANNUAL_TARGET: f64 = 12_500_000.0;

/// Ledger `datetime` column. Values that do not parse are kept verbatim so a
/// full-file rewrite never loses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvoiceTimestamp {
    Parsed(NaiveDateTime),
    Unparsed(String),
}

impl InvoiceTimestamp {
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            InvoiceTimestamp::Parsed(dt) => Some(*dt),
            InvoiceTimestamp::Unparsed(_) => None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.datetime().map(|dt| dt.year())
    }

    pub fn month(&self) -> Option<u32> {
        self.datetime().map(|dt| dt.month())
    }

    pub fn year_month(&self) -> Option<(i32, u32)> {
        self.datetime().map(|dt| (dt.year(), dt.month()))
    }

    pub fn fiscal_quarter(&self) -> Option<FiscalQuarter> {
        self.month().map(FiscalQuarter::from_month)
    }
}

impl From<String> for InvoiceTimestamp {
    fn from(raw: String) -> Self {
        match parse_timestamp(&raw) {
            Some(dt) => InvoiceTimestamp::Parsed(dt),
            None => InvoiceTimestamp::Unparsed(raw),
        }
    }
}

impl From<InvoiceTimestamp> for String {
    fn from(value: InvoiceTimestamp) -> Self {
        match value {
            InvoiceTimestamp::Parsed(dt) => format_timestamp(&dt),
            InvoiceTimestamp::Unparsed(raw) => raw,
        }
    }
}

impl From<NaiveDateTime> for InvoiceTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        InvoiceTimestamp::Parsed(value)
    }
}

/// Ledger `amount` column. Blank or non-numeric cells are kept verbatim and
/// count as zero in every sum.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum InvoiceAmount {
    Parsed(f64),
    Unparsed(String),
}

impl InvoiceAmount {
    pub fn value(&self) -> f64 {
        match self {
            InvoiceAmount::Parsed(amount) => *amount,
            InvoiceAmount::Unparsed(_) => 0.0,
        }
    }
}

impl From<String> for InvoiceAmount {
    fn from(raw: String) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() => InvoiceAmount::Parsed(amount),
            _ => InvoiceAmount::Unparsed(raw),
        }
    }
}

impl From<f64> for InvoiceAmount {
    fn from(amount: f64) -> Self {
        InvoiceAmount::Parsed(amount)
    }
}

impl Serialize for InvoiceAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InvoiceAmount::Parsed(amount) => serializer.serialize_f64(*amount),
            InvoiceAmount::Unparsed(raw) => serializer.serialize_str(raw),
        }
    }
}

/// One ledger row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub company: String,
    pub amount: InvoiceAmount,
    pub datetime: InvoiceTimestamp,
    #[serde(default)]
    pub entered_by: String,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub company: String,
    pub amount: f64,
    pub datetime: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FiscalQuarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl FiscalQuarter {
    pub const ALL: [FiscalQuarter; 4] = [
        FiscalQuarter::Q1,
        FiscalQuarter::Q2,
        FiscalQuarter::Q3,
        FiscalQuarter::Q4,
    ];

    pub fn from_month(month: u32) -> Self {
        match fiscal_quarter(month) {
            1 => FiscalQuarter::Q1,
            2 => FiscalQuarter::Q2,
            3 => FiscalQuarter::Q3,
            _ => FiscalQuarter::Q4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FiscalQuarter::Q1 => "Q1",
            FiscalQuarter::Q2 => "Q2",
            FiscalQuarter::Q3 => "Q3",
            FiscalQuarter::Q4 => "Q4",
        }
    }

    pub fn months_label(self) -> &'static str {
        match self {
            FiscalQuarter::Q1 => "Apr-Jun",
            FiscalQuarter::Q2 => "Jul-Sep",
            FiscalQuarter::Q3 => "Oct-Dec",
            FiscalQuarter::Q4 => "Jan-Mar",
        }
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterTargets {
    #[serde(rename = "Q1")]
    pub q1: f64,
    #[serde(rename = "Q2")]
    pub q2: f64,
    #[serde(rename = "Q3")]
    pub q3: f64,
    #[serde(rename = "Q4")]
    pub q4: f64,
}

impl QuarterTargets {
    pub fn get(&self, quarter: FiscalQuarter) -> f64 {
        match quarter {
            FiscalQuarter::Q1 => self.q1,
            FiscalQuarter::Q2 => self.q2,
            FiscalQuarter::Q3 => self.q3,
            FiscalQuarter::Q4 => self.q4,
        }
    }

    pub fn total(&self) -> f64 {
        self.q1 + self.q2 + self.q3 + self.q4
    }
}

impl Default for QuarterTargets {
    fn default() -> Self {
        QuarterTargets {
            q1: 2_500_000.0,
            q2: 3_000_000.0,
            q3: 3_500_000.0,
            q4: 3_500_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub annual_target: f64,
    pub quarter_values: QuarterTargets,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            annual_target: DEFAULT_ANNUAL_TARGET,
            quarter_values: QuarterTargets::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn can_add_invoices(self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }

    pub fn can_edit_targets(self) -> bool {
        self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

// Any role label other than admin/editor is read-only.
impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "editor" => Role::Editor,
            _ => Role::Viewer,
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub year: i32,
    pub months: BTreeSet<u32>,
    pub companies: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingMetrics {
    pub fiscal_year_start: NaiveDate,
    pub fiscal_year_end: NaiveDate,
    pub days_passed: i64,
    pub days_left: i64,
    pub daily_required: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueDistribution {
    pub achieved: f64,
    pub remaining: f64,
    pub achieved_pct: f64,
    pub remaining_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterProgress {
    pub quarter: FiscalQuarter,
    pub months: String,
    pub achieved: f64,
    pub target: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month_year: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBar {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today: NaiveDate,
    pub annual_target: f64,
    pub achieved_total: f64,
    pub remaining_total: f64,
    pub completion_pct: f64,
    pub pacing: PacingMetrics,
    pub distribution: RevenueDistribution,
    pub quarters: Vec<QuarterProgress>,
    pub revenue_over_time: Vec<MonthlyPoint>,
    pub monthly_breakdown: Vec<MonthlyBar>,
    pub selection: FilterSelection,
    pub filtered_invoices: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Accepted,
    Rejected { warning: String },
}

impl ActionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ActionOutcome::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsed_timestamps_survive_conversion() {
        let ts = InvoiceTimestamp::from("not a date".to_string());
        assert_eq!(ts, InvoiceTimestamp::Unparsed("not a date".to_string()));
        assert_eq!(ts.year(), None);
        assert_eq!(ts.fiscal_quarter(), None);
        assert_eq!(String::from(ts), "not a date");
    }

    #[test]
    fn parsed_timestamp_derives_calendar_fields() {
        let ts = InvoiceTimestamp::from("2025-02-10 09:00:00".to_string());
        assert_eq!(ts.year_month(), Some((2025, 2)));
        assert_eq!(ts.fiscal_quarter(), Some(FiscalQuarter::Q4));
    }

    #[test]
    fn blank_amounts_are_kept_and_count_as_zero() {
        let blank = InvoiceAmount::from(String::new());
        assert_eq!(blank, InvoiceAmount::Unparsed(String::new()));
        assert_eq!(blank.value(), 0.0);
        assert_eq!(
            InvoiceAmount::from("nan".to_string()),
            InvoiceAmount::Unparsed("nan".to_string())
        );
        assert_eq!(InvoiceAmount::from(" 1250.5 ".to_string()).value(), 1_250.5);
    }

    #[test]
    fn role_labels_are_case_insensitive() {
        assert_eq!(Role::from("Admin".to_string()), Role::Admin);
        assert_eq!(Role::from(" EDITOR ".to_string()), Role::Editor);
        assert_eq!(Role::from("auditor".to_string()), Role::Viewer);
        assert!(Role::Editor.can_add_invoices());
        assert!(!Role::Editor.can_edit_targets());
        assert!(!Role::Viewer.can_add_invoices());
    }

    #[test]
    fn settings_json_uses_quarter_labels() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["annual_target"], 12_500_000.0);
        assert_eq!(json["quarter_values"]["Q3"], 3_500_000.0);
    }

    #[test]
    fn default_quarters_sum_to_default_target() {
        assert_eq!(QuarterTargets::default().total(), DEFAULT_ANNUAL_TARGET);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let rejected = ActionOutcome::Rejected {
            warning: "nope".to_string(),
        };
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["warning"], "nope");
        assert!(!rejected.is_accepted());
    }
}
