//! Derived views over the invoice ledger.
//!
//! Target tracking (totals, remaining, completion, quarterly progress) always
//! runs over the whole ledger, because targets are absolute. Only the charts
//! (revenue over time, monthly breakdown) follow the year/month/company
//! selection. Rows without a parseable timestamp count toward totals but never
//! appear in a date-based view.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    DashboardStats, FilterOptions, FilterSelection, FiscalQuarter, Invoice, MonthlyBar,
    MonthlyPoint, QuarterProgress, RevenueDistribution, Settings,
};
use crate::services::fiscal::pacing;
use crate::utils::month_name;

/// Year equality plus month/company membership. An empty month or company
/// set selects nothing.
pub fn filter_invoices<'a>(invoices: &'a [Invoice], selection: &FilterSelection) -> Vec<&'a Invoice> {
    invoices
        .iter()
        .filter(|invoice| match invoice.datetime.year_month() {
            Some((year, month)) => year == selection.year && selection.months.contains(&month),
            None => false,
        })
        .filter(|invoice| selection.companies.contains(&invoice.company))
        .collect()
}

pub fn total_achieved(invoices: &[Invoice]) -> f64 {
    invoices.iter().map(|invoice| invoice.amount.value()).sum()
}

pub fn remaining(annual_target: f64, achieved: f64) -> f64 {
    (annual_target - achieved).max(0.0)
}

/// `achieved / target * 100`, or 0 when there is no target.
pub fn completion_pct(achieved: f64, target: f64) -> f64 {
    if target == 0.0 {
        return 0.0;
    }
    achieved / target * 100.0
}

pub fn quarterly_achieved(invoices: &[Invoice]) -> BTreeMap<FiscalQuarter, f64> {
    let mut totals: BTreeMap<FiscalQuarter, f64> =
        FiscalQuarter::ALL.iter().map(|q| (*q, 0.0)).collect();

    for invoice in invoices {
        if let Some(quarter) = invoice.datetime.fiscal_quarter() {
            *totals.entry(quarter).or_insert(0.0) += invoice.amount.value();
        }
    }

    totals
}

/// Chronological `YYYY-MM` sums for the revenue line chart.
pub fn monthly_series(subset: &[&Invoice]) -> Vec<MonthlyPoint> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for invoice in subset {
        if let Some(key) = invoice.datetime.year_month() {
            *totals.entry(key).or_insert(0.0) += invoice.amount.value();
        }
    }

    totals
        .into_iter()
        .map(|((year, month), amount)| MonthlyPoint {
            month_year: format!("{}-{:02}", year, month),
            amount,
        })
        .collect()
}

/// Sums keyed by month name only, ordered Jan..Dec.
pub fn monthly_bar(subset: &[&Invoice]) -> Vec<MonthlyBar> {
    let mut totals: BTreeMap<u32, f64> = BTreeMap::new();
    for invoice in subset {
        if let Some(month) = invoice.datetime.month() {
            *totals.entry(month).or_insert(0.0) += invoice.amount.value();
        }
    }

    totals
        .into_iter()
        .map(|(month, amount)| MonthlyBar {
            month: month_name(month).to_string(),
            amount,
        })
        .collect()
}

pub fn revenue_distribution(achieved: f64, annual_target: f64) -> RevenueDistribution {
    let remaining = remaining(annual_target, achieved);
    RevenueDistribution {
        achieved,
        remaining,
        achieved_pct: completion_pct(achieved, annual_target),
        remaining_pct: completion_pct(remaining, annual_target),
    }
}

pub fn quarterly_progress(invoices: &[Invoice], settings: &Settings) -> Vec<QuarterProgress> {
    let achieved = quarterly_achieved(invoices);
    FiscalQuarter::ALL
        .iter()
        .map(|quarter| {
            let achieved = achieved.get(quarter).copied().unwrap_or(0.0);
            let target = settings.quarter_values.get(*quarter);
            let progress = if target != 0.0 {
                (achieved / target).min(1.0)
            } else {
                0.0
            };
            QuarterProgress {
                quarter: *quarter,
                months: quarter.months_label().to_string(),
                achieved,
                target,
                progress,
            }
        })
        .collect()
}

/// Choices offered to the filter widgets. `year` and `months` narrow the
/// later lists; omitted, they default to the first year and every month in it.
pub fn filter_options(
    invoices: &[Invoice],
    year: Option<i32>,
    months: Option<&BTreeSet<u32>>,
    today: NaiveDate,
) -> FilterOptions {
    let mut years: Vec<i32> = invoices
        .iter()
        .filter_map(|invoice| invoice.datetime.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if years.is_empty() {
        years.push(today.year());
    }
    let selected_year = year.unwrap_or(years[0]);

    let available_months: BTreeSet<u32> = invoices
        .iter()
        .filter_map(|invoice| invoice.datetime.year_month())
        .filter(|(y, _)| *y == selected_year)
        .map(|(_, m)| m)
        .collect();
    let selected_months = months.unwrap_or(&available_months);

    let companies: Vec<String> = invoices
        .iter()
        .filter(|invoice| match invoice.datetime.year_month() {
            Some((y, m)) => y == selected_year && selected_months.contains(&m),
            None => false,
        })
        .map(|invoice| invoice.company.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    FilterOptions {
        years,
        months: available_months.into_iter().collect(),
        companies,
    }
}

pub fn build_dashboard(
    invoices: &[Invoice],
    settings: &Settings,
    selection: &FilterSelection,
    today: NaiveDate,
) -> DashboardStats {
    let achieved_total = total_achieved(invoices);
    let subset = filter_invoices(invoices, selection);

    DashboardStats {
        today,
        annual_target: settings.annual_target,
        achieved_total,
        remaining_total: remaining(settings.annual_target, achieved_total),
        completion_pct: completion_pct(achieved_total, settings.annual_target),
        pacing: pacing(today, settings.annual_target, achieved_total),
        distribution: revenue_distribution(achieved_total, settings.annual_target),
        quarters: quarterly_progress(invoices, settings),
        revenue_over_time: monthly_series(&subset),
        monthly_breakdown: monthly_bar(&subset),
        selection: selection.clone(),
        filtered_invoices: subset.len(),
    }
}
