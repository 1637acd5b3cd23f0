use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sales_dashboard::commands;
use sales_dashboard::commands::dashboard::DashboardQuery;
use sales_dashboard::commands::invoices::{AddInvoicePayload, ExportPayload};
use sales_dashboard::commands::session::LoginPayload;
use sales_dashboard::commands::settings::AnnualTargetPayload;
use sales_dashboard::config::ConfigArgs;
use sales_dashboard::models::QuarterTargets;
use sales_dashboard::services::state::AppState;

#[derive(Parser)]
#[command(
    name = "sales-dashboard",
    version,
    about = "Tracks invoiced revenue against annual and quarterly sales targets"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Credentials {
    #[arg(long, env = "SALES_DASHBOARD_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "SALES_DASHBOARD_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Targets, pacing and charts for a year/month/company selection
    Summary {
        #[arg(long)]
        year: Option<i32>,
        /// Calendar month number; repeat to select several
        #[arg(long = "month")]
        months: Vec<u32>,
        /// Repeat to select several
        #[arg(long = "company")]
        companies: Vec<String>,
    },
    /// Years, months and companies available for filtering
    Options {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long = "month")]
        months: Vec<u32>,
    },
    /// Current annual and quarterly targets
    Settings,
    /// All invoices, newest first
    Invoices {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Record an invoice (admin or editor)
    AddInvoice {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        company: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// HH:MM:SS
        #[arg(long)]
        time: Option<NaiveTime>,
    },
    /// Set the annual target and re-split the quarters (admin)
    SetTarget {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        target: f64,
    },
    /// Set quarterly targets; they must add up to the annual target (admin)
    SetQuarters {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        q1: f64,
        #[arg(long)]
        q2: f64,
        #[arg(long)]
        q3: f64,
        #[arg(long)]
        q4: f64,
    },
    /// Write every invoice to a CSV file (admin)
    Export {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        dest: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.resolve();
    let state = AppState::new(&config)?;

    match cli.command {
        Command::Summary {
            year,
            months,
            companies,
        } => {
            let query = DashboardQuery {
                year,
                months: non_empty(months),
                companies: non_empty(companies),
            };
            print_json(&commands::dashboard::get_dashboard_stats(query, &state).map_err(|e| anyhow!(e))?)
        }
        Command::Options { year, months } => print_json(
            &commands::dashboard::get_filter_options(year, non_empty(months), &state)
                .map_err(|e| anyhow!(e))?,
        ),
        Command::Settings => {
            print_json(&commands::settings::get_settings(&state).map_err(|e| anyhow!(e))?)
        }
        Command::Invoices { credentials } => {
            login(&state, credentials)?;
            print_json(&commands::invoices::get_invoices(&state).map_err(|e| anyhow!(e))?)
        }
        Command::AddInvoice {
            credentials,
            company,
            amount,
            date,
            time,
        } => {
            login(&state, credentials)?;
            let payload = AddInvoicePayload {
                company,
                amount,
                date,
                time,
            };
            print_json(&commands::invoices::add_invoice(payload, &state).map_err(|e| anyhow!(e))?)
        }
        Command::SetTarget {
            credentials,
            target,
        } => {
            login(&state, credentials)?;
            let payload = AnnualTargetPayload {
                annual_target: target,
            };
            print_json(&commands::settings::save_annual_target(payload, &state).map_err(|e| anyhow!(e))?)
        }
        Command::SetQuarters {
            credentials,
            q1,
            q2,
            q3,
            q4,
        } => {
            login(&state, credentials)?;
            let payload = QuarterTargets { q1, q2, q3, q4 };
            print_json(
                &commands::settings::save_quarterly_targets(payload, &state).map_err(|e| anyhow!(e))?,
            )
        }
        Command::Export { credentials, dest } => {
            login(&state, credentials)?;
            let payload = ExportPayload {
                path: dest.to_string_lossy().to_string(),
            };
            let rows = commands::invoices::export_invoices(payload, &state).map_err(|e| anyhow!(e))?;
            print_json(&serde_json::json!({ "exported": rows, "dest": dest }))
        }
    }?;

    if commands::session::current_session(&state)
        .map_err(|e| anyhow!(e))?
        .is_some()
    {
        commands::session::logout(&state).map_err(|e| anyhow!(e))?;
    }
    Ok(())
}

fn login(state: &AppState, credentials: Credentials) -> Result<()> {
    let (Some(username), Some(password)) = (credentials.username, credentials.password) else {
        return Err(anyhow!("--username and --password are required for this command"));
    };
    let session = commands::session::login(LoginPayload { username, password }, state)
        .map_err(|e| anyhow!(e))?;
    tracing::debug!(username = %session.username, role = %session.role, "session started");
    Ok(())
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
