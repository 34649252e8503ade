//! Command-line boundary for the academic-records core.
//!
//! # Responsibility
//! - Bootstrap a database file and inspect its read models as JSON.
//! - Keep every domain rule inside `academia_core`.

use academia_core::config::CoreConfig;
use academia_core::db::schema::{current_user_version, schema_objects, SchemaObjectKind};
use academia_core::read_model::{calendar, dashboard, eligibility, progress};
use academia_core::repo::student_repo::SqliteStudentRepository;
use academia_core::service::activity_service::ActivityProgressService;
use academia_core::{init_logging, ConnectionManager, DbOptions};
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding `[database].path`
    #[clap(long)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables, indices and views (idempotent) and list them
    Init,

    /// Subjects the student may take next
    Eligible {
        #[clap(short, long)]
        student: i64,
    },

    /// Subjects blocked by unpassed prerequisites
    Blocked {
        #[clap(short, long)]
        student: i64,
    },

    /// Per-career progress and academic summary of a student
    Progress {
        #[clap(short, long)]
        student: i64,
    },

    /// Average progress and health of every career
    Careers,

    /// Unified activity/event agenda for an inclusive date range
    Agenda {
        /// First day, YYYY-MM-DD
        #[clap(long)]
        from: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[clap(long)]
        to: NaiveDate,
    },

    /// Activity counters of a student
    Dashboard {
        #[clap(short, long)]
        student: i64,
        /// Evaluation day, YYYY-MM-DD; defaults to today
        #[clap(long)]
        today: Option<NaiveDate>,
    },

    /// Store the overdue state for open activities past their due date
    MarkOverdue {
        /// Evaluation day, YYYY-MM-DD; defaults to today
        #[clap(long)]
        today: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("loading config `{}`", path.display()))?,
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    init_logging(&config.logging)?;

    let manager = ConnectionManager::new(&config.database.path, DbOptions::from(&config.database));
    let conn = manager
        .connection_for_current_thread()
        .with_context(|| format!("opening `{}`", config.database.path.display()))?;
    let today = || Local::now().date_naive();

    match cli.command {
        Commands::Init => {
            let objects = schema_objects(&conn)?;
            let count = |kind: SchemaObjectKind| objects.iter().filter(|o| o.kind == kind).count();
            print_json(&json!({
                "path": config.database.path,
                "user_version": current_user_version(&conn)?,
                "tables": count(SchemaObjectKind::Table),
                "indexes": count(SchemaObjectKind::Index),
                "views": count(SchemaObjectKind::View),
            }))?;
        }
        Commands::Eligible { student } => {
            print_json(&eligibility::eligible_subjects(&conn, student)?)?;
        }
        Commands::Blocked { student } => {
            print_json(&eligibility::blocked_subjects(&conn, student)?)?;
        }
        Commands::Progress { student } => {
            let summary = progress::academic_summary(&conn, student)?
                .ok_or_else(|| anyhow!("student {student} not found"))?;
            print_json(&json!({
                "summary": summary,
                "careers": progress::career_progress(&conn, student)?,
            }))?;
        }
        Commands::Careers => {
            print_json(&progress::career_overview(&conn)?)?;
        }
        Commands::Agenda { from, to } => {
            print_json(&calendar::agenda(&conn, from..=to)?)?;
        }
        Commands::Dashboard { student, today: day } => {
            let day = day.unwrap_or_else(today);
            let board = dashboard::dashboard_as_of(&conn, student, day)?
                .ok_or_else(|| anyhow!("student {student} not found"))?;
            print_json(&board)?;
        }
        Commands::MarkOverdue { today: day } => {
            let day = day.unwrap_or_else(today);
            let service = ActivityProgressService::new(SqliteStudentRepository::new(&conn));
            let rows = service.mark_overdue(day)?;
            info!("event=cli_mark_overdue module=cli status=ok rows={rows}");
            print_json(&json!({ "today": day, "marked_overdue": rows }))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
