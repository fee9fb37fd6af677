//! callrange - Pick, normalize and share report date ranges across dashboard screens

mod config;
mod range;
mod screen;
mod sources;
mod sync;
mod types;
mod utils;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::DashboardConfig;
use range::{preset_range, GlobalDateContext, RangeNormalizer, RangeWidget, Rejection};
use screen::{ReportScreen, ScreenOptions};
use serde::Serialize;
use sources::{FixtureReportSource, HttpReportSource, ReportSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use types::{CalendarType, DateRange, FetchState, Identity, LimitCalendar, OutputFormat, RangeType, TimeOfDay};
use utils::format::{format_calendar, format_fetch_table, format_json, format_ranges, print_banner};
use utils::time::{local_now, start_of_day};

#[derive(Parser)]
#[command(name = "callrange")]
#[command(author, version, about = "Pick, normalize and share report date ranges across dashboard screens")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the per-user config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every preset range
    Presets {
        /// Reference time (YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD), defaults to now
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
    /// Click through the calendar and print the committed range
    Pick {
        /// Clicked day; repeat for a range
        #[arg(long = "click", value_parser = parse_datetime, required = true)]
        clicks: Vec<NaiveDateTime>,
        #[arg(long)]
        from_time: Option<TimeOfDay>,
        #[arg(long)]
        to_time: Option<TimeOfDay>,
        #[arg(long, value_enum, default_value = "free")]
        calendar_type: CalendarType,
        /// Cap custom ranges at the shorter month limit
        #[arg(long)]
        limit_month: bool,
        /// Override today's date
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Print a month of the calendar
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current one
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
        /// Step back this many months
        #[arg(long, default_value_t = 0, conflicts_with = "next")]
        prev: u32,
        /// Step forward this many months
        #[arg(long, default_value_t = 0)]
        next: u32,
        #[arg(long = "click", value_parser = parse_datetime)]
        clicks: Vec<NaiveDateTime>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Fetch reports for a shared range
    Fetch {
        /// Report name; repeat to mount several screens
        #[arg(long = "report", required = true)]
        reports: Vec<String>,
        #[arg(long)]
        department: String,
        #[arg(long, default_value = "default")]
        tenant: String,
        #[arg(long, default_value = "default")]
        sub_tenant: String,
        #[arg(long, default_value = "default")]
        company: String,
        /// Shared preset (e.g. "last week")
        #[arg(long, conflicts_with_all = ["from", "to"])]
        preset: Option<RangeType>,
        #[arg(long, value_parser = parse_datetime, requires = "to")]
        from: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_datetime, requires = "from")]
        to: Option<NaiveDateTime>,
        /// Read records from a JSON file instead of the report API
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_path) =
        DashboardConfig::resolve(cli.config.as_deref()).context("failed to load configuration")?;
    utils::logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Presets { now } => run_presets(&cli.format, &config, now.unwrap_or_else(local_now)),
        Commands::Pick {
            ref clicks,
            from_time,
            to_time,
            calendar_type,
            limit_month,
            today,
        } => {
            let limit = if limit_month { LimitCalendar::LimitMonth } else { LimitCalendar::None };
            let today = today.unwrap_or_else(|| local_now().date());
            let normalizer = RangeNormalizer::from_config(&config, calendar_type, limit, today);
            let mut widget = RangeWidget::from_config(&config, today);
            if let Some(t) = from_time {
                widget.set_from_time(t);
            }
            if let Some(t) = to_time {
                widget.set_to_time(t);
            }
            run_pick(&cli.format, &mut widget, &normalizer, clicks)
        }
        Commands::Calendar {
            month,
            prev,
            next,
            ref clicks,
            today,
        } => {
            let today = today.unwrap_or_else(|| local_now().date());
            let mut widget = RangeWidget::from_config(&config, today);
            for at in clicks {
                widget.click(*at);
            }
            if let Some(month) = month {
                widget.show_month(month);
            }
            for _ in 0..prev {
                widget.previous_month();
            }
            for _ in 0..next {
                widget.next_month();
            }
            let title = widget.visible_month().format("%B %Y").to_string();
            println!("{}", format_calendar(&title, &widget.month_grid()));
            Ok(())
        }
        Commands::Fetch {
            ref reports,
            ref department,
            ref tenant,
            ref sub_tenant,
            ref company,
            preset,
            from,
            to,
            ref fixture,
        } => {
            let identity = Identity {
                tenant_id: tenant.clone(),
                sub_tenant_id: sub_tenant.clone(),
                company_id: company.clone(),
                department_id: department.clone(),
            };
            let now = local_now();
            let shared = match (preset, from, to) {
                (Some(kind), _, _) => Some(preset_range(kind, now, &config.display_format)),
                (None, Some(from), Some(to)) => Some(DateRange::with_display_format(
                    from,
                    to,
                    RangeType::Custom,
                    &config.display_format,
                )),
                _ => None,
            };
            run_fetch(&cli.format, &config, reports, identity, shared, fixture.as_ref(), now).await
        }
        Commands::Config => run_config(&config, config_path),
    }
}

fn run_presets(format: &OutputFormat, config: &DashboardConfig, now: NaiveDateTime) -> anyhow::Result<()> {
    let ranges: Vec<(String, DateRange)> = RangeType::ALL
        .iter()
        .map(|kind| (kind.to_string(), preset_range(*kind, now, &config.display_format)))
        .collect();

    match format {
        OutputFormat::Table => {
            print_banner();
            println!("{}", format_ranges(&ranges));
        }
        OutputFormat::Json => {
            let presets: Vec<&DateRange> = ranges.iter().map(|(_, r)| r).collect();
            println!("{}", format_json(&presets));
        }
    }
    Ok(())
}

fn run_pick(
    format: &OutputFormat,
    widget: &mut RangeWidget,
    normalizer: &RangeNormalizer,
    clicks: &[NaiveDateTime],
) -> anyhow::Result<()> {
    let mut committed: Option<DateRange> = None;
    let mut rejection: Option<Rejection> = None;

    for at in clicks {
        if !widget.click(*at) {
            println!("{} {} is outside the selectable window", "Ignored:".yellow(), at.date());
            continue;
        }
        if normalizer.is_ready(&widget.selection()) {
            match normalizer.normalize(&widget.selection(), widget.from_time(), widget.to_time()) {
                Ok(range) => {
                    committed = Some(range);
                    rejection = None;
                }
                Err(e) => rejection = Some(e),
            }
        }
    }

    // a lone free click commits as a single instant, as Apply would
    if committed.is_none() && rejection.is_none() {
        match normalizer.normalize(&widget.selection(), widget.from_time(), widget.to_time()) {
            Ok(range) => committed = Some(range),
            Err(e) => rejection = Some(e),
        }
    }

    if let Some(e) = rejection {
        println!("{} {}", "Rejected:".red(), e);
        if committed.is_none() {
            return Ok(());
        }
        println!("{}", "Keeping the last committed range".dimmed());
    }

    if let Some(range) = committed {
        match format {
            OutputFormat::Table => println!("{}", format_ranges(&[(range.range_type().to_string(), range)])),
            OutputFormat::Json => println!("{}", format_json(&range)),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct FetchOutcome {
    report: String,
    range: Option<DateRange>,
    #[serde(flatten)]
    state: FetchState,
}

async fn run_fetch(
    format: &OutputFormat,
    config: &DashboardConfig,
    reports: &[String],
    identity: Identity,
    shared: Option<DateRange>,
    fixture: Option<&PathBuf>,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let global = GlobalDateContext::new();
    let mut screens = Vec::with_capacity(reports.len());

    for report in reports {
        let source: Arc<dyn ReportSource> = match fixture {
            Some(path) => Arc::new(FixtureReportSource::new(report, path)),
            None => Arc::new(
                HttpReportSource::new(report, &config.api)
                    .with_context(|| format!("failed to build client for report '{}'", report))?,
            ),
        };
        let mut screen = ReportScreen::new(config, ScreenOptions::default(), source, &global);
        screen.mount(now);
        screens.push((report.clone(), screen));
    }

    if let Some(range) = shared {
        global.publish(range);
        for (_, screen) in screens.iter_mut() {
            screen.sync_global();
        }
    }

    if matches!(format, OutputFormat::Table) {
        println!("{}", "Fetching reports...".dimmed());
    }

    let deadline = config.debounce() + Duration::from_secs(config.api.timeout_secs) + Duration::from_secs(1);
    let waits = screens.iter_mut().map(|(report, screen)| {
        let mut rx = screen.subscribe_fetch_state();
        screen.set_identity(Some(identity.clone()));
        let report = report.clone();
        let range = screen.effective_range();
        async move {
            let settled = tokio::time::timeout(deadline, rx.wait_for(FetchState::is_settled))
                .await
                .ok()
                .and_then(|r| r.ok())
                .map(|state| state.clone());
            let state = settled.unwrap_or_else(|| rx.borrow().clone());
            FetchOutcome { report, range, state }
        }
    });
    let outcomes: Vec<FetchOutcome> = futures::future::join_all(waits).await;

    for (_, screen) in screens.iter_mut() {
        screen.teardown();
    }

    match format {
        OutputFormat::Table => {
            print!("\x1B[1A\x1B[2K");
            let rows: Vec<(String, Option<DateRange>, FetchState)> = outcomes
                .into_iter()
                .map(|o| (o.report, o.range, o.state))
                .collect();
            println!("{}", format_fetch_table(&rows));
        }
        OutputFormat::Json => println!("{}", format_json(&outcomes)),
    }
    Ok(())
}

fn run_config(config: &DashboardConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    let location = path
        .or_else(utils::paths::config_file)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    println!("{} {}", "Config file:".bold(), location);
    println!();
    println!("{}", toml::to_string_pretty(config).context("failed to render configuration")?);
    Ok(())
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, types::DATE_TIME_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(start_of_day))
        .map_err(|_| format!("expected YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD, got '{}'", s))
}

fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").map_err(|_| format!("expected YYYY-MM, got '{}'", s))
}
