//! `ntsbx` - CLI for ntsb-explorer
//!
//! This binary imports NTSB accident exports and lets you query the resulting
//! database, including the ranked findings summary.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, warn};

use ntsb_explorer::cli::{
    CausesCommand, Cli, Command, ConfigCommand, OutputFormat, SearchCommand, ShowCommand,
};
use ntsb_explorer::{
    aggregate_with_limits, init_logging, Accident, CategoryRollup, Config, FindingRanked,
    FindingsFilter, FindingsSummary, Storage,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let database = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());
    debug!("Using database {}", database.display());

    // Execute the command
    match cli.command {
        Command::Import(cmd) => handle_import(&database, &cmd.file),
        Command::Causes(cmd) => handle_causes(&config, &database, &cmd),
        Command::Stats(cmd) => handle_stats(&database, cmd.json),
        Command::Search(cmd) => handle_search(&config, &database, &cmd),
        Command::Show(cmd) => handle_show(&database, &cmd),
        Command::Options(cmd) => handle_options(&database, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_reader(database: &Path) -> Result<Storage> {
    Storage::open_read_only(database)
        .with_context(|| format!("cannot open database {}", database.display()))
}

fn handle_import(database: &Path, file: &Path) -> Result<()> {
    let mut storage = Storage::open(database)
        .with_context(|| format!("cannot open database {}", database.display()))?;
    let report = storage
        .import_file(file)
        .with_context(|| format!("failed to import {}", file.display()))?;

    println!("Imported:   {}", report.imported);
    println!("Duplicates: {}", report.duplicates);
    println!("Errors:     {}", report.errors);
    println!("Total now:  {}", storage.count()?);
    Ok(())
}

/// Read the findings corpus, treating an unreachable store as empty.
fn load_findings_texts(database: &Path) -> Result<Vec<String>> {
    match Storage::open_read_only(database).and_then(|storage| storage.findings_texts()) {
        Ok(texts) => Ok(texts),
        Err(e) if e.is_source_unavailable() => {
            warn!("Findings unavailable, reporting an empty summary: {}", e);
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// The parts of a summary that pass the command's filters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CausesView<'a> {
    total_findings: u64,
    total_causes: u64,
    total_factors: u64,
    categories: Vec<&'a CategoryRollup>,
    findings: Vec<&'a FindingRanked>,
}

impl<'a> CausesView<'a> {
    fn new(summary: &'a FindingsSummary, filter: &FindingsFilter, category: Option<&str>) -> Self {
        Self {
            total_findings: summary.total_findings,
            total_causes: summary.total_causes,
            total_factors: summary.total_factors,
            categories: summary
                .categories
                .iter()
                .filter(|c| category.map_or(true, |name| c.category == name))
                .collect(),
            findings: summary.filtered(filter),
        }
    }
}

fn handle_causes(config: &Config, database: &Path, cmd: &CausesCommand) -> Result<()> {
    let filter = FindingsFilter::new(cmd.category.clone(), cmd.search.as_deref(), cmd.regex)?;
    let texts = load_findings_texts(database)?;
    let summary = aggregate_with_limits(&texts, config.aggregate_limits());
    let view = CausesView::new(&summary, &filter, cmd.category.as_deref());

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Plain => {
            for finding in &view.findings {
                println!(
                    "{}\t{}\t{}",
                    finding.count,
                    role_code(finding.is_cause),
                    finding.full_path
                );
            }
        }
        OutputFormat::Table => print_causes_table(&view),
    }
    Ok(())
}

fn role_code(is_cause: bool) -> &'static str {
    if is_cause {
        "C"
    } else {
        "F"
    }
}

fn print_causes_table(view: &CausesView<'_>) {
    println!(
        "Findings: {}   Causes: {}   Factors: {}",
        view.total_findings, view.total_causes, view.total_factors
    );
    println!();

    if view.categories.is_empty() {
        println!("No findings recorded.");
        return;
    }

    println!(
        "{:<40} {:>8} {:>8} {:>8}",
        "CATEGORY", "TOTAL", "CAUSES", "FACTORS"
    );
    for category in &view.categories {
        println!(
            "{:<40} {:>8} {:>8} {:>8}",
            truncate(&category.category, 40),
            category.total,
            category.causes,
            category.factors
        );
        for sub in &category.subcategories {
            let name = if sub.name.is_empty() {
                "(none)"
            } else {
                sub.name.as_str()
            };
            println!("  {:<38} {:>8}", truncate(name, 38), sub.count);
        }
    }

    println!();
    if view.findings.is_empty() {
        println!("No findings match.");
        return;
    }
    println!("{:>5} {:>8} {:<4} FINDING", "RANK", "COUNT", "ROLE");
    for (rank, finding) in view.findings.iter().enumerate() {
        println!(
            "{:>5} {:>8} {:<4} {}",
            rank + 1,
            finding.count,
            role_code(finding.is_cause),
            finding.full_path
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn handle_stats(database: &Path, json: bool) -> Result<()> {
    let stats = open_reader(database)?.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("ntsbx database statistics");
        println!("-------------------------");
        println!("Database:            {}", database.display());
        println!("Total events:        {}", stats.total_events);
        println!("With probable cause: {}", stats.events_with_probable_cause);
        println!("With findings:       {}", stats.events_with_findings);
        println!("Fatal:               {}", stats.fatal_accidents);
        println!("Serious injury:      {}", stats.serious_accidents);
        println!("Minor injury:        {}", stats.minor_accidents);
        println!("No injury:           {}", stats.no_injury_accidents);
        match stats.last_import {
            Some(at) => println!("Last import:         {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last import:         never"),
        }
    }
    Ok(())
}

fn handle_search(config: &Config, database: &Path, cmd: &SearchCommand) -> Result<()> {
    let storage = open_reader(database)?.with_max_search_limit(config.search.max_limit);
    let query = cmd.to_query(config.search.default_limit);
    let page = storage.search(&query)?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Plain => {
            for accident in &page.accidents {
                println!(
                    "{}\t{}\t{}\t{}",
                    accident.id.unwrap_or_default(),
                    accident.event_date.as_deref().unwrap_or("-"),
                    accident.ntsb_number.as_deref().unwrap_or(&accident.event_id),
                    accident.location()
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "{:>7} {:<10} {:<12} {:<5} {:<28} AIRCRAFT",
                "ID", "DATE", "NTSB NO", "SEV", "LOCATION"
            );
            for accident in &page.accidents {
                println!(
                    "{:>7} {:<10} {:<12} {:<5} {:<28} {}",
                    accident.id.unwrap_or_default(),
                    accident.event_date.as_deref().unwrap_or("-"),
                    accident.ntsb_number.as_deref().unwrap_or("-"),
                    accident.highest_severity.as_deref().unwrap_or("-"),
                    truncate(&accident.location(), 28),
                    accident.aircraft()
                );
            }
            let end = query.offset + page.accidents.len();
            if page.accidents.is_empty() {
                println!("No matches ({} total).", page.total);
            } else {
                println!("Showing {}-{} of {}", query.offset + 1, end, page.total);
            }
        }
    }
    Ok(())
}

fn handle_show(database: &Path, cmd: &ShowCommand) -> Result<()> {
    let Some(accident) = open_reader(database)?.get(cmd.id)? else {
        bail!("no accident with id {}", cmd.id);
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&accident)?);
    } else {
        print_accident(&accident);
    }
    Ok(())
}

fn print_accident(accident: &Accident) {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    println!("Event:        {}", accident.event_id);
    println!("NTSB number:  {}", field(&accident.ntsb_number));
    println!("Date:         {}", field(&accident.event_date));
    println!("Location:     {}", accident.location());
    println!("Aircraft:     {}", accident.aircraft());
    println!("Phase:        {}", field(&accident.flight_phase));
    println!("Light:        {}", accident.light_label());
    println!(
        "Severity:     {}",
        accident.severity().map_or("-", |s| s.label())
    );
    println!(
        "Injuries:     {} fatal, {} serious, {} minor",
        accident.fatal_count, accident.serious_count, accident.minor_count
    );

    if let Some(cause) = &accident.probable_cause {
        println!();
        println!("Probable cause:");
        println!("  {cause}");
    }

    let entries = accident.finding_entries();
    if !entries.is_empty() {
        println!();
        println!("Findings:");
        for entry in &entries {
            println!(
                "  [{:<7}] {} > {}",
                entry.role.label(),
                entry.category,
                entry.trail().join(" > ")
            );
        }
    }

    for (title, narrative) in [
        ("Preliminary narrative", &accident.narrative_preliminary),
        ("Factual narrative", &accident.narrative_factual),
    ] {
        if let Some(text) = narrative {
            println!();
            println!("{title}:");
            println!("{text}");
        }
    }
}

fn handle_options(database: &Path, json: bool) -> Result<()> {
    let options = open_reader(database)?.filter_options()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        println!("States ({}):", options.states.len());
        println!("  {}", options.states.join(", "));
        println!("Makes ({}):", options.makes.len());
        for make in &options.makes {
            println!("  {make}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Aggregate]");
                println!("  Max subcategories:  {}", config.aggregate.max_subcategories);
                println!("  Max findings:       {}", config.aggregate.max_findings);
                println!();
                println!("[Search]");
                println!("  Default limit:      {}", config.search.default_limit);
                println!("  Max limit:          {}", config.search.max_limit);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path: PathBuf = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
