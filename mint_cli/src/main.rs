use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mint_core::ledger::{self, Period};
use mint_core::store;
use mint_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mint")]
#[command(about = "Personal ledger and cycle tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next-cycle prediction
    Predict {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },

    /// Classify a date into a cycle phase
    Phase {
        /// Date to classify (YYYY-MM-DD)
        date: String,
    },

    /// Print the annotated month grid
    Calendar {
        year: i32,
        month: u32,

        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,

        /// Print cells as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a period
    Record {
        /// First day (YYYY-MM-DD)
        start: String,

        /// Last day (YYYY-MM-DD)
        end: String,

        /// Flow intensity (light, normal, heavy, very_heavy)
        #[arg(long, default_value = "normal")]
        flow: String,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Record symptoms for a date (replaces that date's entry)
    Symptom {
        /// Date (YYYY-MM-DD)
        date: String,

        #[arg(long)]
        mood: Option<String>,

        /// Symptom tag, may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Show cycle statistics
    Stats,

    /// Record an expense
    Spend {
        amount: String,
        category: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Record income
    Earn {
        amount: String,
        category: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Show ledger totals and top categories
    Ledger {
        /// today, month, year or all
        #[arg(long, default_value = "month")]
        period: String,

        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },

    /// Export all data as JSON on stdout
    Export {
        /// Also write transactions.csv and cycles.csv into this directory
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Import a JSON export
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    // Initialize logging
    mint_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let mut store = FileStore::new(data_dir);

    match cli.command {
        Commands::Predict { today } => cmd_predict(&store, &config, resolve_today(today)?),
        Commands::Phase { date } => cmd_phase(&store, &config, parse_date(&date)?),
        Commands::Calendar {
            year,
            month,
            today,
            json,
        } => cmd_calendar(&store, &config, year, month, resolve_today(today)?, json),
        Commands::Record {
            start,
            end,
            flow,
            note,
        } => cmd_record(&mut store, &config, &start, &end, &flow, note),
        Commands::Symptom {
            date,
            mood,
            tags,
            note,
        } => cmd_symptom(&mut store, &config, &date, mood, tags, note),
        Commands::Stats => cmd_stats(&store, &config),
        Commands::Spend {
            amount,
            category,
            date,
            note,
        } => cmd_transaction(
            &mut store,
            &config,
            TransactionKind::Expense,
            &amount,
            &category,
            date,
            note,
        ),
        Commands::Earn {
            amount,
            category,
            date,
            note,
        } => cmd_transaction(
            &mut store,
            &config,
            TransactionKind::Income,
            &amount,
            &category,
            date,
            note,
        ),
        Commands::Ledger { period, today } => {
            cmd_ledger(&store, &config, &period, resolve_today(today)?)
        }
        Commands::Export { csv } => cmd_export(&store, &config, csv.as_deref()),
        Commands::Import { file } => cmd_import(&mut store, &file),
    }
}

fn resolve_today(today: Option<String>) -> Result<NaiveDate> {
    match today {
        Some(s) => parse_date(&s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn cmd_predict(store: &FileStore, config: &Config, today: NaiveDate) -> Result<()> {
    let history = store::load_history(store, &config.cycle)?;

    let Some(prediction) = predict(&history, today) else {
        match history.last_start_date {
            Some(_) => println!("No prediction: the next cycle falls outside the calendar."),
            None => println!("No cycles recorded yet."),
        }
        return Ok(());
    };

    println!("Next period:     {}", format_date(prediction.next_start_date));
    println!("Days until next: {}", prediction.days_until_next);
    println!("Cycle day:       {}", prediction.current_cycle_day);
    println!("Ovulation:       {}", format_date(prediction.ovulation_date));
    println!(
        "Fertile window:  {} to {}",
        format_date(prediction.fertile_window_start),
        format_date(prediction.fertile_window_end)
    );
    println!("Phase:           {}", prediction.current_phase.as_str());
    println!("  {}", prediction.current_phase.description());
    Ok(())
}

fn cmd_phase(store: &FileStore, config: &Config, date: NaiveDate) -> Result<()> {
    let history = store::load_history(store, &config.cycle)?;
    match mint_core::cycle::phase_on(&history, date) {
        Some(phase) => println!("{} {}", format_date(date), phase.as_str()),
        None => println!("No cycles recorded yet."),
    }
    Ok(())
}

fn cmd_calendar(
    store: &FileStore,
    config: &Config,
    year: i32,
    month: u32,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let history = store::load_history(store, &config.cycle)?;
    let cells = month_grid(year, month, &history, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cells)?);
        return Ok(());
    }

    println!("{}-{:02}", year, month);
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for row in cells.chunks(7) {
        let line: Vec<String> = row.iter().map(render_cell).collect();
        println!("{}", line.join(" "));
    }
    println!("T today  M period  O ovulation  P predicted  F fertile");
    Ok(())
}

fn render_cell(cell: &CalendarCell) -> String {
    if !cell.belongs_to_displayed_month {
        return "  .".to_string();
    }
    let marker = match cell.phase_class {
        PhaseClass::None => ' ',
        PhaseClass::Today => 'T',
        PhaseClass::Menstrual => 'M',
        PhaseClass::Ovulation => 'O',
        PhaseClass::PredictedMenstrual => 'P',
        PhaseClass::Fertile => 'F',
    };
    format!("{:>2}{}", cell.day_number, marker)
}

fn cmd_record(
    store: &mut FileStore,
    config: &Config,
    start: &str,
    end: &str,
    flow: &str,
    note: String,
) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let flow = FlowIntensity::from_tag(flow)
        .ok_or_else(|| Error::MalformedRecord(format!("unknown flow {:?}", flow)))?;
    let record = CycleRecord::new(start, end, flow).with_note(note);

    let mut averages = None;
    store::update_history(store, &config.cycle, |history| {
        averages = Some(history.commit_record(record)?);
        Ok(())
    })?;

    println!("✓ Period recorded: {} to {}", format_date(start), format_date(end));
    if let Some(averages) = averages {
        println!("  Average cycle: {} days", averages.cycle_length);
        println!("  Average period: {} days", averages.flow_length);
    }
    Ok(())
}

fn cmd_symptom(
    store: &mut FileStore,
    config: &Config,
    date: &str,
    mood: Option<String>,
    tags: Vec<String>,
    note: String,
) -> Result<()> {
    let mut record = SymptomRecord::new(parse_date(date)?);
    record.mood = mood.as_deref().map(Mood::from_tag);
    record.symptoms = tags.iter().map(|t| SymptomTag::from_tag(t)).collect();
    record.note = note;
    let date = record.date;

    store::update_history(store, &config.cycle, |history| {
        history.upsert_symptom(record);
        Ok(())
    })?;

    println!("✓ Symptoms recorded for {}", format_date(date));
    Ok(())
}

fn cmd_stats(store: &FileStore, config: &Config) -> Result<()> {
    let history = store::load_history(store, &config.cycle)?;
    let stats = history.stats();

    println!("Recorded periods: {}", stats.total_records);
    println!("Average cycle:    {} days", stats.average_cycle_length);
    println!("Average period:   {} days", stats.average_flow_length);
    if let (Some(shortest), Some(longest)) = (stats.shortest_cycle, stats.longest_cycle) {
        println!("Cycle range:      {} to {} days", shortest, longest);
    }
    if let (Some(start), Some(end)) = (stats.last_period_start, stats.last_period_end) {
        println!("Last period:      {} to {}", format_date(start), format_date(end));
    }
    Ok(())
}

fn cmd_transaction(
    store: &mut FileStore,
    config: &Config,
    kind: TransactionKind,
    amount: &str,
    category: &str,
    date: Option<String>,
    note: String,
) -> Result<()> {
    let amount_cents = ledger::parse_amount(amount)?;
    let date = resolve_today(date)?;
    let transaction = Transaction::new(kind, amount_cents, category, date)?.with_note(note);

    let mut book = store::load_ledger(&*store)?;
    book.add(transaction);
    store::save_ledger(store, &book)?;

    println!(
        "✓ {} of {} recorded",
        match kind {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        },
        ledger::format_amount(amount_cents, Some(&config.ledger.currency))
    );
    Ok(())
}

fn cmd_ledger(store: &FileStore, config: &Config, period: &str, today: NaiveDate) -> Result<()> {
    let period = Period::from_tag(period)
        .ok_or_else(|| Error::Other(format!("unknown period {:?}", period)))?;
    let book = store::load_ledger(store)?;
    let selected = book.filter(period, today);
    let currency = Some(config.ledger.currency.as_str());

    let summary = ledger::summarize(&selected);
    println!("Income:  {}", ledger::format_amount(summary.total_income, currency));
    println!("Expense: {}", ledger::format_amount(summary.total_expense, currency));
    println!("Net:     {}", ledger::format_amount(summary.net, currency));

    let shares = ledger::category_breakdown(&selected, config.ledger.top_categories);
    match shares.first() {
        Some(top) => println!("Top category: {}", top.name),
        None => println!("Top category: none"),
    }
    for share in &shares {
        println!(
            "  {:<16} {:>3}%  {}",
            share.name,
            share.percentage,
            ledger::format_amount(share.amount_cents, currency)
        );
    }
    Ok(())
}

fn cmd_export(store: &FileStore, config: &Config, csv_dir: Option<&Path>) -> Result<()> {
    println!("{}", mint_core::export::export_json(store)?);

    if let Some(dir) = csv_dir {
        let book = store::load_ledger(store)?;
        let history = store::load_history(store, &config.cycle)?;
        mint_core::export::export_transactions_csv(
            &dir.join("transactions.csv"),
            book.transactions(),
        )?;
        mint_core::export::export_cycles_csv(&dir.join("cycles.csv"), &history)?;
        eprintln!("✓ CSV written to {}", dir.display());
    }
    Ok(())
}

fn cmd_import(store: &mut FileStore, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let written = mint_core::export::import_json(store, &text)?;
    println!("✓ Imported {} sections", written);
    Ok(())
}
