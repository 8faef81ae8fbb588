use chrono::{DateTime, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use hidro_core::capture::{delete_reading, resolve_candidate};
use hidro_core::forecast::{pooled_daily_rate, segments, SegmentStatus};
use hidro_core::units::{dial_string, format_cubic_meters, format_liters};
use hidro_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hidro")]
#[command(about = "Household water meter log and consumption forecast", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new meter reading
    #[command(group(ArgGroup::new("source").required(true).args(["digits", "liters", "image"])))]
    Add {
        /// Six dial digits as shown on the meter (4 x m³, hundreds of L, tens of L)
        #[arg(long)]
        digits: Option<String>,

        /// Value in liters
        #[arg(long)]
        liters: Option<f64>,

        /// Photo of the meter to recognize
        #[arg(long)]
        image: Option<PathBuf>,

        /// Latitude where the reading was taken
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude where the reading was taken
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,

        /// Timestamp (RFC 3339) instead of now
        #[arg(long)]
        at: Option<String>,

        /// Mark as simulated so it can be cleared later
        #[arg(long)]
        simulated: bool,
    },

    /// List readings, newest first
    List,

    /// Change the value of a stored reading
    Edit {
        /// Index shown by `list`
        index: usize,
        /// New value in liters
        value: f64,
    },

    /// Delete a stored reading
    Delete {
        /// Index shown by `list`
        index: usize,
    },

    /// Show the daily average and projected consumption (default)
    Forecast {
        /// Horizon in days (repeatable); defaults to the configured horizons
        #[arg(long = "days", allow_hyphen_values = true)]
        days: Vec<f64>,

        /// Show every segment used for the average
        #[arg(long)]
        detail: bool,
    },

    /// Show readings of one week (Monday to Sunday)
    Week {
        /// Weeks relative to the current one (-1 is last week)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },

    /// Export readings to CSV
    Export {
        path: PathBuf,
    },

    /// Import readings from CSV, merged in timestamp order
    Import {
        path: PathBuf,
    },

    /// Remove stored readings
    #[command(group(ArgGroup::new("what").required(true).args(["simulated", "all"])))]
    Clear {
        /// Only simulated readings
        #[arg(long)]
        simulated: bool,

        /// Every reading
        #[arg(long)]
        all: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Initialize logging
    hidro_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = JsonFileStore::in_dir(&data_dir);
    tracing::debug!("Using readings store at {:?}", store.path());

    match cli.command {
        Some(Commands::Add {
            digits,
            liters,
            image,
            lat,
            lng,
            at,
            simulated,
        }) => {
            let source = match (digits, liters, image) {
                (Some(d), _, _) => CaptureSource::Digits(d),
                (_, Some(l), _) => CaptureSource::Liters(l),
                (_, _, Some(p)) => CaptureSource::Image(p),
                _ => return Err(Error::Other("no reading source given".into())),
            };
            let geo = lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng });
            cmd_add(&mut store, source, geo, at, simulated, &config)
        }
        Some(Commands::List) => cmd_list(&store),
        Some(Commands::Edit { index, value }) => cmd_edit(&mut store, index, value),
        Some(Commands::Delete { index }) => cmd_delete(&mut store, index),
        Some(Commands::Forecast { days, detail }) => cmd_forecast(&store, days, detail, &config),
        Some(Commands::Week { offset }) => cmd_week(&store, offset),
        Some(Commands::Export { path }) => cmd_export(&store, &path),
        Some(Commands::Import { path }) => cmd_import(&mut store, &path),
        Some(Commands::Clear { simulated, all }) => cmd_clear(&mut store, simulated, all),
        None => {
            // Default to "forecast" command
            cmd_forecast(&store, Vec::new(), false, &config)
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid timestamp {:?}: {}", raw, e)))
}

fn cmd_add(
    store: &mut JsonFileStore,
    source: CaptureSource,
    geo: Option<GeoPoint>,
    at: Option<String>,
    simulated: bool,
    config: &Config,
) -> Result<()> {
    let at = match at {
        Some(raw) => parse_timestamp(&raw)?,
        None => Utc::now(),
    };

    let candidate = resolve_candidate(&source, &StubRecognizer::new())?;
    if let CaptureSource::Image(_) = source {
        println!("Recognized dial: {}", dial_string(candidate));
    }

    let reading = if simulated {
        capture::record(store, Reading::new(candidate, at).with_geo(geo).simulated())?
    } else {
        record_reading(store, candidate, geo, at)?
    };

    println!(
        "✓ Reading recorded: {} ({})",
        config.display.unit.format(reading.value),
        format_liters(reading.value)
    );
    Ok(())
}

fn cmd_list(store: &JsonFileStore) -> Result<()> {
    let readings = store.readings()?;
    if readings.is_empty() {
        println!("No readings yet. Add one with `hidro add`.");
        return Ok(());
    }

    for (index, reading) in history::newest_first(&readings) {
        println!(
            "#{:<3} {}  {:>14}  {:>12}{}",
            index,
            reading.timestamp.format("%d/%m/%Y %H:%M"),
            format_cubic_meters(reading.value),
            format_liters(reading.value),
            if reading.simulated { "  (simulated)" } else { "" }
        );
        if let Some(geo) = reading.geo {
            println!("      Lat: {:.6} | Lng: {:.6}", geo.lat, geo.lng);
        }
    }
    Ok(())
}

fn cmd_edit(store: &mut JsonFileStore, index: usize, value: f64) -> Result<()> {
    edit_reading(store, index, value)?;
    println!("✓ Reading #{} updated to {}", index, format_liters(value));
    Ok(())
}

fn cmd_delete(store: &mut JsonFileStore, index: usize) -> Result<()> {
    let removed = delete_reading(store, index)?;
    println!(
        "✓ Deleted reading #{} ({} at {})",
        index,
        format_liters(removed.value),
        removed.timestamp.format("%d/%m/%Y %H:%M")
    );
    Ok(())
}

fn horizon_label(days: f64) -> String {
    // Whole numbers print without a fraction
    format!("{} days", days)
}

fn cmd_forecast(store: &JsonFileStore, days: Vec<f64>, detail: bool, config: &Config) -> Result<()> {
    let readings = store.readings()?;
    let unit = config.display.unit;

    if readings.len() < 2 {
        println!("Not enough readings to forecast ({} stored, need 2).", readings.len());
    }

    let daily = compute_daily_average(&readings);
    println!("Daily average:   {} ({}/day)", unit.format(daily), format_liters(daily));

    let horizons = if days.is_empty() {
        config.forecast.horizons.clone()
    } else {
        days
    };
    for horizon in Forecast::for_horizons(&readings, &horizons) {
        println!(
            "Next {:<10} {} ({})",
            format!("{}:", horizon_label(horizon.days)),
            unit.format(horizon.total),
            format_liters(horizon.total)
        );
    }

    if detail {
        println!();
        println!("Segments:");
        for segment in segments(&readings) {
            let note = match segment.status {
                SegmentStatus::Included => {
                    format!("{}/day", format_liters(segment.rate().unwrap_or_default()))
                }
                SegmentStatus::NegativeDelta => "skipped: meter went backwards".to_string(),
                SegmentStatus::ZeroDuration => "skipped: same timestamp".to_string(),
            };
            println!(
                "  {} -> {}  {:>10.3} L over {:.3} days  {}",
                segment.start.format("%d/%m %H:%M"),
                segment.end.format("%d/%m %H:%M"),
                segment.delta,
                segment.elapsed_days,
                note
            );
        }
        let pooled = pooled_daily_rate(&readings);
        println!(
            "Duration-weighted rate (for comparison): {}/day",
            format_liters(pooled)
        );
    }

    Ok(())
}

fn cmd_week(store: &JsonFileStore, offset: i64) -> Result<()> {
    let readings = store.readings()?;
    let (start, end) = history::week_range(Utc::now().date_naive(), offset)
        .ok_or_else(|| Error::Other(format!("Week offset {} is out of range", offset)))?;

    println!(
        "Week {} - {}",
        start.format("%d/%m"),
        (end - chrono::Duration::days(1)).format("%d/%m")
    );

    for (day, of_day) in history::group_by_day(&readings, start) {
        if of_day.is_empty() {
            println!("  {}  -", day.format("%a %d"));
            continue;
        }
        for reading in of_day {
            println!(
                "  {}  {}  {:>14}  {:>12}",
                day.format("%a %d"),
                reading.timestamp.format("%H:%M"),
                format_cubic_meters(reading.value),
                format_liters(reading.value)
            );
        }
    }

    let in_week = history::filter_by_range(&readings, start, end);
    println!("{} readings this week", in_week.len());
    Ok(())
}

fn cmd_export(store: &JsonFileStore, path: &std::path::Path) -> Result<()> {
    let readings = store.readings()?;
    let count = csv_export::export_csv(&readings, path)?;
    println!("✓ Exported {} readings to {}", count, path.display());
    Ok(())
}

fn cmd_import(store: &mut JsonFileStore, path: &std::path::Path) -> Result<()> {
    let imported = csv_export::import_csv(path)?;
    let count = imported.len();
    store.append_batch(imported)?;
    println!("✓ Imported {} readings from {}", count, path.display());
    Ok(())
}

fn cmd_clear(store: &mut JsonFileStore, simulated: bool, all: bool) -> Result<()> {
    if all {
        store.clear_all()?;
        println!("✓ All readings removed");
    } else if simulated {
        let removed = store.clear_simulated()?;
        println!("✓ Removed {} simulated readings", removed);
    }
    Ok(())
}
