mod cache;
mod config;

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use planefeed_wiki::{AircraftPipeline, AircraftRecord, ExtendedInfo, SpecField};

use crate::cache::DiskCache;
use crate::config::FeedConfig;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "planefeed",
    about = "Aircraft cards from Wikipedia: manufacturer, first flight, specs",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting PLANEFEED_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Skip the on-disk result cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Full card for one aircraft.
    Lookup { name: String },

    /// Manufacturer only.
    Manufacturer { name: String },

    /// First-flight date only.
    FirstFlight { name: String },

    /// Specifications, history and variants.
    Extended { name: String },

    /// A batch of cards, fetched concurrently.
    Feed {
        /// Aircraft names (defaults to the configured list).
        names: Vec<String>,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Result cache management.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete cached cards and extended info.
    Clear,
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write the default configuration to the config file path.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let json_output = cli.json || std::env::var("PLANEFEED_JSON").as_deref() == Ok("1");
    let config = FeedConfig::load()?;
    let use_cache = config.cache.enabled && !cli.no_cache;

    match cli.command {
        Commands::Lookup { name } => {
            let pipeline = AircraftPipeline::from_config(&config.wiki())?;
            let cache = use_cache.then(|| records_cache(&config));
            let records = feed_records(&pipeline, cache.as_ref(), std::slice::from_ref(&name)).await;
            let dur = start.elapsed().as_millis();
            for record in &records {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":record,"meta":{"duration_ms":dur}}))?;
                } else {
                    print_record(record);
                }
            }
        }

        Commands::Manufacturer { name } => {
            let pipeline = AircraftPipeline::from_config(&config.wiki())?;
            let manufacturer = pipeline.manufacturer(&name).await;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "name": name, "manufacturer": manufacturer },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{manufacturer}");
            }
        }

        Commands::FirstFlight { name } => {
            let pipeline = AircraftPipeline::from_config(&config.wiki())?;
            let first_flight = pipeline.first_flight(&name).await;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "name": name, "firstFlight": first_flight },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{first_flight}");
            }
        }

        Commands::Extended { name } => {
            let pipeline = AircraftPipeline::from_config(&config.wiki())?;
            let cache = use_cache.then(|| extended_cache(&config));
            let cached = match &cache {
                Some(cache) => cache.get::<ExtendedInfo>(&name).await,
                None => None,
            };
            let info = match cached {
                Some(info) => info,
                None => {
                    let info = pipeline.extended_info(&name).await;
                    if let Some(cache) = cache.as_ref().filter(|_| !info.is_empty()) {
                        cache.set(&name, &info).await;
                    }
                    info
                }
            };
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":info,"meta":{"duration_ms":dur}}))?;
            } else {
                print_extended(&name, &info);
            }
        }

        Commands::Feed {
            names,
            count,
            exclude,
        } => {
            let names = if names.is_empty() {
                config.feed_names(&exclude, count)
            } else {
                names
                    .into_iter()
                    .filter(|name| !exclude.iter().any(|ex| ex.eq_ignore_ascii_case(name)))
                    .take(count.unwrap_or(usize::MAX))
                    .collect()
            };
            if names.is_empty() {
                bail!("no aircraft left to fetch");
            }

            let pipeline = AircraftPipeline::from_config(&config.wiki())?;
            let cache = use_cache.then(|| records_cache(&config));
            let records = feed_records(&pipeline, cache.as_ref(), &names).await;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": records, "total": records.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                for record in &records {
                    print_record(record);
                    println!();
                }
            }
        }

        Commands::Config { action } => {
            let path = FeedConfig::config_path();
            match action {
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"path":path}}))?;
                    } else {
                        print!("{}", toml::to_string_pretty(&config)?);
                    }
                }
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        bail!("{} already exists (use --force to overwrite)", path.display());
                    }
                    FeedConfig::default().save_to(&path)?;
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                    } else {
                        println!("Wrote {}", path.display());
                    }
                }
            }
        }

        Commands::Cache {
            action: CacheAction::Clear,
        } => {
            let records = records_cache(&config).clear().await?;
            let extended = extended_cache(&config).clear().await?;
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "records": records, "extended": extended }
                }))?;
            } else {
                println!("Removed {records} cached cards and {extended} extended entries.");
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Logs go to stderr so JSON on stdout stays clean. `RUST_LOG` wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,planefeed={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn records_cache(config: &FeedConfig) -> DiskCache {
    DiskCache::new("records", Duration::from_secs(config.cache.record_ttl_secs))
}

fn extended_cache(config: &FeedConfig) -> DiskCache {
    DiskCache::new("extended", Duration::from_secs(config.cache.extended_ttl_secs))
}

/// Cards for `names` in order. Cached cards are reused; the rest are fetched
/// in one concurrent batch. Ids are reassigned from the current time.
async fn feed_records(
    pipeline: &AircraftPipeline,
    cache: Option<&DiskCache>,
    names: &[String],
) -> Vec<AircraftRecord> {
    let first_id = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();

    let mut cached: Vec<Option<AircraftRecord>> = Vec::with_capacity(names.len());
    for name in names {
        cached.push(match cache {
            Some(cache) => cache.get(name).await,
            None => None,
        });
    }

    let missing: Vec<&String> = names
        .iter()
        .zip(&cached)
        .filter(|(_, hit)| hit.is_none())
        .map(|(name, _)| name)
        .collect();
    info!(total = names.len(), fetching = missing.len(), "building feed");
    let fresh = pipeline.feed_with_ids(first_id, missing.as_slice()).await;

    if let Some(cache) = cache {
        for record in fresh.iter().filter(|record| is_worth_caching(record)) {
            cache.set(&record.name, record).await;
        }
    }

    let mut fresh = fresh.into_iter();
    cached
        .into_iter()
        .filter_map(|hit| hit.or_else(|| fresh.next()))
        .enumerate()
        .map(|(index, mut record)| {
            record.id = first_id + index as u64;
            record
        })
        .collect()
}

/// A card where nothing resolved usually means the lookups failed; those are
/// retried next time instead of cached.
fn is_worth_caching(record: &AircraftRecord) -> bool {
    record.manufacturer != planefeed_wiki::UNKNOWN_MANUFACTURER
        || record.first_flight != planefeed_wiki::DATE_UNKNOWN
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_record(record: &AircraftRecord) {
    println!("{}", record.name);
    println!("  Manufacturer: {}", record.manufacturer);
    println!("  First flight: {}", record.first_flight);
    println!("  Image:        {}", record.image_url);
    if !record.description.is_empty() {
        println!("  {}", record.description);
    }
}

fn print_extended(name: &str, info: &ExtendedInfo) {
    if info.is_empty() {
        println!("No extended information for {name}.");
        return;
    }
    println!("{name}");
    if !info.specifications.is_empty() {
        println!("\nSpecifications:");
        for field in SpecField::ALL {
            if let Some(value) = info.specifications.get(&field) {
                println!("  {:<14} {value}", format!("{}:", field.label()));
            }
        }
    }
    if !info.history.is_empty() {
        println!("\nHistory:");
        for section in &info.history {
            println!("  {section}\n");
        }
    }
    if !info.variants.is_empty() {
        println!("\nVariants:");
        for variant in &info.variants {
            println!("  - {variant}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_feed_options() {
        let cli = Cli::parse_from([
            "planefeed", "feed", "--count", "3", "--exclude", "Concorde", "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Feed {
                names,
                count,
                exclude,
            } => {
                assert!(names.is_empty());
                assert_eq!(count, Some(3));
                assert_eq!(exclude, vec!["Concorde"]);
            }
            _ => panic!("expected feed"),
        }
    }

    #[test]
    fn parses_cache_clear() {
        let cli = Cli::parse_from(["planefeed", "cache", "clear"]);
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Clear
            }
        ));
    }

    #[test]
    fn unresolved_cards_are_not_cached() {
        let blank = AircraftRecord::new(1, "X", "Unknown".into(), "Unknown".into(), String::new(), None);
        assert!(!is_worth_caching(&blank));
        let partial = AircraftRecord::new(1, "X", "Boeing".into(), "Unknown".into(), String::new(), None);
        assert!(is_worth_caching(&partial));
    }
}
