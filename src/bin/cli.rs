//! lsmkv CLI
//!
//! Command-line interface operating directly on a data directory.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use lsmkv::{Config, Engine, Lookup};
use tracing_subscriber::{fmt, EnvFilter};

/// lsmkv CLI
#[derive(Parser, Debug)]
#[command(name = "lsmkv")]
#[command(about = "Embedded leveled LSM key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./lsmkv_data")]
    data_dir: PathBuf,

    /// Level 0 size budget in MB
    #[arg(long, default_value = "1")]
    level0_size_mb: u64,

    /// Max SSTables per level before compaction
    #[arg(long, default_value = "3")]
    part_size: usize,

    /// Max memtable keys before flush
    #[arg(long, default_value = "500")]
    memtable_threshold: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print every live key/value pair
    Scan,

    /// Flush the memtable to a level-0 SSTable
    Flush,

    /// Compact every over-threshold level
    Compact,

    /// Print memtable, WAL and per-level sizes
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lsmkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .level0_size_mb(args.level0_size_mb)
        .part_size(args.part_size)
        .memtable_threshold(args.memtable_threshold)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> lsmkv::Result<()> {
    match command {
        Commands::Get { key } => match engine.get(&key)? {
            Lookup::Found(entry) => println!("{}", String::from_utf8_lossy(entry.value_bytes())),
            Lookup::Deleted => println!("(deleted)"),
            Lookup::NotFound => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            engine.set(&key, value.as_bytes())?;
            engine.flush_check()?;
            println!("OK");
        }
        Commands::Del { key } => {
            let previous = engine.delete_and_get(&key)?;
            engine.flush_check()?;
            println!("{}", if previous.is_some() { "1" } else { "0" });
        }
        Commands::Scan => {
            for (key, value) in engine.scan()? {
                println!("{}\t{}", key, String::from_utf8_lossy(&value));
            }
        }
        Commands::Flush => match engine.flush()? {
            Some(info) => println!("flushed {} entries to {}.{}.db", info.entries, info.level, info.seq),
            None => println!("memtable empty"),
        },
        Commands::Compact => {
            let written = engine.check_and_compact()?;
            println!("compacted {} level(s)", written.len());
        }
        Commands::Stats => {
            let stats = engine.stats()?;
            println!("memtable keys: {}", stats.memtable_keys);
            println!("wal bytes:     {}", stats.wal_bytes);
            for level in stats.levels.iter().filter(|l| l.tables > 0) {
                println!("level {}: {} table(s), {} bytes", level.level, level.tables, level.bytes);
            }
        }
    }
    Ok(())
}
