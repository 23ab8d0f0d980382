use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// foundation: Development tool for foundation-store property files.
///
/// Read, write and inspect type-tagged values in a SQLite property file.
/// Selectors written as `/regex/` match many keys; anything else is an
/// exact key.
#[derive(Parser)]
#[command(name = "foundation", version, about, long_about = None)]
struct Cli {
    /// Namespace inside the database file.
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value(s) selected by a key or `/pattern/` as JSON.
    Get {
        /// Path to the SQLite database file.
        db: String,

        /// Exact key, or `/regex/` for a pattern.
        selector: String,

        /// Print each value together with its key.
        #[arg(long)]
        with_keys: bool,
    },

    /// Store a JSON value under a key.
    Set {
        /// Path to the SQLite database file.
        db: String,

        /// Key to write.
        key: String,

        /// JSON value. Text that is not valid JSON is stored as a string.
        value: String,
    },

    /// Remove the key(s) selected by a key or `/pattern/`.
    Remove {
        /// Path to the SQLite database file.
        db: String,

        /// Exact key, or `/regex/` for a pattern.
        selector: String,
    },

    /// List keys, optionally filtered by a selector.
    Keys {
        /// Path to the SQLite database file.
        db: String,

        /// Exact key, or `/regex/` for a pattern.
        selector: Option<String>,
    },

    /// Show database status and per-namespace key counts.
    Status {
        /// Path to the SQLite database file.
        db: String,
    },

    /// Delete every key in the namespace.
    Reset {
        /// Path to the SQLite database file.
        db: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ns = cli.namespace.as_str();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Get {
            db,
            selector,
            with_keys,
        } => commands::get(&db, ns, &selector, with_keys),
        Commands::Set { db, key, value } => commands::set(&db, ns, &key, &value),
        Commands::Remove { db, selector } => commands::remove(&db, ns, &selector),
        Commands::Keys { db, selector } => commands::keys(&db, ns, selector.as_deref()),
        Commands::Status { db } => commands::status(&db),
        Commands::Reset { db } => commands::reset(&db, ns),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
