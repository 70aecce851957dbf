//! Parcel store CLI
//!
//! ## Commands
//!
//! - `parcel add` - Register a new parcel
//! - `parcel get` - Show one parcel
//! - `parcel list` - Show all parcels of a client
//! - `parcel set-status` / `parcel set-address` - Update a parcel
//! - `parcel delete` - Remove a registered parcel
//! - `parcel stats` - Row count
//! - `parcel demo` - Sequential walkthrough on an in-memory database

use anyhow::Context;
use clap::{Parser, Subcommand};
use parcel_store::{Parcel, ParcelConfig, ParcelDb, ParcelError, ParcelStatus, ParcelStore};
use std::path::PathBuf;

/// Parcel store — track shipments through registered, sent and delivered
#[derive(Debug, Parser)]
#[command(name = "parcel", version)]
pub struct Cli {
    /// Database file (overrides `db_path` from the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (default: $PARCEL_STORE_CONFIG or ~/.config/parcel/parcel.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output as JSON for automation
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new parcel and print its number
    Add(AddArgs),

    /// Show a parcel
    Get {
        number: i64,
    },

    /// Show every parcel of a client
    List {
        #[arg(long)]
        client: i64,
    },

    /// Overwrite a parcel's status (registered, sent, delivered)
    SetStatus {
        number: i64,
        status: ParcelStatus,
    },

    /// Change the address of a registered parcel
    SetAddress {
        number: i64,
        address: String,
    },

    /// Delete a registered parcel
    Delete {
        number: i64,
    },

    /// Print the number of stored parcels
    Stats,

    /// Walk through the parcel lifecycle on a throwaway in-memory database
    Demo,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    #[arg(long)]
    pub client: i64,

    #[arg(long)]
    pub address: String,

    #[arg(long, default_value = "registered")]
    pub status: ParcelStatus,

    /// ISO-8601 creation time (default: now, UTC)
    #[arg(long, value_name = "TIMESTAMP")]
    pub created_at: Option<String>,
}

/// Exit code for a parcel that is missing or past `registered`.
pub const EXIT_REJECTED: i32 = 2;

/// Map an error to the process exit code
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ParcelError>() {
        Some(e) if e.category().is_rejection() => EXIT_REJECTED,
        _ => 1,
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        if matches!(self.command, Command::Demo) {
            return run_demo(self.json);
        }

        let cfg = self.resolve_config()?;
        let db = ParcelDb::open(&cfg)
            .with_context(|| format!("opening {}", cfg.resolved_db_path().display()))?;

        let outcome = execute(db.store(), self.command, self.json);
        db.close()?;
        outcome
    }

    fn resolve_config(&self) -> anyhow::Result<ParcelConfig> {
        let mut cfg = match &self.config {
            Some(path) => ParcelConfig::load_from_path(path)?,
            None => ParcelConfig::load()?,
        };
        if let Some(db) = &self.db {
            cfg.db_path = db.to_string_lossy().into_owned();
        }
        Ok(cfg)
    }
}

fn execute(store: ParcelStore<'_>, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Add(args) => {
            let mut parcel = Parcel::registered(args.client, args.address);
            parcel.status = args.status;
            if let Some(created_at) = args.created_at {
                parcel.created_at = created_at;
            }
            let number = store.add(&parcel)?;
            if json {
                println!("{}", serde_json::json!({ "number": number }));
            } else {
                println!("{number}");
            }
        }
        Command::Get { number } => {
            let parcel = store.get(number)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&parcel)?);
            } else {
                println!("{}", format_parcel(&parcel));
            }
        }
        Command::List { client } => {
            let parcels = store.get_by_client(client)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&parcels)?);
            } else {
                for parcel in &parcels {
                    println!("{}", format_parcel(parcel));
                }
            }
        }
        Command::SetStatus { number, status } => {
            store.set_status(number, status)?;
            report_ok(json, &format!("parcel {number} is now {status}"));
        }
        Command::SetAddress { number, address } => {
            store.set_address(number, &address)?;
            report_ok(json, &format!("parcel {number} address updated"));
        }
        Command::Delete { number } => {
            store.delete(number)?;
            report_ok(json, &format!("parcel {number} deleted"));
        }
        Command::Stats => {
            let count = store.count()?;
            if json {
                println!("{}", serde_json::json!({ "parcels": count }));
            } else {
                println!("parcels: {count}");
            }
        }
        Command::Demo => unreachable!("demo runs without a configured database"),
    }
    Ok(())
}

fn format_parcel(p: &Parcel) -> String {
    format!(
        "#{} client={} status={} address={:?} created_at={}",
        p.number, p.client, p.status, p.address, p.created_at
    )
}

fn report_ok(json: bool, message: &str) {
    if json {
        println!("{}", serde_json::json!({ "ok": true, "message": message }));
    } else {
        println!("{message}");
    }
}

/// Sequential walkthrough; guard rejections are expected steps, not failures.
fn run_demo(json: bool) -> anyhow::Result<()> {
    let db = ParcelDb::open_in_memory()?;
    let store = db.store();
    let mut steps: Vec<(String, String)> = Vec::new();

    let parcel = Parcel {
        number: 0,
        client: 1,
        address: "123 Main St".to_string(),
        status: ParcelStatus::Registered,
        created_at: "2023-07-28T12:34:56Z".to_string(),
    };
    let id = store.add(&parcel)?;
    steps.push(("add".into(), format!("added parcel {id}")));

    let stored = store.get(id)?;
    steps.push(("get".into(), format_parcel(&stored)));

    let by_client = store.get_by_client(stored.client)?;
    steps.push((
        "list".into(),
        format!("client {} has {} parcel(s)", stored.client, by_client.len()),
    ));

    store.set_address(id, "456 Elm St")?;
    steps.push(("set-address".into(), "address changed to 456 Elm St".into()));

    store.set_status(id, ParcelStatus::Sent)?;
    steps.push(("set-status".into(), "status changed to sent".into()));

    steps.push(("set-address".into(), expect_rejection(store.set_address(id, "789 Oak St"))?));
    steps.push(("delete".into(), expect_rejection(store.delete(id))?));

    let stored = store.get(id)?;
    steps.push(("get".into(), format_parcel(&stored)));

    db.close()?;

    if json {
        let steps: Vec<_> = steps
            .iter()
            .map(|(step, outcome)| serde_json::json!({ "step": step, "outcome": outcome }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        for (step, outcome) in &steps {
            println!("{step:<12} {outcome}");
        }
    }
    Ok(())
}

fn expect_rejection(result: parcel_store::Result<()>) -> anyhow::Result<String> {
    match result {
        Ok(()) => anyhow::bail!("guarded mutation unexpectedly succeeded"),
        Err(e @ ParcelError::Guard { .. }) => Ok(format!("rejected: {e}")),
        Err(e) => Err(e.into()),
    }
}
