use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restock_core::providers::HubGateway;
use restock_core::{AddOutcome, Item, ListGateway, SyncController, UiPrefs};
use restock_gateway::HubClient;
use restock_prefs::{KeyValueStore, MemoryPrefs, SqlitePrefs};

#[derive(Parser)]
#[command(name = "restock")]
#[command(version, about = "Shared shopping-list sync and classification engine", long_about = None)]
struct Cli {
    /// Hub base URL
    #[arg(long, env = "RESTOCK_HUB_URL")]
    hub_url: Option<String>,

    /// Bearer token for the hub
    #[arg(long, env = "RESTOCK_TOKEN")]
    token: Option<String>,

    /// List id to bind to (default: first list on the hub)
    #[arg(long)]
    list: Option<String>,

    /// Keep preferences in memory instead of on disk
    #[arg(long)]
    memory_prefs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show all lists on the hub
    Lists,
    /// Show the bound list, classified into sections
    Show,
    /// Add an item by name
    Add {
        /// Item name (normalized before it is sent)
        name: String,
    },
    /// Toggle an item between needed and bought
    Toggle {
        /// Item id
        id: String,
    },
    /// Rename an item and set its completion state
    Edit {
        /// Item id
        id: String,
        /// New name
        name: String,
        /// Mark the item as bought
        #[arg(long)]
        complete: bool,
    },
    /// Remove an item
    Remove {
        /// Item id
        id: String,
    },
    /// Drop every bought item from the list
    Clear,
    /// Search the list for matching items
    Suggest {
        /// Search text (at least 2 characters)
        query: String,
    },
    /// Follow change notices and keep refreshing until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restock=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let client = match &cli.hub_url {
        Some(url) => HubClient::with_base_url(cli.token.clone(), url.clone()),
        None => HubClient::new(cli.token.clone()),
    };
    let gateway = Arc::new(HubGateway::new(client));

    if let Commands::Lists = cli.command {
        let lists = gateway.lists().await?;
        if lists.is_empty() {
            println!("No lists on the hub yet.");
        }
        for list in lists {
            println!("{}  {}", list.id, list.name);
        }
        return Ok(());
    }

    let prefs_store = open_prefs(cli.memory_prefs)?;
    let ui_prefs = UiPrefs::load(prefs_store.as_ref());
    let sync = Arc::new(SyncController::new(gateway.clone(), &ui_prefs));

    if let Commands::Watch = cli.command {
        gateway.start_event_pump();
    }

    let bound = match sync.initialize(cli.list.as_deref()).await {
        Ok(list) => list,
        Err(restock_core::Error::NoListsAvailable) => {
            println!("Nothing configured yet - create a list on the hub first.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    match cli.command {
        // Handled before binding
        Commands::Lists => {}
        Commands::Show => {
            print_buckets(&sync, &ui_prefs).await;
        }
        Commands::Add { name } => match sync.add(&name).await? {
            AddOutcome::Added(item) => println!("Added '{}' ({})", item.name, item.id),
            AddOutcome::Existing(id) => {
                println!("'{}' is already on the list ({}). Edit it instead.", name, id)
            }
            AddOutcome::Ignored => println!("Nothing to add."),
        },
        Commands::Toggle { id } => {
            sync.toggle_complete(&id).await;
            print_buckets(&sync, &ui_prefs).await;
        }
        Commands::Edit { id, name, complete } => {
            sync.edit(&id, &name, complete).await;
            print_buckets(&sync, &ui_prefs).await;
        }
        Commands::Remove { id } => {
            sync.remove(&id).await;
            print_buckets(&sync, &ui_prefs).await;
        }
        Commands::Clear => {
            sync.clear_completed().await;
            print_buckets(&sync, &ui_prefs).await;
        }
        Commands::Suggest { query } => {
            let hits = sync.suggest(&query).await;
            if hits.is_empty() {
                println!("No matches.");
            }
            for hit in hits {
                println!("{:<12} {}  ({})", hit.badge, hit.item.name, hit.item.id);
            }
        }
        Commands::Watch => {
            println!("Watching '{}' for changes, ctrl-c to stop.", bound.name);

            let pump = {
                let sync = Arc::clone(&sync);
                tokio::spawn(async move { sync.pump_changes().await })
            };

            tokio::signal::ctrl_c().await?;
            sync.shutdown().await;
            pump.await?;
        }
    }

    sync.shutdown().await;
    Ok(())
}

fn open_prefs(in_memory: bool) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    if in_memory {
        return Ok(Arc::new(MemoryPrefs::new()));
    }

    let dir = dirs::data_dir()
        .context("could not locate a data directory")?
        .join("restock");
    std::fs::create_dir_all(&dir)?;
    Ok(Arc::new(SqlitePrefs::new(dir.join("prefs.db"))?))
}

async fn print_buckets(sync: &SyncController, prefs: &UiPrefs) {
    let buckets = sync.buckets().await;
    print_section("To buy", &buckets.active, prefs.sections.active);
    print_section("Recently bought", &buckets.recent, prefs.sections.recent);
    print_section("Rarely bought", &buckets.rare, prefs.sections.rare);
}

fn print_section(title: &str, items: &[Item], expanded: bool) {
    println!("{} ({})", title, items.len());
    if !expanded {
        return;
    }

    for item in items {
        let mark = if item.complete { "x" } else { " " };
        let last = item
            .last_updated
            .map(|stamp| stamp.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  [{}] {:<24} {}  bought {} times, last {}",
            mark, item.name, item.id, item.counter, last
        );
    }
}
