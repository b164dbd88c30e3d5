use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

mod catalogue;
mod chat;
mod config;
mod embedder;
mod store;
#[cfg(test)]
mod tests;
mod web;

use chat::{DialogueResolver, InMemoryConversationStore};
use config::Config;
use embedder::FastembedEmbedder;
use store::{CsvOrderStore, CsvProductSource};

#[derive(Parser)]
#[command(name = "plumbot", about = "Conversational product-lookup assistant")]
struct Args {
    /// Path to the config file (created with defaults if missing)
    #[arg(long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook daemon
    Daemon {},

    /// Rank catalogue entries against a query and print them as JSON
    Search {
        query: String,

        #[arg(long, default_value_t = 3)]
        top_n: usize,
    },

    /// Send a single message through the resolver and print the reply
    Ask {
        message: String,

        /// Sender id the conversation state is keyed by
        #[arg(long, default_value = "cli")]
        from: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(Path::new(&args.config));

    match args.command {
        Command::Daemon {} => {
            let resolver = build_resolver(&config)?;
            web::start_daemon(resolver, &config.listen_addr);
            Ok(())
        }

        Command::Search { query, top_n } => {
            let store = build_catalogue_store(&config)?;
            let snapshot = store.ensure_loaded()?;
            let embedder = store.embedder();
            let matches = catalogue::rank(&snapshot, embedder.as_ref(), &query, top_n)?;
            println!("{}", serde_json::to_string_pretty(&matches)?);
            Ok(())
        }

        Command::Ask { message, from } => {
            let resolver = build_resolver(&config)?;
            println!("{}", resolver.handle_message(&message, &from));
            Ok(())
        }
    }
}

fn build_catalogue_store(config: &Config) -> anyhow::Result<Arc<catalogue::CatalogueStore>> {
    let embedder = FastembedEmbedder::new(
        &config.embedding.model,
        config.embedding.cache_dir.clone().into(),
        Some(Duration::from_secs(config.embedding.download_timeout_secs)),
    )?;

    Ok(Arc::new(catalogue::CatalogueStore::new(
        Box::new(CsvProductSource::new(&config.catalogue_csv)),
        Arc::new(embedder),
    )))
}

fn build_resolver(config: &Config) -> anyhow::Result<Arc<DialogueResolver>> {
    let catalogue = build_catalogue_store(config)?;
    let orders = Arc::new(CsvOrderStore::new(&config.orders_csv));
    let conversations = Arc::new(InMemoryConversationStore::new(config.pending_ttl_secs));

    Ok(Arc::new(DialogueResolver::new(
        catalogue,
        orders,
        conversations,
        config.payment_base_url.clone(),
        config.upi_id.clone(),
        config.top_n,
    )))
}
