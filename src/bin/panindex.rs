use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use panindex::cache::object_store::JsonDirObjectStore;
use panindex::core::config::{Config, SortBackend};
use panindex::core::indexer::{PanIndexer, SearchParams};
use panindex::schema::collections;
use panindex::sort::spec::parse_sort_list;

#[derive(Parser)]
#[command(name = "panindex")]
#[command(about = "Cached, sortable search over pangenome collections", long_about = None)]
struct Args {
    /// JSON config file (index directories, sort backend, limits)
    #[arg(long, env = "PANINDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Root for both index directories; overrides the config file
    #[arg(long, env = "PANINDEX_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Overrides `sort-backend` from the config file
    #[arg(long, value_enum)]
    sort_backend: Option<SortBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one collection of an object
    Search {
        /// Directory of `<ref with '/' as '_'>.json` objects
        #[arg(long, env = "PANINDEX_OBJECTS")]
        objects: PathBuf,

        /// orthologs, families, functions or genomes
        #[arg(long)]
        collection: String,

        #[arg(long = "ref")]
        object_ref: String,

        #[arg(long, default_value = "")]
        query: String,

        /// e.g. `id:desc,type`
        #[arg(long, default_value = "")]
        sort: String,

        #[arg(long)]
        start: Option<usize>,

        #[arg(long)]
        limit: Option<usize>,

        /// Total from an earlier search with the same ref and query
        #[arg(long)]
        num_found: Option<usize>,
    },
    /// List cached tables of a collection
    Tables {
        #[arg(long)]
        collection: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(root) = &args.cache_dir {
        config.pangenome_index_dir = root.join("pangenome_index");
        config.comparison_genome_index_dir = root.join("comparison_genome_index");
    }
    if let Some(backend) = args.sort_backend {
        config.sort_backend = backend;
    }

    match args.command {
        Commands::Search { objects, collection, object_ref, query, sort, start, limit, num_found } => {
            let schema = collections::by_name(&collection)
                .ok_or_else(|| format!("Unknown collection '{}'", collection))?;
            let store = Arc::new(JsonDirObjectStore::new(objects));
            let indexer = PanIndexer::new(config, store)?;

            let params = SearchParams {
                object_ref: Some(object_ref),
                query: Some(query),
                sort_by: Some(parse_sort_list(&sort)?),
                start,
                limit,
                num_found,
            };
            let result = indexer.search(&schema.name, None, &params)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Tables { collection } => {
            let schema = collections::by_name(&collection)
                .ok_or_else(|| format!("Unknown collection '{}'", collection))?;
            let store = Arc::new(JsonDirObjectStore::new(PathBuf::from(".")));
            let indexer = PanIndexer::new(config, store)?;

            for table in indexer.list_tables(&schema.name)? {
                let modified = table
                    .modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>12}  {}  {}  {}",
                    table.size_bytes,
                    modified,
                    if table.sorted { "sorted" } else { "base  " },
                    table.path.display()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_backend_is_a_closed_set() {
        let args = Args::try_parse_from(["panindex", "--sort-backend", "merge", "tables", "--collection", "families"])
            .unwrap();
        assert_eq!(args.sort_backend, Some(SortBackend::Merge));

        let rejected = Args::try_parse_from(["panindex", "--sort-backend", "quick", "tables", "--collection", "families"]);
        assert!(rejected.is_err());
    }
}
