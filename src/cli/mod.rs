//! CLI parser and dispatch.

mod request;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use jsonpedia::render::ElementFilter;
use jsonpedia::{ClientConfig, JsonPedia, Processor, ProcessorChain, RequestParams};

#[derive(Parser)]
#[command(name = "jsonpedia")]
#[command(about = "Query the JSONpedia annotation and storage service")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Service host (overrides config file and JSONPEDIA_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Service port (overrides config file and JSONPEDIA_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Print the request URL instead of sending it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a Wikipedia resource (e.g. en:Albert_Einstein)
    Annotate {
        /// Entity id, forwarded verbatim
        entity: String,
        /// Processors to run, comma separated (extractors,linkers,splitters,structure,validate)
        #[arg(short, long, value_delimiter = ',')]
        procs: Vec<Processor>,
        /// Request the HTML render instead of JSON
        #[arg(long)]
        html: bool,
        /// Report elements whose itemtype starts with this prefix (HTML only)
        #[arg(long, requires = "html")]
        type_filter: Option<String>,
        /// Report elements whose name starts with this prefix (HTML only)
        #[arg(long, requires = "html")]
        name_filter: Option<String>,
    },

    /// Query the MongoDB storage
    Mongo {
        #[command(subcommand)]
        command: MongoCommands,
    },

    /// Query the Elasticsearch storage
    Elastic {
        #[command(subcommand)]
        command: ElasticCommands,
    },

    /// Send a request described in a TOML or JSON file
    Run {
        /// Request file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum MongoCommands {
    /// Select documents
    Select {
        /// Selector, e.g. "_id = #736 -> title"
        query: String,
        /// Result filter, e.g. "@type : link"
        filter: String,
        /// Maximum number of results
        #[arg(default_value = "10")]
        limit: u64,
    },
    /// Run a map-reduce job
    Mapred {
        /// Selection criteria
        criteria: String,
        /// Map function source
        map: String,
        /// Reduce function source
        reduce: String,
        /// Maximum number of results
        #[arg(default_value = "10")]
        limit: u64,
    },
}

#[derive(Subcommand)]
enum ElasticCommands {
    /// Full-text select
    Select {
        /// Query text
        query: String,
        /// Result filter, e.g. "@type : link"
        filter: String,
        /// Maximum number of results
        #[arg(default_value = "10")]
        limit: u64,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = Some(port);
    }
    let jsonpedia = JsonPedia::from_config(&config)?;

    let mut element_filter = None;
    let dispatcher = match cli.command {
        Commands::Annotate {
            entity,
            procs,
            html,
            type_filter,
            name_filter,
        } => {
            let chain = procs
                .into_iter()
                .fold(jsonpedia.annotate(entity), ProcessorChain::processor);
            if html {
                if type_filter.is_some() || name_filter.is_some() {
                    element_filter = Some(ElementFilter::new(
                        type_filter.unwrap_or_default(),
                        name_filter.unwrap_or_default(),
                    ));
                }
                chain.html()
            } else {
                chain.json()
            }
        }
        Commands::Mongo { command } => match command {
            MongoCommands::Select {
                query,
                filter,
                limit,
            } => jsonpedia.mongo().select(query, filter, limit),
            MongoCommands::Mapred {
                criteria,
                map,
                reduce,
                limit,
            } => jsonpedia.mongo().mapred(criteria, map, reduce, limit),
        },
        Commands::Elastic {
            command:
                ElasticCommands::Select {
                    query,
                    filter,
                    limit,
                },
        } => jsonpedia.elastic().select(query, filter, limit),
        Commands::Run { file } => jsonpedia.request(RequestParams::from_path(&file)?)?,
    };

    if cli.dry_run {
        println!("{}", dispatcher.url()?);
        return Ok(());
    }

    request::cmd_send(&dispatcher, element_filter.as_ref()).await
}
