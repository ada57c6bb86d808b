use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cqlindex::analysis::Analyzer;
use cqlindex::compiler::{render_sort_keys, sort_fields, SortKey};
use cqlindex::sru::{HttpTransport, RecordSlot, SearchParams, SruResultIterator};
use cqlindex::{
    DocumentExpander, ExpansionStrategy, FieldSchema, IteratorConfig, QueryCompiler, SchemaConfig,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "cqlindex")]
#[command(about = "CQL query compilation, document expansion and SRU paging", long_about = None)]
struct Args {
    /// Schema configuration (.json or properties file)
    #[arg(long, global = true, env = "CQLINDEX_SCHEMA")]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile CQL text into a native query
    Compile {
        /// CQL query text
        query: String,
    },

    /// Resolve SRU sort keys to physical sort fields
    Sort {
        /// Space separated sort keys, e.g. "dc.title,,0 dc.date"
        keys: String,
    },

    /// Expand a source XML document into physical index fields
    Expand {
        /// Source document, or "-" for standard input
        #[arg(default_value = "-")]
        input: String,

        #[arg(long, value_enum, default_value = "cql")]
        strategy: Strategy,

        /// Also print the analyzed postings
        #[arg(long)]
        analyze: bool,

        /// Base fields holding dates
        #[arg(long, value_delimiter = ',')]
        date_fields: Vec<String>,
    },

    /// Page through an SRU endpoint and print each record
    Fetch {
        /// SRU base URL
        #[arg(long, env = "CQLINDEX_SRU_URL")]
        url: String,

        /// CQL query text
        query: String,

        #[arg(long)]
        record_schema: Option<String>,

        /// Logical sort keys, resolved through the schema
        #[arg(long)]
        sort_keys: Option<String>,

        #[arg(long, default_value = "25")]
        page_size: usize,

        /// Result set time-to-live in seconds; 0 omits the parameter
        #[arg(long, default_value = "15")]
        ttl: u32,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<u64>,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Cql,
    Gsearch,
}

impl From<Strategy> for ExpansionStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Cql => ExpansionStrategy::CqlStyle,
            Strategy::Gsearch => ExpansionStrategy::GSearchStyle,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    debug!("cqlindex v{}", cqlindex::VERSION);

    let config = match &args.schema {
        Some(path) => SchemaConfig::load(path)
            .with_context(|| format!("Failed to load schema from {}", path.display()))?,
        None => SchemaConfig::default(),
    };
    let schema = Arc::new(FieldSchema::new(&config));

    match args.command {
        Command::Compile { query } => {
            let compiler = QueryCompiler::new(schema);
            println!("{}", compiler.compile_str(&query)?);
        }
        Command::Sort { keys } => {
            let keys = SortKey::parse_list(&keys)?;
            for field in sort_fields(&keys, &schema) {
                println!("{}", field);
            }
            println!("sortKeys={}", render_sort_keys(&keys, &schema));
        }
        Command::Expand {
            input,
            strategy,
            analyze,
            date_fields,
        } => {
            let xml = read_input(&input)?;
            let expander = DocumentExpander::new(schema.clone()).with_strategy(strategy.into());
            let entry = expander.convert(&xml)?;

            if analyze {
                let analyzer = Analyzer::new(schema).with_date_fields(date_fields);
                let output = serde_json::json!({
                    "fields": entry.fields(),
                    "postings": analyzer.analyze_entry(&entry),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string_pretty(entry.fields())?);
            }
        }
        Command::Fetch {
            url,
            query,
            record_schema,
            sort_keys,
            page_size,
            ttl,
            limit,
            timeout,
        } => {
            let iter_config = IteratorConfig::default()
                .with_page_size(page_size)
                .with_result_set_ttl(if ttl == 0 { None } else { Some(ttl) });
            let mut params = SearchParams::new(url, query).with_config(iter_config);
            if let Some(record_schema) = record_schema {
                params = params.with_record_schema(record_schema);
            }

            let transport = HttpTransport::with_timeout(Duration::from_secs(timeout))?;
            let mut iter = SruResultIterator::new(transport, params);
            if let Some(keys) = sort_keys {
                iter = iter.with_sort_keys(&SortKey::parse_list(&keys)?, &schema);
            }

            info!("{} records", iter.size()?);
            let mut printed = 0u64;
            while iter.has_next()? {
                if limit.map(|limit| printed >= limit).unwrap_or(false) {
                    break;
                }
                match iter.next_record()? {
                    RecordSlot::Record(xml) => println!("{}", xml),
                    RecordSlot::Missing { position } => println!("<!-- record {} missing -->", position + 1),
                }
                printed += 1;
            }
        }
    }

    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}
