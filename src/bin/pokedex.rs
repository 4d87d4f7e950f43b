use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pokedex_catalog::app::Catalog;
use pokedex_catalog::config::ConfigLoader;
use pokedex_catalog::domain::SpriteVariant;
use pokedex_catalog::error::PokedexError;
use pokedex_catalog::fetch::HttpFetcher;
use pokedex_catalog::output::{JsonOutput, LogSink, OutputMode, TextOutput};
use pokedex_catalog::page::{Filters, PageRequest};
use pokedex_catalog::store::Store;

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(about = "Browse PokéAPI pokemon page by page, or from a locally seeded catalogue")]
#[command(version, author)]
struct Cli {
    /// Path to a pokedex.json config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List one page of pokemon from the live API")]
    Page(PageArgs),
    #[command(about = "Show a single pokemon with its species entry and forms")]
    Show(ShowArgs),
    #[command(about = "Import the whole collection into the local catalogue")]
    Seed,
    #[command(about = "List pokemon from the local catalogue")]
    Stored,
    #[command(about = "List the available type and habitat filters")]
    Filters,
    #[command(about = "Delete the local catalogue")]
    Clear,
}

#[derive(Args)]
struct PageArgs {
    /// 1-based page number
    #[arg(long)]
    page: Option<usize>,

    /// Case-insensitive name substring
    #[arg(long)]
    name: Option<String>,

    /// Type name substring
    #[arg(long = "type")]
    type_name: Option<String>,

    /// Habitat name substring
    #[arg(long)]
    habitat: Option<String>,
}

#[derive(Args)]
struct ShowArgs {
    /// Species id or name
    id: String,

    /// Alternate form to display instead of the default one
    #[arg(long)]
    form: Option<String>,

    #[arg(long, value_enum, default_value_t = SpriteVariant::Default)]
    variant: SpriteVariant,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PokedexError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PokedexError) -> u8 {
    match error {
        PokedexError::PokemonNotFound(_)
        | PokedexError::ConfigRead(_)
        | PokedexError::ConfigParse(_)
        | PokedexError::InvalidConfig(_) => 2,
        PokedexError::Fetch(_) | PokedexError::MalformedPayload { .. } => 3,
        PokedexError::StoreLocked(_) => 4,
        _ => 1,
    }
}

async fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Page(args) => {
            let fetcher = HttpFetcher::new(config.request_timeout)?;
            let catalog = Catalog::new(fetcher, config);
            let request = PageRequest::new(
                args.page,
                Filters::new(args.name, args.type_name, args.habitat),
            );
            let page = catalog.page(&request, &LogSink).await?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_page(&page),
                OutputMode::Text => TextOutput::print_page(&page),
            };
            printed.into_diagnostic()
        }
        Commands::Show(args) => {
            let fetcher = HttpFetcher::new(config.request_timeout)?;
            let catalog = Catalog::new(fetcher, config);
            let details = catalog
                .details(&args.id, args.form.as_deref(), args.variant)
                .await?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_details(&details),
                OutputMode::Text => TextOutput::print_details(&details),
            };
            printed.into_diagnostic()
        }
        Commands::Seed => {
            let fetcher = HttpFetcher::new(config.request_timeout)?;
            let catalog = Catalog::new(fetcher, config);
            let store = Store::new()?;
            let report = catalog.seed(&store, &LogSink).await?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_seed(&report),
                OutputMode::Text => TextOutput::print_seed(&report),
            };
            printed.into_diagnostic()
        }
        Commands::Stored => {
            let rows = Store::new()?.read_all()?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_stored(&rows),
                OutputMode::Text => TextOutput::print_stored(&rows),
            };
            printed.into_diagnostic()
        }
        Commands::Filters => {
            let fetcher = HttpFetcher::new(config.request_timeout)?;
            let catalog = Catalog::new(fetcher, config);
            let options = catalog.filter_options().await?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_options(&options),
                OutputMode::Text => TextOutput::print_options(&options),
            };
            printed.into_diagnostic()
        }
        Commands::Clear => {
            Store::new()?.clear()?;
            Ok(())
        }
    }
}
