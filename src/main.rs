//! CLI entry point for `sql2scaffold`.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use sql2scaffold::config::{parse_query_arg, ScaffoldConfig};
use sql2scaffold::definition::DefinitionRegistry;
use sql2scaffold::executor::SqliteExecutor;
use sql2scaffold::generator::pipeline;
use sql2scaffold::mapping::query::NamedQuery;
use sql2scaffold::output::{materializer, report};
use sql2scaffold::ScaffoldError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "sql2scaffold",
    about = "Scaffold SQLite parser plugins and formatters from a sample database and queries"
)]
struct Cli {
    /// TOML batch configuration; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample SQLite database
    #[arg(long)]
    database: Option<PathBuf>,

    /// Plugin name, e.g. "Chrome History"
    #[arg(long)]
    plugin_name: Option<String>,

    /// Registered definition to generate for
    #[arg(long)]
    definition: Option<String>,

    /// Root of the target project
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Named query, appended after configured queries (repeatable)
    #[arg(long = "query", value_name = "NAME=SQL", value_parser = parse_query_arg)]
    queries: Vec<NamedQuery>,

    /// Rows sampled per query
    #[arg(long)]
    row_cap: Option<usize>,

    /// Execute statements that are not plain data retrieval
    #[arg(long)]
    allow_mutating_queries: bool,

    /// Plan and render without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Print the analysed queries as JSON instead of the markdown report
    #[arg(long)]
    print_model: bool,

    /// List registered definitions and exit
    #[arg(long)]
    list_definitions: bool,

    /// Print verbose diagnostics
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            2
        }
    };
    process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "sql2scaffold=debug"
    } else {
        "sql2scaffold=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Exit code 0 when everything succeeded, 1 when some query or artifact failed.
fn run(cli: Cli) -> Result<i32, ScaffoldError> {
    let registry = DefinitionRegistry::with_builtin_definitions();
    if cli.list_definitions {
        for name in registry.list() {
            println!("{name}");
        }
        return Ok(0);
    }

    let config = resolve_config(cli.config.as_deref(), &cli)?;
    config.validate()?;

    let definition = registry.get(&config.definition)?;
    let mut executor = SqliteExecutor::new().with_row_cap(config.row_cap);
    let generation = pipeline::run(&mut executor, definition.as_ref(), &config.to_request())?;

    if !cli.dry_run {
        materializer::write_artifacts(generation.artifacts())?;
    }

    if cli.print_model {
        let json = serde_json::to_string_pretty(&generation.mapped)
            .map_err(|e| ScaffoldError::Config(format!("unable to serialise model: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", report::build_report(&generation));
    }

    Ok(if generation.is_complete() { 0 } else { 1 })
}

fn resolve_config(path: Option<&std::path::Path>, cli: &Cli) -> Result<ScaffoldConfig, ScaffoldError> {
    let mut config = match path {
        Some(path) => ScaffoldConfig::load(path)?,
        None => ScaffoldConfig::default(),
    };

    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(plugin_name) = &cli.plugin_name {
        config.plugin_name = plugin_name.clone();
    }
    if let Some(definition) = &cli.definition {
        config.definition = definition.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(row_cap) = cli.row_cap {
        config.row_cap = row_cap;
    }
    if cli.allow_mutating_queries {
        config.allow_mutating_queries = true;
    }
    config.queries.extend(cli.queries.iter().cloned());
    Ok(config)
}
