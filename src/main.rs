use anyhow::Result;
use clap::{Parser, Subcommand};
use statik::build::build_site;
use statik::config::Config;
use statik::pages::registry;
use statik::serve::serve;
use std::path::PathBuf;

/// Statik builds a personal blog: markdown posts in, static HTML, an Atom
/// feed and content-hashed assets out.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// A directory inside the project. `statik.yaml` is looked up from
    /// here through every parent directory.
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Writes the site here instead of the configured output directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build deletes the output directory and rebuilds the whole site.
    Build,

    /// Serve builds the site, serves it locally, and rebuilds and reloads
    /// open pages whenever a source file changes.
    Serve {
        /// The HTTP port. Live reload uses the port after it.
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = main_result().await {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

async fn main_result() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_directory(&cli.project, cli.output.as_deref())?;
    let registry = registry();

    match cli.command {
        Commands::Build => {
            build_site(&config, &registry).await?;
            Ok(())
        }
        Commands::Serve { port } => serve(config, registry, port).await,
    }
}
