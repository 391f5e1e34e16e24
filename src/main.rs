use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use setfinder_cv::{DeferringLabeler, DetectionConfig, Result, SetDetector};
use std::path::PathBuf;

mod console;
mod game;

use console::ConsoleLabeler;

#[derive(Parser)]
#[command(name = "setfinder")]
#[command(about = "Find SET cards in a photo, label them and list every set")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// JSON detection config; missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of color-count-shade-shape reference images.
    #[arg(long, global = true)]
    references: Option<PathBuf>,

    /// Directory for written images.
    #[arg(long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect and label the cards of a game photo and print every set.
    Solve {
        image: PathBuf,

        /// Write the photo with the sets outlined to this path.
        #[arg(long)]
        annotate: Option<PathBuf>,

        /// Write a JSON report to this path.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Ask on the terminal for cards that cannot be labelled automatically.
        #[arg(long)]
        interactive: bool,

        /// Seed for the set outline colours.
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Write each rectified card of a game photo as cardNN.jpg.
    FindCards { image: PathBuf },

    /// Cut the first symbol out of labelled card images to make reference exemplars.
    ExtractSymbols {
        #[arg(required = true)]
        cards: Vec<PathBuf>,
    },

    /// Print the automatic label of a single card image.
    Classify { card: PathBuf },

    /// Score automatic labels against the file names of labelled card images.
    Accuracy { dir: PathBuf },

    /// Label every card of a game photo by hand and save them as <label>.jpg.
    Label { image: PathBuf },
}

fn load_config(common: &CommonArgs) -> Result<DetectionConfig> {
    let mut config = match &common.config {
        Some(path) => DetectionConfig::from_file(path)?,
        None => DetectionConfig::default(),
    };
    if let Some(dir) = &common.references {
        config.reference_dir = dir.clone();
    }
    if let Some(dir) = &common.output {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn stdin_labeler(config: &DetectionConfig) -> ConsoleLabeler<std::io::StdinLock<'static>, std::io::Stdout> {
    ConsoleLabeler::new(std::io::stdin().lock(), std::io::stdout(), &config.output_dir)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.common)?;

    match cli.command {
        Commands::Solve {
            image,
            annotate,
            json,
            interactive,
            seed,
        } => {
            let detector = SetDetector::from_config(config.clone())?;
            let result = if interactive {
                game::solve(&detector, &image, &mut stdin_labeler(&config))?
            } else {
                game::solve(&detector, &image, &mut DeferringLabeler)?
            };
            if result.stats.unresolved > 0 {
                tracing::warn!(
                    "{} cards could not be labelled; rerun with --interactive to label them",
                    result.stats.unresolved
                );
            }

            if let Some(path) = annotate {
                game::annotate(&config, &image, &result, &path, seed)?;
            }
            if let Some(path) = json {
                result.report().export_json(&path)?;
                tracing::info!("Report written to {:?}", path);
            }
        }

        Commands::FindCards { image } => {
            for path in game::find_cards(&config, &image, &config.output_dir)? {
                println!("{}", path.display());
            }
        }

        Commands::ExtractSymbols { cards } => {
            let out_dir = cli.common.output.unwrap_or_else(|| config.reference_dir.clone());
            for path in game::extract_symbols(&config, &cards, &out_dir)? {
                println!("{}", path.display());
            }
        }

        Commands::Classify { card } => {
            let detector = SetDetector::from_config(config)?;
            let label = game::classify_card(&detector, &card)?;
            match label.resolve() {
                Some(label) => println!("{}", label),
                None => println!("inconclusive, missing {}", label.missing().join(", ")),
            }
        }

        Commands::Accuracy { dir } => {
            let detector = SetDetector::from_config(config)?;
            game::accuracy(&detector, &dir)
                .with_context(|| format!("Accuracy run over {:?} failed", dir))?
                .print();
        }

        Commands::Label { image } => {
            let written = game::label_cards(
                &config,
                &image,
                &config.output_dir,
                &mut stdin_labeler(&config),
            )?;
            println!("{} labelled cards written to {}", written.len(), config.output_dir.display());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse())
}
