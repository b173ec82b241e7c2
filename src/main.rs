use anyhow::Result;
use clap::{Parser, Subcommand};
use qamask::commands;
use qamask::config::Config;
use qamask::models::Split;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "qamask",
    version,
    about = "Create masked KBQA datasets from LC-QuAD 2.0",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect WikiData identifiers from a split's SPARQL answers
    Collect {
        /// Dataset split to work on
        #[arg(short, long, value_enum)]
        split: Split,
    },

    /// Retrieve labels for collected identifiers from WikiData
    Label {
        /// Dataset split to work on
        #[arg(short, long, value_enum)]
        split: Split,

        /// Language to retrieve labels in (overrides config)
        #[arg(short, long)]
        language: Option<String>,

        /// Identifiers per query before saving to disk
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        part_size: Option<u64>,
    },

    /// Replace special symbols and HTML entities in a question file
    Sanitise {
        /// Name of the file to load (without .json)
        #[arg(long)]
        load_file_name: String,

        /// Name of the file to save to (without .json)
        #[arg(long)]
        save_file_name: String,
    },

    /// Mask question-answer pairs of a split
    Mask {
        /// Dataset split to work on
        #[arg(short, long, value_enum)]
        split: Split,

        /// Language of questions and labels (overrides config)
        #[arg(short, long)]
        language: Option<String>,

        /// Minimum accepted label-match fraction (overrides config)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Question file to load (without .json)
        #[arg(long)]
        load_file_name: Option<String>,

        /// Masked output file to save (without .json)
        #[arg(long)]
        save_file_name: Option<String>,
    },

    /// Post-process and partition a masked split into line files
    Finalise {
        /// Dataset split to work on
        #[arg(short, long, value_enum)]
        split: Split,

        /// Language of the masked questions (overrides config)
        #[arg(short, long)]
        language: Option<String>,

        /// Fraction of the train split that goes to validation
        #[arg(long, default_value = "0.1")]
        fraction_to_validate: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    tracing::info!("qamask dataset creation starting");

    let config = Config::from_env();

    match cli.command {
        Commands::Collect { split } => {
            tracing::info!(split = %split, "starting collect command");
            commands::collect::run(&config, split)?;
        }

        Commands::Label {
            split,
            language,
            part_size,
        } => {
            let language = language.unwrap_or_else(|| config.masking.language.clone());
            let part_size = part_size.map_or(config.wikidata.part_size, |n| n as usize);
            tracing::info!(
                split = %split,
                language = %language,
                part_size = %part_size,
                "starting label command"
            );
            commands::label::run(&config, split, &language, part_size).await?;
        }

        Commands::Sanitise {
            load_file_name,
            save_file_name,
        } => {
            tracing::info!(
                load = %load_file_name,
                save = %save_file_name,
                "starting sanitise command"
            );
            commands::sanitise::run(&config, &load_file_name, &save_file_name)?;
        }

        Commands::Mask {
            split,
            language,
            threshold,
            load_file_name,
            save_file_name,
        } => {
            let language = language.unwrap_or_else(|| config.masking.language.clone());
            let threshold = threshold.unwrap_or(config.masking.threshold);
            let load_name = load_file_name
                .unwrap_or_else(|| commands::mask::default_questions_name(split, &language));
            let save_name = save_file_name
                .unwrap_or_else(|| commands::mask::default_output_name(split, &language));
            tracing::info!(
                split = %split,
                language = %language,
                threshold = %threshold,
                load = %load_name,
                save = %save_name,
                "starting mask command"
            );
            commands::mask::run(&config, split, &language, threshold, &load_name, &save_name)?;
        }

        Commands::Finalise {
            split,
            language,
            fraction_to_validate,
        } => {
            let language = language.unwrap_or_else(|| config.masking.language.clone());
            tracing::info!(
                split = %split,
                language = %language,
                fraction_to_validate = %fraction_to_validate,
                "starting finalise command"
            );
            commands::finalise::run(&config, split, &language, fraction_to_validate)?;
        }
    }

    tracing::info!("qamask completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("qamask=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("qamask=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
