mod config;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use buildcast_core::{Credential, PhaseCatalog};
use clap::{Parser, Subcommand};
use colored::Colorize;
use events::EventBus;
use imagen::{AspectRatio, ImagenClient, OutputMimeType};
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::SequenceOrchestrator;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{config_path, resolve_credential, CliConfig, API_KEY_ENV, MAX_STAGES};

const DEFAULT_PROMPT: &str =
    "A futuristic eco-friendly skyscraper with vertical gardens, in a bustling metropolis at sunset.";

#[derive(Parser)]
#[command(name = "buildcast")]
#[command(about = "Watch a building rise, one generated image per construction stage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the construction sequence and save the images
    Generate {
        /// Description of the building
        #[arg(default_value = DEFAULT_PROMPT)]
        prompt: String,

        /// Number of construction stages
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_STAGES as i64))]
        stages: Option<u32>,

        /// Directory the images are written to
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// One of 1:1, 3:4, 4:3, 9:16, 16:9
        #[arg(long, default_value = "1:1", value_parser = parse_aspect_ratio)]
        aspect_ratio: AspectRatio,

        /// API key, overrides the environment and the saved key
        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        /// Print every sequence event as a JSON line on stdout
        #[arg(long)]
        events: bool,
    },
    /// Show the prompt each stage would use, without calling the API
    Phases {
        #[arg(default_value = DEFAULT_PROMPT)]
        prompt: String,

        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_STAGES as i64))]
        stages: Option<u32>,
    },
    /// Manage the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save an API key
    SetKey { key: String },
    /// Remove the saved API key
    ClearKey,
    /// Print the current configuration
    Show,
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let path = config_path();
    let config = CliConfig::load(&path).await?;

    match cli.command {
        Commands::Generate {
            prompt,
            stages,
            out_dir,
            aspect_ratio,
            api_key,
            model,
            base_url,
            events,
        } => {
            let credential =
                resolve_credential(api_key, std::env::var(API_KEY_ENV).ok(), &config)
                    .unwrap_or_default();
            let options = GenerateOptions {
                stages: stages.unwrap_or(config.default_stages) as usize,
                out_dir: out_dir.unwrap_or_else(|| config.output_dir.clone()),
                aspect_ratio,
                model: model.unwrap_or_else(|| config.model.clone()),
                base_url: base_url.unwrap_or_else(|| config.api_base_url.clone()),
                print_events: events,
            };
            generate(&config, credential, &prompt, options).await
        }
        Commands::Phases { prompt, stages } => {
            let catalog = config.phase_catalog()?;
            let stages = stages.unwrap_or(config.default_stages) as usize;
            print_phases(&catalog, &prompt, stages);
            Ok(())
        }
        Commands::Config { action } => run_config(action, config, path).await,
    }
}

struct GenerateOptions {
    stages: usize,
    out_dir: PathBuf,
    aspect_ratio: AspectRatio,
    model: String,
    base_url: String,
    print_events: bool,
}

async fn generate(
    config: &CliConfig,
    credential: Credential,
    prompt: &str,
    options: GenerateOptions,
) -> Result<()> {
    let catalog = config.phase_catalog()?;
    tracing::info!(
        model = %options.model,
        stages = options.stages,
        aspect_ratio = options.aspect_ratio.as_str(),
        "Generating construction sequence"
    );

    let bus = EventBus::new();
    let printer = options.print_events.then(|| {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => match serde_json::to_string(&envelope) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event printer fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let client = ImagenClient::new(&options.base_url, &options.model);
    let orchestrator = SequenceOrchestrator::new(client)
        .with_catalog(catalog)
        .with_image_options(options.aspect_ratio, OutputMimeType::Jpeg)
        .with_events(bus.clone());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = orchestrator
        .generate_sequence(&credential, prompt, options.stages, &mut |message: &str| {
            spinner.set_message(message.to_string())
        })
        .await;

    spinner.finish_and_clear();

    // close the bus so the printer drains and exits
    drop(orchestrator);
    drop(bus);
    if let Some(handle) = printer {
        handle.await.context("Event printer task failed")?;
    }

    let images = match result {
        Ok(images) => images,
        Err(e) => {
            if e.is_configuration() {
                eprintln!(
                    "Set a key with {} or the {} environment variable.",
                    "buildcast config set-key <KEY>".cyan(),
                    API_KEY_ENV
                );
            }
            return Err(e.into());
        }
    };

    let paths = output::write_images(&options.out_dir, &images).await?;

    println!();
    println!(
        "{} {} stage(s) for \"{}\"",
        "Generated".green().bold(),
        paths.len(),
        prompt
    );
    for path in &paths {
        println!("  {}", path.display());
    }
    println!();

    Ok(())
}

fn parse_aspect_ratio(value: &str) -> std::result::Result<AspectRatio, String> {
    AspectRatio::parse(value)
        .ok_or_else(|| format!("unsupported aspect ratio '{}', expected 1:1, 3:4, 4:3, 9:16 or 16:9", value))
}

fn print_phases(catalog: &PhaseCatalog, prompt: &str, stages: usize) {
    println!();
    for stage in 0..stages {
        println!(
            "{} {}",
            format!("Stage {:>2}:", stage + 1).cyan().bold(),
            catalog.stage_prompt(prompt, stage, stages)
        );
    }
    println!();
}

async fn run_config(action: ConfigAction, mut config: CliConfig, path: PathBuf) -> Result<()> {
    match action {
        ConfigAction::SetKey { key } => {
            if Credential::new(key.as_str()).is_blank() {
                anyhow::bail!("API key must not be empty");
            }
            config.api_key = Some(key);
            config.save(&path).await?;
            println!("API key saved to {}", path.display());
        }
        ConfigAction::ClearKey => {
            config.api_key = None;
            config.save(&path).await?;
            println!("API key removed from {}", path.display());
        }
        ConfigAction::Show => {
            let key = config
                .api_key
                .as_deref()
                .map(|k| Credential::new(k).masked())
                .unwrap_or_else(|| "(not set)".to_string());

            println!();
            println!("Config:         {}", path.display());
            println!("API key:        {}", key);
            println!("Model:          {}", config.model);
            println!("API base URL:   {}", config.api_base_url);
            println!("Output dir:     {}", config.output_dir.display());
            println!("Default stages: {}", config.default_stages);
            match &config.phases_file {
                Some(file) => println!("Phases file:    {}", file.display()),
                None => println!("Phases file:    (built-in)"),
            }
            println!();
        }
        ConfigAction::Path => println!("{}", path.display()),
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buildcast=warn,orchestrator=warn,imagen=warn".into()),
        )
        .init();
}
