use anyhow::Result;
use clap::{Parser, Subcommand};
use rhymesnap::app::{render_view, App};
use rhymesnap::models::SUPPORTED_LANGUAGES;
use rhymesnap::session::Phase;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rhymesnap")]
#[command(about = "Turn your photos into poetry")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a poem describing an image.
    Generate {
        /// Path to a photo (JPG, PNG, GIF, WebP, ...).
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Language to write the poem in.
        #[arg(short, long, value_parser = parse_language_arg)]
        language: Option<String>,
    },
    /// Suggest languages commonly spoken at a location.
    SuggestLanguages {
        /// City or country name.
        #[arg(value_name = "LOCATION")]
        location: String,
    },
    /// List the languages offered by default.
    Languages,
    /// Check whether a camera can be used for capture.
    Camera,
}

fn parse_language_arg(input: &str) -> std::result::Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Language must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

async fn run(command: Command) -> Result<bool> {
    match command {
        Command::Languages => {
            for option in SUPPORTED_LANGUAGES {
                println!("{:<10} {}", option.value, option.label);
            }
            Ok(true)
        }
        Command::Generate { image, language } => {
            let app = App::new()?;
            let view = app.generate(&image, language.as_deref()).await?;
            print!("{}", render_view(&view));
            Ok(view.phase == Phase::Succeeded)
        }
        Command::SuggestLanguages { location } => {
            let app = App::new()?;
            let suggestions = app.suggest_languages(&location).await?;
            for language in &suggestions.suggested_languages {
                println!("{}", language);
            }
            Ok(true)
        }
        Command::Camera => {
            let app = App::new()?;
            match app.probe_camera().await {
                Ok(()) => {
                    println!("Camera available");
                    Ok(true)
                }
                Err(e) => {
                    println!("{}: {}", e.title(), e);
                    Ok(false)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rhymesnap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match run(args.command).await {
        Ok(true) => {
            info!("Done");
            Ok(())
        }
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
