//! Interactive terminal front end: load a medical image, analyze it with
//! Grok, optionally have the findings re-explained for a five-year-old.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use termimad::{MadSkin, crossterm::style::Color};

use mediscan::config::API_KEY_VAR;
use mediscan::{Config, Error, GrokClient, ImageUpload, Session};

#[derive(Parser, Debug)]
#[command(author, version, about = "Medical image analysis using a multimodal LLM (Grok xAI)", long_about = None)]
struct Args {
    /// Image to load on startup (jpg, jpeg or png)
    image: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Chat completion endpoint (overrides config)
    #[arg(long)]
    api_url: Option<String>,
}

fn create_markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();

    // Headers
    skin.headers[0].set_fg(Color::Cyan);
    skin.headers[1].set_fg(Color::Blue);
    skin.headers[2].set_fg(Color::Green);

    // Code blocks
    skin.code_block.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Yellow);

    // Bold and italic
    skin.bold.set_fg(Color::White);
    skin.italic.set_fg(Color::Magenta);

    skin
}

fn print_preview(image: &ImageUpload) {
    println!(
        "Loaded: {} ({}, {} bytes)",
        image.name(),
        image.format().media_type(),
        image.len()
    );
}

fn print_help() {
    println!("Commands:");
    println!("  /load <path>   Load a jpg, jpeg or png image");
    println!("  /analyze       Analyze the loaded image");
    println!("  /eli5          Explain the last analysis like I'm 5");
    println!("  /help          Show this help");
    println!("  exit           Quit");
}

fn load_image(session: &mut Session, path: impl AsRef<std::path::Path>) {
    match ImageUpload::from_path(path) {
        Ok(image) => {
            print_preview(&image);
            session.upload(image);
        }
        Err(e) => eprintln!("{e}"),
    }
}

/// API errors are rendered in the result area like any other text; the
/// loop carries on afterwards.
fn render_outcome(skin: &MadSkin, outcome: Result<String, Error>) {
    match outcome {
        Ok(text) => {
            println!();
            skin.print_text(&text);
            println!();
        }
        Err(e @ Error::Api { .. }) => {
            println!();
            skin.print_text(&e.to_string());
            println!();
        }
        Err(e) => eprintln!("{e}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Cannot load configuration from {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(model) = args.model {
        config.api.model = model;
    }
    if let Some(url) = args.api_url {
        config.api.url = url;
    }

    let api_key = std::env::var(API_KEY_VAR)
        .with_context(|| format!("{API_KEY_VAR} is not set - export it or put it in .env"))?;

    let client = GrokClient::with_config(&config.api, api_key);
    let mut session = Session::new();
    let skin = create_markdown_skin();

    println!(
        "Mediscan v{} - Medical Help using a Multimodal LLM (Grok xAI)\n",
        env!("CARGO_PKG_VERSION")
    );
    println!("Upload a medical-related image to get an AI-based analysis using");
    println!("Grok (xAI) with vision capabilities.\n");
    println!("Model: {}\n", client.model());

    if let Some(path) = &args.image {
        load_image(&mut session, path);
        println!();
    }

    print_help();
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        let (command, rest) = input
            .split_once(' ')
            .map_or((input, ""), |(c, rest)| (c, rest.trim()));

        match (command, rest) {
            ("/help", _) => print_help(),
            ("/load", "") => eprintln!("Usage: /load <path>"),
            ("/load", path) => load_image(&mut session, path),
            ("/analyze", _) => {
                if session.uploaded().is_none() {
                    eprintln!("No image loaded yet - use /load <path> first.");
                    continue;
                }
                println!("Analyzing the image with Grok...");
                let outcome = session.analyze(&client).await;
                let succeeded = outcome.is_ok();
                render_outcome(&skin, outcome);
                if succeeded {
                    println!("Want a simple explanation? Try /eli5");
                }
            }
            ("/eli5", _) => {
                if session.last_result().is_none() {
                    eprintln!("Nothing to simplify yet - run /analyze first.");
                    continue;
                }
                println!("Simplifying...");
                render_outcome(&skin, session.simplify(&client).await);
            }
            _ => eprintln!("Unknown command: {input} (try /help)"),
        }
    }

    println!("Goodbye!");
    Ok(())
}
