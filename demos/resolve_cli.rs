use clap::Parser;
use colored::Colorize;
use link_card::{
    log_error_card, log_link_card, setup_logging, CardLayout, CardView, LinkData, LinkResolver,
    LogConfig, ResolveError, ResolverConfig, ResolverSession,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "resolve_cli", about = "Resolve links into preview cards")]
struct Args {
    /// URLs to resolve, in order
    #[arg(required = true)]
    urls: Vec<String>,

    /// JSON file with resolver settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each card as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also emit boxed log cards
    #[arg(long)]
    log_cards: bool,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn print_card(view: &CardView) {
    println!("\n{} {}", "Card".bold().blue(), view.domain.dimmed());
    match &view.layout {
        CardLayout::Default { title, description } => {
            println!("{}: {}", "Title".bold(), title);
            println!("{}: {}", "Description".bold(), description);
        }
        CardLayout::Music {
            title,
            artist,
            platform,
        } => {
            println!("{}: {}", "Song".bold(), title);
            println!("{}: {}", "Artist".bold(), artist);
            if let Some(platform) = platform {
                println!("{}: {:?}", "Platform".bold(), platform);
            }
        }
        CardLayout::News {
            headline,
            byline,
            description,
            ..
        } => {
            println!("{}: {}", "Headline".bold(), headline);
            if !byline.is_empty() {
                println!("{}", byline.italic());
            }
            println!("{}: {}", "Description".bold(), description);
        }
    }
    println!(
        "{}: {}",
        "Image".bold(),
        if view.image.is_some() { "inlined" } else { "none" }
    );
}

/// Resolves `url`, waiting out the cooldown once if the resolver asks for it.
async fn resolve_patiently(
    resolver: &dyn LinkResolver,
    url: &str,
) -> Result<LinkData, ResolveError> {
    match resolver.resolve(url).await {
        Err(ResolveError::RateLimited { retry_after }) => {
            println!(
                "{} waiting {}ms before {}",
                "Cooldown:".yellow(),
                retry_after.as_millis(),
                url
            );
            tokio::time::sleep(retry_after).await;
            resolver.resolve(url).await
        }
        result => result,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();

    setup_logging(LogConfig {
        log_level: args.log_level.clone(),
        ..LogConfig::default()
    })?;

    let config = match &args.config {
        Some(path) => {
            let mut config = ResolverConfig::from_json(&std::fs::read_to_string(path)?)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => ResolverConfig::from_env(),
    };

    let session = ResolverSession::new(config);

    for url in &args.urls {
        match resolve_patiently(&session, url).await {
            Ok(link) => {
                if args.log_cards {
                    log_link_card(&link);
                }
                let view = CardView::from_link(&link);
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                } else {
                    print_card(&view);
                }
            }
            Err(e) => {
                if args.log_cards {
                    log_error_card(url, &e);
                }
                eprintln!("{}: {} - {}", "Error".bold().red(), url, e);
            }
        }
    }

    Ok(())
}
