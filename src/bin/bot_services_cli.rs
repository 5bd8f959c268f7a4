//! bot-services CLI: 从命令行调用各项机器人服务
//!
//! Usage:
//!   bot-services-cli download <url> [--format mp4|mp3] [--platform <name>]
//!   bot-services-cli search <query> [--count <n>]
//!   bot-services-cli translate <text> [--to <lang>]
//!   bot-services-cli probe

use anyhow::{bail, Context};
use bot_services::{Platform, ServiceFacade};
use serde::Serialize;

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--format", "--platform", "--count", "--to"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    match command {
        "version" | "--version" | "-V" => {
            cmd_version();
            return Ok(());
        }
        "help" | "--help" | "-h" => {
            print_usage();
            return Ok(());
        }
        _ => {}
    }

    let facade = ServiceFacade::builder()
        .build()
        .context("cannot build service facade")?;
    let rest = &args[2..];

    match command {
        "download" => cmd_download(&facade, rest).await,
        "search" => {
            let count = flag_value(rest, "--count")
                .map(|c| c.parse::<usize>())
                .transpose()
                .context("--count must be a number")?;
            print_result(facade.search_video(&text_arg(rest), count).await)
        }
        "music" => print_result(facade.search_music(&text_arg(rest)).await),
        "chat" => print_result(facade.chat(&text_arg(rest)).await),
        "image" => print_result(facade.text_to_image(&text_arg(rest)).await),
        "removebg" => print_result(facade.remove_background(&text_arg(rest)).await),
        "upscale" => print_result(facade.upscale_image(&text_arg(rest)).await),
        "translate" => {
            let to = flag_value(rest, "--to");
            print_result(facade.translate(&text_arg(rest), to.as_deref()).await)
        }
        "short" => print_result(facade.shorten_url(&text_arg(rest)).await),
        "weather" => print_result(facade.weather(&text_arg(rest)).await),
        "sticker" => {
            let animated = rest.iter().any(|a| a == "--animated");
            print_result(facade.text_sticker(&text_arg(rest), animated))
        }
        "probe" => cmd_probe(&facade).await,
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"bot-services-cli - 机器人服务命令行工具

USAGE:
    bot-services-cli <COMMAND> [ARGS] [OPTIONS]

COMMANDS:
    download <url> [--format <f>] [--platform <p>]
                                Download media (platform detected from the URL)
    search <query> [--count <n>]
                                Search videos (count 1..=50, default 1)
    music <query>               Search a track with a preview clip
    chat <prompt>               Ask the chat providers
    image <prompt>              Generate an image
    removebg <image_url>        Remove an image background
    upscale <image_url>         Upscale an image
    translate <text> [--to <lang>]
                                Translate text (default language from config)
    short <url>                 Shorten a URL
    weather <city>              Current weather
    sticker <text> [--animated] Text sticker URL
    probe                       Check a sample of capabilities
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    BOT_SERVICES_CONFIG         YAML configuration file
    BOT_SERVICES_TIMEOUT_SECS   Per-call timeout in seconds
    BOT_SERVICES_BASE_URL       Aggregator base URL
    BOT_SERVICES_DEFAULT_LANG   Default target language
    <NAME>_API_KEY              API keys (RAPIDAPI, YOUTUBE, OPENWEATHERMAP, REMOVEBG, CHAT)
    RUST_LOG                    Log filter"#
    );
}

fn cmd_version() {
    println!("bot-services-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Positional arguments joined with spaces, flags and their values removed.
fn text_arg(args: &[String]) -> String {
    let mut words = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip = true;
        } else if !arg.starts_with("--") {
            words.push(arg.as_str());
        }
    }
    words.join(" ")
}

fn print_result<T: Serialize>(result: bot_services::Result<T>) -> anyhow::Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}

async fn cmd_download(facade: &ServiceFacade, args: &[String]) -> anyhow::Result<()> {
    let url = text_arg(args);
    let format = flag_value(args, "--format");
    match flag_value(args, "--platform").as_deref() {
        None => print_result(facade.download_auto(&url, format.as_deref()).await),
        Some(name) => {
            let platform = match name.to_lowercase().as_str() {
                "youtube" => Platform::Youtube,
                "tiktok" => Platform::Tiktok,
                "instagram" => Platform::Instagram,
                other => bail!("unknown platform '{other}' (youtube, tiktok, instagram)"),
            };
            print_result(facade.download_media(platform, &url, format.as_deref()).await)
        }
    }
}

async fn cmd_probe(facade: &ServiceFacade) -> anyhow::Result<()> {
    let report = facade.probe().await;

    println!("{:<22} {:<8} {:>10}  {}", "capability", "status", "time", "detail");
    println!("{}", "-".repeat(72));
    for entry in &report.entries {
        let detail = match (&entry.provider, &entry.error) {
            (Some(p), _) => p.clone(),
            (None, Some(e)) => e.clone(),
            (None, None) => String::new(),
        };
        println!(
            "{:<22} {:<8} {:>8}ms  {}",
            entry.capability.name(),
            if entry.ok { "OK" } else { "FAIL" },
            entry.duration_ms,
            detail
        );
    }

    let failed = report.failures().count();
    println!();
    println!("{}/{} capabilities reachable", report.entries.len() - failed, report.entries.len());
    if !report.all_ok() {
        std::process::exit(2);
    }
    Ok(())
}
