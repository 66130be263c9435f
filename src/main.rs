mod cli;
mod core;
mod error;
mod tui;

use crate::cli::{Cli, Commands, LogFormat, OutputFormat, RunArgs, SearchArgs};
use crate::core::{
    Discovery, OpenAiChat, Pipeline, SearchService, TranscriptService, extract_video_id,
    join_segments, parse_languages, render_json, render_text,
};
use crate::error::{Error, Result};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        error!(error = %e, "run failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "vidigest=info",
        1 => "vidigest=debug",
        _ => "vidigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run_digest(args).await,
        Some(Commands::Search(args)) => run_search(args).await,
        Some(Commands::Transcript { video, languages }) => {
            run_transcript(video, languages).await
        }
        None => run_digest(cli.run).await,
    }
}

async fn run_digest(args: RunArgs) -> Result<()> {
    let settings = args.settings()?;
    let model_config = args.model_config()?;

    info!(
        topic = %settings.topic,
        max_items = settings.max_items,
        model = %model_config.model,
        "starting digest"
    );

    let discovery = SearchService::new()?;
    let transcripts = TranscriptService::new(settings.languages.clone())?;
    let model = OpenAiChat::new(model_config);

    let digest = Pipeline::new(&settings, &discovery, &transcripts)
        .run(model)
        .await?;

    if args.tui {
        tui::view(&digest)?;
    } else {
        match args.format {
            OutputFormat::Text => print!("{}", render_text(&digest)),
            OutputFormat::Json => println!("{}", render_json(&digest)?),
        }
    }

    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let settings = args.settings()?;
    let discovery = SearchService::new()?;

    let ids = discovery
        .search(&settings.topic, &settings.filter, settings.max_items)
        .await?;

    if ids.is_empty() {
        println!("No videos found.");
        return Ok(());
    }

    for (idx, id) in ids.iter().enumerate() {
        println!("{:>3}. {id}  https://youtu.be/{id}", idx + 1);
    }

    Ok(())
}

async fn run_transcript(video_input: String, languages: String) -> Result<()> {
    let video_id = extract_video_id(&video_input)
        .ok_or_else(|| Error::custom("Invalid video URL or ID"))?;

    let languages = parse_languages(&languages);
    if languages.is_empty() {
        return Err(Error::config("at least one transcript language is required"));
    }

    let service = TranscriptService::new(languages)?;
    let transcript = service.fetch(&video_id).await?;
    let text = join_segments(transcript.snippets.iter().map(|s| s.text.as_str()));

    if text.is_empty() {
        return Err(Error::transcript(format!("{video_id}: transcript is empty")));
    }

    println!("{}", textwrap::fill(&text, 100));
    Ok(())
}
