use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_harvester::batch::{BatchOptions, BatchOrchestrator, Collection, ResultSet};
use transcript_harvester::captions::{CaptionResolver, YtDlpCaptionService};
use transcript_harvester::cli::{Cli, Commands, FetchArgs};
use transcript_harvester::config::Config;
use transcript_harvester::listing::{Item, ItemLister, YtDlpLister};
use transcript_harvester::output::ResultWriter;
use transcript_harvester::{rubric, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "transcript_harvester=debug,harvester=debug"
    } else {
        "transcript_harvester=info,harvester=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let config = match &cli.command {
        // Scoring only needs the report path; a broken config must not block it
        Commands::Score { .. } => Config::load(cli.config.as_deref())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring unusable config, using defaults: {:#}", e);
                Config::default()
            }),
        _ => Config::load(cli.config.as_deref()).await?,
    };

    match cli.command {
        Commands::Fetch {
            ids,
            ids_file,
            label,
            fetch,
        } => {
            let mut ids = ids;
            if let Some(path) = ids_file {
                let content = fs_err::read_to_string(&path).context("Failed to read ids file")?;
                ids.extend(utils::parse_id_list(&content));
            }
            if ids.is_empty() {
                anyhow::bail!("No video ids given; pass ids or --ids-file");
            }

            let items: Vec<Item> = ids
                .iter()
                .map(|id| Item::new(id.as_str(), "", label.as_str()))
                .collect();

            let (orchestrator, writer) = build_orchestrator(&config, &fetch, cli.quiet).await?;
            let results = orchestrator.run(&items, ResultSet::new()).await;
            finish_run(&writer, &results)?;
        }
        Commands::Channels {
            collections,
            max_items,
            fetch,
        } => {
            let default_max = config.fetch.max_items_per_collection;
            let collections: Vec<Collection> = if collections.is_empty() {
                config.fetch.collections.clone()
            } else {
                collections
            }
            .into_iter()
            .map(|c| Collection {
                max_items: max_items.or(c.max_items).or(Some(default_max)),
                ..c
            })
            .collect();

            if collections.is_empty() {
                anyhow::bail!("No channels given and none configured under fetch.collections");
            }

            let (orchestrator, writer) = build_orchestrator(&config, &fetch, cli.quiet).await?;
            let results = orchestrator
                .run_from_collections(&collections, ResultSet::new())
                .await;
            finish_run(&writer, &results)?;
        }
        Commands::List { url, max_items } => {
            let url = utils::validate_and_normalize_url(&url)?;
            let lister = YtDlpLister::new(&config.tools.yt_dlp_path, config.listing_timeout());
            let items = lister.list_items(&url, None).await;

            println!("{}", url);
            println!("  Total videos: {}", items.len());
            for threshold in [10_000, 5_000, 3_000] {
                let count = items.iter().filter(|i| i.view_count() >= threshold).count();
                println!("  {}+ views: {}", threshold, count);
            }

            println!("\n  Top {} videos:", max_items.min(items.len()));
            for (rank, item) in items.iter().take(max_items).enumerate() {
                println!(
                    "    {}. {} {:>8} views {:>10}  {}",
                    rank + 1,
                    item.id(),
                    item.view_count(),
                    utils::format_duration(item.duration()),
                    utils::truncate_for_display(item.title(), 50)
                );
            }
        }
        Commands::Score { path } => {
            let report = rubric::score_file(&path)?;
            print!("{}", rubric::render(&report));

            let report_path = &config.scorer.report_path;
            match rubric::save_json(&report, report_path) {
                Ok(()) => println!("\nDetailed report saved to: {}", report_path.display()),
                Err(e) => tracing::warn!("Could not save JSON report: {:#}", e),
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the configuration file to change settings:");
                println!("  {}", Config::user_config_path()?.display());
            }
        }
    }

    Ok(())
}

async fn build_orchestrator(
    config: &Config,
    args: &FetchArgs,
    quiet: bool,
) -> Result<(BatchOrchestrator, ResultWriter)> {
    let missing_deps = utils::check_dependencies(&config.tools.yt_dlp_path).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
    }

    let mut config = config.clone();
    if !args.languages.is_empty() {
        config.fetch.languages = args.languages.clone();
    }
    if let Some(delay) = args.delay {
        config.fetch.delay_seconds = delay;
    }
    if let Some(dir) = &args.output_dir {
        config.fetch.output_dir = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.fetch.prefix = prefix.clone();
    }
    config.validate()?;

    let writer = ResultWriter::new(&config.fetch.output_dir, &config.fetch.prefix)?;
    let service = YtDlpCaptionService::new(&config.tools.yt_dlp_path, config.http_timeout())?;
    let lister = YtDlpLister::new(&config.tools.yt_dlp_path, config.listing_timeout());

    let options = BatchOptions {
        languages: config.fetch.languages.clone(),
        delay: config.delay(),
        show_progress: !quiet,
    };

    let orchestrator = BatchOrchestrator::new(
        CaptionResolver::new(Box::new(service)),
        Box::new(lister),
        options,
    )
    .with_writer(writer.clone());

    Ok((orchestrator, writer))
}

fn finish_run(writer: &ResultWriter, results: &ResultSet) -> Result<()> {
    let saved = writer.save_all(results.outcomes())?;

    println!("\n{}", "=".repeat(60));
    println!("{}", style("FINAL SUMMARY").bold());
    println!("{}", "=".repeat(60));
    println!("{}", results.summary());
    println!("\nManifest: {}", saved.manifest.display());
    println!("Summary:  {}", saved.summary.display());
    println!("Combined: {}", saved.combined.display());
    println!("Transcripts: {}", writer.individual_dir().display());

    Ok(())
}
