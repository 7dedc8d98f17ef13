//! Command handlers.

use super::commands::{Cli, Commands};
use chrono::Utc;
use img10::{
    ContentHash, IngestOutcome, IngestRequest, IngestionPipeline, PipelineConfig, ThumbnailSpec,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Build the pipeline from layered configuration and run the command.
pub async fn execute(cli: Cli) -> CliResult {
    let config = PipelineConfig::load(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");
    let pipeline = IngestionPipeline::from_config(config).await?;
    let json = cli.json;

    match cli.command {
        Commands::Ingest {
            file,
            specs,
            declared,
        } => ingest(&pipeline, &file, specs, declared, json).await,

        Commands::Thumbnail { hash, spec, out } => {
            thumbnail(&pipeline, &hash, &spec, out.as_deref(), json).await
        }

        Commands::Original { hash, out } => original(&pipeline, &hash, out.as_deref(), json).await,

        Commands::Status { hash, spec } => {
            let status = pipeline.thumbnail_status(&hash, &spec).await?;
            if json {
                print_json(&serde_json::json!({ "hash": hash, "spec": spec, "status": status }))
            } else {
                println!("{} {}: {}", hash, spec, status);
                Ok(())
            }
        }

        Commands::Invalidate { hash, spec } => {
            let removed = pipeline.invalidate(&hash, &spec).await?;
            if json {
                print_json(&serde_json::json!({ "hash": hash, "spec": spec, "removed": removed }))
            } else {
                if removed {
                    println!("Invalidated {} {}", hash, spec);
                } else {
                    println!("No rendition recorded for {} {}", hash, spec);
                }
                Ok(())
            }
        }

        Commands::Show { hash } => show(&pipeline, &hash, json).await,

        Commands::Stats => {
            let stats = pipeline.stats().await?;
            if json {
                return print_json(&stats);
            }
            let index = &stats.index;
            println!("Assets:      {} ({} bytes)", index.total_assets, index.total_bytes);
            println!(
                "Renditions:  {} ready, {} failed",
                index.ready_thumbnails, index.failed_thumbnails
            );
            println!(
                "Storage:     {} bytes originals, {} bytes thumbnails",
                stats.originals_bytes, stats.thumbnails_bytes
            );
            println!("In flight:   {}", stats.in_flight);
            if let (Some(oldest), Some(newest)) = (index.oldest, index.newest) {
                println!(
                    "Uploaded:    {} .. {}",
                    oldest.format("%Y-%m-%d %H:%M"),
                    newest.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }

        Commands::Cleanup => {
            let removed = pipeline.cleanup_expired(Utc::now()).await?;
            if json {
                print_json(&serde_json::json!({ "removed": removed }))
            } else {
                println!("Removed {} expired assets", removed);
                Ok(())
            }
        }

        Commands::Health => {
            let report = pipeline.health().await;
            if json {
                print_json(&report)?;
            } else {
                for (name, component) in [
                    ("originals", &report.originals),
                    ("thumbnails", &report.thumbnails),
                    ("index", &report.index),
                ] {
                    match &component.detail {
                        Some(detail) => println!("{:<12} FAIL {}", name, detail),
                        None => println!("{:<12} ok", name),
                    }
                }
            }
            if !report.healthy {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn ingest(
    pipeline: &IngestionPipeline,
    file: &Path,
    specs: Vec<ThumbnailSpec>,
    declared: Option<String>,
    json: bool,
) -> CliResult {
    let bytes = tokio::fs::read(file).await?;
    info!(file = %file.display(), size = bytes.len(), "Read upload");

    let mut request = IngestRequest::new(bytes).with_specs(specs);
    if let Some(declared) = declared {
        request = request.with_declared_type(declared);
    }
    let outcome = pipeline.ingest(request).await?;

    if json {
        return print_json(&outcome);
    }
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &IngestOutcome) {
    let asset = &outcome.asset;
    println!(
        "{} {} ({}, {} bytes)",
        if outcome.deduplicated { "Existing" } else { "Stored" },
        asset.hash(),
        outcome.media_type,
        asset.size_bytes()
    );
    for report in &outcome.renditions {
        let spec = report.spec.canonical();
        let status = report.status.to_string();
        match (&report.location, &report.error) {
            (Some(location), _) => println!("  {:<28} {:<8} {}", spec, status, location),
            (None, Some(error)) => println!(
                "  {:<28} {:<8} {}: {}",
                spec,
                status,
                report.category.as_deref().unwrap_or("error"),
                error
            ),
            (None, None) => println!("  {:<28} {}", spec, status),
        }
    }
    if outcome.degraded {
        println!("Some renditions failed; they are retried on the next request");
    }
}

async fn thumbnail(
    pipeline: &IngestionPipeline,
    hash: &ContentHash,
    spec: &ThumbnailSpec,
    out: Option<&Path>,
    json: bool,
) -> CliResult {
    let rendition = pipeline.retrieve(hash, spec).await?;
    let written: Option<PathBuf> = match out {
        Some(path) => {
            tokio::fs::write(path, &rendition.bytes).await?;
            Some(path.to_path_buf())
        }
        None => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "thumbnail": rendition.thumbnail,
            "size_bytes": rendition.bytes.len(),
            "cache_hit": rendition.cache_hit,
            "written_to": written,
        }));
    }

    let thumbnail = &rendition.thumbnail;
    println!(
        "{} {}: {}x{} ({} bytes, {})",
        hash,
        spec,
        thumbnail.width().unwrap_or_default(),
        thumbnail.height().unwrap_or_default(),
        rendition.bytes.len(),
        if rendition.cache_hit { "cached" } else { "generated" }
    );
    if let Some(path) = written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn original(
    pipeline: &IngestionPipeline,
    hash: &ContentHash,
    out: Option<&Path>,
    json: bool,
) -> CliResult {
    let asset = pipeline.asset(hash).await?;
    let bytes = pipeline.original(hash).await?;
    if let Some(path) = out {
        tokio::fs::write(path, &bytes).await?;
    }

    if json {
        return print_json(&serde_json::json!({
            "asset": asset,
            "size_bytes": bytes.len(),
            "written_to": out,
        }));
    }

    println!("{} ({}, {} bytes)", hash, asset.media_type(), bytes.len());
    if let Some(path) = out {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn show(pipeline: &IngestionPipeline, hash: &ContentHash, json: bool) -> CliResult {
    let asset = pipeline.asset(hash).await?;
    let thumbnails = pipeline.thumbnails(hash).await?;

    if json {
        return print_json(&serde_json::json!({ "asset": asset, "thumbnails": thumbnails }));
    }

    println!("Asset {}", asset.hash());
    println!("  Type:     {}", asset.media_type());
    println!("  Size:     {} bytes", asset.size_bytes());
    if let (Some(width), Some(height)) = (asset.width(), asset.height()) {
        println!("  Pixels:   {}x{}", width, height);
    }
    println!("  Uploaded: {}", asset.created_at().format("%Y-%m-%d %H:%M:%S"));
    println!("  Location: {}", asset.location());
    println!("Renditions: {}", thumbnails.len());
    for thumbnail in &thumbnails {
        let spec = thumbnail.spec().canonical();
        let status = thumbnail.status().to_string();
        match thumbnail.error() {
            Some(error) => println!("  {:<28} {:<8} {}", spec, status, error),
            None => println!("  {:<28} {}", spec, status),
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
