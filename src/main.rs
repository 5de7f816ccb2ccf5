mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use vetpanel::config::AppConfig;
use vetpanel::infra::export::csv::columns_for;
use vetpanel::infra::import::open_source;
use vetpanel::infra::sqlite::queries::{list_snapshots, purge_snapshots};
use vetpanel::infra::sqlite::repo::{CachingSource, SnapshotSource};
use vetpanel::ui::state::view_state::ViewState;
use vetpanel::usecase::services::export_service::ExportService;
use vetpanel::usecase::services::view_service::{SourcedView, ViewService};
use vetpanel::{FieldAccessor, RecordBatch, RecordFields, RecordSource, ViewSpec};

use crate::cli::{Cli, Commands, ViewArgs};

fn main() -> Result<()> {
    vetpanel::logging::init()?;
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    match cli.command {
        Commands::View(args) => run_view(&config, &args),
        Commands::Export {
            view,
            output,
            all_pages,
        } => run_export(&config, &view, &output, all_pages),
        Commands::Snapshots => run_snapshots(&config),
        Commands::PurgeCache { name } => {
            let removed = purge_snapshots(&config.cache_path, &name)?;
            println!("removed {removed} snapshot(s) of {name}");
            Ok(())
        }
    }
}

fn build_source(config: &AppConfig, args: &ViewArgs) -> Result<Arc<dyn RecordSource>> {
    let file_source = open_source(&args.path, args.sheet.clone())?;

    let source: Arc<dyn RecordSource> = if args.from_cache {
        Arc::new(SnapshotSource {
            db_path: config.cache_path.clone(),
            source_name: file_source.name().to_string(),
        })
    } else if args.cache {
        Arc::new(CachingSource::new(file_source, config.cache_path.clone()))
    } else {
        Arc::from(file_source)
    };
    Ok(source)
}

fn build_service(config: &AppConfig, args: &ViewArgs) -> Result<ViewService> {
    let fetch_limit = match args.limit {
        Some(0) => None,
        Some(limit) => Some(limit),
        None => config.fetch_limit,
    };
    Ok(ViewService::new(build_source(config, args)?, fetch_limit))
}

fn build_spec(config: &AppConfig, args: &ViewArgs, batch: &RecordBatch) -> ViewSpec {
    let search_fields = if args.fields.is_empty() {
        columns_for(&batch.records)
    } else {
        args.fields.clone()
    };
    let mut state = ViewState::new(search_fields, args.page_size.unwrap_or(config.page_size));

    state.begin_search();
    state.set_search(args.search.clone());
    state.finish_interaction();
    for (key, value) in &args.filters {
        state.open_filter();
        state.select_filter(key.clone(), value.clone());
    }
    if let Some(sort) = &args.sort {
        state.toggle_sort(sort.clone());
        if args.desc {
            state.toggle_sort(sort.clone());
        }
    }
    state.go_to_page(args.page);
    state.to_spec()
}

fn display_columns(args: &ViewArgs, batch: &RecordBatch) -> Vec<String> {
    if args.columns.is_empty() {
        columns_for(&batch.records)
    } else {
        args.columns.clone()
    }
}

fn run_view(config: &AppConfig, args: &ViewArgs) -> Result<()> {
    let service = build_service(config, args)?;
    let batch = service.load()?;
    let spec = build_spec(config, args, &batch);
    let view = service.view(&batch, &spec)?;

    print_view(&display_columns(args, &batch), &view);
    Ok(())
}

fn print_view(columns: &[String], view: &SourcedView) {
    println!("{}", columns.join("\t"));
    for record in &view.result.items {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                RecordFields
                    .field_text(record, column)
                    .map(|value| value.into_owned())
                    .unwrap_or_default()
            })
            .collect();
        println!("{}", row.join("\t"));
    }
    println!(
        "{} | page {}/{} | {} fetched {}",
        view.summary(),
        view.result.page,
        view.result.total_pages,
        view.source,
        view.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut hints = Vec::new();
    if view.result.has_prev() {
        hints.push(format!("previous: --page {}", view.result.page - 1));
    }
    if view.result.has_next() {
        hints.push(format!("next: --page {}", view.result.page + 1));
    }
    if !hints.is_empty() {
        println!("{}", hints.join(" | "));
    }
}

fn run_export(
    config: &AppConfig,
    args: &ViewArgs,
    output: &std::path::Path,
    all_pages: bool,
) -> Result<()> {
    let service = build_service(config, args)?;
    let batch = service.load()?;
    let mut spec = build_spec(config, args, &batch);
    if all_pages {
        spec.page = 1;
        spec.page_size = i64::try_from(batch.records.len().max(1)).unwrap_or(i64::MAX);
    }
    let view = service.view(&batch, &spec)?;

    let written = ExportService::new(args.columns.clone())
        .export_to_path(output, &view.result.items)?;
    info!(rows = written, total = view.result.total_items, "export finished");
    println!("wrote {written} row(s) to {}", output.display());
    Ok(())
}

fn run_snapshots(config: &AppConfig) -> Result<()> {
    let snapshots = list_snapshots(&config.cache_path)?;
    if snapshots.is_empty() {
        println!("no snapshots in {}", config.cache_path.display());
        return Ok(());
    }
    for snapshot in snapshots {
        let truncated = if snapshot.truncated { " (truncated)" } else { "" };
        println!(
            "#{}\t{}\t{} rows{}\t{}",
            snapshot.id,
            snapshot.source_name,
            snapshot.row_count,
            truncated,
            snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
