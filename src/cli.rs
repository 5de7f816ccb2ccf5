use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vetpanel", about = "Search, filter, sort and page content tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one page of a table
    View(ViewArgs),
    /// Write the visible page (or every matching row) to a CSV file
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Export all matching rows instead of the current page
        #[arg(long)]
        all_pages: bool,
    },
    /// List cached snapshots
    Snapshots,
    /// Delete every cached snapshot of a source
    PurgeCache {
        /// Source name as shown by `snapshots`
        name: String,
    },
}

#[derive(Args, Clone)]
pub struct ViewArgs {
    /// CSV or spreadsheet file holding the records
    pub path: PathBuf,

    /// Worksheet to read. Defaults to the first sheet.
    #[arg(long)]
    pub sheet: Option<String>,

    /// Case-insensitive substring to search for
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Fields to search, comma separated. Defaults to every field.
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Exact-match filter as KEY=VALUE; repeatable. An empty VALUE means all.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Field to sort by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// 1-indexed page; out of range pages are clamped
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Rows per page. Defaults to VETPANEL_PAGE_SIZE.
    #[arg(long, allow_negative_numbers = true)]
    pub page_size: Option<i64>,

    /// Maximum records to fetch; 0 fetches everything. Defaults to VETPANEL_FETCH_LIMIT.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Columns to print or export, comma separated. Defaults to every field.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Save each fetch to the snapshot cache and fall back to it on failure
    #[arg(long)]
    pub cache: bool,

    /// Read the latest cached snapshot instead of the file
    #[arg(long, conflicts_with = "cache")]
    pub from_cache: bool,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}
