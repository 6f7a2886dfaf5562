use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::domain::status::WatchStatus;
use crate::listing::SortOrder;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "watchlist")]
#[command(bin_name = "watchlist")]
#[command(version)]
#[command(about = "Track series you are watching, planning, or done with")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "WATCHLIST_DB_PATH",
        default_value = ".watchlist/watchlist.sqlite",
        help = "Path to the SQLite document store."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        env = "WATCHLIST_CONFIG",
        default_value = ".watchlist/config.toml",
        help = "Path to the optional TOML config file."
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Add a series.")]
    Add(AddArgs),
    #[command(about = "List series with filter, search, and sort.")]
    Ls(ListArgs),
    #[command(about = "Show one series card.")]
    Show(ShowArgs),
    #[command(about = "Edit a series: stage field changes, then save them together.")]
    Edit(EditArgs),
    #[command(about = "Mark one more episode as watched.")]
    Inc(IdArgs),
    #[command(about = "Change the watch status of a series.")]
    Status(StatusArgs),
    #[command(about = "Delete a series.")]
    Rm(IdArgs),
    #[command(about = "Import series from a CSV file with a header row.")]
    Import(ImportArgs),
    #[command(about = "Export every series to CSV.")]
    Export(ExportArgs),
    #[command(about = "Print shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(help = "Series title.")]
    pub title: String,

    #[arg(long, default_value_t = 0, help = "Number of seasons.")]
    pub seasons: u32,

    #[arg(long = "total", default_value_t = 0, help = "Total episode count.")]
    pub total_episodes: u32,

    #[arg(long = "watched", default_value_t = 0, help = "Episodes watched so far.")]
    pub watched_episodes: u32,

    #[arg(
        short = 's',
        long,
        value_parser = parse_status,
        help = "Watch status (defaults to 'Plan to watch')."
    )]
    pub status: Option<WatchStatus>,

    #[arg(short = 'p', long, help = "Person associated with the series.")]
    pub person: Option<String>,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(short = 's', long, value_parser = parse_status, help = "Only show this status.")]
    pub status: Option<WatchStatus>,

    #[arg(short = 'q', long, help = "Case-insensitive title search.")]
    pub search: Option<String>,

    #[arg(long, value_parser = parse_sort, help = "Title order: asc|desc (config default).")]
    pub sort: Option<SortOrder>,

    #[arg(short = 'r', long, help = "Reverse the title order.")]
    pub reverse: bool,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Series id.")]
    pub id: String,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(help = "Series id.")]
    pub id: String,

    #[arg(long, help = "New title; cannot be blank.")]
    pub title: Option<String>,

    #[arg(long, help = "New number of seasons.")]
    pub seasons: Option<String>,

    #[arg(long = "total", help = "New total episode count.")]
    pub total_episodes: Option<String>,

    #[arg(long = "watched", help = "New watched episode count.")]
    pub watched_episodes: Option<String>,

    #[arg(short = 's', long, help = "New watch status.")]
    pub status: Option<String>,

    #[arg(short = 'p', long, help = "Person; an empty value clears it.")]
    pub person: Option<String>,

    #[arg(long, help = "Show the staged card without saving.")]
    pub dry_run: bool,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Series id.")]
    pub id: String,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(help = "Series id.")]
    pub id: String,

    #[arg(value_parser = parse_status, help = "New watch status.")]
    pub status: WatchStatus,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(help = "CSV file whose header names series fields.")]
    pub file: PathBuf,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(short = 'o', long, help = "Output path (config export.file_name by default).")]
    pub out: Option<PathBuf>,

    #[arg(long, conflicts_with = "out", help = "Write CSV to standard output.")]
    pub stdout: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for (detected from $SHELL).")]
    pub shell: Option<Shell>,
}

fn parse_status(raw: &str) -> Result<WatchStatus, String> {
    raw.parse::<WatchStatus>().map_err(|err| err.to_string())
}

fn parse_sort(raw: &str) -> Result<SortOrder, String> {
    raw.parse::<SortOrder>().map_err(|err| err.to_string())
}
