use std::io::{self, IsTerminal};

use crate::card::CardMode;
use crate::domain::series::{format_percentage, SeriesRecord};
use crate::domain::status::WatchStatus;
use crate::listing::ListParams;
use crate::transfer::ImportSummary;

const BAR_WIDTH: usize = 20;

pub fn print_series_list(records: &[SeriesRecord], params: &ListParams) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Watchlist"));
    println!("{}", palette.dim(&filter_summary(params)));

    if records.is_empty() {
        println!("{}", palette.dim("no series matched"));
        return;
    }

    for record in records {
        println!("{}", format_series_row(record, &palette));
    }
    println!("{}", palette.dim(&format!("{} series", records.len())));
}

pub fn print_card(record: &SeriesRecord, mode: CardMode) {
    let palette = Palette::auto();
    let fields = &record.fields;
    let heading = match mode {
        CardMode::Viewing => fields.title.clone(),
        CardMode::Editing => format!("{} (editing)", fields.title),
    };
    println!("{}", palette.heading(&heading));
    println!("  id        {}", palette.id(&record.id));
    println!("  status    {}", palette.status(fields.status));
    println!("  seasons   {}", fields.seasons);
    println!(
        "  episodes  {}/{}",
        fields.watched_episodes, fields.total_episodes
    );
    println!("  progress  {}", progress_bar(record.progress(), &palette));
    if let Some(person) = fields.person.as_deref() {
        println!("  person    {}", person);
    }
}

pub fn print_import_summary(summary: &ImportSummary) {
    let palette = Palette::auto();
    println!(
        "import {} rows_read={} created={} skipped={}",
        summary.status, summary.rows_read, summary.created, summary.skipped
    );
    if let (Some(row), Some(message)) = (summary.failed_row, summary.last_error.as_deref()) {
        println!("{}", palette.dim(&format!("  stopped at line {row}: {message}")));
    }
}

fn format_series_row(record: &SeriesRecord, palette: &Palette) -> String {
    let fields = &record.fields;
    let mut line = format!(
        "{} {} {} {}/{} {}",
        palette.id(&record.id),
        palette.status(fields.status),
        fields.title,
        fields.watched_episodes,
        fields.total_episodes,
        progress_bar(record.progress(), palette)
    );
    if let Some(person) = fields.person.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("@{person}")));
    }
    line
}

fn progress_bar(percentage: f64, palette: &Palette) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    );
    format!(
        "{} {}%",
        palette.paint(progress_color_code(percentage), &bar),
        format_percentage(percentage)
    )
}

fn filter_summary(params: &ListParams) -> String {
    let mut parts = Vec::new();
    if let Some(status) = params.status {
        parts.push(format!("status={status}"));
    }
    if let Some(search) = params.search.as_deref().filter(|term| !term.is_empty()) {
        parts.push(format!("search={search}"));
    }
    parts.push(format!("sort={}", params.sort));
    parts.join(" ")
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn status(&self, status: WatchStatus) -> String {
        self.paint(status_color_code(status), &format!("[{status}]"))
    }
}

fn status_color_code(status: WatchStatus) -> &'static str {
    match status {
        WatchStatus::Completed => "32",
        WatchStatus::Watching => "34",
        WatchStatus::OnHold => "33",
        WatchStatus::Dropped => "31",
        WatchStatus::PlanToWatch => "37",
    }
}

fn progress_color_code(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "32"
    } else if percentage >= 50.0 {
        "34"
    } else if percentage >= 25.0 {
        "33"
    } else {
        "31"
    }
}
