mod app;
mod card;
mod cli;
mod completions;
mod config;
mod controller;
mod db;
mod domain;
mod listing;
mod store;
mod transfer;
mod ui;

use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use crate::domain::series::SeriesRecord;

const LOG_ENV: &str = "WATCHLIST_LOG";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("error: could not encode JSON output: {err}"),
    }
}

fn record_json(record: &SeriesRecord) -> Value {
    let mut value = json!(record);
    if let Value::Object(map) = &mut value {
        map.insert("progress".to_string(), json!(record.progress()));
    }
    value
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<(), app::AppError> {
    use card::{CardMode, EditField};
    use clap::Parser;
    use cli::Commands;
    use domain::series::SeriesFields;
    use listing::ListParams;

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell);
    }

    let config = config::Config::load(&cli.config)?;
    init_logging(&config.log.level);
    tracing::debug!(db = %cli.db, config = %cli.config.display(), "starting");

    let mut app = app::App::open(&cli.db, &config)?;

    match cli.command {
        Commands::Add(args) => {
            let mut fields = SeriesFields::new(&args.title);
            fields.seasons = args.seasons;
            fields.total_episodes = args.total_episodes;
            fields.watched_episodes = args.watched_episodes;
            fields.status = args.status.unwrap_or_default();
            fields.person = args.person.filter(|person| !person.trim().is_empty());
            let record = app.add(fields)?;
            if args.json {
                print_json(&record_json(&record));
            } else {
                println!("created {} {}", record.id, record.fields.title);
            }
        }
        Commands::Ls(args) => {
            let params = ListParams {
                status: args.status,
                search: args.search,
                sort: args.sort.unwrap_or_else(|| config.sort_order()),
            };
            let records = app.list(params, args.reverse)?.to_vec();
            if args.json {
                let values: Vec<Value> = records.iter().map(record_json).collect();
                print_json(&values);
            } else {
                ui::print_series_list(&records, app.controller().params());
            }
        }
        Commands::Show(args) => {
            let record = app.show(&args.id)?;
            if args.json {
                print_json(&record_json(&record));
            } else {
                ui::print_card(&record, app.controller().card_mode(&args.id));
            }
        }
        Commands::Edit(args) => {
            let changes: Vec<(EditField, String)> = [
                (EditField::Title, args.title),
                (EditField::Seasons, args.seasons),
                (EditField::TotalEpisodes, args.total_episodes),
                (EditField::WatchedEpisodes, args.watched_episodes),
                (EditField::Status, args.status),
                (EditField::Person, args.person),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|value| (field, value)))
            .collect();
            let outcome = app.edit(&args.id, &changes, args.dry_run)?;
            if args.json {
                let mut value = record_json(&outcome.record);
                if let Value::Object(map) = &mut value {
                    map.insert("saved".to_string(), json!(outcome.saved));
                }
                print_json(&value);
            } else if outcome.saved {
                println!("updated {}", outcome.record.id);
            } else {
                ui::print_card(&outcome.record, CardMode::Editing);
                println!("dry run: nothing saved");
            }
        }
        Commands::Inc(args) => {
            let record = app.increment(&args.id)?;
            if args.json {
                print_json(&record_json(&record));
            } else {
                println!(
                    "{} watched {}/{}",
                    record.id, record.fields.watched_episodes, record.fields.total_episodes
                );
            }
        }
        Commands::Status(args) => {
            let record = app.set_status(&args.id, args.status)?;
            if args.json {
                print_json(&record_json(&record));
            } else {
                println!("{} status {}", record.id, record.fields.status);
            }
        }
        Commands::Rm(args) => {
            app.remove(&args.id)?;
            if args.json {
                print_json(&json!({ "id": args.id, "deleted": true }));
            } else {
                println!("deleted {}", args.id);
            }
        }
        Commands::Import(args) => {
            let summary = app.import_csv(&args.file)?;
            if args.json {
                print_json(&summary);
            } else {
                ui::print_import_summary(&summary);
            }
            if summary.stopped() {
                return Err(app::AppError::InvalidArgument(format!(
                    "import stopped at line {}",
                    summary.failed_row.unwrap_or_default()
                )));
            }
        }
        Commands::Export(args) => {
            let target = if args.stdout {
                app::ExportTarget::Stdout
            } else {
                app::ExportTarget::File(args.out.unwrap_or_else(|| app.default_export_path()))
            };
            let summary = app.export_csv(&target)?;
            if let app::ExportTarget::File(path) = &target {
                println!("exported {} series to {}", summary.rows, path.display());
            }
        }
        Commands::Completions(_) => {}
    }
    Ok(())
}
