use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod inputter;
mod model;
mod ui;

use controller::Controller;
use model::{Model, Status, TVConfig};
use tabview::domain::DEFAULT_PAGE_SIZE;
use tabview::loader::LoadOptions;
use tabview::{ViewConfig, ViewError};
use ui::TableUI;

/// Page through, filter and sort a csv, parquet or arrow file.
#[derive(Parser, Debug)]
#[command(name = "tv", version, about)]
struct Args {
    /// Data file to view, `~` and environment variables are expanded
    path: String,

    /// Rows per page
    #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    page_size: usize,

    /// Widest a column is rendered, in characters
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Milliseconds to wait for a key press before redrawing
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,

    /// Filter text columns by fuzzy match instead of prefix match
    #[arg(long)]
    fuzzy: bool,

    /// Columns to load but not show, comma separated
    #[arg(long, value_delimiter = ',')]
    hide: Vec<String>,

    /// Log file, the level is taken from TV_LOG (default: info)
    #[arg(long, default_value = "tv.log")]
    log_file: PathBuf,
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(&args.log_file) {
        eprintln!("Error: could not open log file: {e}");
        return ExitCode::FAILURE;
    }
    match run(args) {
        Err(e) => {
            error!("{e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(log_file: &PathBuf) -> Result<(), ViewError> {
    let file = File::create(log_file)?;
    let filter = EnvFilter::try_from_env("TV_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), ViewError> {
    info!("Starting tv!");
    let path = shellexpand::full(&args.path)
        .map_err(|e| ViewError::LoadingFailed(e.to_string()))?
        .into_owned();

    let cfg = TVConfig {
        event_poll_time: args.event_poll_time,
        max_column_width: args.max_column_width,
        view: ViewConfig {
            default_page_size: args.page_size,
            ..ViewConfig::default()
        },
        load: LoadOptions {
            fuzzy_text: args.fuzzy,
            hidden: args.hide,
        },
    };

    let mut model = Model::init(&cfg);
    model.load_data_file(PathBuf::from(path));
    let mut ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
) -> Result<(), ViewError> {
    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_rejects_zero_page_size() {
        assert!(Args::try_parse_from(["tv", "data.csv", "--page-size", "0"]).is_err());
        let args = Args::try_parse_from(["tv", "data.csv", "-n", "25", "--hide", "a,b"]).unwrap();
        assert_eq!(args.page_size, 25);
        assert_eq!(args.hide, vec!["a", "b"]);
    }
}
