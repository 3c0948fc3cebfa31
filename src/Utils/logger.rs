use chrono::Local;
use csv::Writer;
use log::info;
use nalgebra::{DMatrix, DVector};
use simplelog::*;
use std::fs::File;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::errors::ExportError;

/// Maps the solvers' `loglevel` strings onto a level filter; `None` means
/// logging was switched off ("off" / "none") or the string is unknown.
pub fn level_filter(loglevel: &str) -> Option<LevelFilter> {
    match loglevel.to_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}

/// Initializes a terminal logger and, if `log_dir` is given, a file logger
/// writing to `log_<date>_<time>.txt` in that directory.
/// Returns false when nothing was initialized: logging is off, or a global
/// logger is already installed (the second init is silently ignored).
pub fn init_logger(loglevel: Option<&str>, log_dir: Option<&Path>) -> bool {
    let Some(level) = loglevel.and_then(level_filter) else {
        return false;
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(dir) = log_dir {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = dir.join(format!("log_{}.txt", date_and_time));
        if let Ok(file) = File::create(name) {
            loggers.push(WriteLogger::new(level, Config::default(), file));
        }
    }
    CombinedLogger::init(loggers).is_ok()
}

/// two-column "parameter | value" table in the modern rounded style
pub fn statistics_table(stats: &[(&str, String)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["parameter".to_string(), "value".to_string()]);
    for (name, value) in stats {
        builder.push_record([name.to_string(), value.clone()]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

/// Writes a grid with one row per time level: the header holds `t` followed by
/// the space coordinates, every record starts with its time coordinate.
pub fn save_grid_to_csv(
    grid: &DMatrix<f64>,
    t_mesh: &DVector<f64>,
    x_mesh: &DVector<f64>,
    path: &Path,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);

    let mut headers = vec!["t".to_string()];
    headers.extend(x_mesh.iter().map(|x| x.to_string()));
    writer.write_record(&headers)?;

    for (i, row) in grid.row_iter().enumerate() {
        let mut record = vec![t_mesh[i].to_string()];
        record.extend(row.iter().map(|val| val.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!("grid saved to {}", path.display());
    Ok(())
}
