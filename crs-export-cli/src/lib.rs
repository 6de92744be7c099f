//! Command-line interface for exporting coordinate reference systems.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use crs_export_core::{ExportEngine, SqliteCrsSource};

mod batch;
mod error;
mod export;

pub use error::CliError;

use batch::{BatchArgs, run_batch};
use export::{ExportArgs, run_export};

const ARG_SRID: &str = "srid";
const ARG_FORMAT: &str = "format";
const ARG_DATABASE: &str = "database";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_OUTPUT_ROOT: &str = "output-root";
const ARG_ENCODING: &str = "encoding";
const ARG_COORDINATE_ORDER: &str = "coordinate-order";
const ENV_EXPORT_SRID: &str = "CRS_EXPORT_CMDS_EXPORT_SRID";
const ENV_EXPORT_FORMAT: &str = "CRS_EXPORT_CMDS_EXPORT_FORMAT";
const ENV_EXPORT_DATABASE: &str = "CRS_EXPORT_CMDS_EXPORT_DATABASE";
const ENV_BATCH_FORMAT: &str = "CRS_EXPORT_CMDS_BATCH_FORMAT";
const ENV_BATCH_DATABASE: &str = "CRS_EXPORT_CMDS_BATCH_DATABASE";
const ENV_BATCH_OUTPUT_ROOT: &str = "CRS_EXPORT_CMDS_BATCH_OUTPUT_ROOT";

/// Run the CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Export(args) => run_export(args, &mut stdout),
        Command::Batch(args) => run_batch(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "crs-export",
    about = "Export coordinate reference systems to Civil 3D and GlobalMapper formats",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export a single SRID.
    Export(ExportArgs),
    /// Export every custom coordinate system into the directory taxonomy.
    Batch(BatchArgs),
}

/// Checks that `path` names an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match crs_export_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) if path.exists() => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Opens the CRS database read-only and wraps it in an engine.
fn open_engine(database: &Utf8Path) -> Result<ExportEngine<SqliteCrsSource>, CliError> {
    require_existing(database, ARG_DATABASE)?;
    let source = SqliteCrsSource::open(database.as_std_path())?;
    Ok(ExportEngine::new(source))
}

#[cfg(test)]
mod tests;
