//! `export` command: one SRID to one file or stdout.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use crs_export_core::{CoordinateOrder, ExportFormat, ExportParams, OutputText, TextEncoding};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COORDINATE_ORDER, ARG_DATABASE, ARG_ENCODING, ARG_FORMAT, ARG_OUTPUT_DIR, ARG_SRID,
    CliError, ENV_EXPORT_DATABASE, ENV_EXPORT_FORMAT, ENV_EXPORT_SRID, open_engine,
};

/// CLI arguments for the `export` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Export one coordinate reference system. The document is \
                 written into the output directory under its derived \
                 filename, or to stdout when no directory is given.",
    about = "Export a single SRID"
)]
#[ortho_config(prefix = "CRS_EXPORT")]
pub(crate) struct ExportArgs {
    /// SRID to export.
    #[arg(value_name = "srid")]
    #[serde(default)]
    pub(crate) srid: Option<i64>,
    /// Target format key (`civil3d`, `prj_GMv20`, `prj_GMv25`).
    #[arg(long = ARG_FORMAT, value_name = "key")]
    #[serde(default)]
    pub(crate) format: Option<String>,
    /// Path to the SQLite CRS database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Directory receiving the exported file.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Output encoding (`UTF-8`, `UTF-16`, `ASCII`).
    #[arg(long = ARG_ENCODING, value_name = "name")]
    #[serde(default)]
    pub(crate) encoding: Option<String>,
    /// XML axis order (`EN` or `NE`).
    #[arg(long = ARG_COORDINATE_ORDER, value_name = "order")]
    #[serde(default)]
    pub(crate) coordinate_order: Option<String>,
}

impl ExportArgs {
    pub(crate) fn into_config(self) -> Result<ExportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExportConfig::try_from(merged)
    }
}

/// Resolved `export` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportConfig {
    pub(crate) srid: i64,
    pub(crate) format: ExportFormat,
    pub(crate) database: Utf8PathBuf,
    pub(crate) output_dir: Option<Utf8PathBuf>,
    pub(crate) params: ExportParams,
}

impl TryFrom<ExportArgs> for ExportConfig {
    type Error = CliError;

    fn try_from(args: ExportArgs) -> Result<Self, Self::Error> {
        let srid = args.srid.ok_or(CliError::MissingArgument {
            field: ARG_SRID,
            env: ENV_EXPORT_SRID,
        })?;
        let format = parse_format(args.format)?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_EXPORT_DATABASE,
        })?;
        let encoding = args
            .encoding
            .as_deref()
            .map(str::parse::<TextEncoding>)
            .transpose()
            .map_err(|source| CliError::InvalidOption {
                field: ARG_ENCODING,
                source,
            })?
            .unwrap_or_default();
        let coordinate_order = args
            .coordinate_order
            .as_deref()
            .map(str::parse::<CoordinateOrder>)
            .transpose()
            .map_err(|source| CliError::InvalidOption {
                field: ARG_COORDINATE_ORDER,
                source,
            })?
            .unwrap_or_default();
        Ok(Self {
            srid,
            format,
            database,
            output_dir: args.output_dir,
            params: ExportParams {
                encoding,
                coordinate_order,
                version: None,
            },
        })
    }
}

fn parse_format(format: Option<String>) -> Result<ExportFormat, CliError> {
    let key = format.ok_or(CliError::MissingArgument {
        field: ARG_FORMAT,
        env: ENV_EXPORT_FORMAT,
    })?;
    key.parse().map_err(|source| CliError::InvalidOption {
        field: ARG_FORMAT,
        source,
    })
}

pub(crate) fn run_export(args: ExportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_export_with(&config, writer)
}

pub(crate) fn run_export_with(config: &ExportConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let engine = open_engine(&config.database)?;
    let output = engine.export(config.srid, config.format, Some(&config.params))?;
    match &config.output_dir {
        Some(dir) => write_to_dir(dir, &output, writer),
        None => writer
            .write_all(&output.to_bytes())
            .map_err(CliError::WriteOutput),
    }
}

fn write_to_dir(
    dir: &Utf8Path,
    output: &OutputText,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let path = dir.join(&output.filename);
    crs_export_fs::write_file(&path, &output.to_bytes()).map_err(|source| {
        CliError::WriteExport {
            path: path.clone(),
            source,
        }
    })?;
    info!("wrote {} export to {path}", output.format);
    writeln!(writer, "{path}").map_err(CliError::WriteOutput)
}
