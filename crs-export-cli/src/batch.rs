//! `batch` command: every custom SRID into the directory taxonomy.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use crs_export_batch::{BatchReport, export_batch};
use crs_export_core::ExportFormat;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_FORMAT, ARG_OUTPUT_ROOT, CliError, ENV_BATCH_DATABASE, ENV_BATCH_FORMAT,
    ENV_BATCH_OUTPUT_ROOT, open_engine,
};

/// CLI arguments for the `batch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Export every custom coordinate system into \
                 <output-root>/Proj/custom_MSK/<format folder>, archiving \
                 previous exports into Proj/damp_custom_MSK first. Prints \
                 the batch report as JSON.",
    about = "Export all custom coordinate systems"
)]
#[ortho_config(prefix = "CRS_EXPORT")]
pub(crate) struct BatchArgs {
    /// Target format key (`civil3d`, `prj_GMv20`, `prj_GMv25`).
    #[arg(long = ARG_FORMAT, value_name = "key")]
    #[serde(default)]
    pub(crate) format: Option<String>,
    /// Path to the SQLite CRS database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Root directory of the export tree.
    #[arg(long = ARG_OUTPUT_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_root: Option<Utf8PathBuf>,
}

impl BatchArgs {
    pub(crate) fn into_config(self) -> Result<BatchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        BatchConfig::try_from(merged)
    }
}

/// Resolved `batch` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BatchConfig {
    pub(crate) format: ExportFormat,
    pub(crate) database: Utf8PathBuf,
    pub(crate) output_root: Utf8PathBuf,
}

impl TryFrom<BatchArgs> for BatchConfig {
    type Error = CliError;

    fn try_from(args: BatchArgs) -> Result<Self, Self::Error> {
        let key = args.format.ok_or(CliError::MissingArgument {
            field: ARG_FORMAT,
            env: ENV_BATCH_FORMAT,
        })?;
        let format = key.parse().map_err(|source| CliError::InvalidOption {
            field: ARG_FORMAT,
            source,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_BATCH_DATABASE,
        })?;
        let output_root = args.output_root.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_ROOT,
            env: ENV_BATCH_OUTPUT_ROOT,
        })?;
        Ok(Self {
            format,
            database,
            output_root,
        })
    }
}

pub(crate) fn run_batch(args: BatchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_batch_with(&config, writer)
}

pub(crate) fn run_batch_with(config: &BatchConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let engine = open_engine(&config.database)?;
    let report = export_batch(&engine, config.format, &config.output_root)?;
    write_report(writer, &report)
}

fn write_report(writer: &mut dyn Write, report: &BatchReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<BatchConfig, CliError> {
    let merged = BatchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    BatchConfig::try_from(merged)
}
