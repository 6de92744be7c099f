//! Focused unit tests covering batch CLI configuration and reporting.

use crate::batch::{BatchArgs, BatchConfig, config_from_layers_for_test, run_batch_with};
use super::helpers::Workspace;
use super::*;
use crs_export_core::ExportFormat;
use rstest::rstest;

#[rstest]
fn converting_without_output_root_errors() {
    let args = BatchArgs {
        format: Some("prj_GMv25".to_owned()),
        database: Some("crs.sqlite".into()),
        output_root: None,
    };
    let err = BatchConfig::try_from(args).expect_err("missing root should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_OUTPUT_ROOT);
            assert_eq!(env, ENV_BATCH_OUTPUT_ROOT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "format": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "format": "prj_GMv20",
            "database": "from-file.sqlite",
            "output_root": "from-file",
        }),
        None,
    );
    composer.push_environment(json!({
        "database": "from-env.sqlite",
        "output_root": "from-env",
    }));
    composer.push_cli(json!({ "output_root": "from-cli" }));

    let config = config_from_layers_for_test(composer.layers()).expect("merged config");
    assert_eq!(config.format, ExportFormat::PrjV1);
    assert_eq!(config.database, "from-env.sqlite");
    assert_eq!(config.output_root, "from-cli");
}

#[rstest]
fn batch_prints_report_json() {
    let workspace = Workspace::new();
    let config = BatchConfig {
        format: ExportFormat::PrjV2,
        database: workspace.database.clone(),
        output_root: workspace.root.join("tree"),
    };
    let mut stdout = Vec::new();
    run_batch_with(&config, &mut stdout).expect("batch");

    let report: serde_json::Value = serde_json::from_slice(&stdout).expect("json report");
    assert_eq!(report["generated"], 2);
    assert_eq!(report["skipped"], 0);
    assert_eq!(report["groups"], 1);
    assert!(
        workspace
            .root
            .join("tree/Proj/custom_MSK/GMv25/SK42/3deg/SK42_zone_7.3.prj")
            .is_file()
    );
    assert!(
        workspace
            .root
            .join("tree/Proj/custom_MSK/GMv25/local/Mestnaya_sistema.prj")
            .is_file()
    );
}
