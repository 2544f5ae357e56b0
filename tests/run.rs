//! Integration tests for the `run` command.
use gencap::cli::{RunOpts, handle_run_command};
use gencap::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/winter_week")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("GENCAP_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    {
        // Save results to non-existent directory to check that directory creation works
        let output_dir = tempdir.path().join("results");
        let opts = RunOpts {
            output_dir: Some(output_dir.clone()),
            debug_model: true,
            emission_price: Some(20.0),
            ..Default::default()
        };
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

        for file_name in [
            "metadata.toml",
            "capacities.csv",
            "storage_capacities.csv",
            "generation.csv",
            "storage_dispatch.csv",
            "system_cost.csv",
            "debug_variables.csv",
            "gencap_info.log",
            "gencap_error.log",
        ] {
            assert!(output_dir.join(file_name).is_file(), "Missing {file_name}");
        }

        // The emission price given on the command line is the one used
        let system_cost = fs::read_to_string(output_dir.join("system_cost.csv")).unwrap();
        let emission_price = system_cost.lines().nth(1).unwrap().split(',').next_back();
        assert_eq!(emission_price.unwrap().parse::<f64>().unwrap(), 20.0);
    }

    // Second time will fail because the logging is already initialised
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("results2")),
        ..Default::default()
    };
    assert_eq!(
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}
