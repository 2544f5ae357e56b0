//! Integration tests for the `example run` command.
use gencap::cli::RunOpts;
use gencap::cli::example::handle_example_run_command;
use gencap::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("GENCAP_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("winter_week")),
        ..Default::default()
    };
    handle_example_run_command("winter_week", &opts, Some(Settings::default())).unwrap();
    assert!(tempdir.path().join("winter_week/capacities.csv").is_file());
}
