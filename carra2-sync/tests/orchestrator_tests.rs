use std::cell::RefCell;
use std::fs;
use std::path::Path;

use carra2_core::{config, Config, DatasetKind, Settings, StreamId};
use carra2_sync::{
    pipeline::{self, FetchOptions},
    DatasetStatus, StreamState, SyncError, ToolInvocation, ToolOutput, ToolRunner,
};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<ToolInvocation>>,
}

impl ToolRunner for RecordingRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, SyncError> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok(ToolOutput {
            success: true,
            code: Some(0),
            ..ToolOutput::default()
        })
    }
}

/// Streams `(name, active, progress log contents)`; `None` contents means no log file.
fn setup(workspace: &TempDir, streams: &[(&str, bool, Option<&str>)]) -> Config {
    let mut yaml = String::from("STREAMS:\n");
    for (name, active, contents) in streams {
        let log = workspace.path().join(format!("{name}.progress.log"));
        if let Some(contents) = contents {
            fs::write(&log, contents).expect("write progress log");
        }
        yaml.push_str(&format!(
            "  {name}:\n    USER: fac2\n    ACTIVE: {active}\n    PROGLOG: {}\n",
            log.display()
        ));
    }
    yaml.push_str("OBS:\n");
    for kind in DatasetKind::ALL {
        yaml.push_str(&format!(
            "  {}:\n    LOCALPATH: {}\n",
            kind.key(),
            workspace.path().join("obs").join(kind.key()).display()
        ));
    }
    config::parse(Path::new("streams.yml"), &yaml).expect("parse config")
}

fn state_of<'r>(report: &'r carra2_sync::RunReport, name: &str) -> &'r StreamState {
    &report
        .streams
        .iter()
        .find(|s| s.stream == StreamId::from(name))
        .expect("stream in report")
        .state
}

#[test]
fn december_dtg_dispatches_following_year() {
    let workspace = TempDir::new().unwrap();
    let cfg = setup(&workspace, &[("s1", true, Some("DTG=2024120100 extra\n"))]);
    let runner = RecordingRunner::default();

    let report = pipeline::run(&cfg, &Settings::default(), &runner, &FetchOptions::default());

    match state_of(&report, "s1") {
        StreamState::Triggered { dtg, dispatch } => {
            assert_eq!(dtg.to_string(), "2024120100");
            assert_eq!(dispatch.year, 2025);
            assert!(matches!(
                dispatch.datasets[0].status,
                DatasetStatus::Synced { .. }
            ));
        }
        other => panic!("expected trigger, got {other:?}"),
    }
    let calls = runner.calls.borrow();
    assert_eq!(calls[0].args[0], "ec:/fac2/CARRA2/obs/S3SICE/2025/*");
    assert!(workspace.path().join("obs/S3SICE/2025").is_dir());
}

#[test]
fn november_dtg_does_nothing() {
    let workspace = TempDir::new().unwrap();
    let cfg = setup(&workspace, &[("s1", true, Some("DTG=2024110100\n"))]);
    let runner = RecordingRunner::default();

    let report = pipeline::run(&cfg, &Settings::default(), &runner, &FetchOptions::default());

    assert!(matches!(state_of(&report, "s1"), StreamState::NotDecember { .. }));
    assert!(runner.calls.borrow().is_empty());
    assert!(!report.has_failures());
}

#[test]
fn progress_failure_does_not_block_later_streams() {
    let workspace = TempDir::new().unwrap();
    let cfg = setup(
        &workspace,
        &[
            ("a_missing_log", true, None),
            ("b_no_marker", true, Some("nothing useful\n")),
            ("c_bad_dtg", true, Some("DTG=202413xx00\n")),
            ("d_inactive", false, Some("DTG=2024120100\n")),
            ("e_ok", true, Some("DTG=1990121518\n")),
        ],
    );
    fs::create_dir_all(workspace.path().join("obs/OSISAF/1991/1991/12")).unwrap();
    let runner = RecordingRunner::default();

    let report = pipeline::run(&cfg, &Settings::default(), &runner, &FetchOptions::default());

    assert_eq!(report.streams.len(), 5);
    assert!(matches!(state_of(&report, "a_missing_log"), StreamState::ProgressUnknown { .. }));
    assert!(matches!(state_of(&report, "b_no_marker"), StreamState::ProgressUnknown { .. }));
    match state_of(&report, "c_bad_dtg") {
        StreamState::ParseFailed { value, .. } => assert_eq!(value, "202413xx00"),
        other => panic!("expected parse failure, got {other:?}"),
    }
    assert_eq!(state_of(&report, "d_inactive"), &StreamState::Inactive);
    match state_of(&report, "e_ok") {
        StreamState::Triggered { dispatch, .. } => assert_eq!(dispatch.year, 1991),
        other => panic!("expected trigger, got {other:?}"),
    }

    assert!(report.has_failures());
    assert_eq!(report.failure_count(), 3);
    assert_eq!(report.triggered_count(), 1);
}

#[test]
fn dispatch_for_1991_runs_legacy_imager_and_reshuffle_only() {
    let workspace = TempDir::new().unwrap();
    let cfg = setup(&workspace, &[("s1", true, Some("DTG=1990120100\n"))]);
    // Pretend the staging copy already landed two months.
    for month in ["01", "02"] {
        fs::create_dir_all(workspace.path().join("obs/OSISAF/1991/1991").join(month)).unwrap();
    }
    let runner = RecordingRunner::default();

    let report = pipeline::run(&cfg, &Settings::default(), &runner, &FetchOptions::default());
    assert!(!report.has_failures(), "{report:?}");

    let programs: Vec<String> = runner
        .calls
        .borrow()
        .iter()
        .map(|c| format!("{} {}", c.program, c.args[0]))
        .collect();
    assert_eq!(
        programs,
        vec![
            "ecp ec:/fac2/CARRA2/obs/AVHRR/1991/*".to_string(),
            "ecfsdir ec:/fac2/CARRA2/obs/OSISAF_v2_20240424/1991".to_string(),
            "rsync -vaux".to_string(),
        ]
    );
    assert!(!workspace.path().join("obs/OSISAF/1991/1991").exists());
}

#[test]
fn report_serializes_states_and_statuses() {
    let workspace = TempDir::new().unwrap();
    let cfg = setup(
        &workspace,
        &[
            ("s1", true, Some("DTG=2024120100\n")),
            ("s2", false, None),
        ],
    );
    let runner = RecordingRunner::default();
    let options = FetchOptions {
        dry_run: true,
        ..FetchOptions::default()
    };

    let report = pipeline::run(&cfg, &Settings::default(), &runner, &options);
    let json: serde_json::Value =
        serde_json::from_str(&report.to_json_pretty().expect("json")).expect("parse json");

    assert_eq!(json["streams"][0]["stream"], "s1");
    assert_eq!(json["streams"][0]["state"], "triggered");
    assert_eq!(json["streams"][0]["dtg"], "2024120100");
    assert_eq!(json["streams"][0]["dispatch"]["year"], 2025);
    assert_eq!(json["streams"][0]["dispatch"]["datasets"][0]["dataset"], "S3SICE");
    assert_eq!(json["streams"][0]["dispatch"]["datasets"][0]["status"], "would_sync");
    assert_eq!(json["streams"][1]["state"], "inactive");
    assert!(runner.calls.borrow().is_empty());
}
