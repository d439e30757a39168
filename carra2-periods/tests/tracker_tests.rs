//! End-to-end period tracker runs against a scratch archive tree.

use assert_fs::prelude::*;
use carra2_core::StreamId;
use carra2_periods::{run, StartSource, TrackerOptions};
use predicates::prelude::*;

fn touch_archive(root: &assert_fs::TempDir, stream: &str, names: &[&str]) {
    for name in names {
        root.child(format!("{stream}/archive/extract/{name}"))
            .touch()
            .expect("touch archive file");
    }
}

fn options(root: &assert_fs::TempDir, work: &assert_fs::TempDir, streams: &[&str]) -> TrackerOptions {
    TrackerOptions {
        streams: streams.iter().map(|s| StreamId::from(*s)).collect(),
        archive_root: root.path().to_path_buf(),
        prior_path: work.path().join("periods_prev.txt"),
        output_path: work.path().join("periods.txt"),
    }
}

#[test]
fn first_run_writes_observed_periods() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    touch_archive(
        &root,
        "carra2_198409",
        &[
            "carra2_ex_19840915.tar.gz",
            "carra2_ex_19840901.tar.gz",
            "carra2_ex_19840930.tar.gz",
        ],
    );

    let report = run(&options(&root, &work, &["carra2_198409"])).expect("run");
    assert!(!report.had_prior);
    assert_eq!(report.periods.len(), 1);

    work.child("periods.txt")
        .assert(predicate::eq("carra2_198409 1984090100 1984093023\n"));
}

#[test]
fn second_run_carries_previous_end_as_start() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    touch_archive(
        &root,
        "S",
        &["prefix_ab_19840901.tar.gz", "prefix_ab_19840930.tar.gz"],
    );
    work.child("periods_prev.txt")
        .write_str("S X 1984080023\n")
        .unwrap();

    let report = run(&options(&root, &work, &["S"])).expect("run");
    assert!(report.had_prior);
    assert_eq!(report.periods[0].start_source, StartSource::CarriedOver);

    work.child("periods.txt")
        .assert(predicate::eq("S 1984080023 1984093023\n"));
}

#[test]
fn streams_without_files_are_absent_from_the_table() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    touch_archive(&root, "full", &["carra2_ex_19890901.tar.gz"]);
    root.child("empty/archive/extract").create_dir_all().unwrap();
    touch_archive(&root, "only_short", &["short.tar.gz"]);

    let report = run(&options(&root, &work, &["empty", "full", "only_short", "missing"]))
        .expect("run");

    assert_eq!(
        report.empty,
        vec![
            StreamId::from("empty"),
            StreamId::from("only_short"),
            StreamId::from("missing"),
        ]
    );
    work.child("periods.txt")
        .assert(predicate::eq("full 1989090100 1989090123\n"));
}

#[test]
fn short_names_do_not_disturb_other_files() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    touch_archive(
        &root,
        "S",
        &["a.tar.gz", "carra2_ex_19990101.tar.gz", "x_1.tar.gz"],
    );

    run(&options(&root, &work, &["S"])).expect("run");
    work.child("periods.txt")
        .assert(predicate::eq("S 1999010100 1999010123\n"));
}

#[test]
fn output_is_recreated_each_run() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    work.child("periods.txt")
        .write_str("gone 1 2\nalso_gone 3 4\n")
        .unwrap();

    let report = run(&options(&root, &work, &["S"])).expect("run");
    assert!(report.periods.is_empty());
    work.child("periods.txt").assert(predicate::eq(""));
}

#[test]
fn unwritable_output_is_fatal() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    let mut opts = options(&root, &work, &["S"]);
    opts.output_path = work.path().join("missing_dir/periods.txt");

    let err = run(&opts).unwrap_err();
    assert!(err.to_string().contains("periods.txt"), "got: {err}");
}

#[test]
fn stream_order_is_preserved_in_output() {
    let root = assert_fs::TempDir::new().unwrap();
    let work = assert_fs::TempDir::new().unwrap();
    touch_archive(&root, "b", &["carra2_ex_20000101.tar.gz"]);
    touch_archive(&root, "a", &["carra2_ex_19990101.tar.gz"]);

    run(&options(&root, &work, &["b", "a"])).expect("run");
    work.child("periods.txt").assert(predicate::eq(
        "b 2000010100 2000010123\na 1999010100 1999010123\n",
    ));
}
