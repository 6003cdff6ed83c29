//! Runs the `uwucatch` binary to observe what uncaught exceptions do to a
//! whole process.

use std::process::{Command, Output};

fn uwucatch(scenario: &str, number: i32) -> Output {
    let number = number.to_string();
    Command::new(env!("CARGO_BIN_EXE_uwucatch"))
        .args([scenario, number.as_str()])
        .output()
        .expect("failed to run uwucatch")
}

#[test]
fn uncaught_on_main_exits_with_code() {
    let output = uwucatch("uncaught", 2);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Uncaught exception (code 2)"), "{stderr}");
}

#[test]
fn unmatched_region_exits_with_code() {
    let output = uwucatch("rethrown", 3);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Rethrown exception (code 3)"));
}

#[test]
fn run_driver_exits_with_code() {
    assert_eq!(uwucatch("run", 4).status.code(), Some(4));
}

#[test]
fn caught_exception_exits_cleanly() {
    let output = uwucatch("caught", 5);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "caught 5\n");
}

#[test]
fn workers_die_alone() {
    let output = uwucatch("workers", 4);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "worker 0: code 50\nworker 1: ok\nworker 2: code 52\nworker 3: ok\n"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Thread 0 uncaught exception (code 50)"), "{stderr}");
    assert!(stderr.contains("Thread 2 uncaught exception (code 52)"), "{stderr}");
    assert!(stderr.contains("thread "), "{stderr}");
}
