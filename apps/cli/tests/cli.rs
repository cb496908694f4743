use std::process::{Command, Output};

fn cmd(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_libmpv-setup"));
    cmd.current_dir(dir)
        .env_remove("LIBMPV_SETUP_TARGET_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn assert_usage(out: &Output) {
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(out);
    assert!(text.contains("Usage: libmpv-setup setup-lib"), "{text}");
    assert!(
        text.contains("setup-lib   Download and configure libmpv libraries automatically."),
        "{text}"
    );
}

#[test]
fn unknown_command_prints_usage_and_touches_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = cmd(temp.path()).arg("foo").output().expect("run");

    assert_usage(&out);
    assert!(!temp.path().join("src-tauri").exists());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn no_command_prints_usage() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = cmd(temp.path()).output().expect("run");

    assert_usage(&out);
    assert!(!temp.path().join("src-tauri").exists());
}

#[test]
fn extra_arguments_print_usage() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = cmd(temp.path())
        .args(["setup-lib", "--bogus"])
        .output()
        .expect("run");

    assert_usage(&out);
    assert!(!temp.path().join("src-tauri").exists());
}

#[test]
fn unreachable_release_host_exits_one_with_error_line() {
    let temp = tempfile::tempdir().expect("tempdir");
    // Nothing listens on the discard port.
    let out = cmd(temp.path())
        .arg("setup-lib")
        .env("LIBMPV_WRAPPER_BASE_URL", "http://127.0.0.1:9")
        .env("LIBMPV_MPV_BASE_URL", "http://127.0.0.1:9")
        .env("LIBMPV_SETUP_TIMEOUT_SECS", "5")
        .output()
        .expect("run");

    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("Error: "), "{err}");
    assert!(!temp.path().join("src-tauri").join("lib").join("temp").exists());
}
