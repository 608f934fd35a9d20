//! Runs fake `unoinfo` helpers and checks what the bootstrap makes of them.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use unoloader_core::envelope::{encode_narrow, encode_wide};
use unoloader_core::{ResourceHelperPort, ResourceLocation};
use unoloader_runtime::{HELPER_NAME, HelperError, UnoinfoHelper};

/// Installation whose helper checks its argument, prints `payload.bin`,
/// writes `stderr_bytes` to stderr first and exits with `exit_code`.
fn installation(payload: &[u8], stderr_bytes: usize, exit_code: i32) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("payload.bin"), payload).unwrap();
    let script = format!(
        "#!/bin/sh\n\
         [ \"$1\" = java ] || exit 9\n\
         head -c {stderr_bytes} /dev/zero >&2\n\
         cat \"$(dirname \"$0\")/payload.bin\"\n\
         exit {exit_code}\n"
    );
    let helper = dir.path().join(HELPER_NAME);
    fs::write(&helper, script).unwrap();
    fs::set_permissions(&helper, fs::Permissions::from_mode(0o755)).unwrap();
    dir
}

fn paths(locations: &[ResourceLocation]) -> Vec<String> {
    locations
        .iter()
        .map(|l| l.path().display().to_string())
        .collect()
}

#[tokio::test]
async fn narrow_output_is_split_on_nul() {
    let install = installation(&encode_narrow(&["/opt/a.jar", "/opt/b.jar"]), 0, 0);
    let locations = UnoinfoHelper::new().query(install.path()).await.unwrap();
    assert_eq!(paths(&locations), vec!["/opt/a.jar", "/opt/b.jar"]);
}

#[tokio::test]
async fn narrow_output_keeps_utf8_paths() {
    let install = installation(b"0/opt/caf\xc3\xa9/juh.jar\0/opt/b.jar", 0, 0);
    let locations = UnoinfoHelper::new().query(install.path()).await.unwrap();
    assert_eq!(paths(&locations), vec!["/opt/caf\u{e9}/juh.jar", "/opt/b.jar"]);
}

#[tokio::test]
async fn wide_output_is_decoded() {
    let install = installation(&encode_wide(&["/opt/\u{e9}t\u{e9}.jar", "/opt/b.jar"]), 0, 0);
    let locations = UnoinfoHelper::new().query(install.path()).await.unwrap();
    assert_eq!(paths(&locations), vec!["/opt/\u{e9}t\u{e9}.jar", "/opt/b.jar"]);
}

#[tokio::test]
async fn empty_fields_are_skipped() {
    let install = installation(b"0\0/opt/a.jar\0\0", 0, 0);
    let locations = UnoinfoHelper::new().query(install.path()).await.unwrap();
    assert_eq!(paths(&locations), vec!["/opt/a.jar"]);
}

#[tokio::test]
async fn bad_sentinel_yields_no_locations() {
    let install = installation(b"2/opt/a.jar", 0, 0);
    let helper = UnoinfoHelper::new();
    assert!(matches!(
        helper.query(install.path()).await,
        Err(HelperError::Envelope(_))
    ));
    assert!(helper.resource_locations(install.path()).await.is_empty());
}

#[tokio::test]
async fn empty_output_yields_no_locations() {
    let install = installation(b"", 0, 0);
    let helper = UnoinfoHelper::new();
    assert!(helper.query(install.path()).await.is_err());
    assert!(helper.resource_locations(install.path()).await.is_empty());
}

#[tokio::test]
async fn non_zero_exit_discards_output() {
    let install = installation(&encode_narrow(&["/opt/a.jar"]), 0, 4);
    let helper = UnoinfoHelper::new();
    assert!(matches!(
        helper.query(install.path()).await,
        Err(HelperError::ExitCode(4))
    ));
    assert!(helper.resource_locations(install.path()).await.is_empty());
}

#[tokio::test]
async fn stderr_flood_does_not_block() {
    let install = installation(&encode_narrow(&["/opt/a.jar"]), 1 << 20, 0);
    let locations = tokio::time::timeout(
        Duration::from_secs(30),
        UnoinfoHelper::new().query(install.path()),
    )
    .await
    .expect("helper stalled on a full stderr pipe")
    .unwrap();
    assert_eq!(paths(&locations), vec!["/opt/a.jar"]);
}

#[tokio::test]
async fn output_over_ceiling_is_rejected() {
    let long = "/opt/".to_string() + &"x".repeat(5_000);
    let install = installation(&encode_narrow(&[long.as_str()]), 0, 0);
    let err = UnoinfoHelper::new()
        .with_output_ceiling(4_000)
        .query(install.path())
        .await
        .unwrap_err();
    assert!(matches!(err, HelperError::TooMuchOutput { ceiling: 4_000 }));
}

#[tokio::test]
async fn missing_helper_is_a_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = UnoinfoHelper::new()
        .query(&dir.path().join("nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, HelperError::Launch { .. }));
    assert!(err.to_string().starts_with("exec "));
}

#[test]
fn helper_lives_in_installation_directory() {
    let helper = UnoinfoHelper::new();
    assert_eq!(
        helper.helper_path(Path::new("/opt/office/program")),
        Path::new("/opt/office/program").join(HELPER_NAME)
    );
}
