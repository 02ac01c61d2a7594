//! Tests for `HdfsClient::fetch`.

use super::super::*;
use crate::fetch::CHUNK_SIZE;
use rstest::rstest;
use tempfile::TempDir;

use super::fixtures::{base_config, scripted_client, target};

fn temp_root() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 tempdir");
    (tmp, root)
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from(i % 256).unwrap_or(0)).collect()
}

#[rstest]
#[case::exact_multiple(4 * CHUNK_SIZE)]
#[case::trailing_partial(4 * CHUNK_SIZE + 1)]
#[case::empty_file(0)]
fn fetch_writes_identical_bytes(
    base_config: SshdfsConfig,
    target: RemoteTarget,
    #[case] len: usize,
) {
    let (_tmp, root) = temp_root();
    let destination = root.join("copy.bin");
    let (runner, client) = scripted_client(base_config);
    let source = payload(len);
    runner.push_stdout(source.clone());

    let summary = client
        .fetch(&target, "/data/blob.bin", Some(&destination))
        .expect("fetch should succeed");

    let written = std::fs::read(&destination).expect("destination should exist");
    assert_eq!(written, source);
    assert_eq!(summary.bytes, len as u64);
    assert_eq!(summary.destination, destination);
    assert_eq!(runner.finished(), 1);

    let invocations = runner.invocations();
    let [invocation] = invocations.as_slice() else {
        panic!("expected a single ssh invocation");
    };
    assert_eq!(invocation.mode, TransferMode::Binary);
    assert!(
        invocation
            .command_string()
            .ends_with("hdfs dfs -cat /data/blob.bin"),
        "unexpected command: {}",
        invocation.command_string()
    );
}

#[rstest]
fn fetch_overwrites_existing_destination(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let destination = root.join("existing.txt");
    std::fs::write(&destination, "old contents that are longer").expect("seed file");
    let (runner, client) = scripted_client(base_config);
    runner.push_stdout("new");

    client
        .fetch(&target, "/f", Some(&destination))
        .expect("fetch should succeed");

    assert_eq!(
        std::fs::read_to_string(&destination).expect("read back"),
        "new"
    );
}

#[rstest]
fn failed_remote_command_removes_partial_file(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let destination = root.join("partial.bin");
    let (runner, client) = scripted_client(base_config);
    runner.push_output(Some(1), payload(100), "cat: Filesystem closed");

    let err = client
        .fetch(&target, "/f", Some(&destination))
        .expect_err("remote failure");

    assert!(matches!(err, HdfsError::RemoteCommand { status: Some(1), .. }));
    assert!(!destination.exists(), "partial file should be removed");
    assert_eq!(runner.finished(), 1);
}

#[rstest]
fn dropped_connection_removes_partial_file(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let destination = root.join("partial.bin");
    let (runner, client) = scripted_client(base_config);
    runner.push_output(
        Some(255),
        payload(CHUNK_SIZE + 7),
        "Connection to namenode closed by remote host.",
    );

    let err = client
        .fetch(&target, "/f", Some(&destination))
        .expect_err("transport failure");

    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert!(!destination.exists());
}

#[rstest]
fn broken_stream_is_a_read_error(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let destination = root.join("partial.bin");
    let (runner, client) = scripted_client(base_config);
    runner.push_read_failure(payload(10));

    let err = client
        .fetch(&target, "/f", Some(&destination))
        .expect_err("read failure");

    assert!(matches!(err, HdfsError::Read { .. }), "unexpected error: {err:?}");
    assert!(!destination.exists());
    assert_eq!(runner.finished(), 1);
}

#[rstest]
fn unwritable_destination_closes_channel(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let destination = root.join("no-such-dir").join("file.bin");
    let (runner, client) = scripted_client(base_config);
    runner.push_stdout("data");

    let err = client
        .fetch(&target, "/f", Some(&destination))
        .expect_err("missing parent directory");

    assert!(matches!(err, HdfsError::LocalFile { .. }), "unexpected error: {err:?}");
    assert_eq!(runner.opened(), 1);
    assert_eq!(runner.finished(), 1);
}

#[rstest]
fn failed_fetch_keeps_existing_destination(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let destination = root.join("keep.bin");
    std::fs::write(&destination, "keep me").expect("seed file");
    let (runner, client) = scripted_client(base_config);
    runner.push_output(Some(1), "", "cat: `/data/typo.bin': No such file or directory");

    let err = client
        .fetch(&target, "/data/typo.bin", Some(&destination))
        .expect_err("remote failure");

    assert!(matches!(err, HdfsError::RemoteCommand { .. }), "unexpected error: {err:?}");
    assert_eq!(
        std::fs::read_to_string(&destination).expect("destination survives"),
        "keep me"
    );
    let leftovers: Vec<_> = root
        .read_dir_utf8()
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().to_owned())
        .collect();
    assert_eq!(leftovers, ["keep.bin"]);
}

#[cfg(unix)]
#[rstest]
fn fetch_through_symlink_writes_link_target(base_config: SshdfsConfig, target: RemoteTarget) {
    let (_tmp, root) = temp_root();
    let (_other, elsewhere) = temp_root();
    let real = elsewhere.join("real.bin");
    std::fs::write(&real, "old").expect("seed target");
    let link = root.join("link.bin");
    std::os::unix::fs::symlink(&real, &link).expect("symlink");
    let (runner, client) = scripted_client(base_config);
    runner.push_stdout("fresh contents");

    let summary = client
        .fetch(&target, "/data/real.bin", Some(&link))
        .expect("fetch through symlink");

    assert_eq!(std::fs::read_to_string(&real).expect("read target"), "fresh contents");
    assert!(link.is_symlink());
    assert_eq!(summary.destination, link);
}
