//! Fake `ssh` and `hdfs` executables for process-level tests.
//!
//! The fake `ssh` drops every option, runs its final argument with `sh -c`,
//! and exits with status 255 for any target containing `unreachable`. The
//! fake `hdfs` answers `dfs -ls`, `dfs -du -s`, and `dfs -cat`, serving file
//! contents from [`FakeRemote::data_root`].
//!
//! ```rust
//! #[path = "common/fake_remote.rs"]
//! mod fake_remote;
//! ```

use std::fs;
use std::os::unix::fs::PermissionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

const FAKE_SSH: &str = r#"#!/bin/sh
while [ "$#" -gt 2 ]; do shift; done
target="$1"
case "$target" in
  *unreachable*)
    echo "ssh: connect to host ${target#*@} port 22: Connection refused" >&2
    exit 255
    ;;
esac
exec sh -c "$2"
"#;

const FAKE_HDFS: &str = r#"#!/bin/sh
[ "$1" = "dfs" ] || exit 2
shift
op="$1"
shift
case "$op" in
  -ls)
    dir="$1"
    case "$dir" in
      /missing*)
        echo "ls: \`$dir': No such file or directory" >&2
        exit 1
        ;;
      /broken)
        echo "Found 1 items"
        echo "drwxr-xr-x   3 alice staff        128 2024-01-02 /broken/x"
        exit 0
        ;;
    esac
    echo "Found 2 items"
    echo "drwxr-xr-x   - alice staff          0 2024-01-02 03:04 $dir/sub"
    printf '%s\n' "-rw-r--r--   3 alice staff        128 2024-01-03 14:30 $dir/file name.txt"
    ;;
  -du)
    [ "$1" = "-s" ] && shift
    echo "100  300  $1"
    ;;
  -cat)
    exec cat "__DATA_ROOT__$1"
    ;;
  *)
    echo "unsupported: $op" >&2
    exit 2
    ;;
esac
"#;

/// Temporary directory holding the fake binaries and served files.
pub struct FakeRemote {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl FakeRemote {
    /// Creates the fake binaries in a fresh temporary directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
        let data_root = root.join("data-root");
        fs::create_dir_all(&data_root).expect("create data root");
        fs::create_dir_all(root.join("work")).expect("create work dir");

        write_script(&root.join("ssh"), FAKE_SSH);
        write_script(
            &root.join("hdfs"),
            &FAKE_HDFS.replace("__DATA_ROOT__", data_root.as_str()),
        );

        Self { _dir: dir, root }
    }

    /// Path of the fake `ssh`.
    pub fn ssh_bin(&self) -> Utf8PathBuf {
        self.root.join("ssh")
    }

    /// Path of the fake `hdfs`.
    pub fn hdfs_bin(&self) -> Utf8PathBuf {
        self.root.join("hdfs")
    }

    /// Directory that `dfs -cat /x` reads `x` from.
    pub fn data_root(&self) -> Utf8PathBuf {
        self.root.join("data-root")
    }

    /// Scratch directory for local downloads and as a working directory.
    pub fn work_dir(&self) -> Utf8PathBuf {
        self.root.join("work")
    }

    /// Places `contents` at remote path `remote` (absolute, `/`-separated).
    pub fn serve(&self, remote: &str, contents: &[u8]) {
        let path = self.data_root().join(remote.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create served parent");
        }
        fs::write(path, contents).expect("write served file");
    }
}

fn write_script(path: &Utf8Path, body: &str) {
    fs::write(path, body).expect("write script");
    let mut permissions = fs::metadata(path).expect("script metadata").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("chmod script");
}

/// Deterministic byte pattern of `len` bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("fits in u8"))
        .collect()
}
