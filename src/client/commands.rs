//! Remote filesystem command strings.
//!
//! Every argument is shell-escaped because the remote side hands the whole
//! command line to a login shell.

use shell_escape::unix::escape;

/// Builds `hdfs dfs -ls <args>`.
pub(crate) fn list_command(hdfs_bin: &str, args: &[String]) -> String {
    render(hdfs_bin, &["dfs", "-ls"], args.iter().map(String::as_str))
}

/// Builds `hdfs dfs -du -s <path>`.
pub(crate) fn usage_command(hdfs_bin: &str, path: &str) -> String {
    render(hdfs_bin, &["dfs", "-du", "-s"], [path])
}

/// Builds `hdfs dfs -cat <path>`.
pub(crate) fn cat_command(hdfs_bin: &str, path: &str) -> String {
    render(hdfs_bin, &["dfs", "-cat"], [path])
}

fn render<'a>(
    program: &str,
    subcommand: &[&'a str],
    args: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut result = String::from(escape(program.into()));
    for word in subcommand.iter().copied().chain(args) {
        result.push(' ');
        result.push_str(escape(word.into()).as_ref());
    }
    result
}
