//! Tests for `HdfsClient::usage`.

use super::super::*;
use rstest::rstest;

use super::fixtures::{base_config, scripted_client, target};

#[rstest]
fn usage_parses_summary_line(base_config: SshdfsConfig, target: RemoteTarget) {
    let (runner, client) = scripted_client(base_config);
    runner.push_stdout("100  300  /x/y\n");

    let records = client.usage(&target, "/x/y").expect("usage should succeed");

    assert_eq!(
        records,
        vec![UsageRecord {
            logical_size: 100,
            physical_size: 300,
            path: String::from("/x/y"),
        }]
    );
    let command = runner
        .invocations()
        .first()
        .map(crate::test_support::CommandInvocation::command_string)
        .expect("one invocation");
    assert_eq!(command, "ssh hadoop@namenode hdfs dfs -du -s /x/y");
}

#[rstest]
fn usage_surfaces_spawn_failures(base_config: SshdfsConfig, target: RemoteTarget) {
    let (runner, client) = scripted_client(base_config);
    runner.push_spawn_failure("No such file or directory (os error 2)");

    let err = client.usage(&target, "/x").expect_err("spawn failure");

    assert!(matches!(err, HdfsError::Spawn { ref program, .. } if program == "ssh"));
    assert_eq!(runner.opened(), 0);
}
