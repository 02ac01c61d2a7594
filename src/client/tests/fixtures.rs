//! Shared fixtures for client tests.

use super::super::*;
use crate::test_support::ScriptedRunner;
use rstest::fixture;

#[fixture]
pub fn base_config() -> SshdfsConfig {
    SshdfsConfig {
        hdfs_bin: String::from("hdfs"),
        default_host: Some(String::from("namenode")),
        default_user: Some(String::from("hadoop")),
        ..SshdfsConfig::default()
    }
}

#[fixture]
pub fn target() -> RemoteTarget {
    RemoteTarget::new("namenode", Some(String::from("hadoop")))
}

pub fn scripted_client(config: SshdfsConfig) -> (ScriptedRunner, HdfsClient<ScriptedRunner>) {
    let runner = ScriptedRunner::new();
    let client = HdfsClient::new(config, runner.clone()).expect("config should validate");
    (runner, client)
}
