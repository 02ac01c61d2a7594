//! Every call closes its channel exactly once, whatever the outcome.

use super::super::*;
use rstest::rstest;

use super::fixtures::{base_config, scripted_client, target};

#[rstest]
fn repeated_failing_calls_close_each_channel_once(
    base_config: SshdfsConfig,
    target: RemoteTarget,
) {
    let (runner, client) = scripted_client(base_config);
    for _ in 0..5 {
        runner.push_stdout("Found 1 items\nnot a listing row\n");
        runner.push_output(Some(255), "", "Permission denied (publickey).");
        runner.push_output(Some(1), "", "du: `/nope': No such file or directory");
        runner.push_stdout("one two three four\n");
        runner.push_read_failure("Found 3 items\n");
    }

    for _ in 0..5 {
        client.list(&target, &[]).expect_err("schema mismatch");
        client.list(&target, &[]).expect_err("connection failure");
        client.usage(&target, "/nope").expect_err("remote failure");
        client.usage(&target, "/x").expect_err("bad size column");
        client.list(&target, &[]).expect_err("broken stream");
    }

    assert_eq!(runner.opened(), 25);
    assert_eq!(runner.finished(), 25);
}

#[rstest]
fn successful_calls_close_each_channel_once(base_config: SshdfsConfig, target: RemoteTarget) {
    let (runner, client) = scripted_client(base_config);
    runner.push_stdout("Found 0 items\n");
    runner.push_stdout("1 3 /a\n");

    client.list(&target, &[]).expect("listing");
    client.usage(&target, "/a").expect("usage");

    assert_eq!(runner.finished(), runner.opened());
    assert_eq!(runner.finished(), 2);
}

#[rstest]
fn open_channel_hands_ownership_to_the_caller(base_config: SshdfsConfig, target: RemoteTarget) {
    let (runner, client) = scripted_client(base_config);
    runner.push_stdout("raw");
    let invocation = RemoteInvocation::new(target, "echo raw", TransferMode::Text);

    let mut channel = client.open_channel(&invocation).expect("channel");
    assert_eq!(runner.finished(), 0);
    assert_eq!(channel.read_text().expect("text"), "raw");
    channel.close().expect("close");

    assert_eq!(runner.finished(), 1);
}
