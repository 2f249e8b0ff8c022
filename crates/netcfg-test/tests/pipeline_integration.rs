//! End-to-end tests: xpath edits through the emitters into a command
//! sequence executed against a recording remote executor.

use std::sync::Arc;

use netcfg_common::shell::{SYSTEMCTL_CMD, VTYSH_CMD};
use netcfg_common::{BackupPlan, CommandSequence, RemoteShellCommand, Shell, ShellCommand, UpdateType};
use netcfg_emit::{CliProcessor, GobgpConfig};
use netcfg_model::{process_network_instances, NetworkInstances};
use netcfg_test::{
    assert_lines, bgp_fixtures, ldp_fixtures, ospf_fixtures, verify_contains_in_order, Journal,
    RecordingExecutor,
};

fn instances() -> NetworkInstances {
    let mut nis = NetworkInstances::new();
    bgp_fixtures::global("mic", 65000, "10.10.10.10")
        .merge(bgp_fixtures::neighbor("mic", "10.0.0.2", 65001))
        .merge(ospf_fixtures::router_id("mic", "10.0.0.1"))
        .merge(ldp_fixtures::lsr_id("mic", "10.0.0.1"))
        .apply(&mut nis)
        .unwrap();
    nis
}

fn sequence(nis: &NetworkInstances, executor: RecordingExecutor) -> CommandSequence {
    let executor = Arc::new(executor);
    let mut cli = CliProcessor::new();
    process_network_instances(&mut cli, false, nis).unwrap();

    let mut seq = CommandSequence::new();
    let restart = Shell::new(SYSTEMCTL_CMD, ["restart", "frr"]);
    let backup = BackupPlan::frr("/etc/frr/frr.conf", VTYSH_CMD, Some(restart)).command();
    seq.once(
        UpdateType::Vty,
        RemoteShellCommand::new(backup, executor.clone()),
    );
    for shell in cli.shells(VTYSH_CMD, "mic") {
        let cmd = ShellCommand::new(Some(shell), None, None);
        seq.add(RemoteShellCommand::new(cmd, executor.clone()));
    }
    seq
}

#[test]
fn test_gobgp_config_from_fixtures() {
    let mut gobgp = GobgpConfig::new();
    process_network_instances(&mut gobgp, false, &instances()).unwrap();

    assert_lines(
        gobgp.items(),
        &[
            "[global.config]",
            "as = 65000",
            "router-id = \"10.10.10.10\"",
            "[[neighbors]]",
            "[neighbors.config]",
            "neighbor-address = \"10.0.0.2\"",
            "peer-as = 65001",
        ],
    );
}

#[tokio::test]
async fn test_sequence_applies_in_order() {
    let journal = Journal::new();
    let nis = instances();
    let mut seq = sequence(&nis, RecordingExecutor::new(&journal));
    assert_eq!(seq.len(), 3);

    seq.do_all().await.unwrap();
    seq.end_all().await.unwrap();

    let entries = journal.entries();
    assert_eq!(entries.len(), 4);
    verify_contains_in_order(
        &entries,
        &[
            "/bin/sh -c \"if [ -e /etc/frr/frr.conf ]; then /bin/cp -f /etc/frr/frr.conf /etc/frr/frr.conf.backup; else /bin/rm -f /etc/frr/frr.conf.backup; fi\"",
            "/usr/bin/vtysh -c \"configure terminal\" -c \"mpls ldp\" -c \"router-id 10.0.0.1\" -c end",
            "/usr/bin/vtysh -c \"configure terminal\" -c \"router ospf\" -c \"router-id 10.0.0.1\" -c exit -c end",
        ],
    )
    .unwrap();
    assert!(entries[3].contains("write file"));
}

#[tokio::test]
async fn test_sequence_rolls_back_on_failure() {
    let journal = Journal::new();
    let nis = instances();
    let executor = RecordingExecutor::new(&journal).failing_on("router ospf");
    let mut seq = sequence(&nis, executor);

    let err = seq.do_all().await.unwrap_err();
    assert!(err.to_string().contains("scripted failure"));

    let entries = journal.entries();
    assert_eq!(entries.len(), 4);
    assert!(entries[0].contains("/bin/cp -f /etc/frr/frr.conf "));
    assert!(entries[1].contains("mpls ldp"));
    assert!(entries[2].contains("router ospf"));
    assert_eq!(entries[3], "/bin/systemctl restart frr");
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let journal = Journal::new();
    let nis = instances();
    let mut seq = sequence(&nis, RecordingExecutor::new(&journal));
    seq.set_dry_run(true);

    seq.do_all().await.unwrap();
    seq.end_all().await.unwrap();
    seq.undo_all().await;

    assert!(journal.entries().is_empty());
}
