//! Applies edit lists end to end with the local responder against files in
//! a temporary directory. `echo` and `false` stand in for vtysh.

use std::fs;
use std::path::Path;
use std::time::Duration;

use netcfg_ncmd::{execute, executor, load_edits, Applier, ConfigTrees, NcmdConfig};
use netcfg_test::{bgp_fixtures, ospf_fixtures, EditSet};
use pretty_assertions::assert_eq;
use toml::{Table, Value};

const OLD_GOBGP: &str = "[global.config]\nas = 1\n";

const RUNNING_GOBGP: &str = r#"
[global.config]
as = 65000
router-id = "10.0.0.1"

[[neighbors]]
[neighbors.config]
neighbor-address = "10.0.0.2"
peer-as = 65001
description = "upstream"

[neighbors.timers.config]
hold-time = 90
"#;

/// Writes ncmd.toml pointing every managed file into `dir`.
fn settings(dir: &Path, vtysh: &str) -> NcmdConfig {
    let text = format!(
        r#"
[frr]
vtysh = "{}"
config_path = "{}"

[gobgp]
config_path = "{}"
restart = false
"#,
        vtysh,
        dir.join("frr.conf").display(),
        dir.join("gobgpd.toml").display()
    );
    let path = dir.join("ncmd.toml");
    fs::write(&path, text).unwrap();

    let config = NcmdConfig::load_or_default(&path).unwrap();
    config.validate().unwrap();
    config
}

fn config(dir: &Path, vtysh: &str, gobgp: &str) -> NcmdConfig {
    fs::write(dir.join("frr.conf"), "! frr\n").unwrap();
    fs::write(dir.join("gobgpd.toml"), gobgp).unwrap();
    settings(dir, vtysh)
}

fn applier(edits: &EditSet) -> Applier {
    let file = edits.write_temp().unwrap();
    let edits = load_edits(file.path()).unwrap();
    let trees = ConfigTrees::from_edits(&edits).unwrap();

    let mut applier = Applier::new();
    applier.process(&trees).unwrap();
    applier
}

fn edits() -> EditSet {
    bgp_fixtures::global("mic", 65000, "10.0.0.1")
        .merge(bgp_fixtures::neighbor("mic", "10.0.0.2", 65001))
        .merge(ospf_fixtures::router_id("mic", "10.0.0.1"))
}

async fn apply(config: &NcmdConfig, edits: &EditSet) {
    let mut seq = applier(edits)
        .commands(config, executor(&config.executor))
        .unwrap();
    execute(&mut seq).await.unwrap();
}

fn written(config: &NcmdConfig) -> Table {
    let text = fs::read_to_string(&config.gobgp.config_path).unwrap();
    toml::from_str(&text).unwrap()
}

fn global(doc: &Table) -> &Table {
    doc["global"]["config"].as_table().unwrap()
}

fn neighbors(doc: &Table) -> &[Value] {
    doc["neighbors"].as_array().unwrap()
}

#[tokio::test]
async fn test_apply_writes_gobgp_config_and_drops_backups() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "echo", OLD_GOBGP);

    apply(&config, &edits()).await;

    let doc = written(&config);
    assert_eq!(global(&doc)["as"].as_integer(), Some(65000));
    assert_eq!(global(&doc)["router-id"].as_str(), Some("10.0.0.1"));
    let neighbors = neighbors(&doc);
    assert_eq!(neighbors.len(), 1);
    assert_eq!(
        neighbors[0]["config"]["neighbor-address"].as_str(),
        Some("10.0.0.2")
    );
    assert_eq!(neighbors[0]["config"]["peer-as"].as_integer(), Some(65001));
    assert!(!dir.path().join("frr.conf.backup").exists());
    assert!(!dir.path().join("gobgpd.toml.backup").exists());
}

#[tokio::test]
async fn test_incremental_apply_keeps_running_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "echo", RUNNING_GOBGP);
    let bgp = bgp_fixtures::bgp_path("mic");
    let edits = EditSet::new().edit(format!("{}/global/config/router-id", bgp), "10.0.0.9");

    apply(&config, &edits).await;

    let doc = written(&config);
    assert_eq!(global(&doc)["as"].as_integer(), Some(65000));
    assert_eq!(global(&doc)["router-id"].as_str(), Some("10.0.0.9"));
    let neighbors = neighbors(&doc);
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0]["config"]["peer-as"].as_integer(), Some(65001));
    assert_eq!(neighbors[0]["timers"]["config"]["hold-time"].as_integer(), Some(90));
}

#[tokio::test]
async fn test_incremental_neighbor_leaf_merges_by_address() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "echo", RUNNING_GOBGP);
    let bgp = bgp_fixtures::bgp_path("mic");
    let edits = EditSet::new().edit(
        format!(
            "{}/neighbors/neighbor[neighbor-address='10.0.0.2']/config/peer-as",
            bgp
        ),
        65002,
    );

    apply(&config, &edits).await;

    let doc = written(&config);
    let neighbors = neighbors(&doc);
    assert_eq!(neighbors.len(), 1);
    let neighbor = neighbors[0]["config"].as_table().unwrap();
    assert_eq!(neighbor["neighbor-address"].as_str(), Some("10.0.0.2"));
    assert_eq!(neighbor["peer-as"].as_integer(), Some(65002));
    assert_eq!(neighbor["description"].as_str(), Some("upstream"));
    assert_eq!(global(&doc)["router-id"].as_str(), Some("10.0.0.1"));
}

#[tokio::test]
async fn test_first_apply_without_managed_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = settings(dir.path(), "echo");
    assert!(!dir.path().join("gobgpd.toml").exists());

    apply(&config, &edits()).await;

    let doc = written(&config);
    assert_eq!(global(&doc)["as"].as_integer(), Some(65000));
    assert_eq!(neighbors(&doc).len(), 1);
    assert!(!dir.path().join("frr.conf").exists());
    assert!(!dir.path().join("frr.conf.backup").exists());
    assert!(!dir.path().join("gobgpd.toml.backup").exists());
}

#[tokio::test]
async fn test_large_gobgp_config_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "echo", OLD_GOBGP);
    let edits = (0..2000u32).fold(EditSet::new(), |edits, i| {
        let addr = format!("10.{}.{}.2", i / 250, i % 250);
        edits.merge(bgp_fixtures::neighbor("mic", &addr, 65001 + i))
    });

    tokio::time::timeout(Duration::from_secs(60), apply(&config, &edits))
        .await
        .expect("apply must not block on a large gobgpd config");

    let len = fs::metadata(&config.gobgp.config_path).unwrap().len();
    assert!(len > 64 * 1024);
    let doc = written(&config);
    assert_eq!(neighbors(&doc).len(), 2000);
    assert_eq!(global(&doc)["as"].as_integer(), Some(1));
}

#[tokio::test]
async fn test_failed_vtysh_leaves_gobgp_config_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "false", OLD_GOBGP);
    let applier = applier(&edits());

    let mut seq = applier
        .commands(&config, executor(&config.executor))
        .unwrap();
    assert!(execute(&mut seq).await.is_err());

    let written = fs::read_to_string(&config.gobgp.config_path).unwrap();
    assert_eq!(written, OLD_GOBGP);
    assert!(!dir.path().join("gobgpd.toml.backup").exists());
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), "false", OLD_GOBGP);
    config.executor.dry_run = true;
    let applier = applier(&edits());

    let mut seq = applier
        .commands(&config, executor(&config.executor))
        .unwrap();
    execute(&mut seq).await.unwrap();

    assert_eq!(
        fs::read_to_string(&config.gobgp.config_path).unwrap(),
        OLD_GOBGP
    );
    assert!(!dir.path().join("frr.conf.backup").exists());
}
