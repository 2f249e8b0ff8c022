//! Applier: emitters in, transactional commands out.
//!
//! One walk over the trees feeds every emitter at once. [`Applier`] owns a
//! [`CliProcessor`], a [`GobgpConfig`] and an [`InterfaceMutations`] and
//! hands each capability group to the emitter that implements it.
//!
//! [`Applier::commands`] then turns the collected output into a
//! [`CommandSequence`]:
//!
//! | slot | Do | Undo | End |
//! |------|----|------|-----|
//! | `Vty` (once) | back up frr.conf | frr restart/reload | `write file`, drop backup |
//! | - (per session) | `vtysh -c ...` | - | - |
//! | `Gobgp` (once) | back up gobgpd.toml | restore, restart | restart, drop backup |
//! | `GobgpConfig` (set) | `tee gobgpd.toml`, merged | - | - |
//!
//! The gobgpd slot writes the current file merged with the changed
//! sections, never the changed sections alone. Datastore mutations are
//! rendered but never executed.

use std::fs;
use std::io;
use std::sync::Arc;

use netcfg_common::shell::TEE_CMD;
use netcfg_common::{
    BackupPlan, CommandSequence, LocalResponder, ProcessExecutor, RemoteExecutor,
    RemoteShellCommand, Shell, ShellCommand, UpdateType,
};
use netcfg_emit::{merge_config, CliProcessor, GobgpConfig, InterfaceMutations};
use netcfg_model::processor::{
    BgpGlobalProcessor, BgpNeighborProcessor, BgpZebraProcessor, InterfaceProcessor,
    MplsProcessor, Ospfv2Processor, PolicyDefinitionProcessor, StaticRouteProcessor,
    SubinterfaceProcessor,
};
use netcfg_model::{
    process_interfaces, process_network_instances, process_routing_policy, Processor,
};
use tracing::{debug, info, instrument};

use crate::config::{ExecutorConfig, ExecutorMode, NcmdConfig};
use crate::edits::ConfigTrees;
use crate::error::{NcmdError, NcmdResult};

/// Emitter output selectable by `ncmd render`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderTarget {
    /// gobgpd TOML lines
    Gobgp,
    /// Interface datastore mutations
    Datastore,
    /// One vtysh command line per session
    Vty,
}

/// Collects the output of every emitter from one walk.
#[derive(Debug, Clone, Default)]
pub struct Applier {
    cli: CliProcessor,
    gobgp: GobgpConfig,
    datastore: InterfaceMutations,
}

impl Processor for Applier {
    fn as_bgp_global(&mut self) -> Option<&mut dyn BgpGlobalProcessor> {
        self.gobgp.as_bgp_global()
    }

    fn as_bgp_zebra(&mut self) -> Option<&mut dyn BgpZebraProcessor> {
        self.gobgp.as_bgp_zebra()
    }

    fn as_bgp_neighbor(&mut self) -> Option<&mut dyn BgpNeighborProcessor> {
        self.gobgp.as_bgp_neighbor()
    }

    fn as_policy_definition(&mut self) -> Option<&mut dyn PolicyDefinitionProcessor> {
        self.gobgp.as_policy_definition()
    }

    fn as_interface(&mut self) -> Option<&mut dyn InterfaceProcessor> {
        self.datastore.as_interface()
    }

    fn as_subinterface(&mut self) -> Option<&mut dyn SubinterfaceProcessor> {
        self.datastore.as_subinterface()
    }

    fn as_mpls(&mut self) -> Option<&mut dyn MplsProcessor> {
        self.cli.as_mpls()
    }

    fn as_static_route(&mut self) -> Option<&mut dyn StaticRouteProcessor> {
        self.cli.as_static_route()
    }

    fn as_ospfv2(&mut self) -> Option<&mut dyn Ospfv2Processor> {
        self.cli.as_ospfv2()
    }
}

impl Applier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks network instances, routing policy and interfaces, in that
    /// order.
    #[instrument(skip(self, trees))]
    pub fn process(&mut self, trees: &ConfigTrees) -> NcmdResult<()> {
        process_network_instances(self, false, &trees.instances)?;
        process_routing_policy(self, false, &trees.policy)?;
        process_interfaces(self, false, &trees.interfaces)?;

        info!(
            vty = self.cli.len(),
            gobgp = self.gobgp.len(),
            datastore = self.datastore.len(),
            "Trees processed"
        );
        Ok(())
    }

    pub fn cli(&self) -> &CliProcessor {
        &self.cli
    }

    pub fn gobgp(&self) -> &GobgpConfig {
        &self.gobgp
    }

    pub fn datastore(&self) -> &InterfaceMutations {
        &self.datastore
    }

    /// Text lines of one emitter's output.
    pub fn render(&self, target: RenderTarget, config: &NcmdConfig) -> Vec<String> {
        match target {
            RenderTarget::Gobgp => self.gobgp.items().to_vec(),
            RenderTarget::Datastore => self
                .datastore
                .mutations()
                .iter()
                .map(ToString::to_string)
                .collect(),
            RenderTarget::Vty => self
                .cli
                .shells(&config.frr.vtysh, &config.frr.default_instance)
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Builds the transactional sequence for everything collected so far.
    #[instrument(skip(self, config, executor))]
    pub fn commands(
        &self,
        config: &NcmdConfig,
        executor: Arc<dyn RemoteExecutor>,
    ) -> NcmdResult<CommandSequence> {
        let mut seq = CommandSequence::new();
        seq.set_dry_run(config.executor.dry_run);

        if !self.cli.is_empty() {
            let frr = &config.frr;
            let plan = BackupPlan::frr(&frr.config_path, &frr.vtysh, frr.auto_restart.shell());
            seq.once(
                UpdateType::Vty,
                RemoteShellCommand::new(plan.command(), executor.clone()),
            );
            for shell in self.cli.shells(&frr.vtysh, &frr.default_instance) {
                let cmd = ShellCommand::new(Some(shell), None, None);
                seq.add(RemoteShellCommand::new(cmd, executor.clone()));
            }
        }

        if !self.gobgp.is_empty() {
            let gobgp = &config.gobgp;
            let plan = BackupPlan::gobgp(&gobgp.config_path, &gobgp.service, gobgp.restart);
            seq.once(
                UpdateType::Gobgp,
                RemoteShellCommand::new(plan.command(), executor.clone()),
            );
            let merged = merge_config(&read_existing(&gobgp.config_path)?, &self.gobgp)?;
            let tee = Shell::new(TEE_CMD, [gobgp.config_path.as_str()])
                .with_input(merged.into_bytes());
            seq.set_slot(
                UpdateType::GobgpConfig,
                RemoteShellCommand::new(ShellCommand::new(Some(tee), None, None), executor),
            )?;
        }

        if !self.datastore.is_empty() {
            info!(
                count = self.datastore.len(),
                "Datastore mutations are not applied"
            );
            for mutation in self.datastore.mutations() {
                debug!(mutation = %mutation, "skipped");
            }
        }

        Ok(seq)
    }
}

/// Contents of a managed file, empty when it does not exist yet.
fn read_existing(path: &str) -> NcmdResult<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path, "No existing file");
            Ok(String::new())
        }
        Err(e) => Err(NcmdError::io(path, e)),
    }
}

/// Executor selected by the configured mode.
pub fn executor(config: &ExecutorConfig) -> Arc<dyn RemoteExecutor> {
    match config.mode {
        ExecutorMode::Local => Arc::new(LocalResponder),
        ExecutorMode::Cfgd => Arc::new(ProcessExecutor::new(
            config.cfgd_path.as_str(),
            Vec::<String>::new(),
        )),
    }
}

/// Backup/rollback/commit plan of every managed file.
pub fn backup_plans(config: &NcmdConfig) -> Vec<(UpdateType, BackupPlan)> {
    vec![
        (
            UpdateType::Vty,
            BackupPlan::frr(
                &config.frr.config_path,
                &config.frr.vtysh,
                config.frr.auto_restart.shell(),
            ),
        ),
        (UpdateType::Sysctl, BackupPlan::sysctl(&config.sysctl.path)),
        (UpdateType::SysVrf, BackupPlan::vrf(&config.vrf.path)),
        (UpdateType::Network, BackupPlan::network(&config.network.path)),
        (
            UpdateType::Gobgp,
            BackupPlan::gobgp(
                &config.gobgp.config_path,
                &config.gobgp.service,
                config.gobgp.restart,
            ),
        ),
    ]
}

/// Runs Do over the whole sequence and, when every command succeeded, End.
///
/// A failed Do has already been rolled back by the sequence when this
/// returns its error.
#[instrument(skip(seq), fields(commands = seq.len(), dry_run = seq.dry_run()))]
pub async fn execute(seq: &mut CommandSequence) -> NcmdResult<()> {
    seq.do_all().await?;
    seq.end_all().await?;
    info!("Configuration applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoRestart;
    use crate::edits::Edit;
    use netcfg_test::{
        assert_lines, bgp_fixtures, interface_fixtures, ospf_fixtures, EditSet, Journal,
        RecordingExecutor,
    };
    use pretty_assertions::assert_eq;

    fn trees(edits: EditSet) -> ConfigTrees {
        let edits: Vec<Edit> = edits
            .edits()
            .iter()
            .map(|e| Edit::new(e.xpath.as_str(), e.value.as_str()))
            .collect();
        ConfigTrees::from_edits(&edits).unwrap()
    }

    fn applier(edits: EditSet) -> Applier {
        let mut applier = Applier::new();
        applier.process(&trees(edits)).unwrap();
        applier
    }

    fn full() -> EditSet {
        bgp_fixtures::global("mic", 65000, "10.0.0.1")
            .merge(ospf_fixtures::router_id("mic", "10.0.0.1"))
            .merge(interface_fixtures::ethernet("eth1", 1500))
    }

    #[test]
    fn test_one_walk_feeds_every_emitter() {
        let applier = applier(full());

        assert_eq!(applier.gobgp().len(), 3);
        assert_eq!(applier.cli().len(), 1);
        assert!(!applier.datastore().is_empty());
    }

    #[test]
    fn test_render() {
        let applier = applier(full());
        let config = NcmdConfig::default();

        let gobgp = applier.render(RenderTarget::Gobgp, &config);
        assert_lines(
            gobgp.as_slice(),
            &["[global.config]", "as = 65000", "router-id = \"10.0.0.1\""],
        );
        let vty = applier.render(RenderTarget::Vty, &config);
        assert_lines(
            vty.as_slice(),
            &["/usr/bin/vtysh -c \"configure terminal\" -c \"router ospf\" -c \"router-id 10.0.0.1\" -c exit -c end"],
        );
        let datastore = applier.render(RenderTarget::Datastore, &config);
        assert!(datastore
            .iter()
            .all(|line| line.starts_with("/beluganos-interfaces:interfaces/interface[name='eth1']")));
    }

    #[test]
    fn test_commands_layout() {
        let applier = applier(full());
        let journal = Journal::new();
        let seq = applier
            .commands(&NcmdConfig::default(), Arc::new(RecordingExecutor::new(&journal)))
            .unwrap();

        assert_eq!(seq.len(), 4);
        assert_eq!(seq.slot(UpdateType::Vty), Some(0));
        assert_eq!(seq.slot(UpdateType::Gobgp), Some(2));
        assert_eq!(seq.slot(UpdateType::GobgpConfig), Some(3));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_render_targets_non_default_instance() {
        let applier = applier(ospf_fixtures::router_id("ric1", "10.0.1.1"));
        let config = NcmdConfig::default();

        let vty = applier.render(RenderTarget::Vty, &config);
        assert_lines(
            vty.as_slice(),
            &["/usr/bin/vtysh -N ric1 -c \"configure terminal\" -c \"router ospf\" -c \"router-id 10.0.1.1\" -c exit -c end"],
        );
    }

    #[test]
    fn test_commands_reject_broken_gobgp_config() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[global\nas = ").unwrap();
        let mut config = NcmdConfig::default();
        config.gobgp.config_path = file.path().to_string_lossy().into_owned();
        let journal = Journal::new();

        let err = applier(full())
            .commands(&config, Arc::new(RecordingExecutor::new(&journal)))
            .unwrap_err();
        assert!(matches!(err, NcmdError::Emit(_)));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_read_existing_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gobgpd.toml");
        assert_eq!(read_existing(&path.to_string_lossy()).unwrap(), "");
    }

    #[test]
    fn test_commands_empty() {
        let applier = applier(interface_fixtures::ethernet("eth1", 1500));
        let journal = Journal::new();
        let seq = applier
            .commands(&NcmdConfig::default(), Arc::new(RecordingExecutor::new(&journal)))
            .unwrap();
        assert!(seq.is_empty());
    }

    #[tokio::test]
    async fn test_execute_runs_do_then_end() {
        let applier = applier(full());
        let journal = Journal::new();
        let mut seq = applier
            .commands(&NcmdConfig::default(), Arc::new(RecordingExecutor::new(&journal)))
            .unwrap();

        execute(&mut seq).await.unwrap();

        let entries = journal.entries();
        assert_eq!(entries.len(), 6);
        assert_eq!(
            entries[0],
            "/bin/sh -c \"if [ -e /etc/frr/frr.conf ]; then /bin/cp -f /etc/frr/frr.conf /etc/frr/frr.conf.backup; else /bin/rm -f /etc/frr/frr.conf.backup; fi\""
        );
        assert!(entries[1].contains("router ospf"));
        assert!(entries[2].contains("/bin/cp -f /etc/frr/gobgpd.toml /etc/frr/gobgpd.toml.backup"));
        assert_eq!(entries[3], "/usr/bin/tee /etc/frr/gobgpd.toml");
        assert!(entries[4].contains("write file"));
        assert!(entries[5].contains("restart gobgpd"));
    }

    #[tokio::test]
    async fn test_execute_rolls_back_on_failure() {
        let applier = applier(full());
        let journal = Journal::new();
        let mut config = NcmdConfig::default();
        config.frr.auto_restart = AutoRestart::Restart;
        let executor = RecordingExecutor::new(&journal).failing_on("/usr/bin/tee");
        let mut seq = applier.commands(&config, Arc::new(executor)).unwrap();

        assert!(execute(&mut seq).await.is_err());

        let entries = journal.entries();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[3], "/usr/bin/tee /etc/frr/gobgpd.toml");
        assert!(entries[4].contains("/bin/cp -f /etc/frr/gobgpd.toml.backup /etc/frr/gobgpd.toml"));
        assert_eq!(entries[5], "/bin/systemctl restart frr");
    }

    #[tokio::test]
    async fn test_execute_dry_run() {
        let applier = applier(full());
        let journal = Journal::new();
        let mut config = NcmdConfig::default();
        config.executor.dry_run = true;
        let mut seq = applier
            .commands(&config, Arc::new(RecordingExecutor::new(&journal)))
            .unwrap();

        execute(&mut seq).await.unwrap();
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_backup_plans() {
        let plans = backup_plans(&NcmdConfig::default());
        let paths: Vec<(UpdateType, &str)> = plans.iter().map(|(t, p)| (*t, p.path())).collect();
        assert_eq!(
            paths,
            vec![
                (UpdateType::Vty, "/etc/frr/frr.conf"),
                (UpdateType::Sysctl, "/etc/sysctl.d/30-beluganos.conf"),
                (UpdateType::SysVrf, "/etc/vrf.conf"),
                (UpdateType::Network, "/etc/netplan/02-beluganos.yaml"),
                (UpdateType::Gobgp, "/etc/frr/gobgpd.toml"),
            ]
        );
    }
}
