//! One reconciliation run: inventory → resolve → reconcile → publish

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::inventory::command::{CommandError, CommandRunner};
use crate::inventory::parser::InventoryParser;
use crate::inventory::types::{PackageRecord, collapse_duplicates};
use crate::scheduler::snapshot::{ReconciliationResult, StatusBoard};
use crate::version::checker::reconcile;
use crate::version::error::ReconcileError;
use crate::version::registry::Registry;
use crate::version::resolver::RemoteResolver;

/// How a run publishes its results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Publish the local inventory first, then the reconciled result
    Partial,
    /// Publish only the reconciled result
    Full,
}

/// Command lines producing the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryCommands {
    /// Prints the package manager's own version somewhere in its output
    pub version: String,
    /// Prints one installed package per line
    pub installed: String,
}

/// Runs reconciliations and publishes their results to a [`StatusBoard`]
pub struct Pipeline {
    runner: Arc<dyn CommandRunner>,
    commands: InventoryCommands,
    parser: InventoryParser,
    resolver: RemoteResolver,
    board: Arc<StatusBoard>,
}

impl Pipeline {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        commands: InventoryCommands,
        parser: InventoryParser,
        resolver: RemoteResolver,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            runner,
            commands,
            parser,
            resolver,
            board,
        }
    }

    /// Build a pipeline from configuration with the given collaborators
    pub fn from_config(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        registry: Arc<dyn Registry>,
    ) -> Self {
        let resolver = RemoteResolver::new(registry)
            .with_request_timeout(config.registry.request_timeout())
            .with_max_concurrency(config.registry.max_concurrent_requests);
        Self::new(
            runner,
            InventoryCommands {
                version: config.commands.version_command.clone(),
                installed: config.commands.installed_command.clone(),
            },
            InventoryParser::new(&config.inventory.self_package_name),
            resolver,
            Arc::new(StatusBoard::new()),
        )
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    /// Run both inventory commands concurrently and parse their output
    pub async fn load_inventory(&self) -> Result<Vec<PackageRecord>, CommandError> {
        let (version_output, installed_output) = tokio::try_join!(
            self.runner.run(&self.commands.version),
            self.runner.run(&self.commands.installed),
        )?;
        Ok(self.parser.parse(&version_output, &installed_output))
    }

    /// Run one reconciliation and publish the result
    ///
    /// On failure nothing further is published; in partial mode the
    /// inventory-only snapshot may already be visible.
    pub async fn run(&self, mode: RunMode) -> Result<Arc<ReconciliationResult>, ReconcileError> {
        let inventory = self.load_inventory().await?;
        info!("Loaded {} installed packages", inventory.len());

        if mode == RunMode::Partial {
            let previous = self.board.current();
            self.board.publish(ReconciliationResult {
                records: collapse_duplicates(inventory.clone()),
                checked_at: previous.checked_at,
            });
            debug!("Published inventory before remote resolution");
        }

        let names: IndexSet<String> = inventory.iter().map(|r| r.name.clone()).collect();
        let remote = self.resolver.resolve_versions(&names).await?;

        let records = reconcile(&inventory, &remote);
        Ok(self.board.publish(ReconciliationResult::checked_now(records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::command::MockCommandRunner;
    use crate::version::checker::PortStatus;
    use crate::version::error::RegistryError;
    use crate::version::registry::MockRegistry;

    fn commands() -> InventoryCommands {
        InventoryCommands {
            version: "port version".to_string(),
            installed: "port installed".to_string(),
        }
    }

    fn runner_with(version: &'static str, installed: &'static str) -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|command| command == "port version")
            .returning(move |_| Ok(version.to_string()));
        runner
            .expect_run()
            .withf(|command| command == "port installed")
            .returning(move |_| Ok(installed.to_string()));
        runner
    }

    fn pipeline(runner: MockCommandRunner, registry: MockRegistry) -> Pipeline {
        Pipeline::new(
            Arc::new(runner),
            commands(),
            InventoryParser::default(),
            RemoteResolver::new(Arc::new(registry)),
            Arc::new(StatusBoard::new()),
        )
    }

    #[tokio::test]
    async fn run_publishes_reconciled_records() {
        let runner = runner_with(
            "MacPorts 2.9.1\n",
            "foo 1.2.3_0+bar active\nbad-line\nbaz 2.0 active\n",
        );
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_latest_version()
            .returning(|name| match name {
                "foo" => Ok("1.2.3".to_string()),
                "macports" => Ok("2.9.1".to_string()),
                _ => Err(RegistryError::NotFound(name.to_string())),
            });
        let pipeline = pipeline(runner, registry);

        let result = pipeline.run(RunMode::Full).await.unwrap();

        let statuses: Vec<_> = result
            .records
            .iter()
            .map(|r| (r.name.as_str(), r.status()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("macports", PortStatus::Latest),
                ("foo", PortStatus::Latest),
                ("baz", PortStatus::Unknown),
            ]
        );
        assert!(result.checked_at.is_some());
        assert_eq!(pipeline.board().current(), result);
    }

    #[tokio::test]
    async fn run_fails_and_publishes_nothing_when_command_fails() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|command| {
            Err(CommandError::NonZeroExit {
                command: command.to_string(),
                code: Some(1),
            })
        });
        let mut registry = MockRegistry::new();
        registry.expect_fetch_latest_version().times(0);
        let pipeline = pipeline(runner, registry);

        let result = pipeline.run(RunMode::Partial).await;

        assert!(matches!(result, Err(ReconcileError::Command(_))));
        assert_eq!(
            *pipeline.board().current(),
            ReconciliationResult::default()
        );
    }

    #[tokio::test]
    async fn full_run_keeps_previous_result_when_registry_fails() {
        let runner = runner_with("", "foo @1.0_0 (active)\n");
        let mut registry = MockRegistry::new();
        registry.expect_fetch_latest_version().returning(|name| {
            Err(RegistryError::UnexpectedStatus {
                name: name.to_string(),
                status: 502,
            })
        });
        let pipeline = pipeline(runner, registry);
        let previous = pipeline
            .board()
            .publish(ReconciliationResult::checked_now(vec![
                PackageRecord::installed("old", "0.1"),
            ]));

        let result = pipeline.run(RunMode::Full).await;

        assert!(matches!(result, Err(ReconcileError::Registry(_))));
        assert_eq!(pipeline.board().current(), previous);
    }

    #[tokio::test]
    async fn partial_run_publishes_inventory_with_previous_checked_at() {
        let runner = runner_with("", "foo @1.0_0 (active)\n");
        let mut registry = MockRegistry::new();
        registry.expect_fetch_latest_version().returning(|name| {
            Err(RegistryError::UnexpectedStatus {
                name: name.to_string(),
                status: 500,
            })
        });
        let pipeline = pipeline(runner, registry);

        let result = pipeline.run(RunMode::Partial).await;

        assert!(result.is_err());
        let published = pipeline.board().current();
        assert_eq!(
            published.records,
            vec![PackageRecord::installed("foo", "1.0")]
        );
        assert_eq!(published.checked_at, None);
    }

    #[tokio::test]
    async fn load_inventory_runs_both_commands() {
        let runner = runner_with("Version: 2.10.5", "curl @8.5.0_0+ssl (active)\n");
        let registry = MockRegistry::new();
        let pipeline = pipeline(runner, registry);

        let inventory = pipeline.load_inventory().await.unwrap();

        assert_eq!(
            inventory,
            vec![
                PackageRecord::installed("macports", "2.10.5"),
                PackageRecord::installed("curl", "8.5.0"),
            ]
        );
    }
}
