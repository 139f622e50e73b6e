//! Subcommand handlers.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use qaflow_client::{WorkflowApi, WorkflowService};
use qaflow_core::workflow::{validate_workflow_config, WorkflowConfig, WorkflowState};
use qaflow_lifecycle::{StartOutcome, ViewRouter, WorkflowController};
use serde::Serialize;

use crate::cli::{Command, RunArgs};
use crate::config::ClientConfig;
use crate::render::TerminalRenderer;

pub async fn dispatch(command: Command, config: &ClientConfig) -> anyhow::Result<()> {
    let api = WorkflowApi::new(&config.api_url, config.request_timeout)
        .context("Failed to create orchestrator client")?;

    match command {
        Command::Run(args) => run(api, config, args).await,
        Command::Status { workflow_id } => print_json(&api.get_workflow_status(&workflow_id).await?),
        Command::Results { workflow_id } => {
            print_json(&api.get_workflow_results(&workflow_id).await?)
        }
        Command::Health => print_json(&api.get_service_health().await?),
        Command::List => print_json(&api.list_workflows().await?),
        Command::Cancel { workflow_id } => {
            let response = api.cancel_workflow(&workflow_id).await?;
            println!("{}", response.message);
            Ok(())
        }
        Command::Ping => {
            if api.check_liveness().await {
                println!("{} is reachable", api.base_url());
                Ok(())
            } else {
                bail!("{} is not reachable", api.base_url())
            }
        }
    }
}

/// Start a workflow and render it until polling ends.
///
/// Ctrl-C requests cancellation on the orchestrator and keeps following
/// the workflow until it reports `cancelled`; a second Ctrl-C exits
/// immediately.
async fn run(api: WorkflowApi, config: &ClientConfig, args: RunArgs) -> anyhow::Result<()> {
    let workflow = args.into_config()?;
    validate_workflow_config(&workflow)?;

    let service: Arc<dyn WorkflowService> = Arc::new(api);
    let controller = WorkflowController::new(service, config.controller_config());
    controller.spawn_health_loop().await;
    let router = ViewRouter::spawn(
        Arc::clone(&controller),
        TerminalRenderer::new(std::io::stdout()),
    );

    let outcome = follow(&controller, workflow).await;

    let final_state = controller.store().snapshot();
    router.stop().await;
    controller.shutdown().await;

    match outcome? {
        StartOutcome::Started(workflow_id) => {
            if let Some(error) = final_state.error {
                return Err(anyhow!(error));
            }
            match final_state.current_workflow.map(|wf| wf.status) {
                Some(WorkflowState::Completed) => Ok(()),
                Some(state) => bail!("Workflow {workflow_id} finished as {state}"),
                None => bail!("Workflow {workflow_id} is no longer tracked"),
            }
        }
        StartOutcome::Failed(message) => Err(anyhow!(message)),
        StartOutcome::Superseded => bail!("Workflow start was superseded"),
    }
}

async fn follow(
    controller: &Arc<WorkflowController>,
    workflow: WorkflowConfig,
) -> anyhow::Result<StartOutcome> {
    let outcome = controller.start(workflow).await;
    if !matches!(outcome, StartOutcome::Started(_)) {
        return Ok(outcome);
    }

    tokio::select! {
        _ = controller.wait_for_polling() => return Ok(outcome),
        signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl-C")?,
    }

    tracing::info!("Interrupted, cancelling workflow");
    controller.cancel().await;

    tokio::select! {
        _ = controller.wait_for_polling() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::warn!("Interrupted again, leaving workflow running on the orchestrator");
        }
    }
    Ok(outcome)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
