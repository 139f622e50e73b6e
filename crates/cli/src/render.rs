//! Terminal presentation of the routed views.

use std::fmt::Write as _;
use std::io::Write;

use qaflow_core::health::ServiceHealthResponse;
use qaflow_core::results::WorkflowResults;
use qaflow_core::state::ControllerState;
use qaflow_core::view::View;
use qaflow_core::workflow::{WorkflowConfig, WorkflowStatus};
use qaflow_lifecycle::ViewRenderer;

const BAR_WIDTH: usize = 30;

/// Writes each distinct rendering of the current view to `out`.
pub struct TerminalRenderer<W> {
    out: W,
    last: Option<String>,
}

impl<W: Write + Send + 'static> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }
}

impl<W: Write + Send + 'static> ViewRenderer for TerminalRenderer<W> {
    fn render(&mut self, view: View, state: &ControllerState) {
        let text = render_view(view, state);
        if self.last.as_deref() == Some(text.as_str()) {
            return;
        }
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
        self.last = Some(text);
    }
}

/// Render `view` for `state` as text.
pub fn render_view(view: View, state: &ControllerState) -> String {
    let mut out = String::new();

    match view {
        View::Configuration => configuration(&mut out, state),
        View::Progress => {
            if let Some(status) = &state.current_workflow {
                progress(&mut out, status);
            }
        }
        View::Results => {
            if let Some(status) = &state.current_workflow {
                results(&mut out, status, state.results.as_ref());
            }
        }
    }

    if let Some(health) = &state.service_health {
        health_line(&mut out, health);
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}

// ---- views ----

fn configuration(out: &mut String, state: &ControllerState) {
    match (&state.config, &state.current_workflow) {
        (Some(config), _) if state.loading => {
            let _ = writeln!(out, "Submitting workflow: {}", describe(config));
        }
        (_, Some(status)) => {
            let _ = writeln!(out, "Workflow {} was {}", status.workflow_id, status.status);
        }
        (Some(config), None) => {
            let _ = writeln!(out, "Not started: {}", describe(config));
        }
        (None, None) => {
            let _ = writeln!(out, "No workflow running");
        }
    }
}

fn progress(out: &mut String, status: &WorkflowStatus) {
    let _ = writeln!(
        out,
        "[{}] {:5.1}%  {:<12} {}",
        bar(status.progress),
        status.progress,
        status.status.as_str(),
        status.current_step,
    );
    if let Some(eta) = status.estimated_completion {
        let _ = writeln!(out, "  estimated completion: {}", eta.format("%H:%M:%S UTC"));
    }
}

fn results(out: &mut String, status: &WorkflowStatus, results: Option<&WorkflowResults>) {
    let _ = writeln!(out, "Workflow {} {}", status.workflow_id, status.status);

    let Some(results) = results else {
        let _ = writeln!(out, "  results not available");
        return;
    };

    if let Some(secs) = results.execution_time {
        let _ = writeln!(out, "  execution time: {secs:.1}s");
    }
    let _ = writeln!(
        out,
        "  stages: {}/7 produced output",
        results.results.completed_stage_count()
    );
    for (stage, output) in results.results.stages() {
        let mark = if output.is_some() { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {stage}");
    }
    for name in results.results.other.keys() {
        let _ = writeln!(out, "  [x] {name}");
    }

    let failed = results.failed_services();
    if !failed.is_empty() {
        let _ = writeln!(out, "  failed services: {}", failed.join(", "));
    }
    for error in results.errors.iter().flatten() {
        let _ = writeln!(out, "  ! {error}");
    }
}

fn health_line(out: &mut String, health: &ServiceHealthResponse) {
    let summary = &health.summary;
    let _ = write!(
        out,
        "services: {}/{} healthy",
        summary.healthy_services, summary.total_services
    );
    let unhealthy: Vec<&str> = health.unhealthy().map(|(name, _)| name).collect();
    if !unhealthy.is_empty() {
        let _ = write!(out, " (down: {})", unhealthy.join(", "));
    }
    out.push('\n');
}

// ---- private helpers ----

fn describe(config: &WorkflowConfig) -> String {
    format!("{} ({})", config.url, config.workflow_type.as_str())
}

fn bar(progress: f64) -> String {
    let filled = ((progress / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
