//! Mapping from controller state to the view that should be shown.

use std::fmt;

use crate::state::ControllerState;
use crate::workflow::WorkflowState;

/// The three mutually exclusive top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Configuration entry form.
    Configuration,
    /// Progress monitor for a running workflow.
    Progress,
    /// Results dashboard for a finished workflow.
    Results,
}

impl View {
    /// Total mapping from the tracked workflow state to a view.
    ///
    /// A cancelled workflow has nothing to monitor and no results, so it
    /// returns to configuration.
    pub fn for_state(state: Option<WorkflowState>) -> Self {
        match state {
            None => Self::Configuration,
            Some(WorkflowState::Initializing | WorkflowState::Running) => Self::Progress,
            Some(WorkflowState::Completed | WorkflowState::Failed) => Self::Results,
            Some(WorkflowState::Cancelled) => Self::Configuration,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Progress => "progress",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the view for a state snapshot. Driven solely by the workflow
/// status; `error` and `loading` never change the view.
pub fn route(state: &ControllerState) -> View {
    View::for_state(state.current_workflow.as_ref().map(|wf| wf.status))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::workflow::WorkflowStatus;

    fn with_status(state: WorkflowState) -> ControllerState {
        ControllerState {
            current_workflow: Some(WorkflowStatus {
                status: state,
                ..WorkflowStatus::initial("wf-1", Utc::now())
            }),
            ..ControllerState::default()
        }
    }

    #[test]
    fn no_workflow_routes_to_configuration() {
        assert_eq!(route(&ControllerState::default()), View::Configuration);
    }

    #[test]
    fn every_state_has_a_view() {
        let cases = [
            (WorkflowState::Initializing, View::Progress),
            (WorkflowState::Running, View::Progress),
            (WorkflowState::Completed, View::Results),
            (WorkflowState::Failed, View::Results),
            (WorkflowState::Cancelled, View::Configuration),
        ];
        for (state, expected) in cases {
            assert_eq!(route(&with_status(state)), expected, "state {state}");
        }
    }

    #[test]
    fn error_does_not_change_view() {
        let mut state = with_status(WorkflowState::Running);
        state.error = Some("poll failed".into());
        assert_eq!(route(&state), View::Progress);
    }

    #[test]
    fn loading_without_workflow_stays_on_configuration() {
        let state = ControllerState {
            loading: true,
            ..ControllerState::default()
        };
        assert_eq!(route(&state), View::Configuration);
    }
}
