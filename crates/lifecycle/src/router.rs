//! View routing effect.
//!
//! [`ViewRouter`] subscribes to the controller's store and, after every
//! state change, derives the [`View`] and hands it to a [`ViewRenderer`].
//! Errors never drive a transition; only the workflow status does.

use std::sync::Arc;

use qaflow_core::state::ControllerState;
use qaflow_core::view::{route, View};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::controller::WorkflowController;

/// Presentation layer hook.
pub trait ViewRenderer: Send + 'static {
    /// Render `view` for `state`. Called once on spawn and after every
    /// state change.
    fn render(&mut self, view: View, state: &ControllerState);
}

/// Handle to the running router task.
pub struct ViewRouter {
    controller: Arc<WorkflowController>,
    view_rx: watch::Receiver<View>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ViewRouter {
    /// Spawn the router. The current state is rendered immediately.
    pub fn spawn<R: ViewRenderer>(controller: Arc<WorkflowController>, renderer: R) -> Self {
        let mut state_rx = controller.store().subscribe();
        let initial = route(&state_rx.borrow_and_update());
        let (view_tx, view_rx) = watch::channel(initial);
        let cancel = controller.child_token();

        let handle = tokio::spawn(run(state_rx, view_tx, renderer, cancel.clone()));

        Self {
            controller,
            view_rx,
            cancel,
            handle,
        }
    }

    /// The most recently routed view.
    pub fn current_view(&self) -> View {
        *self.view_rx.borrow()
    }

    /// Receive a notification whenever the routed view changes.
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view_rx.clone()
    }

    /// Manual override back to the configuration view. Resets the
    /// controller.
    pub async fn back_to_configuration(&self) {
        self.controller.reset().await;
    }

    /// Stop the router after rendering any pending change.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn run<R: ViewRenderer>(
    mut state_rx: watch::Receiver<ControllerState>,
    view_tx: watch::Sender<View>,
    mut renderer: R,
    cancel: CancellationToken,
) {
    let initial = state_rx.borrow_and_update().clone();
    render(&mut renderer, &view_tx, &initial);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if state_rx.has_changed().unwrap_or(false) {
                    let state = state_rx.borrow_and_update().clone();
                    render(&mut renderer, &view_tx, &state);
                }
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                render(&mut renderer, &view_tx, &state);
            }
        }
    }

    tracing::debug!("View router stopped");
}

fn render<R: ViewRenderer>(renderer: &mut R, view_tx: &watch::Sender<View>, state: &ControllerState) {
    let view = route(state);
    view_tx.send_if_modified(|current| {
        if *current == view {
            return false;
        }
        tracing::info!(from = %current, to = %view, "View changed");
        *current = view;
        true
    });
    renderer.render(view, state);
}
