//! Maps observed save-unit snapshots to a coarse UI state.

use blurmill_runtime::WorkInfo;
use tokio::sync::watch;

/// Coarse processing state surfaced to a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    /// Nothing observed yet.
    #[default]
    Idle,
    /// A tagged save unit exists and has not finished.
    InProgress,
    /// The observed save unit reached a terminal status.
    Finished,
}

/// Fold one observed snapshot list into the current UI state.
///
/// An empty list leaves the state unchanged. Only the first element is
/// inspected: under the replace policy at most one tagged save unit is
/// outstanding at a time.
pub fn fold_ui_state(current: UiState, infos: &[WorkInfo]) -> UiState {
    match infos.first() {
        None => current,
        Some(info) if info.status.is_finished() => UiState::Finished,
        Some(_) => UiState::InProgress,
    }
}

/// Drive [`fold_ui_state`] from a tag watch channel.
///
/// Publishes the folded state on its own watch channel, processing one
/// snapshot list at a time. The task ends when the source channel closes.
pub fn spawn_ui_observer(
    mut source: watch::Receiver<Vec<WorkInfo>>,
) -> (watch::Receiver<UiState>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = watch::channel(UiState::Idle);
    let handle = tokio::spawn(async move {
        loop {
            let folded = {
                let infos = source.borrow_and_update();
                fold_ui_state(*tx.borrow(), infos.as_slice())
            };
            tx.send_replace(folded);
            if source.changed().await.is_err() {
                break;
            }
        }
    });
    (rx, handle)
}
