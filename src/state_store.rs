//! This module owns the application state. Every tracker mutation happens in
//! [`StateStore::main_loop`], one action or transfer event at a time.
use std::sync::Arc;

use color_eyre::eyre;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::action::Action;
use crate::model::state::State;
use crate::model::upload_event::UploadEvent;
use crate::services::upload_client::UploadTransport;
use crate::services::upload_session::UploadSession;
use crate::settings::upload_config::UploadConfig;
use crate::termination::{Interrupted, Terminator};

pub struct StateStore {
    state_tx: UnboundedSender<State>,
}

impl StateStore {
    pub fn new() -> (Self, UnboundedReceiver<State>) {
        let (state_tx, state_rx) = mpsc::unbounded_channel::<State>();

        (StateStore { state_tx }, state_rx)
    }
}

impl StateStore {
    pub async fn main_loop(
        self,
        mut terminator: Terminator,
        mut action_rx: UnboundedReceiver<Action>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
        config: UploadConfig,
        transport: Arc<dyn UploadTransport>,
    ) -> eyre::Result<Interrupted> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UploadEvent>();
        let session = UploadSession::new(&config, transport, event_tx);
        let mut state = State::new(&config);

        // the initial state once
        self.state_tx.send(state.clone())?;

        let result = loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    if state.tracker.apply(&event) {
                        self.state_tx.send(state.clone())?;
                    } else {
                        tracing::debug!("Ignored upload event for {}", event.name());
                    }
                },
                Some(action) = action_rx.recv() => match action {
                    Action::Exit => {
                        let _ = terminator.terminate(Interrupted::UserInt);

                        break Interrupted::UserInt;
                    },
                    Action::Navigate { page } => {
                        state.set_active_page(page);
                        self.state_tx.send(state.clone())?;
                    },
                    Action::Drop { paths } => {
                        tracing::info!("Dropped {} path(s)", paths.len());
                        session.handle_drop(&mut state.tracker, paths).await;
                        self.state_tx.send(state.clone())?;
                    },
                    Action::Retry { name } => {
                        if session.retry(&mut state.tracker, &name).await {
                            self.state_tx.send(state.clone())?;
                        }
                    },
                    Action::Delete { name } => {
                        if session.delete(&mut state.tracker, &name).await {
                            self.state_tx.send(state.clone())?;
                        }
                    },
                },
                // Catch and handle interrupt signal to gracefully shutdown
                Ok(interrupted) = interrupt_rx.recv() => {
                    break interrupted;
                }
            }
        };

        session.shutdown().await;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::error::TransferError;
    use crate::model::state::ActivePage;
    use crate::model::upload_record::UploadStatus;
    use crate::services::upload_client::MockUploadTransport;
    use crate::termination::create_termination;
    use tempfile::TempDir;

    async fn next_state_matching(
        state_rx: &mut UnboundedReceiver<State>,
        predicate: impl Fn(&State) -> bool,
    ) -> State {
        loop {
            let state = state_rx.recv().await.unwrap();
            if predicate(&state) {
                return state;
            }
        }
    }

    #[tokio::test]
    async fn test_drop_upload_and_exit() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("photo.png");
        std::fs::write(&png, vec![0u8; 32]).unwrap();

        let mut mock = MockUploadTransport::new();
        mock.expect_upload().times(1).returning(|_, on_progress| {
            on_progress(50);
            Box::pin(async { Ok::<(), TransferError>(()) })
        });
        // the remote delete may still be queued when the loop exits
        mock.expect_delete()
            .times(0..=1)
            .returning(|_| Box::pin(async { Ok::<(), TransferError>(()) }));

        let (terminator, interrupt_rx) = create_termination();
        let (state_store, mut state_rx) = StateStore::new();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(state_store.main_loop(
            terminator,
            action_rx,
            interrupt_rx,
            UploadConfig::default(),
            Arc::new(mock),
        ));

        let initial = state_rx.recv().await.unwrap();
        assert!(initial.tracker.is_empty());
        assert_eq!(initial.active_page, ActivePage::Uploader);

        action_tx.send(Action::Drop { paths: vec![png] }).unwrap();
        let completed = next_state_matching(&mut state_rx, |s| {
            s.tracker
                .get("photo.png")
                .is_some_and(|r| r.status == UploadStatus::Completed)
        })
        .await;
        assert_eq!(completed.tracker.get("photo.png").unwrap().progress, 100);

        action_tx
            .send(Action::Delete { name: "photo.png".into() })
            .unwrap();
        next_state_matching(&mut state_rx, |s| s.tracker.is_empty()).await;

        action_tx
            .send(Action::Navigate { page: ActivePage::Help })
            .unwrap();
        next_state_matching(&mut state_rx, |s| s.active_page == ActivePage::Help).await;

        action_tx.send(Action::Exit).unwrap();
        let reason = handle.await.unwrap().unwrap();
        assert_eq!(reason, Interrupted::UserInt);
    }

    #[tokio::test]
    async fn test_dropping_unsupported_type_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let gif = dir.path().join("anim.gif");
        std::fs::write(&gif, vec![0u8; 32]).unwrap();

        let mut mock = MockUploadTransport::new();
        mock.expect_upload().never();

        let (terminator, interrupt_rx) = create_termination();
        let (state_store, mut state_rx) = StateStore::new();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(state_store.main_loop(
            terminator,
            action_rx,
            interrupt_rx,
            UploadConfig::default(),
            Arc::new(mock),
        ));
        state_rx.recv().await.unwrap();

        action_tx.send(Action::Drop { paths: vec![gif] }).unwrap();
        let after_drop = state_rx.recv().await.unwrap();
        assert!(after_drop.tracker.is_empty());

        action_tx.send(Action::Exit).unwrap();
        assert_eq!(handle.await.unwrap().unwrap(), Interrupted::UserInt);
    }
}
