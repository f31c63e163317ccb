//! Loading/success/error wrapper for asynchronous operations.
//!
//! # Responsibility
//! - Give the UI one state shape for every async operation.
//! - Publish the `Loading -> Success | Error` sequence for a single call.
//!
//! # Invariants
//! - `track` publishes exactly two states per call, `Loading` first.
//! - Error text comes from `HasMessage::user_message`, never raw error text.

use crate::error::HasMessage;
use std::future::Future;
use tokio::sync::watch;

/// State of one asynchronous operation as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resource<T> {
    #[default]
    Loading,
    Success(T),
    Error(String),
}

impl<T> Resource<T> {
    /// Converts a finished operation into its terminal state.
    pub fn from_result<E: HasMessage>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(err.user_message()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
        match self {
            Self::Loading => Resource::Loading,
            Self::Success(value) => Resource::Success(f(value)),
            Self::Error(message) => Resource::Error(message),
        }
    }
}

/// Runs `operation` while publishing its state on `state`.
///
/// Returns the terminal state that was published. Send errors are ignored:
/// a dropped receiver means the UI scope was torn down.
pub async fn track<T, E, F>(state: &watch::Sender<Resource<T>>, operation: F) -> Resource<T>
where
    T: Clone,
    E: HasMessage,
    F: Future<Output = Result<T, E>>,
{
    state.send_replace(Resource::Loading);
    let terminal = Resource::from_result(operation.await);
    state.send_replace(terminal.clone());
    terminal
}

#[cfg(test)]
mod tests {
    use super::{track, Resource};
    use crate::error::{HasMessage, MessageId};
    use tokio::sync::watch;

    #[derive(Debug)]
    struct Offline;

    impl HasMessage for Offline {
        fn message_id(&self) -> MessageId {
            MessageId::NoConnection
        }
    }

    #[test]
    fn from_result_uses_user_message() {
        let failed: Resource<u32> = Resource::from_result(Err(Offline));
        assert_eq!(
            failed.error_message(),
            Some(MessageId::NoConnection.default_text())
        );

        let ok: Resource<u32> = Resource::from_result::<Offline>(Ok(7));
        assert_eq!(ok.data(), Some(&7));
        assert_eq!(ok.map(|value| value * 2).into_data(), Some(14));
    }

    #[tokio::test]
    async fn track_publishes_loading_then_terminal_state() {
        let (tx, mut rx) = watch::channel(Resource::<u32>::Error("stale".to_string()));

        let operation = async {
            Ok::<_, Offline>(42)
        };
        let terminal = track(&tx, operation).await;

        assert_eq!(terminal, Resource::Success(42));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Resource::Success(42));
    }

    #[tokio::test]
    async fn track_observes_loading_before_completion() {
        let (tx, rx) = watch::channel(Resource::<u32>::Success(0));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            track(&tx, async move {
                let _ = release_rx.await;
                Err::<u32, _>(Offline)
            })
            .await
        });

        let mut rx_loading = rx.clone();
        rx_loading
            .wait_for(|state| state.is_loading())
            .await
            .expect("loading state should be published");
        release_tx.send(()).unwrap();

        let terminal = handle.await.unwrap();
        assert_eq!(
            terminal.error_message(),
            Some(MessageId::NoConnection.default_text())
        );
    }
}
