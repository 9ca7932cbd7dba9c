// Type-erased unit of work
//
// A queue holds items with different result types, so each submission is
// wrapped in a command object that owns the operation and the caller's reply
// channel until the item settles or is cleared.

use crate::domain::{QueueError, WorkItemId};
use futures::future::BoxFuture;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use tokio::sync::oneshot;

/// How an operation ended, as far as bookkeeping is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Failed(String),
}

/// Outcome plus the deferred delivery of the typed result to the caller
///
/// Delivery is split off so the queue can finish its bookkeeping before the
/// caller observes the result.
pub(crate) struct Settlement {
    pub outcome: Outcome,
    pub deliver: Box<dyn FnOnce() + Send>,
}

impl Settlement {
    fn new(outcome: Outcome, deliver: impl FnOnce() + Send + 'static) -> Self {
        Self {
            outcome,
            deliver: Box::new(deliver),
        }
    }
}

/// Single-capability command object owned by a work item
pub(crate) trait Job: Send {
    /// Run the operation on its own task and report how it ended
    fn run(self: Box<Self>, id: WorkItemId) -> BoxFuture<'static, Settlement>;

    /// Reject a never-started item (queue cleared)
    fn reject(self: Box<Self>, id: WorkItemId, label: String);
}

pub(crate) type ReplySender<T, E> = oneshot::Sender<Result<T, QueueError<E>>>;

pub(crate) struct TypedJob<F, T, E> {
    operation: F,
    reply: ReplySender<T, E>,
}

impl<F, T, E> TypedJob<F, T, E> {
    pub(crate) fn new(operation: F, reply: ReplySender<T, E>) -> Self {
        Self { operation, reply }
    }
}

impl<F, Fut, T, E> Job for TypedJob<F, T, E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    fn run(self: Box<Self>, id: WorkItemId) -> BoxFuture<'static, Settlement> {
        let TypedJob { operation, reply } = *self;

        Box::pin(async move {
            // Spawned separately so a panic stays inside the operation's task
            let joined = tokio::task::spawn(async move { operation().await }).await;

            // A dropped receiver means the caller stopped waiting; the item
            // still counts, so send results are ignored
            match joined {
                Ok(Ok(value)) => Settlement::new(Outcome::Completed, move || {
                    let _ = reply.send(Ok(value));
                }),
                Ok(Err(err)) => {
                    let message = err.to_string();
                    Settlement::new(Outcome::Failed(message), move || {
                        let _ = reply.send(Err(QueueError::Operation(err)));
                    })
                }
                Err(join_err) if join_err.is_panic() => {
                    let message = panic_message(join_err.into_panic());
                    Settlement::new(Outcome::Failed(message.clone()), move || {
                        let _ = reply.send(Err(QueueError::Panicked { id, message }));
                    })
                }
                Err(_) => Settlement::new(
                    Outcome::Failed("operation task cancelled".to_string()),
                    move || {
                        let _ = reply.send(Err(QueueError::Abandoned { id }));
                    },
                ),
            }
        })
    }

    fn reject(self: Box<Self>, id: WorkItemId, label: String) {
        let _ = self.reply.send(Err(QueueError::Cleared { id, label }));
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
