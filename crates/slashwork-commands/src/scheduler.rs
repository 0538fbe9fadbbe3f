//! Execution scheduler
//!
//! Both paths return a [`Task`], so callers route failures the same way
//! whether the executor ran inline or on the runtime.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

use crate::context::CommandContext;
use crate::error::ExecutionError;

pub type ExecutorFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Callback that runs a command node
pub type Executor = Arc<dyn Fn(CommandContext) -> ExecutorFuture + Send + Sync>;

/// Wrap an async closure into an [`Executor`]
pub fn executor<F, Fut>(f: F) -> Executor
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

enum TaskState {
    Finished(Result<(), ExecutionError>),
    Running(JoinHandle<Result<(), ExecutionError>>),
}

/// Handle to an executor run
pub struct Task {
    state: TaskState,
}

/// How a task ended after its exception handler was attached
#[derive(Debug)]
pub enum TaskStatus {
    Completed,
    Failed,
    /// Still running in the background; the handle resolves once the handler ran
    Scheduled(JoinHandle<()>),
}

impl Task {
    fn finished(result: Result<(), ExecutionError>) -> Self {
        Self {
            state: TaskState::Finished(result),
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            TaskState::Finished(_) => true,
            TaskState::Running(handle) => handle.is_finished(),
        }
    }

    /// Route a failure to `handler`.
    ///
    /// A finished task calls the handler before returning. A running task gets
    /// a watcher that calls it once the background run fails.
    pub async fn on_exception<F, Fut>(self, handler: F) -> TaskStatus
    where
        F: FnOnce(ExecutionError) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self.state {
            TaskState::Finished(Ok(())) => TaskStatus::Completed,
            TaskState::Finished(Err(error)) => {
                handler(error).await;
                TaskStatus::Failed
            }
            TaskState::Running(handle) => {
                let watcher = tokio::spawn(async move {
                    if let Err(error) = flatten(handle.await) {
                        handler(error).await;
                    }
                });
                TaskStatus::Scheduled(watcher)
            }
        }
    }

    /// Wait for the outcome without a handler
    pub async fn join(self) -> Result<(), ExecutionError> {
        match self.state {
            TaskState::Finished(result) => result,
            TaskState::Running(handle) => flatten(handle.await),
        }
    }
}

/// Run the executor to completion on the calling task
pub async fn run_sync(executor: &Executor, ctx: CommandContext) -> Task {
    let result = match panic::catch_unwind(AssertUnwindSafe(|| executor(ctx))) {
        Ok(future) => guard(future).await,
        Err(payload) => Err(ExecutionError::Panicked(panic_message(payload.as_ref()))),
    };
    Task::finished(result)
}

/// Hand the executor to the runtime and return immediately
pub fn run_async(executor: &Executor, ctx: CommandContext) -> Task {
    let runtime = match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => return Task::finished(Err(ExecutionError::NoRuntime)),
    };

    let executor = Arc::clone(executor);
    let handle = runtime.spawn(async move {
        match panic::catch_unwind(AssertUnwindSafe(|| executor(ctx))) {
            Ok(future) => future.await.map_err(ExecutionError::Failed),
            Err(payload) => Err(ExecutionError::Panicked(panic_message(payload.as_ref()))),
        }
    });

    Task {
        state: TaskState::Running(handle),
    }
}

async fn guard(future: ExecutorFuture) -> Result<(), ExecutionError> {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result.map_err(ExecutionError::Failed),
        Err(payload) => Err(ExecutionError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn flatten(joined: Result<Result<(), ExecutionError>, JoinError>) -> Result<(), ExecutionError> {
    match joined {
        Ok(result) => result,
        Err(error) if error.is_panic() => Err(ExecutionError::Panicked(panic_message(
            error.into_panic().as_ref(),
        ))),
        Err(_) => Err(ExecutionError::Cancelled),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
