use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::common::error::TradeEngineError;
use crate::message::TradeMessage;
use crate::messenger::PeerMessenger;
use crate::protocol::process_model::ProcessModel;
use crate::trade::{ProcessState, RoleVariant};
use crate::wallet::TradeWallet;

/// Execution context handed to every task of one chain. Owns the working copy
/// of the process model; the dispatcher writes it back when the chain ends.
pub(crate) struct TaskContext {
    pub(crate) trade_uuid: Uuid,
    pub(crate) role: RoleVariant,
    pub(crate) model: ProcessModel,
    pub(crate) inbound: Option<TradeMessage>,
    pub(crate) messenger: Arc<dyn PeerMessenger>,
    pub(crate) wallet: Arc<dyn TradeWallet>,
}

/// Structured failure value returned through the task failure channel - the
/// target failure state, ordered diagnostics for the trade's error log, and
/// the rendered originating cause if there was one.
#[derive(Clone, Debug)]
pub(crate) struct TaskFailure {
    pub(crate) state: ProcessState,
    pub(crate) diagnostics: Vec<String>,
    pub(crate) cause: Option<String>,
}

impl TaskFailure {
    pub(crate) fn message_sending(diagnostic: impl Into<String>) -> Self {
        Self {
            state: ProcessState::MessageSendingFailed,
            diagnostics: vec![diagnostic.into()],
            cause: None,
        }
    }

    pub(crate) fn validation(diagnostic: impl Into<String>) -> Self {
        Self {
            state: ProcessState::ValidationFailed,
            diagnostics: vec![diagnostic.into()],
            cause: None,
        }
    }

    pub(crate) fn exception(error: TradeEngineError) -> Self {
        let rendered = error.to_string();
        Self {
            state: ProcessState::TaskException,
            diagnostics: vec![rendered.clone()],
            cause: Some(rendered),
        }
    }
}

/// One atomic unit of protocol work. The returned future resolving is the
/// task's exactly-once completion or failure signal - internal errors convert
/// into a `TaskFailure`, never a panic across the runner boundary.
#[async_trait]
pub(crate) trait Task: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure>;
}

#[derive(Debug)]
pub(crate) struct RunnerOutcome {
    pub(crate) started: usize,
    pub(crate) failure: Option<TaskFailure>,
}

impl RunnerOutcome {
    pub(crate) fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Runs an ordered task sequence strictly sequentially, aborting at the first
/// failure - no subsequent task in the sequence starts.
pub(crate) struct TaskRunner {
    trade_uuid: Uuid,
    role: RoleVariant,
}

impl TaskRunner {
    pub(crate) fn new(trade_uuid: Uuid, role: RoleVariant) -> Self {
        Self { trade_uuid, role }
    }

    pub(crate) async fn run(
        &self,
        tasks: Vec<Box<dyn Task>>,
        context: &mut TaskContext,
    ) -> RunnerOutcome {
        let mut started: usize = 0;

        for task in tasks {
            started += 1;
            debug!(
                "TaskRunner for {} Trade w/ TradeUUID {} running task {}",
                self.role,
                self.trade_uuid,
                task.name()
            );

            if let Some(failure) = task.run(context).await.err() {
                error!(
                    "TaskRunner for {} Trade w/ TradeUUID {} aborting at task {} towards state {} - {:?}",
                    self.role,
                    self.trade_uuid,
                    task.name(),
                    failure.state,
                    failure.diagnostics
                );
                return RunnerOutcome {
                    started,
                    failure: Some(failure),
                };
            }
        }

        RunnerOutcome {
            started,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::testing::{SomeTestTradeParams, TestMessenger, TestWallet};
    use crate::trade::{TradeRole, TradeSide};

    struct CountingTask {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Task for CountingTask {
        fn name(&self) -> &'static str {
            "CountingTask"
        }

        async fn run(&self, _context: &mut TaskContext) -> Result<(), TaskFailure> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingTask;

    #[async_trait]
    impl Task for FailingTask {
        fn name(&self) -> &'static str {
            "FailingTask"
        }

        async fn run(&self, _context: &mut TaskContext) -> Result<(), TaskFailure> {
            Err(TaskFailure::message_sending("Sending some message failed"))
        }
    }

    fn some_context() -> TaskContext {
        TaskContext {
            trade_uuid: SomeTestTradeParams::some_uuid(),
            role: RoleVariant {
                role: TradeRole::Taker,
                side: TradeSide::Buyer,
            },
            model: ProcessModel::new(SomeTestTradeParams::taker_terms()),
            inbound: None,
            messenger: Arc::new(TestMessenger::new()),
            wallet: Arc::new(TestWallet::new()),
        }
    }

    #[tokio::test]
    async fn all_tasks_run_when_every_task_succeeds() {
        let count = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<Box<dyn Task>> = (0..4)
            .map(|_| {
                Box::new(CountingTask {
                    count: count.clone(),
                }) as Box<dyn Task>
            })
            .collect();

        let mut context = some_context();
        let runner = TaskRunner::new(context.trade_uuid, context.role);
        let outcome = runner.run(tasks, &mut context).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.started, 4);
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn runner_halts_at_first_failure() {
        let count = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(CountingTask {
                count: count.clone(),
            }),
            Box::new(FailingTask),
            Box::new(CountingTask {
                count: count.clone(),
            }),
            Box::new(CountingTask {
                count: count.clone(),
            }),
        ];

        let mut context = some_context();
        let runner = TaskRunner::new(context.trade_uuid, context.role);
        let outcome = runner.run(tasks, &mut context).await;

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.state, ProcessState::MessageSendingFailed);
        assert_eq!(outcome.started, 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_sequence_succeeds_without_starting_tasks() {
        let mut context = some_context();
        let runner = TaskRunner::new(context.trade_uuid, context.role);
        let outcome = runner.run(Vec::new(), &mut context).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.started, 0);
    }
}
