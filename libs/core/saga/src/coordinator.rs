// [libs/core/saga/src/coordinator.rs]
/*!
 * SagaCoordinator (C11): ejecuta pasos forward secuencialmente; ante
 * cualquier fallo, compensa los pasos previamente exitosos en orden
 * inverso. Cada paso se persiste en el journal antes de avanzar, de
 * modo que un reintento tras un crash salta las acciones forward ya
 * completadas (§4.10).
 */

use std::future::Future;

use broker_domain_models::errors::BrokerError;
use broker_domain_models::saga::SagaStepStatus;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::journal::{BoxFuture, SagaJournal};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SagaStepError(pub String);

pub struct SagaStep {
    pub name: String,
    forward: Box<dyn Fn() -> BoxFuture<'static, Result<(), SagaStepError>> + Send + Sync>,
    compensate: Box<dyn Fn() -> BoxFuture<'static, Result<(), SagaStepError>> + Send + Sync>,
}

impl SagaStep {
    pub fn new<F, FFut, C, CFut>(name: impl Into<String>, forward: F, compensate: C) -> Self
    where
        F: Fn() -> FFut + Send + Sync + 'static,
        FFut: Future<Output = Result<(), SagaStepError>> + Send + 'static,
        C: Fn() -> CFut + Send + Sync + 'static,
        CFut: Future<Output = Result<(), SagaStepError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            forward: Box::new(move || Box::pin(forward())),
            compensate: Box::new(move || Box::pin(compensate())),
        }
    }
}

pub struct SagaCoordinator<'a> {
    journal: &'a dyn SagaJournal,
}

impl<'a> SagaCoordinator<'a> {
    pub fn new(journal: &'a dyn SagaJournal) -> Self {
        Self { journal }
    }

    #[instrument(skip(self, steps), fields(saga_id = %saga_id, step_count = steps.len()))]
    pub async fn run(&self, saga_id: Uuid, steps: Vec<SagaStep>) -> Result<(), BrokerError> {
        let mut completed_indices: Vec<usize> = Vec::new();

        for (index, step) in steps.iter().enumerate() {
            let step_index = index as u32;

            if self.journal.status(saga_id, step_index).await == Some(SagaStepStatus::Completed) {
                completed_indices.push(index);
                continue;
            }

            match (step.forward)().await {
                Ok(()) => {
                    self.journal.record(saga_id, step_index, &step.name, SagaStepStatus::Completed).await;
                    completed_indices.push(index);
                }
                Err(forward_error) => {
                    warn!(step = %step.name, error = %forward_error, "saga step failed, compensating");
                    self.compensate(saga_id, &steps, &completed_indices).await;
                    return Err(BrokerError::SagaFailed(format!(
                        "step '{}' failed: {}",
                        step.name, forward_error
                    )));
                }
            }
        }

        Ok(())
    }

    async fn compensate(&self, saga_id: Uuid, steps: &[SagaStep], completed_indices: &[usize]) {
        for &done_index in completed_indices.iter().rev() {
            let done_step = &steps[done_index];
            match (done_step.compensate)().await {
                Ok(()) => {
                    self.journal
                        .record(saga_id, done_index as u32, &done_step.name, SagaStepStatus::Compensated)
                        .await;
                }
                Err(compensation_error) => {
                    error!(
                        step = %done_step.name,
                        error = %compensation_error,
                        "compensation failed; manual reconciliation required"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::InMemorySagaJournal;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn all_steps_succeed_commits_saga() {
        let journal = InMemorySagaJournal::new();
        let coordinator = SagaCoordinator::new(&journal);
        let executed = Arc::new(AtomicU32::new(0));
        let executed_clone = executed.clone();

        let steps = vec![SagaStep::new(
            "update_carrier",
            move || {
                let executed = executed_clone.clone();
                async move {
                    executed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            || async { Ok(()) },
        )];

        let result = coordinator.run(Uuid::new_v4(), steps).await;
        assert!(result.is_ok());
        assert_eq!(executed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_compensates_previous_steps_in_reverse_order() {
        let journal = InMemorySagaJournal::new();
        let coordinator = SagaCoordinator::new(&journal);
        let order = Arc::new(std::sync::Mutex::new(Vec::<&'static str>::new()));

        let order_a = order.clone();
        let order_b = order.clone();

        let steps = vec![
            SagaStep::new(
                "step_a",
                || async { Ok(()) },
                move || {
                    let order = order_a.clone();
                    async move {
                        order.lock().unwrap().push("compensate_a");
                        Ok(())
                    }
                },
            ),
            SagaStep::new(
                "step_b",
                || async { Err(SagaStepError("ledger transfer rejected".to_string())) },
                move || {
                    let order = order_b.clone();
                    async move {
                        order.lock().unwrap().push("compensate_b");
                        Ok(())
                    }
                },
            ),
        ];

        let result = coordinator.run(Uuid::new_v4(), steps).await;
        assert!(matches!(result, Err(BrokerError::SagaFailed(_))));
        assert_eq!(*order.lock().unwrap(), vec!["compensate_a"]);
    }

    #[tokio::test]
    async fn resume_skips_already_completed_forward_step() {
        let journal = InMemorySagaJournal::new();
        let saga_id = Uuid::new_v4();
        journal.record(saga_id, 0, "step_a", SagaStepStatus::Completed).await;

        let coordinator = SagaCoordinator::new(&journal);
        let reexecuted = Arc::new(AtomicU32::new(0));
        let reexecuted_clone = reexecuted.clone();

        let steps = vec![SagaStep::new(
            "step_a",
            move || {
                let reexecuted = reexecuted_clone.clone();
                async move {
                    reexecuted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            || async { Ok(()) },
        )];

        coordinator.run(saga_id, steps).await.unwrap();
        assert_eq!(reexecuted.load(Ordering::SeqCst), 0, "completed step must not re-run forward action");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::journal::InMemorySagaJournal;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn build_steps(executions: &[Arc<AtomicU32>]) -> Vec<SagaStep> {
        executions
            .iter()
            .enumerate()
            .map(|(i, counter)| {
                let counter = counter.clone();
                SagaStep::new(
                    format!("step_{i}"),
                    move || {
                        let counter = counter.clone();
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    },
                    || async { Ok(()) },
                )
            })
            .collect()
    }

    proptest! {
        /// Testable Property 10: replaying a saga whose steps are all already
        /// journaled as `Completed` must not re-invoke any forward action,
        /// regardless of how many steps the saga has.
        #[test]
        fn resuming_a_completed_saga_never_reexecutes_forward_steps(step_count in 1usize..8) {
            let counts = tokio::runtime::Runtime::new().unwrap().block_on(async move {
                let journal = InMemorySagaJournal::new();
                let saga_id = Uuid::new_v4();
                let executions: Vec<Arc<AtomicU32>> = (0..step_count).map(|_| Arc::new(AtomicU32::new(0))).collect();
                let coordinator = SagaCoordinator::new(&journal);

                coordinator.run(saga_id, build_steps(&executions)).await.unwrap();
                coordinator.run(saga_id, build_steps(&executions)).await.unwrap();

                executions.iter().map(|c| c.load(Ordering::SeqCst)).collect::<Vec<_>>()
            });

            prop_assert!(counts.iter().all(|&count| count == 1));
        }
    }
}
