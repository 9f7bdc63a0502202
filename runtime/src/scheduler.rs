//! Side-effect scheduler.
//!
//! Scheduled effects run one at a time on a single worker task, in the order
//! they were scheduled. Each effect is handed the state that is current when it
//! starts, read from the Store's `watch` channel, not the state that existed
//! when it was scheduled.
//!
//! Failures never leave the worker: `Err` results are logged at `warn`, panics
//! are caught and logged at `error`.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tabstate_core::effect::{EffectError, ScheduledEffect};
use tokio::sync::{mpsc, watch};

/// FIFO executor for [`ScheduledEffect`]s.
#[derive(Debug)]
pub struct SideEffectScheduler<S> {
    jobs: mpsc::UnboundedSender<ScheduledEffect<S>>,
    pending: Arc<watch::Sender<usize>>,
}

impl<S> Clone for SideEffectScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<S> SideEffectScheduler<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Spawn the worker task.
    ///
    /// `latest` is the receiving side of the channel the Store publishes
    /// every new state on.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(latest: watch::Receiver<S>) -> Self {
        let (jobs, rx) = mpsc::unbounded_channel();
        let (pending, _) = watch::channel(0_usize);
        let pending = Arc::new(pending);

        tokio::spawn(run_worker(rx, latest, Arc::clone(&pending)));

        Self { jobs, pending }
    }

    /// Queue `effect` behind everything scheduled before it.
    ///
    /// Returns immediately; the worker runs the effect once everything queued
    /// before it has finished.
    pub fn schedule(&self, effect: ScheduledEffect<S>) {
        let name = effect.name();
        self.pending.send_modify(|n| *n += 1);

        if self.jobs.send(effect).is_err() {
            // Worker is gone (runtime shutting down); drop the effect
            self.pending.send_modify(|n| *n = n.saturating_sub(1));
            tracing::warn!(effect = name, "Scheduler worker stopped, dropping effect");
            return;
        }
        tracing::trace!(effect = name, "Effect scheduled");
    }

    /// Number of effects scheduled but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every scheduled effect has finished.
    pub async fn wait_idle(&self) {
        let mut rx = self.pending.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

async fn run_worker<S>(
    mut jobs: mpsc::UnboundedReceiver<ScheduledEffect<S>>,
    latest: watch::Receiver<S>,
    pending: Arc<watch::Sender<usize>>,
) where
    S: Clone + Send + Sync + 'static,
{
    while let Some(effect) = jobs.recv().await {
        let name = effect.name();
        let current = latest.borrow().clone();

        // Closure call happens inside the future so a panic in it is caught too
        let outcome = AssertUnwindSafe(async move { effect.run(current).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(EffectError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(()) => {
                tracing::trace!(effect = name, "Effect completed");
            },
            Err(error @ EffectError::Failed(_)) => {
                metrics::counter!("scheduler.effects.failed", "effect" => name).increment(1);
                tracing::warn!(effect = name, error = %error, "Scheduled effect failed");
            },
            Err(error @ EffectError::Panicked(_)) => {
                metrics::counter!("scheduler.effects.failed", "effect" => name).increment(1);
                tracing::error!(effect = name, error = %error, "Scheduled effect panicked");
            },
        }

        pending.send_modify(|n| *n = n.saturating_sub(1));
    }
    tracing::debug!("Scheduler worker stopped");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_effects_run_in_scheduling_order() {
        let (_tx, rx) = watch::channel(0_u32);
        let scheduler = SideEffectScheduler::spawn(rx);
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = Arc::clone(&seen);
            scheduler.schedule(ScheduledEffect::new("record", move |_| {
                async move {
                    seen.lock().unwrap().push(i);
                    Ok(())
                }
                .boxed()
            }));
        }

        scheduler.wait_idle().await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_effect_sees_state_at_execution_time() {
        let (tx, rx) = watch::channel(1_u32);
        let scheduler = SideEffectScheduler::spawn(rx);
        let seen = Arc::new(Mutex::new(None));

        // Publish a newer state before the worker gets a chance to run
        let recorded = Arc::clone(&seen);
        scheduler.schedule(ScheduledEffect::new("observe", move |latest| {
            async move {
                *recorded.lock().unwrap() = Some(latest);
                Ok(())
            }
            .boxed()
        }));
        tx.send_replace(2);

        scheduler.wait_idle().await;
        assert_eq!(*seen.lock().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_failures_and_panics_are_contained() {
        let (_tx, rx) = watch::channel(0_u32);
        let scheduler = SideEffectScheduler::spawn(rx);
        let ran_after = Arc::new(Mutex::new(false));

        scheduler.schedule(ScheduledEffect::new("fails", |_| {
            async { Err(EffectError::Failed("network down".to_string())) }.boxed()
        }));
        #[allow(clippy::panic)]
        scheduler.schedule(ScheduledEffect::new("panics", |_| {
            panic!("boom");
        }));
        let flag = Arc::clone(&ran_after);
        scheduler.schedule(ScheduledEffect::new("after", move |_| {
            async move {
                *flag.lock().unwrap() = true;
                Ok(())
            }
            .boxed()
        }));

        scheduler.wait_idle().await;
        assert!(*ran_after.lock().unwrap());
    }

    #[test]
    fn test_panic_message_extracts_strings() {
        let owned: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("static");
        let other: Box<dyn std::any::Any + Send> = Box::new(3_u8);

        assert_eq!(panic_message(&*owned), "owned");
        assert_eq!(panic_message(&*borrowed), "static");
        assert_eq!(panic_message(&*other), "unknown panic");
    }
}
