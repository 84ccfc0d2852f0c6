use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;

/// Queue for advisory side effects: confirmation emails, audit
/// rows. Effects run on the runtime, failures are logged and never
/// reach the dispatching operation. `drain` lets binaries and tests
/// wait for everything in flight.
#[derive(Default)]
pub struct EffectQueue {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a best-effort task. The label names the effect in logs.
    pub fn dispatch<F>(&self, label: &'static str, effect: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if let Err(err) = effect.await {
                tracing::warn!(effect = label, error = %err, "Side effect failed");
            }
        });
        self.handles.lock().unwrap().push(handle);
    }

    /// Await every dispatched effect. New effects dispatched while
    /// draining are picked up as well.
    pub async fn drain(&self) {
        loop {
            let pending = {
                let mut handles = self.handles.lock().unwrap();
                std::mem::take(&mut *handles)
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                // A panicked effect is already logged by the runtime
                let _ = handle.await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_dispatch_and_drain() {
        let effects = EffectQueue::new();
        let counter = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            effects.dispatch("count", async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        effects.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_effect_does_not_propagate() {
        let effects = EffectQueue::new();
        effects.dispatch("boom", async { Err(anyhow::anyhow!("boom")) });
        // Drain completes normally
        effects.drain().await;
    }
}
