//! The periodic driver that ticks registered processors.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// A unit of work driven by the fiber on every tick.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Resource tags this processor needs the fiber to hold.
    fn requirements(&self) -> Vec<String>;

    /// One tick of work.
    async fn process(&self);
}

/// Construction parameters for a [`Fiber`].
#[derive(Debug, Clone)]
pub struct FiberConfig {
    /// Resource tags offered to processors.
    pub resources: Vec<String>,

    /// Interval between ticks.
    pub tick_interval: Duration,
}

impl Default for FiberConfig {
    fn default() -> Self {
        Self {
            resources: vec!["default".to_string()],
            tick_interval: Duration::from_millis(1),
        }
    }
}

/// Interval-driven task runner.
///
/// Each tick snapshots the processor list and launches every processor's
/// `process()` as its own task; the fiber never waits for a processor to
/// finish before the next tick.
pub struct Fiber {
    resources: Vec<String>,
    processors: Arc<RwLock<Vec<Arc<dyn Processor>>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Fiber {
    /// Start a fiber ticking every `config.tick_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with(config: FiberConfig) -> Self {
        let processors: Arc<RwLock<Vec<Arc<dyn Processor>>>> = Arc::new(RwLock::new(Vec::new()));

        let ticking = processors.clone();
        let tick_interval = config.tick_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; consume it so
            // processors first fire one full interval after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                let snapshot: Vec<Arc<dyn Processor>> = ticking.read().await.clone();
                for processor in snapshot {
                    tokio::spawn(async move {
                        processor.process().await;
                    });
                }
            }
        });

        Self {
            resources: config.resources,
            processors,
            timer: Mutex::new(Some(handle)),
        }
    }

    /// Offer a processor to this fiber.
    ///
    /// Accepted only if every requirement is contained in the fiber's
    /// resources; rejected processors are not retained.
    pub async fn acquire(&self, processor: Arc<dyn Processor>) -> bool {
        let satisfied = processor
            .requirements()
            .iter()
            .all(|requirement| self.resources.iter().any(|resource| resource == requirement));
        if !satisfied {
            tracing::warn!("processor rejected: unsatisfied resource requirements");
            return false;
        }
        self.processors.write().await.push(processor);
        true
    }

    /// Stop the timer. Idempotent; no further ticks fire after this returns.
    pub fn free(&self) {
        let handle = match self.timer.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("fiber stopped");
        }
    }
}

impl Drop for Fiber {
    fn drop(&mut self) {
        self.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProcessor {
        requirements: Vec<String>,
        ticks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Processor for CountingProcessor {
        fn requirements(&self) -> Vec<String> {
            self.requirements.clone()
        }

        async fn process(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_ticks_drive_processor() {
        let fiber = Fiber::with(FiberConfig::default());
        let ticks = Arc::new(AtomicUsize::new(0));

        let accepted = fiber
            .acquire(Arc::new(CountingProcessor {
                requirements: vec!["default".to_string()],
                ticks: ticks.clone(),
            }))
            .await;
        assert!(accepted);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_acquire_rejects_unsatisfied_requirements() {
        let fiber = Fiber::with(FiberConfig::default());
        let ticks = Arc::new(AtomicUsize::new(0));

        let accepted = fiber
            .acquire(Arc::new(CountingProcessor {
                requirements: vec!["gpu".to_string()],
                ticks: ticks.clone(),
            }))
            .await;
        assert!(!accepted);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_free_stops_ticks() {
        let fiber = Fiber::with(FiberConfig::default());
        let ticks = Arc::new(AtomicUsize::new(0));

        fiber
            .acquire(Arc::new(CountingProcessor {
                requirements: vec!["default".to_string()],
                ticks: ticks.clone(),
            }))
            .await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        fiber.free();
        // Free is idempotent
        fiber.free();

        // Let any already-launched tick land before sampling
        tokio::time::sleep(Duration::from_millis(5)).await;
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
