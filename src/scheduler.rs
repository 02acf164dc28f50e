//! Background breaking-news poller.
//!
//! Runs beside the foreground cycle and shares its [`Aggregator`]. Each tick
//! is self-contained: a failing or slow source only costs that tick, and the
//! loop keeps going until shutdown is signalled.

use crate::aggregator::Aggregator;
use crate::models::Lane;
use crate::scrapers::SourceAdapter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

/// Spawn the poller. The first poll happens one `every` after start, since
/// the foreground cycle polls breaking sources itself on startup.
///
/// The task ends once `shutdown` carries `true` or its sender is dropped.
pub fn spawn<A>(
    aggregator: Arc<Aggregator>,
    adapters: Vec<A>,
    every: Duration,
    fetch_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    A: SourceAdapter + 'static,
{
    let every = every.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(every_secs = every.as_secs_f64(), sources = adapters.len(), "Breaking news poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = aggregator.poll(&adapters, Lane::Breaking, fetch_timeout).await;
                    debug!(added = report.added.len(), "Breaking poll finished");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Breaking news poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DayCache;
    use crate::scrapers::tests::StubAdapter;
    use chrono::Local;

    fn aggregator() -> Arc<Aggregator> {
        let dir = std::env::temp_dir();
        Arc::new(Aggregator::new(DayCache::new(dir, None), Local::now().date_naive()))
    }

    #[tokio::test]
    async fn test_polls_repeatedly_and_stops_on_shutdown() {
        let agg = aggregator();
        let (tx, rx) = watch::channel(false);
        let mut alert = StubAdapter::new("alerts", vec!["Quake jolts Luzon"]);
        alert.breaking = true;

        let handle = spawn(
            Arc::clone(&agg),
            vec![alert],
            Duration::from_millis(20),
            Duration::from_secs(1),
            rx,
        );
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(agg.is_new_breaking_news().await);
        assert_eq!(agg.count().await, 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_survives_failing_sources() {
        let agg = aggregator();
        let (tx, rx) = watch::channel(false);
        let mut broken = StubAdapter::new("broken", vec![]);
        broken.fail = true;

        let handle = spawn(
            Arc::clone(&agg),
            vec![broken],
            Duration::from_millis(10),
            Duration::from_secs(1),
            rx,
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        assert_eq!(agg.count().await, 0);

        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_poll_before_first_interval() {
        let agg = aggregator();
        let (tx, rx) = watch::channel(false);
        let handle = spawn(
            Arc::clone(&agg),
            vec![StubAdapter::new("alerts", vec!["Early"])],
            Duration::from_secs(60),
            Duration::from_secs(1),
            rx,
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(agg.count().await, 0);
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
