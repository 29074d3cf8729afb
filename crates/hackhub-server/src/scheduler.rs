// ABOUTME: Interval scheduler that triggers scrape and sweep jobs in the background.
// ABOUTME: Jobs go through the same functions as on-demand callers; the first run waits one period.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::app_state::SharedState;
use crate::jobs::{run_scrape, run_sweep};

/// Handles to the running interval jobs. Dropping it stops them.
pub struct Scheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the scrape and sweep jobs with the given periods.
    pub fn start(state: SharedState, scrape_every: Duration, sweep_every: Duration) -> Self {
        let scrape_state = SharedState::clone(&state);
        let scrape = spawn_every("scrape", scrape_every, move || {
            let state = SharedState::clone(&scrape_state);
            async move {
                if let Err(e) = run_scrape(&state).await {
                    tracing::error!("scheduled scrape failed: {}", e);
                }
            }
        });

        let sweep = spawn_every("sweep", sweep_every, move || {
            let state = SharedState::clone(&state);
            async move {
                if let Err(e) = run_sweep(&state).await {
                    tracing::error!("scheduled sweep failed: {}", e);
                }
            }
        });

        tracing::info!(
            "scheduler started: scrape every {:?}, sweep every {:?}",
            scrape_every,
            sweep_every
        );

        Self {
            tasks: vec![scrape, sweep],
        }
    }

    /// Stop all jobs. A job already mid-pass finishes its store transaction
    /// on the blocking pool before the process exits.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_every<F, Fut>(name: &'static str, period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            tracing::info!("running scheduled {}", name);
            job().await;
        }
    })
}
