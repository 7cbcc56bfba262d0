/*!
 * Blockage Watchdog - Demo
 *
 * Runs a simulated UI run-loop that stalls inside marked frames every few
 * rounds, watches it with the full watchdog pipeline, and prints the
 * captured blockages as span JSON.
 */

use anyhow::{Context, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

use blockage_watchdog::core::types::Job;
use blockage_watchdog::{
    init_tracing, AppStateFlag, BlockageService, Clock, RunLoopHeartbeat, ShadowStack,
    ScheduledWorker, SharedConfig, SystemClock, TokioWorker, WatchdogConfig,
};

const ROUNDS: usize = 120;
const IDLE_ROUND: Duration = Duration::from_millis(20);
const STALL: Duration = Duration::from_millis(700);

fn main() -> Result<()> {
    init_tracing();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let config = Arc::new(
        SharedConfig::new(WatchdogConfig {
            min_duration_threshold_ms: 300,
            sampling_interval_ms: 50,
            ..WatchdogConfig::default()
        })
        .context("invalid demo configuration")?,
    );
    let worker = Arc::new(TokioWorker::new().context("failed to start watchdog worker")?);

    let (run_loop, mailbox) = flume::unbounded::<Job>();
    let stack = ShadowStack::new("demo-main", 5);

    let service = BlockageService::new(
        Arc::clone(&clock),
        config,
        worker.clone(),
        Arc::new(AppStateFlag::new(false)),
        Arc::new(RunLoopHeartbeat::new(run_loop, Arc::clone(&clock))),
        stack.clone(),
    );
    service.start_capture();

    let target = thread::Builder::new()
        .name("demo-main".into())
        .spawn(move || {
            for round in 0..ROUNDS {
                while let Ok(job) = mailbox.try_recv() {
                    job();
                }
                if round % 30 == 10 {
                    let _render = stack.enter("demo::render_frame");
                    let _decode = stack.enter("demo::decode_image");
                    thread::sleep(STALL);
                } else {
                    thread::sleep(IDLE_ROUND);
                }
            }
        })
        .context("failed to spawn demo run-loop")?;

    target
        .join()
        .map_err(|_| anyhow::anyhow!("demo run-loop panicked"))?;

    service.on_background(clock.now());
    // Lifecycle transitions run on the worker; wait until it got there
    let (settled_tx, settled_rx) = flume::bounded(1);
    worker.submit(Box::new(move || {
        let _ = settled_tx.send(());
    }))?;
    settled_rx
        .recv_timeout(Duration::from_secs(2))
        .context("watchdog worker did not settle")?;

    let spans = service.snapshot_spans();
    info!(
        intervals = spans.len(),
        stats = ?service.stats(),
        "Demo finished"
    );

    println!("{}", serde_json::to_string_pretty(&spans)?);
    worker.shutdown();
    Ok(())
}
