//! Fixed-interval background polling of a realtime session
//!
//! `RealtimePoller` takes ownership of a running `RealtimeController`, polls
//! it on a tokio interval and pushes every result into a bounded channel.
//! `stop` hands the controller back in `Idle`.

use crate::error::{ClientError, Result};
use crate::realtime::RealtimeController;
use crate::types::DetectionFrame;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;

/// Frames buffered before new ones are dropped
pub const FRAME_BUFFER: usize = 16;

/// Shortest polling period; smaller values are raised to this
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a spawned polling task
pub struct RealtimePoller {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<RealtimeController>,
    frames: Option<mpsc::Receiver<Result<DetectionFrame>>>,
}

impl RealtimePoller {
    /// Spawn the polling loop on the current runtime
    ///
    /// The loop ends on its own once the controller leaves `Running`
    /// (for example after the session expires), which closes the frame
    /// stream. A controller that is not running yields an empty stream.
    pub fn spawn(controller: RealtimeController, period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_BUFFER);
        let handle = tokio::spawn(poll_loop(controller, period, frame_tx, stop_rx));

        Self {
            stop_tx: Some(stop_tx),
            handle,
            frames: Some(frame_rx),
        }
    }

    /// Take the frame stream; `None` once taken
    pub fn frames(&mut self) -> Option<ReceiverStream<Result<DetectionFrame>>> {
        self.frames.take().map(ReceiverStream::new)
    }

    /// Next polled result, while the stream has not been taken
    pub async fn next_frame(&mut self) -> Option<Result<DetectionFrame>> {
        self.frames.as_mut()?.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop polling, stop the server session and return the controller
    ///
    /// A poll already in flight is awaited; its result is discarded.
    pub async fn stop(mut self) -> Result<RealtimeController> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Err means the loop already exited on its own
            let _ = stop_tx.send(());
        }
        self.handle
            .await
            .map_err(|e| ClientError::Task(e.to_string()))
    }
}

async fn poll_loop(
    mut controller: RealtimeController,
    period: Duration,
    frame_tx: mpsc::Sender<Result<DetectionFrame>>,
    mut stop_rx: oneshot::Receiver<()>,
) -> RealtimeController {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(period_ms = period.as_millis() as u64, "Realtime poller started");

    while controller.is_running() {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {}
        }

        let result = controller.poll(None, None).await;

        // Dropped handle closes the channel, which counts as a stop request
        if !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            tracing::debug!("Stop requested during poll, discarding result");
            break;
        }

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Realtime poll failed");
        }
        match frame_tx.try_send(result) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("Frame consumer lagging, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Frame stream dropped, stopping poller");
                break;
            }
        }
    }

    if let Err(e) = controller.stop().await {
        tracing::warn!(error = %e, "Failed to stop realtime detection");
    }
    tracing::debug!("Realtime poller exited");
    controller
}
