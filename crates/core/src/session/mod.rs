use crate::camera::FrameSource;
use crate::classify::FaceClassifier;
use crate::detector::{EmotionDetector, EmotionReading};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("failed to spawn capture worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("capture worker panicked")]
    WorkerPanicked,
}

/// A running capture session: a dedicated worker thread reads frames, runs
/// the detector, and hands immutable readings to the consumer over a bounded
/// channel. The detector is confined to the worker thread; it is returned to
/// the caller only after the loop has stopped.
pub struct CaptureSession {
    readings: mpsc::Receiver<EmotionReading>,
    cancel: CancellationToken,
    worker: JoinHandle<EmotionDetector>,
}

impl CaptureSession {
    /// Starts the capture worker. `frame_interval` paces the camera-read
    /// loop; the detector's own rate gate bounds classifier calls
    /// independently of it.
    pub fn spawn<S, C>(
        mut source: S,
        classifier: C,
        mut detector: EmotionDetector,
        frame_interval: Duration,
        channel_capacity: usize,
    ) -> Result<Self, SessionError>
    where
        S: FrameSource + 'static,
        C: FaceClassifier + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));

        let worker = std::thread::Builder::new()
            .name("sentio-capture".into())
            .spawn(move || {
                tracing::debug!("capture worker started");
                while !token.is_cancelled() {
                    match source.next_frame() {
                        Ok(frame) => {
                            let reading = detector.detect_emotion(&frame, &classifier);
                            if tx.blocking_send(reading).is_err() {
                                tracing::debug!("reading channel closed, stopping capture");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "frame read failed, skipping");
                        }
                    }
                    std::thread::sleep(frame_interval);
                }
                tracing::debug!("capture worker shutting down");
                detector
            })?;

        Ok(Self {
            readings: rx,
            cancel,
            worker,
        })
    }

    /// Next reading from the worker, `None` once the worker has stopped and
    /// the channel drained.
    pub async fn next_reading(&mut self) -> Option<EmotionReading> {
        self.readings.recv().await
    }

    /// Requests a cooperative stop; the worker exits at its next iteration.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stops the worker and hands the detector back for summary and export.
    pub fn finish(self) -> Result<EmotionDetector, SessionError> {
        let Self {
            readings,
            cancel,
            worker,
        } = self;
        cancel.cancel();
        // Unblocks a worker parked in a full channel.
        drop(readings);
        worker.join().map_err(|_| SessionError::WorkerPanicked)
    }
}
