//! Background decoder thread.
//!
//! File reads and image decoding run on a dedicated `image-decoder` thread fed
//! over channels; the event loop polls for results once per frame.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::{DecodeBackend, DecodeJob, DecodeOutcome, run_job_blocking};

/// Message sent to the decoder thread.
enum ThreadMessage {
    Decode(DecodeJob),
    Shutdown,
}

/// Owns the decoder thread and both ends of its channels.
pub struct ThreadDecoder {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<DecodeOutcome>,
    thread_handle: Option<JoinHandle<()>>,
    pending: usize,
}

impl ThreadDecoder {
    /// Spawn the decoder thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<DecodeOutcome>();

        let thread_handle = thread::Builder::new()
            .name("image-decoder".to_string())
            .spawn(move || {
                log::info!("Image decoder thread started");
                Self::thread_loop(request_rx, result_tx);
                log::info!("Image decoder thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: 0,
        })
    }

    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<DecodeOutcome>) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Decode(job)) => {
                    if result_tx.send(run_job_blocking(job)).is_err() {
                        log::warn!("Result channel closed, decoder thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, decoder thread exiting");
                    break;
                }
            }
        }
    }

    /// Jobs submitted but not yet polled.
    pub fn pending_count(&self) -> usize {
        self.pending
    }
}

impl DecodeBackend for ThreadDecoder {
    fn submit(&mut self, job: DecodeJob) {
        let ticket = job.ticket.value();
        match self.request_tx.send(ThreadMessage::Decode(job)) {
            Ok(()) => {
                self.pending += 1;
                log::debug!("Sent decode request {}", ticket);
            }
            Err(_) => log::error!("Failed to send decode request {}: channel closed", ticket),
        }
    }

    fn poll(&mut self) -> Vec<DecodeOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(outcome) => {
                    self.pending = self.pending.saturating_sub(1);
                    outcomes.push(outcome);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Decoder thread disconnected");
                    break;
                }
            }
        }
        outcomes
    }
}

impl Drop for ThreadDecoder {
    fn drop(&mut self) {
        log::debug!("Shutting down decoder thread");
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Decoder thread panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use image::ImageFormat;

    use super::*;
    use crate::decode::tests::encoded;
    use crate::decode::{DecodeInput, DecodePurpose, LoadTracker};
    use crate::ingest::FileHandle;
    use crate::panorama::PanoramaId;

    fn wait_for(decoder: &mut ThreadDecoder, count: usize) -> Vec<DecodeOutcome> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outcomes = Vec::new();
        while outcomes.len() < count && Instant::now() < deadline {
            outcomes.extend(decoder.poll());
            thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    #[test]
    fn test_thread_decodes_in_background() {
        let mut tracker = LoadTracker::new();
        let mut decoder = ThreadDecoder::spawn().unwrap();
        let bytes: Arc<[u8]> = Arc::from(encoded(16, 8, ImageFormat::Png));
        for _ in 0..3 {
            decoder.submit(DecodeJob {
                ticket: tracker.issue(),
                purpose: DecodePurpose::Display(PanoramaId::new("p1")),
                label: "p1".into(),
                input: DecodeInput::File(FileHandle::Bytes(bytes.clone())),
                max_dimension: 8192,
            });
        }
        assert_eq!(decoder.pending_count(), 3);

        let outcomes = wait_for(&mut decoder, 3);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(decoder.pending_count(), 0);

        // Single thread, so completion follows submission.
        let tickets: Vec<_> = outcomes.iter().map(|o| o.ticket.value()).collect();
        assert_eq!(tickets, [1, 2, 3]);
    }

    #[test]
    fn test_drop_joins_thread() {
        let decoder = ThreadDecoder::spawn().unwrap();
        drop(decoder);
    }
}
