use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender, TrySendError};
use thiserror::Error;
use tracing::{debug, error};

use super::process_frame;
use crate::dispatch::Dispatcher;
use crate::protocols::tic::RawFrame;

/// One raw frame waiting to be decoded and dispatched.
#[derive(Debug)]
pub struct FrameJob {
    pub frame: RawFrame,
    pub captured_at: String,
    /// Consumers of the connection the frame was read on.
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker queue is full, frame {sequence} rejected")]
    Saturated { sequence: u64 },
    #[error("worker pool is shut down")]
    Closed,
    #[error("cannot spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker pool needs at least one worker")]
    NoWorkers,
}

/// Fixed set of worker threads fed by a bounded queue.
///
/// The reader never waits on workers: when the queue is full the frame is
/// handed back as [`PoolError::Saturated`].
#[derive(Debug)]
pub struct FramePool {
    sender: Option<Sender<FrameJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl FramePool {
    pub fn new(workers: usize, capacity: usize) -> Result<Self, PoolError> {
        if workers == 0 {
            return Err(PoolError::NoWorkers);
        }
        let (sender, receiver) = channel::bounded::<FrameJob>(capacity.max(1));
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("linky-frame-{index}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        process_frame(job.frame, job.captured_at, &job.dispatcher);
                    }
                    debug!(worker = index, "worker stopped");
                })?;
            handles.push(handle);
        }
        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a frame without blocking.
    pub fn submit(&self, job: FrameJob) -> Result<(), PoolError> {
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        sender.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) => PoolError::Saturated {
                sequence: job.frame.sequence,
            },
            TrySendError::Disconnected(_) => PoolError::Closed,
        })
    }

    /// Close the queue and wait for queued frames to finish.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "worker thread panicked");
            }
        }
    }
}

impl Drop for FramePool {
    fn drop(&mut self) {
        self.close();
    }
}
