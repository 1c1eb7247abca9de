//! Background recognition
//!
//! Runs the pipeline on tokio's blocking pool so the UI thread never waits on
//! the OCR engine. One job at a time; a request made while a job is in flight
//! is refused with `Busy`.

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error};

use super::{RecognitionPipeline, RecognitionResult};
use crate::capture::Raster;
use crate::error::ScanError;
use crate::geometry::SourceRect;

/// A finished job together with the raster it ran on
#[derive(Debug)]
pub struct RecognitionOutcome {
    pub result: Result<RecognitionResult, ScanError>,
    /// Snapshot the job read; overlays are drawn onto this one
    pub raster: Arc<Raster>,
}

/// A submitted job that has not been collected yet
struct InFlight {
    results: Receiver<RecognitionOutcome>,
    raster: Arc<Raster>,
}

impl InFlight {
    /// Outcome for a job that ended without sending one
    fn aborted(self) -> RecognitionOutcome {
        error!("Recognition job ended without a result");
        RecognitionOutcome {
            result: Err(ScanError::EngineFailure(
                "recognition job aborted".to_string(),
            )),
            raster: self.raster,
        }
    }
}

pub struct RecognitionWorker {
    pipeline: Arc<RecognitionPipeline>,
    runtime: Handle,
    in_flight: Option<InFlight>,
}

impl RecognitionWorker {
    pub fn new(pipeline: Arc<RecognitionPipeline>, runtime: Handle) -> Self {
        Self {
            pipeline,
            runtime,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Queue a recognition job on the blocking pool
    pub fn submit(
        &mut self,
        raster: Option<Arc<Raster>>,
        selection: Option<SourceRect>,
    ) -> Result<(), ScanError> {
        if self.is_busy() {
            return Err(ScanError::Busy);
        }
        let raster = raster.ok_or(ScanError::NoImage)?;

        let (tx, rx) = bounded(1);
        let pipeline = self.pipeline.clone();
        let job_raster = raster.clone();
        debug!("Submitting recognition job");
        self.runtime.spawn_blocking(move || {
            let result = pipeline.run(Some(&job_raster), selection);
            let _ = tx.send(RecognitionOutcome {
                result,
                raster: job_raster,
            });
        });

        self.in_flight = Some(InFlight {
            results: rx,
            raster,
        });
        Ok(())
    }

    /// Take the finished job, if there is one
    ///
    /// A job that panicked comes back as an `EngineFailure` outcome.
    pub fn try_collect(&mut self) -> Option<RecognitionOutcome> {
        let job = self.in_flight.as_ref()?;
        match job.results.try_recv() {
            Ok(outcome) => {
                self.in_flight = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.in_flight.take().map(InFlight::aborted),
        }
    }

    /// Block until the in-flight job finishes
    #[cfg(test)]
    pub fn wait(&mut self) -> Option<RecognitionOutcome> {
        let job = self.in_flight.take()?;
        match job.results.recv() {
            Ok(outcome) => Some(outcome),
            Err(_) => Some(job.aborted()),
        }
    }
}
