use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// A failed `Required` step aborts the workflow.
#[derive(Debug, Clone, Copy)]
pub struct Required;

/// A failed `BestEffort` step is logged and recorded, and the workflow goes on.
#[derive(Debug, Clone, Copy)]
pub struct BestEffort;

pub trait StepPolicy {
    type Output<T>;

    fn settle<T>(
        step: &'static str,
        result: SyncResult<T>,
        warnings: &mut Vec<StepWarning>,
    ) -> SyncResult<Self::Output<T>>;
}

impl StepPolicy for Required {
    type Output<T> = T;

    fn settle<T>(
        step: &'static str,
        result: SyncResult<T>,
        _warnings: &mut Vec<StepWarning>,
    ) -> SyncResult<Self::Output<T>> {
        result.map_err(|source| SyncError::StepFailed {
            step,
            source: Box::new(source),
        })
    }
}

impl StepPolicy for BestEffort {
    type Output<T> = Option<T>;

    fn settle<T>(
        step: &'static str,
        result: SyncResult<T>,
        warnings: &mut Vec<StepWarning>,
    ) -> SyncResult<Self::Output<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(step, error = %e, "best-effort step failed");
                warnings.push(StepWarning::new(step, e.to_string()));
                Ok(None)
            }
        }
    }
}

/// One named step of a workflow. The policy is part of the type, so each
/// step's failure handling is fixed where the step is declared.
#[derive(Debug, Clone, Copy)]
pub struct Step<P> {
    pub name: &'static str,
    _policy: PhantomData<P>,
}

impl Step<Required> {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            _policy: PhantomData,
        }
    }
}

impl Step<BestEffort> {
    pub const fn best_effort(name: &'static str) -> Self {
        Self {
            name,
            _policy: PhantomData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWarning {
    pub step: String,
    pub message: String,
}

impl StepWarning {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Runs the steps of one workflow and collects the warnings they raise.
/// Nothing is rolled back: a fatal step leaves earlier side effects in place.
pub struct Saga {
    workflow: &'static str,
    warnings: Vec<StepWarning>,
}

impl Saga {
    pub fn new(workflow: &'static str) -> Self {
        Self {
            workflow,
            warnings: Vec::new(),
        }
    }

    pub async fn run<P, T, F>(&mut self, step: Step<P>, fut: F) -> SyncResult<P::Output<T>>
    where
        P: StepPolicy,
        F: Future<Output = SyncResult<T>>,
    {
        debug!(workflow = self.workflow, step = step.name, "running step");
        let result = fut.await;
        P::settle(step.name, result, &mut self.warnings)
    }

    /// Record a warning that isn't tied to a failed call.
    pub fn warn(&mut self, step: &'static str, message: impl Into<String>) {
        let warning = StepWarning::new(step, message);
        warn!(workflow = self.workflow, %warning, "skipped");
        self.warnings.push(warning);
    }

    pub fn into_warnings(self) -> Vec<StepWarning> {
        self.warnings
    }
}
