//! Per end-effector contact schedule.
//!
//! A schedule owns the ordered phase durations of one foot. Phases alternate
//! between contact and swing, starting with `first_in_contact`. The node sets
//! that depend on these durations are registered by identifier and notified
//! by the owning [`Composite`](crate::Composite) after every duration change;
//! the schedule itself never reaches into its observers.

use nalgebra::DVector;
use stride_core::config::ContactTiming;
use stride_core::error::{BoundsError, ConsistencyError, Result};
use stride_core::time;

use crate::bounds::Bounds;
use crate::component::VariableSet;
use crate::names;

#[derive(Clone, Debug, PartialEq)]
pub struct ContactSchedule {
    id: String,
    ee: usize,
    first_in_contact: bool,
    durations: Vec<f64>,
    duration_bounds: Bounds,
    observers: Vec<String>,
}

impl ContactSchedule {
    /// Build the schedule of end-effector `ee` from its nominal timing.
    ///
    /// Every nominal duration must lie in `[min_duration, max_duration]`.
    pub fn new(
        ee: usize,
        timing: &ContactTiming,
        min_duration: f64,
        max_duration: f64,
    ) -> Result<Self> {
        let duration_bounds = Bounds::new(min_duration, max_duration)?;
        let schedule = Self {
            id: names::ee_schedule(ee),
            ee,
            first_in_contact: timing.first_in_contact,
            durations: Vec::new(),
            duration_bounds,
            observers: Vec::new(),
        };
        schedule.check_durations(&timing.durations)?;
        Ok(Self {
            durations: timing.durations.clone(),
            ..schedule
        })
    }

    pub fn ee(&self) -> usize {
        self.ee
    }

    pub fn phase_count(&self) -> usize {
        self.durations.len()
    }

    pub fn phase_durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn duration_bounds(&self) -> Bounds {
        self.duration_bounds
    }

    /// Contact flag of every phase, in order.
    pub fn contact_sequence(&self) -> Vec<bool> {
        (0..self.durations.len())
            .map(|phase| self.phase_in_contact(phase))
            .collect()
    }

    /// Whether phase `phase` is a contact (stance) phase.
    pub fn phase_in_contact(&self, phase: usize) -> bool {
        (phase % 2 == 0) == self.first_in_contact
    }

    /// Sum of all phase durations.
    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Index of the phase active at time `t`.
    pub fn phase_at(&self, t: f64) -> Result<usize> {
        Ok(time::locate(&self.durations, t)?.0)
    }

    /// Whether the end-effector is in contact at time `t`.
    pub fn is_in_contact(&self, t: f64) -> Result<bool> {
        Ok(self.phase_in_contact(self.phase_at(t)?))
    }

    /// Identifiers of the registered dependents.
    pub fn observers(&self) -> &[String] {
        &self.observers
    }

    pub(crate) fn add_observer(&mut self, id: &str) {
        if !self.observers.iter().any(|o| o == id) {
            self.observers.push(id.to_owned());
        }
    }

    /// Replace the durations. Phase count is fixed at construction.
    pub(crate) fn set_durations(&mut self, durations: &[f64]) -> Result<()> {
        self.check_durations(durations)?;
        self.durations.copy_from_slice(durations);
        Ok(())
    }

    fn check_durations(&self, durations: &[f64]) -> Result<()> {
        if durations.is_empty()
            || (!self.durations.is_empty() && durations.len() != self.durations.len())
        {
            return Err(ConsistencyError::PhaseCountMismatch {
                id: self.id.clone(),
                expected: self.durations.len().max(1),
                got: durations.len(),
            }
            .into());
        }
        let b = self.duration_bounds;
        if let Some((index, &value)) = durations
            .iter()
            .enumerate()
            .find(|&(_, &d)| !b.contains(d))
        {
            return Err(BoundsError::PhaseDuration {
                index,
                value,
                min: b.lower,
                max: b.upper,
            }
            .into());
        }
        Ok(())
    }
}

impl VariableSet for ContactSchedule {
    fn id(&self) -> &str {
        &self.id
    }

    fn rows(&self) -> usize {
        self.durations.len()
    }

    fn values(&self) -> DVector<f64> {
        DVector::from_row_slice(&self.durations)
    }

    /// Scattered durations are taken as given; bounds are the solver's job.
    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        if x.len() != self.durations.len() {
            return Err(ConsistencyError::VectorLength {
                expected: self.durations.len(),
                got: x.len(),
            }
            .into());
        }
        self.durations.copy_from_slice(x.as_slice());
        Ok(())
    }

    fn bounds(&self) -> Vec<Bounds> {
        vec![self.duration_bounds; self.durations.len()]
    }
}
