//! Hierarchical container of named variable sets.
//!
//! A [`Composite`] keeps two parallel collections: decision-bearing children,
//! whose values make up the decision vector in depth-first registration
//! order, and informational children, which stay queryable but never enter
//! the vector. Identifiers are unique across the whole tree.
//!
//! The composite also mediates contact-schedule notifications: schedules
//! store the identifiers of their dependent node sets, and every duration
//! change made through the tree (including [`Composite::scatter`]) re-times
//! those dependents synchronously.

use std::fmt::Write as _;

use nalgebra::DVector;
use stride_core::error::{ComponentError, ConsistencyError, Result};
use tracing::{debug, info};

use crate::bounds::Bounds;
use crate::coeff_spline::CoeffSplineView;
use crate::component::{Component, ComponentKind, VariableSet};
use crate::phase_nodes::PhaseNodes;
use crate::polynomial::PolynomialVars;
use crate::schedule::ContactSchedule;
use crate::spline::SplineRef;

#[derive(Clone, Debug)]
pub struct Composite {
    id: String,
    decision: Vec<Component>,
    informational: Vec<Component>,
}

impl Composite {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            decision: Vec::new(),
            informational: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Append a decision-bearing child.
    pub fn add_component(&mut self, component: impl Into<Component>) -> Result<()> {
        let component = component.into();
        self.check_unique(&component)?;
        debug!(
            id = component.id(),
            kind = component.kind(),
            rows = component.rows(),
            "added decision component"
        );
        self.decision.push(component);
        Ok(())
    }

    /// Append a child that is kept for lookup only.
    pub fn add_informational(&mut self, component: impl Into<Component>) -> Result<()> {
        let component = component.into();
        self.check_unique(&component)?;
        debug!(
            id = component.id(),
            kind = component.kind(),
            "added informational component"
        );
        self.informational.push(component);
        Ok(())
    }

    fn check_unique(&self, component: &Component) -> Result<()> {
        let mut incoming = vec![component.id().to_owned()];
        if let Component::Group(group) = component {
            incoming.extend(group.ids());
        }
        for id in incoming {
            if id == self.id || self.contains(&id) {
                return Err(ConsistencyError::DuplicateId(id).into());
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    fn children(&self) -> impl Iterator<Item = &Component> {
        self.decision.iter().chain(&self.informational)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Depth-first search over both collections and nested groups.
    pub fn find(&self, id: &str) -> Option<&Component> {
        for component in self.children() {
            if component.id() == id {
                return Some(component);
            }
            if let Component::Group(group) = component {
                if let Some(found) = group.find(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Component> {
        for component in self.decision.iter_mut().chain(&mut self.informational) {
            if component.id() == id {
                return Some(component);
            }
            if let Component::Group(group) = component {
                if let Some(found) = group.find_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Typed lookup. Fails if `id` is absent or refers to another kind.
    pub fn get<T: ComponentKind>(&self, id: &str) -> Result<&T> {
        let component = self
            .find(id)
            .ok_or_else(|| ComponentError::NotFound(id.to_owned()))?;
        T::from_component(component).ok_or_else(|| {
            ComponentError::TypeMismatch {
                id: id.to_owned(),
                expected: T::KIND,
                found: component.kind(),
            }
            .into()
        })
    }

    pub fn get_mut<T: ComponentKind>(&mut self, id: &str) -> Result<&mut T> {
        let component = self
            .find_mut(id)
            .ok_or_else(|| ComponentError::NotFound(id.to_owned()))?;
        let found = component.kind();
        T::from_component_mut(component).ok_or_else(|| {
            ComponentError::TypeMismatch {
                id: id.to_owned(),
                expected: T::KIND,
                found,
            }
            .into()
        })
    }

    /// Resolve any trajectory stored in the tree by identifier.
    pub fn spline(&self, id: &str) -> Result<SplineRef<'_>> {
        let component = self
            .find(id)
            .ok_or_else(|| ComponentError::NotFound(id.to_owned()))?;
        match component {
            Component::Nodes(nodes) => Ok(SplineRef::Nodes(nodes)),
            Component::PhaseNodes(nodes) => Ok(SplineRef::PhaseNodes(nodes)),
            Component::CoeffSpline(spline) => {
                let segments = spline
                    .segment_ids()
                    .iter()
                    .map(|segment| self.get::<PolynomialVars>(segment))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SplineRef::Coeff(CoeffSplineView::new(spline, segments)))
            }
            other => Err(ComponentError::TypeMismatch {
                id: id.to_owned(),
                expected: "spline",
                found: other.kind(),
            }
            .into()),
        }
    }

    /// Identifiers of every component in the tree, depth first.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for component in self.children() {
            ids.push(component.id().to_owned());
            if let Component::Group(group) = component {
                ids.extend(group.ids());
            }
        }
        ids
    }

    pub fn decision_components(&self) -> &[Component] {
        &self.decision
    }

    pub fn informational_components(&self) -> &[Component] {
        &self.informational
    }

    // -----------------------------------------------------------------------
    // Decision vector
    // -----------------------------------------------------------------------

    /// Current decision vector.
    pub fn flatten(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.rows());
        let mut offset = 0;
        for component in &self.decision {
            let values = component.values();
            x.rows_mut(offset, values.len()).copy_from(&values);
            offset += values.len();
        }
        x
    }

    /// Write a decision vector back and re-time every schedule's dependents.
    pub fn scatter(&mut self, x: &DVector<f64>) -> Result<()> {
        self.set_values(x)?;
        self.notify_all()
    }

    // -----------------------------------------------------------------------
    // Contact schedule linkage
    // -----------------------------------------------------------------------

    /// Register the phase node set `observer_id` as a dependent of
    /// `schedule_id` and bring it up to date with the current durations.
    pub fn register_observer(&mut self, schedule_id: &str, observer_id: &str) -> Result<()> {
        let phases = self.get::<ContactSchedule>(schedule_id)?.phase_count();
        let observed = self.get::<PhaseNodes>(observer_id)?.phase_count();
        if phases != observed {
            return Err(ConsistencyError::PhaseCountMismatch {
                id: observer_id.to_owned(),
                expected: phases,
                got: observed,
            }
            .into());
        }
        self.get_mut::<ContactSchedule>(schedule_id)?
            .add_observer(observer_id);
        self.notify(schedule_id)?;
        Ok(())
    }

    /// Change the phase durations of a schedule and notify its dependents.
    pub fn set_phase_durations(&mut self, schedule_id: &str, durations: &[f64]) -> Result<()> {
        self.get_mut::<ContactSchedule>(schedule_id)?
            .set_durations(durations)?;
        self.notify(schedule_id)?;
        Ok(())
    }

    /// Push a schedule's durations to its dependents. Returns how many moved.
    pub fn notify(&mut self, schedule_id: &str) -> Result<usize> {
        let schedule = self.get::<ContactSchedule>(schedule_id)?;
        let durations = schedule.phase_durations().to_vec();
        let observers = schedule.observers().to_vec();

        let mut moved = 0;
        for observer in &observers {
            if self
                .get_mut::<PhaseNodes>(observer)?
                .on_durations_changed(&durations)?
            {
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Notify the dependents of every schedule in the tree.
    pub fn notify_all(&mut self) -> Result<()> {
        for id in self.schedule_ids() {
            self.notify(&id)?;
        }
        Ok(())
    }

    fn schedule_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for component in self.children() {
            match component {
                Component::Schedule(s) => ids.push(s.id().to_owned()),
                Component::Group(group) => ids.extend(group.schedule_ids()),
                _ => {}
            }
        }
        ids
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// One line per component: identifier, kind, rows, collection.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({} decision variables)", self.id, self.rows());
        self.write_summary(&mut out, 1);
        out
    }

    fn write_summary(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for (component, role) in self
            .decision
            .iter()
            .map(|c| (c, "decision"))
            .chain(self.informational.iter().map(|c| (c, "informational")))
        {
            let _ = writeln!(
                out,
                "{indent}{:<20} {:<20} {:>5}  {role}",
                component.id(),
                component.kind(),
                component.rows(),
            );
            if let Component::Group(group) = component {
                group.write_summary(out, depth + 1);
            }
        }
    }

    pub fn log_summary(&self) {
        info!("variable tree:\n{}", self.summary());
    }
}

impl VariableSet for Composite {
    fn id(&self) -> &str {
        &self.id
    }

    fn rows(&self) -> usize {
        self.decision.iter().map(VariableSet::rows).sum()
    }

    fn values(&self) -> DVector<f64> {
        self.flatten()
    }

    /// Writes children only; dependents are re-timed by [`Composite::scatter`].
    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        let rows = self.rows();
        if x.len() != rows {
            return Err(ConsistencyError::VectorLength {
                expected: rows,
                got: x.len(),
            }
            .into());
        }
        let mut offset = 0;
        for component in &mut self.decision {
            let n = component.rows();
            component.set_values(&x.rows(offset, n).into_owned())?;
            offset += n;
        }
        Ok(())
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.decision.iter().flat_map(VariableSet::bounds).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
