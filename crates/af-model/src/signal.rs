//! Signals: named wires between blocks.
//!
//! A signal has at most one source (a block output) and any number of sinks
//! (block input ports). Besides its identity it carries units, optional
//! limits and initial condition, a role flag, and two flags consumed by code
//! generation: `derived` (inline the producer's expression instead of naming
//! it) and `defined` (already emitted during the current generation pass).

use af_core::{BlockId, SignalId, parse_number};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Role a signal plays at the model boundary.
///
/// The roles are mutually exclusive; the first one assigned sticks and later
/// assignments are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRole {
    Input,
    Control,
    Disturbance,
    State,
    StateDeriv,
    Output,
    StdAiaa,
}

impl SignalRole {
    /// Roles whose value is supplied from outside the model.
    pub fn is_model_input(self) -> bool {
        matches!(
            self,
            SignalRole::Input | SignalRole::Control | SignalRole::Disturbance | SignalRole::State
        )
    }

    /// Roles whose value is reported out of the model.
    pub fn is_model_output(self) -> bool {
        matches!(self, SignalRole::Output | SignalRole::StateDeriv)
    }
}

/// A block port: block handle plus 0-based port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub block: BlockId,
    pub port: usize,
}

/// Named wire carrying one value between blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub(crate) id: SignalId,
    pub(crate) name: String,
    pub(crate) var_id: String,
    pub(crate) units: String,
    pub(crate) description: String,
    pub(crate) source: Option<PortRef>,
    pub(crate) sinks: Vec<PortRef>,
    pub(crate) lower_limit: f64,
    pub(crate) upper_limit: f64,
    pub(crate) ic: Option<f64>,
    pub(crate) role: Option<SignalRole>,
    pub(crate) derived: bool,
    pub(crate) defined: bool,
}

impl Signal {
    pub(crate) fn new(
        id: SignalId,
        name: impl Into<String>,
        var_id: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            var_id: var_id.into(),
            units: units.into(),
            description: String::new(),
            source: None,
            sinks: Vec::new(),
            lower_limit: f64::NEG_INFINITY,
            upper_limit: f64::INFINITY,
            ic: None,
            role: None,
            derived: false,
            defined: false,
        }
    }

    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_id(&self) -> &str {
        &self.var_id
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn source(&self) -> Option<PortRef> {
        self.source
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn sinks(&self) -> &[PortRef] {
        &self.sinks
    }

    pub fn has_sinks(&self) -> bool {
        !self.sinks.is_empty()
    }

    /// Attach a consumer port. Only `Model` wiring may call this.
    pub(crate) fn add_sink(&mut self, block: BlockId, port: usize) {
        let sink = PortRef { block, port };
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
    }

    pub(crate) fn remove_sink(&mut self, block: BlockId, port: usize) {
        self.sinks.retain(|s| !(s.block == block && s.port == port));
    }

    /// Attach the producing block; a signal has exactly one source.
    pub(crate) fn set_source(&mut self, block: BlockId, port: usize) -> ModelResult<()> {
        if self.source.is_some() {
            return Err(ModelError::AlreadyConnected {
                what: format!("signal '{}' already has a source", self.var_id),
            });
        }
        self.source = Some(PortRef { block, port });
        Ok(())
    }

    pub fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    pub fn upper_limit(&self) -> f64 {
        self.upper_limit
    }

    pub fn set_lower_limit(&mut self, limit: f64) {
        self.lower_limit = limit;
    }

    pub fn set_upper_limit(&mut self, limit: f64) {
        self.upper_limit = limit;
    }

    pub fn set_lower_limit_text(&mut self, text: &str) -> ModelResult<()> {
        self.lower_limit = parse_number(text)?;
        Ok(())
    }

    pub fn set_upper_limit_text(&mut self, text: &str) -> ModelResult<()> {
        self.upper_limit = parse_number(text)?;
        Ok(())
    }

    pub fn has_lower_limit(&self) -> bool {
        self.lower_limit != f64::NEG_INFINITY
    }

    pub fn has_upper_limit(&self) -> bool {
        self.upper_limit != f64::INFINITY
    }

    /// True when either bound is finite.
    pub fn is_limited(&self) -> bool {
        self.has_lower_limit() || self.has_upper_limit()
    }

    pub fn ic(&self) -> Option<f64> {
        self.ic
    }

    pub fn has_ic(&self) -> bool {
        self.ic.is_some()
    }

    pub fn set_ic(&mut self, value: f64) {
        self.ic = Some(value);
    }

    pub fn set_ic_text(&mut self, text: &str) -> ModelResult<()> {
        self.ic = Some(parse_number(text)?);
        Ok(())
    }

    pub fn role(&self) -> Option<SignalRole> {
        self.role
    }

    /// Assign a role unless one is already set.
    pub fn mark(&mut self, role: SignalRole) {
        if self.role.is_none() {
            self.role = Some(role);
        }
    }

    pub fn mark_input(&mut self) {
        self.mark(SignalRole::Input);
    }

    pub fn mark_control(&mut self) {
        self.mark(SignalRole::Control);
    }

    pub fn mark_disturbance(&mut self) {
        self.mark(SignalRole::Disturbance);
    }

    pub fn mark_state(&mut self) {
        self.mark(SignalRole::State);
    }

    pub fn mark_state_deriv(&mut self) {
        self.mark(SignalRole::StateDeriv);
    }

    pub fn mark_output(&mut self) {
        self.mark(SignalRole::Output);
    }

    pub fn mark_std_aiaa(&mut self) {
        self.mark(SignalRole::StdAiaa);
    }

    pub fn is_input(&self) -> bool {
        self.role == Some(SignalRole::Input)
    }

    pub fn is_control(&self) -> bool {
        self.role == Some(SignalRole::Control)
    }

    pub fn is_disturbance(&self) -> bool {
        self.role == Some(SignalRole::Disturbance)
    }

    pub fn is_state(&self) -> bool {
        self.role == Some(SignalRole::State)
    }

    pub fn is_state_deriv(&self) -> bool {
        self.role == Some(SignalRole::StateDeriv)
    }

    pub fn is_output(&self) -> bool {
        self.role == Some(SignalRole::Output)
    }

    pub fn is_std_aiaa(&self) -> bool {
        self.role == Some(SignalRole::StdAiaa)
    }

    /// Produced by a synthetic helper block; code generation inlines it.
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub fn set_derived(&mut self, derived: bool) {
        self.derived = derived;
    }

    /// Already emitted during the current code generation pass.
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn set_defined(&mut self) {
        self.defined = true;
    }

    pub(crate) fn clear_defined(&mut self) {
        self.defined = false;
    }
}
