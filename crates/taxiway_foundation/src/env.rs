//! The variable environment of a compiled model.
//!
//! Holds every declared variable in declaration order. Constants are part of
//! the environment but never part of a [`Snapshot`].

use std::collections::HashMap;

use crate::Result;
use crate::changeset::MARKERS;
use crate::error::{Error, ErrorKind};
use crate::snapshot::Snapshot;
use crate::value::Value;

/// A declared variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: Value,
    constant: bool,
}

impl Variable {
    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns true if the variable can never change.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        self.constant
    }
}

/// Ordered collection of declared variables.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    vars: Vec<Variable>,
    by_name: HashMap<String, usize>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a mutable variable with its initial value.
    ///
    /// Redeclaring a name replaces the earlier declaration in place.
    ///
    /// # Errors
    /// Returns [`ErrorKind::ReservedName`] if `name` is one of the synthetic
    /// paths in [`MARKERS`].
    pub fn with_var(mut self, name: impl Into<String>, initial: Value) -> Result<Self> {
        self.declare(name, initial, false)?;
        Ok(self)
    }

    /// Declares a constant.
    ///
    /// # Errors
    /// See [`Environment::with_var`].
    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Result<Self> {
        self.declare(name, value, true)?;
        Ok(self)
    }

    /// Declares a variable in place.
    ///
    /// # Errors
    /// See [`Environment::with_var`].
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        value: Value,
        constant: bool,
    ) -> Result<()> {
        let name = name.into();
        if MARKERS.contains(&name.as_str()) {
            return Err(Error::reserved_name(name));
        }
        let var = Variable {
            name: name.clone(),
            value,
            constant,
        };
        if let Some(&slot) = self.by_name.get(&name) {
            self.vars[slot] = var;
        } else {
            self.by_name.insert(name, self.vars.len());
            self.vars.push(var);
        }
        Ok(())
    }

    /// Returns the number of declared variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates over variables in declaration order.
    pub fn vars(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    /// Returns the current value of a variable.
    ///
    /// # Errors
    /// Returns an error if the variable is not declared.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.by_name
            .get(name)
            .map(|&slot| &self.vars[slot].value)
            .ok_or_else(|| Error::undefined_variable(name))
    }

    /// Assigns a variable.
    ///
    /// # Errors
    /// Returns an error if the variable is not declared or is constant.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let slot = *self
            .by_name
            .get(name)
            .ok_or_else(|| Error::undefined_variable(name))?;
        let var = &mut self.vars[slot];
        if var.constant {
            return Err(Error::constant_assignment(name));
        }
        var.value = value;
        Ok(())
    }

    /// Serializes every non-constant variable.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.vars
            .iter()
            .filter(|var| !var.constant)
            .map(|var| (var.name.clone(), var.value.clone()))
            .collect()
    }

    /// Assigns every non-constant variable from a snapshot.
    ///
    /// # Errors
    /// Returns an error if the snapshot lacks a variable. Nothing is assigned
    /// in that case.
    pub fn load(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(missing) = self
            .vars
            .iter()
            .find(|var| !var.constant && snapshot.get(&var.name).is_none())
        {
            return Err(Error::new(ErrorKind::MissingSnapshotEntry(
                missing.name.clone(),
            )));
        }
        for var in self.vars.iter_mut().filter(|var| !var.constant) {
            if let Some(value) = snapshot.get(&var.name) {
                var.value = value.clone();
            }
        }
        Ok(())
    }
}
