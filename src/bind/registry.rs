//! Per-statement registry of bind variables.

use crate::access::{DataType, Value};
use crate::bind::error::{BindError, BindResult};
use crate::bind::key::{BindKey, SlotId};
use crate::bind::variable::BindVariable;
use crate::expression::function::Clearable;
use log::{debug, trace};
use std::collections::HashMap;

/// All bind variables of one prepared statement.
///
/// Variables live in an arena addressed by [`SlotId`]. Positional
/// variables occupy a contiguous range `$1..=$n`; named variables are
/// unique per name. Entries are never removed, only cleared and rebound.
///
/// Mutating operations take `&mut self` and reads take `&self`, so a
/// registry shared with worker threads for one execution cannot be rebound
/// until every worker has released it. See the [`crate::bind`] module
/// documentation for the full contract.
#[derive(Debug, Default, Clone)]
pub struct BindVariables {
    variables: Vec<BindVariable>,
    positional: Vec<SlotId>,
    named: HashMap<String, SlotId>,
}

impl BindVariables {
    /// Highest positional index a statement may declare (`$65535`)
    pub const MAX_POSITIONAL: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with positional slots `$1..=$count` already declared
    pub fn with_positional(count: usize) -> Self {
        let mut registry = Self::new();
        for index in 1..=count {
            registry.push_positional(index);
        }
        registry
    }

    /// Declare positional slot `index`, extending the range so it stays contiguous.
    ///
    /// Fails with `IndexOutOfRange` for `$0` and above [`Self::MAX_POSITIONAL`].
    pub fn declare_index(&mut self, index: usize) -> BindResult<SlotId> {
        if index == 0 || index > Self::MAX_POSITIONAL {
            return Err(BindError::IndexOutOfRange {
                index,
                count: self.positional.len(),
            });
        }
        while self.positional.len() < index {
            let next = self.positional.len() + 1;
            self.push_positional(next);
        }
        Ok(self.positional[index - 1])
    }

    /// Declare the next positional slot, as used by anonymous `?` placeholders
    pub fn declare_next_index(&mut self) -> BindResult<SlotId> {
        let next = self.positional.len() + 1;
        if next > Self::MAX_POSITIONAL {
            return Err(BindError::IndexOutOfRange {
                index: next,
                count: self.positional.len(),
            });
        }
        Ok(self.push_positional(next))
    }

    /// Declare named slot `name`. Declaring an existing name returns its slot.
    pub fn declare_name(&mut self, name: &str) -> SlotId {
        if let Some(slot) = self.named.get(name) {
            return *slot;
        }
        let slot = self.push(BindKey::name(name));
        self.named.insert(name.to_string(), slot);
        slot
    }

    fn push_positional(&mut self, index: usize) -> SlotId {
        let slot = self.push(BindKey::index(index));
        self.positional.push(slot);
        slot
    }

    fn push(&mut self, key: BindKey) -> SlotId {
        let slot = SlotId(self.variables.len());
        trace!("Declared bind variable {} as {}", key, slot);
        self.variables.push(BindVariable::new(slot, key));
        slot
    }

    /// Fix the type of positional slot `index` before any value is bound
    pub fn define_index(&mut self, index: usize, data_type: DataType) -> BindResult<()> {
        let slot = self.slot_for_index(index)?;
        debug!("Defining ${} as {}", index, data_type);
        self.variables[slot.0].define(data_type)
    }

    /// Fix the type of named slot `name` before any value is bound
    pub fn define_name(&mut self, name: &str, data_type: DataType) -> BindResult<()> {
        let slot = self.slot_for_name(name)?;
        debug!("Defining :{} as {}", name, data_type);
        self.variables[slot.0].define(data_type)
    }

    /// Bind `value` to positional slot `index`.
    ///
    /// The first successful bind of a slot fixes its type; later binds must
    /// be convertible to it.
    pub fn bind_by_index(&mut self, index: usize, value: impl Into<Value>) -> BindResult<()> {
        let slot = self.slot_for_index(index)?;
        let value = value.into();
        trace!("Binding ${} = {:?}", index, value);
        self.variables[slot.0].bind(value)
    }

    /// Bind `value` to named slot `name`
    pub fn bind_by_name(&mut self, name: &str, value: impl Into<Value>) -> BindResult<()> {
        let slot = self.slot_for_name(name)?;
        let value = value.into();
        trace!("Binding :{} = {:?}", name, value);
        self.variables[slot.0].bind(value)
    }

    /// Bind a text-format parameter to positional slot `index`; `None` binds NULL
    pub fn bind_text_by_index(&mut self, index: usize, text: Option<&str>) -> BindResult<()> {
        let slot = self.slot_for_index(index)?;
        trace!("Binding ${} from text {:?}", index, text);
        self.variables[slot.0].bind_text(text)
    }

    /// Bind a text-format parameter to named slot `name`; `None` binds NULL
    pub fn bind_text_by_name(&mut self, name: &str, text: Option<&str>) -> BindResult<()> {
        let slot = self.slot_for_name(name)?;
        trace!("Binding :{} from text {:?}", name, text);
        self.variables[slot.0].bind_text(text)
    }

    /// Bind by either addressing mode
    pub fn bind(&mut self, key: &BindKey, value: impl Into<Value>) -> BindResult<()> {
        match key {
            BindKey::Index(index) => self.bind_by_index(*index, value),
            BindKey::Name(name) => self.bind_by_name(name, value),
        }
    }

    /// Reset every variable to its kind's NULL sentinel. Type tags are kept.
    pub fn clear_all(&mut self) {
        debug!("Clearing {} bind variables", self.variables.len());
        for variable in &mut self.variables {
            variable.clear();
        }
    }

    /// Find the variable for `key`, failing the same way binding would
    pub fn lookup(&self, key: &BindKey) -> BindResult<&BindVariable> {
        match key {
            BindKey::Index(index) => self.lookup_index(*index),
            BindKey::Name(name) => self.lookup_name(name),
        }
    }

    pub fn lookup_index(&self, index: usize) -> BindResult<&BindVariable> {
        let slot = self.slot_for_index(index)?;
        Ok(&self.variables[slot.0])
    }

    pub fn lookup_name(&self, name: &str) -> BindResult<&BindVariable> {
        let slot = self.slot_for_name(name)?;
        Ok(&self.variables[slot.0])
    }

    /// Variable at `slot`; used by the evaluator on the per-row path
    #[inline]
    pub fn get(&self, slot: SlotId) -> Option<&BindVariable> {
        self.variables.get(slot.0)
    }

    fn slot_for_index(&self, index: usize) -> BindResult<SlotId> {
        index
            .checked_sub(1)
            .and_then(|i| self.positional.get(i))
            .copied()
            .ok_or(BindError::IndexOutOfRange {
                index,
                count: self.positional.len(),
            })
    }

    fn slot_for_name(&self, name: &str) -> BindResult<SlotId> {
        self.named
            .get(name)
            .copied()
            .ok_or_else(|| BindError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    /// Number of declared positional slots
    pub fn positional_count(&self) -> usize {
        self.positional.len()
    }

    /// Number of declared named slots
    pub fn named_count(&self) -> usize {
        self.named.len()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// All variables in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &BindVariable> {
        self.variables.iter()
    }

    /// Declared names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Keys of variables that currently read as NULL
    pub fn unbound_keys(&self) -> Vec<&BindKey> {
        self.variables
            .iter()
            .filter(|v| v.is_null())
            .map(BindVariable::key)
            .collect()
    }
}
