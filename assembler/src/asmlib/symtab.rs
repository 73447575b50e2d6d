use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use super::types::{AssemblerFailure, LineNumber};

/// A label name in canonical (lower case) form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelName(String);

impl LabelName {
    pub(crate) fn new(name: &str) -> LabelName {
        LabelName(name.to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for LabelName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.0.as_str())
    }
}

/// Label values are byte addresses.  Each assembly gets its own
/// table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: BTreeMap<LabelName, u32>,
}

impl LabelTable {
    /// Bind `name` to `value`.  Binding a label again to the value it
    /// already has is allowed.
    pub(crate) fn define(
        &mut self,
        line: LineNumber,
        name: &LabelName,
        value: u32,
    ) -> Result<(), AssemblerFailure> {
        match self.labels.get(name) {
            Some(old) if *old == value => Ok(()),
            Some(old) => Err(AssemblerFailure::LabelConflict {
                line,
                name: name.to_string(),
                old: *old,
                new: value,
            }),
            None => {
                event!(
                    Level::DEBUG,
                    "line {line}: label '{name}' is at {value:#X}"
                );
                self.labels.insert(name.clone(), value);
                Ok(())
            }
        }
    }

    /// Check that the second pass arrived at `name` with the value
    /// the first pass gave it.
    pub(crate) fn confirm(
        &self,
        line: LineNumber,
        name: &LabelName,
        value: u32,
    ) -> Result<(), AssemblerFailure> {
        match self.labels.get(name) {
            Some(expected) if *expected == value => Ok(()),
            Some(expected) => Err(AssemblerFailure::Internal(format!(
                "line {line}: label '{name}' was at {expected:#X} in pass 1 but is at {value:#X} in pass 2"
            ))),
            None => Err(AssemblerFailure::Internal(format!(
                "line {line}: label '{name}' was not seen in pass 1"
            ))),
        }
    }

    pub(crate) fn lookup(&self, line: LineNumber, name: &LabelName) -> Result<u32, AssemblerFailure> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| AssemblerFailure::UndefinedLabel {
                line,
                name: name.to_string(),
            })
    }

    /// Look up a label, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(&LabelName::new(name)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LabelName, u32)> {
        self.labels.iter().map(|(name, value)| (name, *value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Display for LabelTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        for (name, value) in &self.labels {
            writeln!(f, "{value:08X} {name}")?;
        }
        Ok(())
    }
}
