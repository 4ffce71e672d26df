//! # Run Summary
//!
//! Counters collected during a successful pass, when requested. The text
//! rendering is the `--summary` report of the CLI; the serde form is its
//! `--format json` output.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use esml_core::TypeTag;
use serde::Serialize;

/// Statistics for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Every event in the stream.
    pub total_events: usize,
    /// Events whose tag was declarator-capable when they were read.
    pub declaration_events: usize,
    /// All other events.
    pub ordinary_events: usize,
    /// Events seen per tag.
    pub event_counts: BTreeMap<TypeTag, usize>,
    /// Every tag some declaration event registered a schema for.
    pub declared_types: BTreeSet<TypeTag>,
    /// Tags treated as declarators at the end of the run.
    pub declarator_types: BTreeSet<TypeTag>,
}

impl Summary {
    pub(crate) fn record_declaration(&mut self, declarer: &TypeTag, declared: &TypeTag) {
        self.record(declarer);
        self.declaration_events += 1;
        self.declared_types.insert(declared.clone());
    }

    pub(crate) fn record_ordinary(&mut self, tag: &TypeTag) {
        self.record(tag);
        self.ordinary_events += 1;
    }

    fn record(&mut self, tag: &TypeTag) {
        self.total_events += 1;
        *self.event_counts.entry(tag.clone()).or_insert(0) += 1;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(f, "Type-declaring events: {}", self.declaration_events)?;
        writeln!(f, "Normal events: {}", self.ordinary_events)?;
        write!(f, "Declared types (unique): {}", self.declared_types.len())?;
        if !self.declarator_types.is_empty() {
            write!(f, "\nDeclarer-capable types:")?;
            for tag in &self.declarator_types {
                write!(f, "\n  - {tag}")?;
            }
        }
        if !self.event_counts.is_empty() {
            write!(f, "\nEvent counts by type:")?;
            for (tag, count) in &self.event_counts {
                write!(f, "\n  - {tag}: {count}")?;
            }
        }
        Ok(())
    }
}
