//! Diagnostics produced while lowering graph nodes.
//!
//! Every diagnostic is keyed by the node that produced it, so the editor can
//! badge the offending node. An error aborts lowering of that node only.

use std::fmt;

use crate::NodeId;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The node could not be lowered; its statements were dropped.
    Error,
    /// The node was lowered (or skipped) but looks suspicious.
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Node the message is attached to; `None` for graph-wide messages.
    pub node: Option<NodeId>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{} [node {}]: {}", self.severity, node.0, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, node: Option<NodeId>, message: impl Into<String>) {
        self.push(Severity::Error, node, message);
    }

    pub fn warning(&mut self, node: Option<NodeId>, message: impl Into<String>) {
        self.push(Severity::Warning, node, message);
    }

    pub fn info(&mut self, node: Option<NodeId>, message: impl Into<String>) {
        self.push(Severity::Info, node, message);
    }

    fn push(&mut self, severity: Severity, node: Option<NodeId>, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity,
            node,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Diagnostics attached to `node`.
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.node == Some(node))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append all diagnostics from `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.items {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}
