//! Indented tree rendering used by the `Display` impls of graphs and results.

use std::fmt;

use crate::model::Properties;

/// A labelled tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tree {
    label: String,
    children: Vec<Tree>,
}

impl Tree {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub(crate) fn with_children(label: impl Into<String>, children: Vec<Tree>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    pub(crate) fn properties(properties: &Properties) -> Self {
        let entries: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        Self::new(format!("Properties: {{{}}}", entries.join(", ")))
    }

    pub(crate) fn push(&mut self, child: Tree) {
        self.children.push(child);
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        let count = self.children.len();
        for (idx, child) in self.children.iter().enumerate() {
            let last = idx + 1 == count;
            let (branch, indent) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            writeln!(f, "{prefix}{branch}{}", child.label)?;
            child.render(f, &format!("{prefix}{indent}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        self.render(f, "")
    }
}
