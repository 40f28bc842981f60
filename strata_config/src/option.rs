//! Static option metadata and the per-call option tree.
//!
//! The derive macro emits an [`OptionSpec`] slice per struct; [`OptionTree`]
//! instantiates it for one resolution call, assigning dotted `full_id`s and
//! tracking the value each option currently holds. The tree is discarded once
//! resolution finishes.

use std::collections::{HashMap, HashSet};

use crate::value::Value;

/// Scalar type an option's final value must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    /// `bool`.
    Bool,
    /// Signed integers of any width.
    Int,
    /// Unsigned integers of any width.
    Uint,
    /// `f32` or `f64`.
    Float,
    /// `String`.
    Str,
    /// `std::time::Duration`.
    Duration,
}

impl Scalar {
    /// Name shown in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Uint => "unsigned integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Duration => "duration",
        }
    }
}

/// Shape of one configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Single scalar value.
    Scalar(Scalar),
    /// Sequence of scalars of one element type.
    Sequence(Scalar),
    /// Nested record; carries no value of its own.
    Group,
}

/// Static metadata for one option, emitted by the derive macro.
#[derive(Debug)]
pub struct OptionSpec {
    /// Identifier among siblings; also the file key and flag-name segment.
    pub id: &'static str,
    /// Single-character flag alias.
    pub short: Option<char>,
    /// Help text shown for the generated flag.
    pub help: &'static str,
    /// Default literal, parsed against the declared type before any source
    /// runs.
    pub default: Option<&'static str>,
    /// Shape and underlying type.
    pub kind: Kind,
    /// Child options when `kind` is [`Kind::Group`], empty otherwise.
    pub children: &'static [OptionSpec],
}

/// Separator joining nested ids into a `full_id`.
pub(crate) const NESTING_SEPARATOR: char = '.';

/// One option instantiated for a resolution call.
pub(crate) struct OptionNode {
    pub spec: &'static OptionSpec,
    /// Arena index of the enclosing group, if nested.
    pub parent: Option<usize>,
    /// Arena indices of child options, for groups.
    pub children: Vec<usize>,
    /// Dotted path from the root; unique across the tree.
    pub full_id: String,
    /// Path segments from the root, as passed to `assign`.
    pub path: Vec<&'static str>,
    /// Last value applied by any stage. Starts unset; defaults and sources
    /// only ever overwrite, never clear.
    pub current: Option<Value>,
}

impl OptionNode {
    pub fn is_leaf(&self) -> bool {
        !matches!(self.spec.kind, Kind::Group)
    }
}

/// Arena holding every option of one resolution call.
///
/// Ownership flows from the root downward; parents are plain indices, so no
/// cycles of ownership exist.
pub(crate) struct OptionTree {
    nodes: Vec<OptionNode>,
    /// Direct children of the root.
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

impl OptionTree {
    /// Build the per-call tree from derived metadata.
    ///
    /// # Panics
    ///
    /// Panics on structural faults in the configuration struct: duplicate ids
    /// among siblings, duplicate shorthand aliases anywhere in the tree, or a
    /// default or shorthand declared on a group. The derive macro rejects all
    /// of these at compile time; the checks fire for hand-written
    /// `StrataConfig` implementations.
    pub fn build(specs: &'static [OptionSpec]) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            index: HashMap::new(),
        };
        tree.roots = tree.push_level(specs, None);
        tree.check_shorthands();
        tree
    }

    fn push_level(&mut self, specs: &'static [OptionSpec], parent: Option<usize>) -> Vec<usize> {
        let mut level = Vec::with_capacity(specs.len());
        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert(spec.id) {
                let scope = parent.map_or_else(
                    || "at the root".to_owned(),
                    |p| format!("under '{}'", self.nodes[p].full_id),
                );
                panic!("duplicate option id '{}' {scope}", spec.id);
            }

            let full_id = parent.map_or_else(
                || spec.id.to_owned(),
                |p| format!("{}{NESTING_SEPARATOR}{}", self.nodes[p].full_id, spec.id),
            );
            let mut path = parent.map_or_else(Vec::new, |p| self.nodes[p].path.clone());
            path.push(spec.id);

            if matches!(spec.kind, Kind::Group) {
                if spec.default.is_some() {
                    panic!("group option '{full_id}' cannot declare a default value");
                }
                if spec.short.is_some() {
                    panic!("group option '{full_id}' cannot declare a shorthand");
                }
            }

            let idx = self.nodes.len();
            self.index.insert(full_id.clone(), idx);
            self.nodes.push(OptionNode {
                spec,
                parent,
                children: Vec::new(),
                full_id,
                path,
                current: None,
            });
            level.push(idx);

            if matches!(spec.kind, Kind::Group) {
                let children = self.push_level(spec.children, Some(idx));
                self.nodes[idx].children = children;
            }
        }
        level
    }

    fn check_shorthands(&self) {
        let mut seen: HashMap<char, &str> = HashMap::new();
        for node in &self.nodes {
            let Some(short) = node.spec.short else {
                continue;
            };
            if let Some(other) = seen.insert(short, &node.full_id) {
                panic!(
                    "shorthand '-{short}' is declared by both '{other}' and '{}'",
                    node.full_id
                );
            }
        }
    }

    pub fn node(&self, idx: usize) -> &OptionNode {
        &self.nodes[idx]
    }

    pub fn set_current(&mut self, idx: usize, value: Value) {
        self.nodes[idx].current = Some(value);
    }

    /// Indices of every leaf, in declaration order.
    pub fn leaf_indices(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].is_leaf())
            .collect()
    }

    /// Direct children of the root, in declaration order.
    pub fn root_indices(&self) -> Vec<usize> {
        self.roots.clone()
    }

    /// Look up a root-level option by its id.
    pub fn root_option(&self, id: &str) -> Option<usize> {
        self.index
            .get(id)
            .copied()
            .filter(|&idx| self.nodes[idx].parent.is_none())
    }
}
