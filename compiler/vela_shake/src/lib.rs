//! Tree-shaking analysis for the Vela AOT compiler.
//!
//! This crate provides:
//!
//! - **The dependency graph** ([`DependencyGraph`]) — an incremental graph
//!   whose nodes are classes and methods and whose edges express "if X is
//!   kept, Y must also be kept". The driver feeds it one [`ClassInfo`] per
//!   compiled class and finally asks for the reachable class names and
//!   method triples, which determine the compilation units emitted into the
//!   final binary.
//!
//! - **The tree-shaker policy** ([`TreeShakerMode`]) — how aggressively
//!   weakly referenced methods are pruned during traversal.
//!
//! - **The archive strip filter** ([`StripArchivesConfig`]) — ordered
//!   include/exclude glob rules deciding which entries survive when a
//!   dependency archive is repackaged.
//!
//! # Design
//!
//! Nodes live in an append-only table and reference each other by 32-bit
//! index, so the cyclic graph needs no ownership tricks and reachability is
//! an explicit worklist over indices rather than recursion over node
//! references. The graph only ever grows; the single piece of mutable state
//! besides the tables is the reachable-set cache, which every
//! [`add`](DependencyGraph::add) clears.
//!
//! Nothing here performs I/O or synchronization. A driver ingesting classes
//! from parallel workers must serialize calls into one graph instance.

mod class_info;
mod graph;
mod strip;

use std::fmt;
use std::str::FromStr;

pub use class_info::{ClassInfo, Dependency, MethodInfo};
pub use graph::DependencyGraph;
pub use strip::{Pattern, StripArchivesBuilder, StripArchivesConfig, StripArchivesError};

/// How aggressively the tree shaker prunes weakly referenced methods.
///
/// Chosen once when the [`DependencyGraph`] is created; affects traversal
/// only, never graph construction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum TreeShakerMode {
    /// Follow every edge. Nothing is shaken out.
    #[default]
    None,
    /// Drop methods explicitly marked weakly linked unless a strong edge
    /// reaches them; keep every other weak target.
    Conservative,
    /// Keep a weakly referenced method only if it is strongly linked, or if
    /// it is a constructor not marked weakly linked. Classes survive only
    /// through their methods or strong chains from the roots.
    Aggressive,
}

impl fmt::Display for TreeShakerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeShakerMode::None => write!(f, "none"),
            TreeShakerMode::Conservative => write!(f, "conservative"),
            TreeShakerMode::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl FromStr for TreeShakerMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(TreeShakerMode::None),
            "conservative" => Ok(TreeShakerMode::Conservative),
            "aggressive" => Ok(TreeShakerMode::Aggressive),
            _ => Err(ParseModeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Error when a tree-shaker mode name does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError {
    /// The string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown tree shaker mode `{}`, expected `none`, `conservative` or `aggressive`",
            self.input
        )
    }
}

impl std::error::Error for ParseModeError {}
