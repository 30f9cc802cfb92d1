//! The shell's abstract syntax tree.
//!
//! This module is the Rust counterpart of `mrsh_node` and its four
//! top-level node kinds (`mrsh_and_or_list`, `mrsh_command`,
//! `mrsh_command_list`, `mrsh_word`) plus their substructure, laid out as
//! ordinary owned Rust types (`Box`/`Vec`/`String`) instead of mrsh's
//! manually reference-counted, `_create`/`_destroy`/`_copy`-function C
//! structs: `#[derive(Clone)]` gives deep-copy for free (spec invariant
//! P2), and `Drop` (synthesized automatically, since every field owns its
//! data) gives recursive teardown for free.

pub mod command;
pub mod display;
pub mod visit;
pub mod word;

pub use command::{
    AndOrList, AndOrOp, Assignment, CaseItem, Command, CommandList, IoRedirect, Pipeline,
    Program, RedirectOp, Separator,
};
pub use visit::{Node, Visit};
pub use word::{ParameterExpansion, ParameterOp, Word, WordPart};

use crate::source::Range;

/// A node that knows its own source range.
///
/// Every AST node carries a `location: Range` field directly (set once by
/// the parser, per spec §4.B), rather than computing it on demand by
/// folding over children as mrsh's C API does via separate getter
/// functions — there is no advantage to recomputation once ownership
/// already makes the field easy to carry along, and a direct field keeps
/// [`crate::source::Range::contains`] (spec invariant P3) trivial to check
/// against children without a tree walk.
pub trait Spanned {
    fn span(&self) -> Range;
}

impl Spanned for Word {
    fn span(&self) -> Range {
        self.location
    }
}

impl Spanned for Command {
    fn span(&self) -> Range {
        use Command::*;
        match self {
            Simple { location, .. }
            | BraceGroup { location, .. }
            | Subshell { location, .. }
            | If { location, .. }
            | For { location, .. }
            | Loop { location, .. }
            | Case { location, .. }
            | FunctionDefinition { location, .. } => *location,
        }
    }
}

impl Spanned for Pipeline {
    fn span(&self) -> Range {
        self.location
    }
}

impl Spanned for AndOrList {
    fn span(&self) -> Range {
        match self {
            AndOrList::Pipeline(p) => p.location,
            AndOrList::BinOp { location, .. } => *location,
        }
    }
}

impl Spanned for CommandList {
    fn span(&self) -> Range {
        self.location
    }
}
