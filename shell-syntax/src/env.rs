//! The evaluation-interface contract.
//!
//! This crate stops at producing an AST; it does not execute anything.
//! But several parsing decisions (whether `$(...)` produces a trimmed
//! string, what `$?` expands to, whether a function named `name` is
//! already defined) depend on state that only an execution engine
//! maintains. Per spec component G, this module defines that state's
//! *shape* — `mrsh_state`, `mrsh_call_frame`, and `mrsh_option` turned into
//! idiomatic Rust types — as a contract a future execution engine
//! implements and this crate's consumers can already code against,
//! without this crate itself doing any of the work those types describe.

use bitflags::bitflags;

bitflags! {
    /// Shell options settable via `set -o`/`set +o`. Mirrors
    /// `mrsh_option`.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Options: u32 {
        /// `-a`: export all subsequently defined variables.
        const ALLEXPORT = 1 << 0;
        /// `-b`: report background job completion immediately.
        const NOTIFY    = 1 << 1;
        /// `-C`: refuse to clobber existing files with `>`.
        const NOCLOBBER = 1 << 2;
        /// `-e`: exit immediately on a command failure.
        const ERREXIT   = 1 << 3;
        /// `-f`: disable pathname expansion.
        const NOGLOB    = 1 << 4;
        /// `-d`: look up command names in the function table before `PATH`.
        const PRELOOKUP = 1 << 5;
        /// `-m`: enable job control.
        const MONITOR   = 1 << 6;
        /// `-n`: read commands but do not execute them.
        const NOEXEC    = 1 << 7;
        /// `-i`-adjacent: do not exit an interactive shell on EOF.
        const IGNOREEOF = 1 << 8;
        /// `-n`-adjacent: disable command history logging.
        const NOLOG     = 1 << 9;
        /// `-V`: use vi-style command-line editing.
        const VI        = 1 << 10;
        /// `-u`: treat an unset variable reference as an error.
        const NOUNSET   = 1 << 11;
        /// `-v`: echo input lines as they are read.
        const VERBOSE   = 1 << 12;
        /// `-x`: print each command before executing it.
        const XTRACE    = 1 << 13;
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::empty()
    }
}

/// Attributes of a shell variable. Mirrors `mrsh_variable_attrib`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VariableAttributes {
    pub exported: bool,
    pub read_only: bool,
}

/// One nested scope of local variables and positional parameters,
/// mirroring `mrsh_call_frame` — pushed on entry to a function call and
/// popped on return.
#[derive(Clone, Debug, Default)]
pub struct CallFrame {
    pub function_name: Option<String>,
    pub argv: Vec<String>,
}

/// The variable-storage contract an execution engine must satisfy for
/// this crate's AST to be evaluated, analogous to how
/// [`shell_arith::eval::Var`](../shell_arith/eval/trait.Var.html) is the
/// narrower contract arithmetic evaluation needs.
pub trait VariableStore {
    type Error;

    fn get(&self, name: &str) -> Result<Option<&str>, Self::Error>;
    fn set(&mut self, name: &str, value: String) -> Result<(), Self::Error>;
    fn attributes(&self, name: &str) -> VariableAttributes;
}

/// The overall interpreter state an execution engine threads through
/// evaluation, mirroring the scalar fields of `mrsh_state` that are not
/// themselves a variable store, alias set, or call-frame stack (those have
/// their own types: [`VariableStore`], [`crate::alias::AliasSet`],
/// [`CallFrame`]).
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    pub options: Options,
    pub last_status: i32,
    pub interactive: bool,
    pub exit_requested: Option<i32>,
    pub call_frames: Vec<CallFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_all_unset() {
        assert_eq!(Options::default(), Options::empty());
    }

    #[test]
    fn options_combine_with_bitor() {
        let opts = Options::ERREXIT | Options::NOUNSET;
        assert!(opts.contains(Options::ERREXIT));
        assert!(opts.contains(Options::NOUNSET));
        assert!(!opts.contains(Options::XTRACE));
    }
}
