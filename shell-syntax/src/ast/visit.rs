//! Read-only tree traversal.
//!
//! `mrsh_node_type` tags a node as one of `PROGRAM`, `COMMAND_LIST`,
//! `AND_OR_LIST`, `COMMAND`, or `WORD` so that generic code (the mrsh
//! pretty-printer, for instance) can walk a heterogeneous tree without
//! knowing every concrete node type up front. [`Node`] is that same tag as
//! a borrowing enum, and [`Visit`] is the idiomatic Rust equivalent of
//! walking it: a trait with one method per node kind, each defaulting to
//! recursing into children, so a caller overrides only the kinds it cares
//! about (the pattern `syn::visit::Visit` uses).

use super::command::{AndOrList, Command, CommandList, Pipeline, Program};
use super::word::{Word, WordPart};

/// A borrowed reference to any one of the five node kinds `mrsh_node_type`
/// distinguishes.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Program(&'a Program),
    CommandList(&'a CommandList),
    AndOrList(&'a AndOrList),
    Command(&'a Command),
    Word(&'a Word),
}

/// A read-only visitor over the AST.
///
/// Every method has a default implementation that simply recurses into
/// the node's children, in source order, doing nothing else — so
/// implementing just `visit_word`, say, reaches every word in the tree
/// without needing to know how to walk `if`/`for`/`case` commands by hand.
pub trait Visit {
    fn visit_program(&mut self, program: &Program) {
        self.visit_command_list(&program.body);
    }

    fn visit_command_list(&mut self, list: &CommandList) {
        for (and_or, _separator) in &list.items {
            self.visit_and_or_list(and_or);
        }
    }

    fn visit_and_or_list(&mut self, and_or: &AndOrList) {
        match and_or {
            AndOrList::Pipeline(pipeline) => self.visit_pipeline(pipeline),
            AndOrList::BinOp { left, right, .. } => {
                self.visit_and_or_list(left);
                self.visit_pipeline(right);
            }
        }
    }

    fn visit_pipeline(&mut self, pipeline: &Pipeline) {
        for command in &pipeline.commands {
            self.visit_command(command);
        }
    }

    fn visit_command(&mut self, command: &Command) {
        match command {
            Command::Simple {
                assignments,
                words,
                io_redirects,
                ..
            } => {
                for assignment in assignments {
                    self.visit_word(&assignment.value);
                }
                for word in words {
                    self.visit_word(word);
                }
                for redirect in io_redirects {
                    self.visit_word(&redirect.target);
                    if let Some(body) = &redirect.here_doc_body {
                        self.visit_word(body);
                    }
                }
            }
            Command::BraceGroup { body, .. } | Command::Subshell { body, .. } => {
                self.visit_command_list(body);
            }
            Command::If {
                condition,
                body,
                else_part,
                ..
            } => {
                self.visit_command_list(condition);
                self.visit_command_list(body);
                if let Some(else_part) = else_part {
                    self.visit_command(else_part);
                }
            }
            Command::For { values, body, .. } => {
                if let Some(values) = values {
                    for word in values {
                        self.visit_word(word);
                    }
                }
                self.visit_command_list(body);
            }
            Command::Loop {
                condition, body, ..
            } => {
                self.visit_command_list(condition);
                self.visit_command_list(body);
            }
            Command::Case { word, items, .. } => {
                self.visit_word(word);
                for item in items {
                    for pattern in &item.patterns {
                        self.visit_word(pattern);
                    }
                    self.visit_command_list(&item.body);
                }
            }
            Command::FunctionDefinition { body, .. } => {
                self.visit_command(body);
            }
        }
    }

    fn visit_word(&mut self, word: &Word) {
        for part in &word.parts {
            self.visit_word_part(part);
        }
    }

    fn visit_word_part(&mut self, part: &WordPart) {
        match part {
            WordPart::String { .. } => (),
            WordPart::Parameter(expansion) => {
                if let Some(arg) = &expansion.arg {
                    self.visit_word(arg);
                }
            }
            WordPart::Command { program, .. } => self.visit_program(program),
            WordPart::Arithmetic { body, .. } => self.visit_word(body),
        }
    }
}
