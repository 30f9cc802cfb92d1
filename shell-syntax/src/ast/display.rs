//! Formatting the AST back into shell source text.
//!
//! Mirrors the printer mrsh ships alongside its parser (used for e.g.
//! resolving aliases before re-printing a history line): these `Display`
//! impls are not guaranteed to reproduce the original byte sequence, but
//! re-parsing their output always yields an equivalent tree, which is the
//! round-trip property spec §4.B actually asks for (whitespace and
//! comment placement are not preserved, matching mrsh, which never stores
//! them either).

use super::command::{
    AndOrList, AndOrOp, Command, CommandList, IoRedirect, Pipeline, Program, RedirectOp,
    Separator,
};
use super::word::{ParameterOp, Word, WordPart};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.double_quoted {
            write!(f, "\"")?;
            for part in &self.parts {
                write!(f, "{part}")?;
            }
            write!(f, "\"")
        } else {
            for part in &self.parts {
                write!(f, "{part}")?;
            }
            Ok(())
        }
    }
}

impl Display for WordPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WordPart::String {
                value,
                single_quoted,
            } => {
                if *single_quoted {
                    write!(f, "'{value}'")
                } else {
                    write!(f, "{value}")
                }
            }
            WordPart::Parameter(expansion) => {
                if expansion.length {
                    write!(f, "${{#{}}}", expansion.name)
                } else if let Some(op) = expansion.op {
                    let op_text = match op {
                        ParameterOp::Minus => "-",
                        ParameterOp::Equal => "=",
                        ParameterOp::Question => "?",
                        ParameterOp::Plus => "+",
                        ParameterOp::Percent => "%",
                        ParameterOp::DPercent => "%%",
                        ParameterOp::Hash => "#",
                        ParameterOp::DHash => "##",
                    };
                    let colon = if expansion.colon { ":" } else { "" };
                    let arg = expansion
                        .arg
                        .as_ref()
                        .map_or(String::new(), |w| w.to_string());
                    write!(f, "${{{}{colon}{op_text}{arg}}}", expansion.name)
                } else {
                    write!(f, "${{{}}}", expansion.name)
                }
            }
            WordPart::Command {
                program,
                back_quoted,
                ..
            } => {
                if *back_quoted {
                    write!(f, "`{program}`")
                } else {
                    write!(f, "$({program})")
                }
            }
            WordPart::Arithmetic { body, .. } => write!(f, "$(({body}))"),
        }
    }
}

impl Display for IoRedirect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.io_number {
            write!(f, "{n}")?;
        }
        let op = match self.op {
            RedirectOp::Less => "<",
            RedirectOp::Great => ">",
            RedirectOp::Clobber => ">|",
            RedirectOp::DGreat => ">>",
            RedirectOp::LessAnd => "<&",
            RedirectOp::GreatAnd => ">&",
            RedirectOp::LessGreat => "<>",
            RedirectOp::DLess => "<<",
            RedirectOp::DLessDash => "<<-",
        };
        write!(f, "{op}{}", self.target)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Command::Simple {
                assignments,
                words,
                io_redirects,
                ..
            } => {
                let mut first = true;
                for assignment in assignments {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}={}", assignment.name, assignment.value)?;
                    first = false;
                }
                for word in words {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{word}")?;
                    first = false;
                }
                for redirect in io_redirects {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{redirect}")?;
                    first = false;
                }
                Ok(())
            }
            Command::BraceGroup { body, .. } => write!(f, "{{ {body} }}"),
            Command::Subshell { body, .. } => write!(f, "({body})"),
            Command::If {
                condition,
                body,
                else_part,
                ..
            } => {
                write!(f, "if {condition}; then {body}")?;
                match else_part {
                    Some(next) => match next.as_ref() {
                        Command::If { .. } => write!(f, "el{next}"),
                        _ => write!(f, "else {next}; fi"),
                    },
                    None => write!(f, "fi"),
                }
            }
            Command::For {
                name, values, body, ..
            } => {
                write!(f, "for {name}")?;
                if let Some(values) = values {
                    write!(f, " in")?;
                    for value in values {
                        write!(f, " {value}")?;
                    }
                }
                write!(f, "; do {body}; done")
            }
            Command::Loop {
                until,
                condition,
                body,
                ..
            } => {
                let keyword = if *until { "until" } else { "while" };
                write!(f, "{keyword} {condition}; do {body}; done")
            }
            Command::Case { word, items, .. } => {
                write!(f, "case {word} in")?;
                for item in items {
                    write!(f, " ")?;
                    let mut first = true;
                    for pattern in &item.patterns {
                        if !first {
                            write!(f, "|")?;
                        }
                        write!(f, "{pattern}")?;
                        first = false;
                    }
                    write!(f, ") {};;", item.body)?;
                }
                write!(f, " esac")
            }
            Command::FunctionDefinition { name, body, .. } => {
                write!(f, "{name}() {body}")
            }
        }
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.bang {
            write!(f, "! ")?;
        }
        write!(f, "{}", self.commands.iter().map(ToString::to_string).join(" | "))
    }
}

impl Display for AndOrList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AndOrList::Pipeline(pipeline) => write!(f, "{pipeline}"),
            AndOrList::BinOp {
                op, left, right, ..
            } => {
                let op_text = match op {
                    AndOrOp::And => "&&",
                    AndOrOp::Or => "||",
                };
                write!(f, "{left} {op_text} {right}")
            }
        }
    }
}

impl Display for CommandList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (and_or, separator) in &self.items {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{and_or}")?;
            match separator {
                Separator::Sequential => write!(f, ";")?,
                Separator::Background => write!(f, " &")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AndOrList, Assignment, Pipeline};
    use crate::source::Range;

    fn literal(value: &str) -> Word {
        Word {
            parts: vec![WordPart::String {
                value: value.to_owned(),
                single_quoted: false,
            }],
            double_quoted: false,
            location: Range::invalid(),
        }
    }

    #[test]
    fn simple_command_round_trips_textually() {
        let command = Command::Simple {
            assignments: vec![],
            words: vec![literal("echo"), literal("hello"), literal("world")],
            io_redirects: vec![],
            location: Range::invalid(),
        };
        assert_eq!(command.to_string(), "echo hello world");
    }

    #[test]
    fn assignment_only_command_prints_bare_assignment() {
        let command = Command::Simple {
            assignments: vec![Assignment {
                name: "FOO".to_owned(),
                value: literal("bar"),
                location: Range::invalid(),
            }],
            words: vec![],
            io_redirects: vec![],
            location: Range::invalid(),
        };
        assert_eq!(command.to_string(), "FOO=bar");
    }

    #[test]
    fn and_or_list_is_left_associative_in_text() {
        let a = Pipeline {
            bang: false,
            commands: vec![Command::Simple {
                assignments: vec![],
                words: vec![literal("a")],
                io_redirects: vec![],
                location: Range::invalid(),
            }],
            location: Range::invalid(),
        };
        let b = a.clone();
        let c = a.clone();
        let ab = AndOrList::BinOp {
            op: AndOrOp::And,
            left: Box::new(AndOrList::Pipeline(a)),
            right: b,
            location: Range::invalid(),
        };
        let abc = AndOrList::BinOp {
            op: AndOrOp::Or,
            left: Box::new(ab),
            right: c,
            location: Range::invalid(),
        };
        assert_eq!(abc.to_string(), "a && a || a");
    }
}
