//! Pretty-printing diagnostic messages that reference source code.
//!
//! A [`SyntaxError`](crate::parser::error::SyntaxError) (or any other error
//! that implements [`MessageBase`]) can be converted into a [`Message`] and,
//! with the `annotate-snippets` feature enabled, into an
//! `annotate_snippets::Group` ready to render. This mirrors
//! `yash_syntax::source::pretty`, simplified for this crate's plain
//! `Position`/`Range` model: there is no cached, `Rc`-shared source string
//! behind a [`Location`](super::Location), so rendering takes the original
//! source text as an explicit parameter instead of reading it out of the
//! location.
//!
//! ```
//! use shell_syntax::parser::error::{Error, SyntaxError};
//! use shell_syntax::source::Location;
//! use shell_syntax::source::pretty::Message;
//!
//! let error = Error {
//!     cause: SyntaxError::EmptyParam.into(),
//!     location: Location::unknown(),
//! };
//! let message = Message::from(&error);
//! assert_eq!(message.title, "a parameter expansion has no name");
//! ```

use super::Location;
use std::borrow::Cow;

/// Severity/role of an [`Annotation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnnotationKind {
    Error,
    Warning,
    Info,
    Note,
    Help,
}

/// A labeled reference to a fragment of source code.
#[derive(Clone, Debug)]
pub struct Annotation<'a> {
    pub kind: AnnotationKind,
    pub label: Cow<'a, str>,
    pub location: &'a Location,
}

impl<'a> Annotation<'a> {
    #[must_use]
    pub fn new(kind: AnnotationKind, label: Cow<'a, str>, location: &'a Location) -> Self {
        Annotation {
            kind,
            label,
            location,
        }
    }
}

/// A complete diagnostic message: a title plus the source fragments that
/// support it.
#[derive(Clone, Debug)]
pub struct Message<'a> {
    pub kind: AnnotationKind,
    pub title: Cow<'a, str>,
    pub annotations: Vec<Annotation<'a>>,
}

impl super::Source {
    /// Appends annotations describing how this source's text came to be
    /// part of the program being parsed, walking through nested
    /// substitutions/aliases.
    fn complement_annotations<'a>(&'a self, result: &mut Vec<Annotation<'a>>) {
        use super::Source::*;
        match self {
            Unknown | CommandString | File { .. } => (),
            Alias { name, original } => {
                result.push(Annotation::new(
                    AnnotationKind::Info,
                    format!("alias `{name}` was substituted here").into(),
                    original,
                ));
                original.source.complement_annotations(result);
            }
            CommandSubstitution { original } => {
                result.push(Annotation::new(
                    AnnotationKind::Info,
                    "command substitution appeared here".into(),
                    original,
                ));
                original.source.complement_annotations(result);
            }
            ArithmeticExpansion { original } => {
                result.push(Annotation::new(
                    AnnotationKind::Info,
                    "arithmetic expansion appeared here".into(),
                    original,
                ));
                original.source.complement_annotations(result);
            }
            HereDoc { delimiter } => {
                result.push(Annotation::new(
                    AnnotationKind::Info,
                    "here-document body introduced here".into(),
                    delimiter,
                ));
                delimiter.source.complement_annotations(result);
            }
        }
    }
}

/// Helper for converting an error type into a [`Message`].
///
/// Implementors get `From<&Self> for Message` for free via the blanket
/// implementation below.
pub trait MessageBase {
    /// The overall severity of the message. Defaults to
    /// [`AnnotationKind::Error`].
    fn message_kind(&self) -> AnnotationKind {
        AnnotationKind::Error
    }

    /// The headline text of the message.
    fn message_title(&self) -> Cow<'_, str>;

    /// The primary annotation, pointing at the main cause.
    fn main_annotation(&self) -> Annotation<'_>;
}

impl<'a, T: MessageBase> From<&'a T> for Message<'a> {
    fn from(base: &'a T) -> Self {
        let main_annotation = base.main_annotation();
        let mut annotations = vec![main_annotation];
        let source = annotations[0].location.source.clone();
        source.complement_annotations(&mut annotations);
        Message {
            kind: base.message_kind(),
            title: base.message_title(),
            annotations,
        }
    }
}

#[cfg(feature = "annotate-snippets")]
mod annotate_snippets_support {
    use super::*;

    impl From<AnnotationKind> for annotate_snippets::Level<'_> {
        fn from(kind: AnnotationKind) -> Self {
            use AnnotationKind::*;
            match kind {
                Error => Self::ERROR,
                Warning => Self::WARNING,
                Info => Self::INFO,
                Note => Self::NOTE,
                Help => Self::HELP,
            }
        }
    }

    impl From<AnnotationKind> for annotate_snippets::AnnotationKind {
        fn from(kind: AnnotationKind) -> Self {
            use AnnotationKind::*;
            match kind {
                Error | Warning => Self::Primary,
                Info | Note | Help => Self::Context,
            }
        }
    }

    /// Renders `message`'s annotations that refer to `source_text` into an
    /// `annotate_snippets::Group`. Annotations whose location belongs to a
    /// different piece of source text than the one passed in are omitted
    /// from the snippet (only their label would be meaningful, and this
    /// crate does not keep a registry of every nested source text around to
    /// look them up by).
    #[must_use]
    pub fn render<'a>(message: &'a Message<'a>, source_text: &'a str) -> annotate_snippets::Group<'a> {
        let len = source_text.len() as u64;
        let annotations: Vec<_> = message
            .annotations
            .iter()
            .filter(|a| {
                let r = a.location.range;
                r.is_valid() && r.begin.offset <= len && r.end.offset <= len
            })
            .map(|a| {
                let range = a.location.range.begin.offset as usize..a.location.range.end.offset as usize;
                annotate_snippets::AnnotationKind::from(a.kind)
                    .span(range)
                    .label(&a.label)
            })
            .collect();

        let snippet = annotate_snippets::Snippet::source(source_text)
            .line_start(1)
            .annotations(annotations);

        annotate_snippets::Level::from(message.kind)
            .primary_title(&*message.title)
            .element(snippet)
    }
}

#[cfg(feature = "annotate-snippets")]
pub use annotate_snippets_support::render;
