//! End-to-end parsing scenarios, one per grammar feature spec.md §8 calls
//! out, plus representative checks of the quantified properties P1-P7.

use shell_syntax::alias::{Alias, AliasSet};
use shell_syntax::ast::{AndOrList, AndOrOp, Command, Separator, Spanned, Visit, Word, WordPart};
use shell_syntax::buffer::SourceBuffer;
use shell_syntax::parser::{Config, Parser};
use shell_syntax::source::{Location, Range, Source};
use shell_syntax::Program;

fn parse(source: &str) -> Program {
    let mut parser = Parser::new(
        SourceBuffer::from_static(source),
        Source::CommandString,
        Config::new(),
    );
    parser.parse_program().unwrap()
}

fn parse_with_aliases(source: &str, aliases: &AliasSet) -> Program {
    let mut parser = Parser::new(
        SourceBuffer::from_static(source),
        Source::CommandString,
        Config::new().aliases(aliases),
    );
    parser.parse_program().unwrap()
}

fn only_command(program: &Program) -> &Command {
    assert_eq!(program.body.items.len(), 1, "expected exactly one list item");
    let AndOrList::Pipeline(pipeline) = &program.body.items[0].0 else {
        panic!("expected a plain pipeline, not an and/or chain")
    };
    assert_eq!(pipeline.commands.len(), 1, "expected a single-command pipeline");
    &pipeline.commands[0]
}

fn nth_command(program: &Program, index: usize) -> &Command {
    let AndOrList::Pipeline(pipeline) = &program.body.items[index].0 else {
        panic!("expected a plain pipeline, not an and/or chain")
    };
    &pipeline.commands[0]
}

#[test]
fn echo_hello_world() {
    let program = parse("echo hello world\n");
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let literals: Vec<_> = words.iter().map(|w| w.as_literal().unwrap()).collect();
    assert_eq!(literals, vec!["echo", "hello", "world"]);
}

#[test]
fn assignments_and_parameter_expansion() {
    let program = parse("greeting=hello\necho $greeting\n");
    assert_eq!(program.body.items.len(), 2);

    let Command::Simple { assignments, .. } = nth_command(&program, 0) else {
        panic!("expected a simple command")
    };
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].name, "greeting");
    assert_eq!(assignments[0].value.as_literal(), Some("hello"));

    let Command::Simple { words, .. } = nth_command(&program, 1) else {
        panic!("expected a simple command")
    };
    assert_eq!(words.len(), 2);
    let WordPart::Parameter(expansion) = &words[1].parts[0] else {
        panic!("expected a parameter expansion")
    };
    assert_eq!(expansion.name, "greeting");
}

#[test]
fn if_then_else_chain() {
    let program = parse("if false; then echo a; elif true; then echo b; else echo c; fi\n");
    let Command::If {
        condition,
        body,
        else_part,
        ..
    } = only_command(&program)
    else {
        panic!("expected an if command")
    };
    assert_eq!(condition.items.len(), 1);
    assert_eq!(body.items.len(), 1);
    let elif = else_part.as_ref().expect("elif branch present");
    assert!(matches!(elif.as_ref(), Command::If { .. }));
}

#[test]
fn here_document_body_is_attached_to_its_redirect() {
    let program = parse("cat <<EOF\nfirst line\nsecond line\nEOF\n");
    let Command::Simple { io_redirects, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert_eq!(io_redirects.len(), 1);
    let body = io_redirects[0]
        .here_doc_body
        .as_ref()
        .expect("here-doc body present")
        .as_literal()
        .expect("here-doc body is a literal word");
    assert_eq!(body, "first line\nsecond line\n");
}

#[test]
fn and_or_list_is_left_associative() {
    let program = parse("false && echo a || echo b\n");
    let AndOrList::BinOp { op, left, .. } = &program.body.items[0].0 else {
        panic!("expected a binary and-or list")
    };
    assert_eq!(*op, AndOrOp::Or);
    assert!(matches!(
        left.as_ref(),
        AndOrList::BinOp {
            op: AndOrOp::And,
            ..
        }
    ));
}

#[test]
fn arithmetic_expansion_respects_precedence() {
    let program = parse("echo $((1+2*3))\n");
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert_eq!(words.len(), 1);
    let WordPart::Arithmetic { body, .. } = &words[0].parts[0] else {
        panic!("expected an arithmetic expansion word part")
    };
    let text = body.as_literal().expect("arithmetic body is literal text");
    let expr = Parser::parse_arithm_expr(text).unwrap();
    let mut vars = std::collections::HashMap::new();
    assert_eq!(shell_arith::eval::eval(&expr, &mut vars).unwrap(), 7);
}

#[test]
fn alias_substitution_expands_command_name() {
    let mut aliases = AliasSet::new();
    aliases.insert(Alias {
        name: "greet".to_owned(),
        replacement: "echo hello".to_owned(),
        global: false,
        origin: Location::unknown(),
    });
    let program = parse_with_aliases("greet world\n", &aliases);
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let literals: Vec<_> = words.iter().map(|w| w.as_literal().unwrap()).collect();
    assert_eq!(literals, vec!["echo", "hello", "world"]);
}

#[test]
fn global_alias_expands_outside_command_name_position() {
    let mut aliases = AliasSet::new();
    aliases.insert(Alias {
        name: "L".to_owned(),
        replacement: "-l".to_owned(),
        global: true,
        origin: Location::unknown(),
    });
    let program = parse_with_aliases("ls L\n", &aliases);
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let literals: Vec<_> = words.iter().map(|w| w.as_literal().unwrap()).collect();
    assert_eq!(literals, vec!["ls", "-l"]);
}

#[test]
fn non_global_alias_does_not_expand_outside_command_name_position() {
    let mut aliases = AliasSet::new();
    aliases.insert(Alias {
        name: "L".to_owned(),
        replacement: "-l".to_owned(),
        global: false,
        origin: Location::unknown(),
    });
    let program = parse_with_aliases("ls L\n", &aliases);
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let literals: Vec<_> = words.iter().map(|w| w.as_literal().unwrap()).collect();
    assert_eq!(literals, vec!["ls", "L"]);
}

#[test]
fn self_referential_alias_terminates_instead_of_looping_forever() {
    let mut aliases = AliasSet::new();
    aliases.insert(Alias {
        name: "ls".to_owned(),
        replacement: "ls -F".to_owned(),
        global: false,
        origin: Location::unknown(),
    });
    let program = parse_with_aliases("ls\n", &aliases);
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert!(!words.is_empty());
}

/// P3: every node's range is contained in the enclosing program's range.
#[test]
fn every_node_range_is_contained_in_the_program_range() {
    #[derive(Default)]
    struct RangeChecker {
        program_range: Range,
        violations: Vec<String>,
    }

    impl Visit for RangeChecker {
        fn visit_word(&mut self, word: &Word) {
            if !self.program_range.contains(word.span()) {
                self.violations.push(word.to_string());
            }
            for part in &word.parts {
                self.visit_word_part(part);
            }
        }
    }

    let program = parse("if true; then echo a b c; fi\n");
    let mut checker = RangeChecker {
        program_range: program.body.span(),
        violations: Vec::new(),
    };
    checker.visit_program(&program);
    assert!(checker.violations.is_empty(), "{:?}", checker.violations);
}

/// P2: cloning a program yields a structurally identical, independently
/// owned tree (deep-copy semantics via `#[derive(Clone)]`).
#[test]
fn cloning_a_program_is_a_deep_independent_copy() {
    let program = parse("echo a b c\n");
    let mut cloned = program.clone();

    let AndOrList::Pipeline(pipeline) = &mut cloned.body.items[0].0 else {
        panic!("expected a plain pipeline")
    };
    let Command::Simple { words, .. } = &mut pipeline.commands[0] else {
        panic!("expected a simple command")
    };
    words.push(Word::empty());

    let Command::Simple {
        words: original_words,
        ..
    } = only_command(&program)
    else {
        panic!("expected a simple command")
    };
    assert_eq!(
        original_words.len(),
        3,
        "mutating the clone must not affect the original"
    );
}

#[test]
fn round_trip_reparses_to_an_equivalent_tree() {
    let program = parse("echo hello world\n");
    let text = program.to_string();
    let reparsed = parse(&format!("{text}\n"));

    let Command::Simple { words: original, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let Command::Simple {
        words: roundtripped,
        ..
    } = only_command(&reparsed)
    else {
        panic!("expected a simple command")
    };
    let originals: Vec<_> = original.iter().map(|w| w.as_literal().unwrap()).collect();
    let roundtripped: Vec<_> = roundtripped
        .iter()
        .map(|w| w.as_literal().unwrap())
        .collect();
    assert_eq!(originals, roundtripped);
}

#[test]
fn background_separator_is_preserved() {
    let program = parse("sleep 1 &\n");
    assert_eq!(program.body.items[0].1, Separator::Background);
}

#[test]
fn explicit_file_descriptor_is_captured_as_io_number() {
    let program = parse("cmd 2>&1\n");
    let Command::Simple { io_redirects, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert_eq!(io_redirects.len(), 1);
    assert_eq!(io_redirects[0].io_number, Some(2));
    assert_eq!(io_redirects[0].target.as_literal(), Some("1"));
}

#[test]
fn digits_not_touching_a_redirect_operator_stay_an_ordinary_word() {
    let program = parse("echo 2 1\n");
    let Command::Simple { words, io_redirects, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert!(io_redirects.is_empty());
    let literals: Vec<_> = words.iter().map(|w| w.as_literal().unwrap()).collect();
    assert_eq!(literals, vec!["echo", "2", "1"]);
}

#[test]
fn command_substitution_with_a_quoted_parenthesis_finds_the_real_close() {
    let program = parse("echo $(echo \")\")\n");
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert_eq!(words.len(), 2);
    let WordPart::Command { program: inner, back_quoted, .. } = &words[1].parts[0] else {
        panic!("expected a command substitution word part")
    };
    assert!(!back_quoted);
    let Command::Simple { words: inner_words, .. } = nth_command(inner, 0) else {
        panic!("expected a simple command inside the substitution")
    };
    assert_eq!(inner_words[0].as_literal(), Some("echo"));
    assert_eq!(inner_words[1].as_literal(), Some(")"));
}

#[test]
fn nested_command_substitution_parses_both_levels() {
    let program = parse("echo $(echo $(echo inner))\n");
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let WordPart::Command { program: outer, .. } = &words[1].parts[0] else {
        panic!("expected a command substitution word part")
    };
    let Command::Simple { words: outer_words, .. } = nth_command(outer, 0) else {
        panic!("expected a simple command")
    };
    let WordPart::Command { program: inner, .. } = &outer_words[1].parts[0] else {
        panic!("expected a nested command substitution word part")
    };
    let Command::Simple { words: inner_words, .. } = nth_command(inner, 0) else {
        panic!("expected a simple command")
    };
    assert_eq!(inner_words[1].as_literal(), Some("inner"));
}

#[test]
fn backquoted_substitution_keeps_backslash_before_an_unescapable_char() {
    let program = parse("echo `echo \\x`\n");
    let Command::Simple { words, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let WordPart::Command { program: inner, back_quoted, .. } = &words[1].parts[0] else {
        panic!("expected a command substitution word part")
    };
    assert!(back_quoted);
    let Command::Simple { words: inner_words, .. } = nth_command(inner, 0) else {
        panic!("expected a simple command")
    };
    assert_eq!(inner_words[1].as_literal(), Some("\\x"));
}

#[test]
fn multiple_here_documents_on_one_command_resolve_in_declaration_order() {
    let program = parse("cat <<A <<B\nfirst\nA\nsecond\nB\n");
    let Command::Simple { io_redirects, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    assert_eq!(io_redirects.len(), 2);
    assert_eq!(
        io_redirects[0].here_doc_body.as_ref().unwrap().as_literal(),
        Some("first\n")
    );
    assert_eq!(
        io_redirects[1].here_doc_body.as_ref().unwrap().as_literal(),
        Some("second\n")
    );
}

#[test]
fn quoted_here_doc_delimiter_suppresses_expansion_in_the_body() {
    let program = parse("cat <<'EOF'\n$literal `not a command` \\n\nEOF\n");
    let Command::Simple { io_redirects, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let body = io_redirects[0].here_doc_body.as_ref().unwrap();
    assert_eq!(body.parts.len(), 1);
    assert_eq!(
        body.as_literal(),
        Some("$literal `not a command` \\n\n")
    );
}

#[test]
fn unquoted_here_doc_delimiter_expands_parameters_in_the_body() {
    let program = parse("cat <<EOF\nhello $name\nEOF\n");
    let Command::Simple { io_redirects, .. } = only_command(&program) else {
        panic!("expected a simple command")
    };
    let body = io_redirects[0].here_doc_body.as_ref().unwrap();
    assert!(body.parts.iter().any(|part| matches!(
        part,
        WordPart::Parameter(expansion) if expansion.name == "name"
    )));
}
