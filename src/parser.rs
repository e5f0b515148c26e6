//! Turns script text into statements and function blocks.
//!
//! Scripts are line oriented:
//!
//! ```text
//! # comment
//! box 2 4 5
//! fn pillar height
//!   box 1 8 1
//!   translate 3 0 0
//! pillar
//! ```
//!
//! Indentation is measured in units of two spaces and only means something
//! directly below a `fn` line. Function bodies cannot nest.

use crate::error::{Result, ScriptError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 2;

/// One command invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub command: String,
    pub args: Vec<String>,
    /// 1-based source line.
    pub line: usize,
}

/// A named block of statements defined with `fn`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBlock {
    pub name: String,
    /// Declared parameter names. They are recorded but not bound when called.
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    /// Line of the `fn` header.
    pub line: usize,
}

/// A parsed script: top-level statements plus every function it defines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub functions: HashMap<String, FunctionBlock>,
}

/// Returns true for tokens shaped like `[a-z][a-z0-9]*`.
pub fn is_command_token(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

struct Line<'a> {
    level: usize,
    command: &'a str,
    args: Vec<String>,
}

fn split_line(text: &str, line: usize) -> Result<Line<'_>> {
    let body = text.trim_start_matches(' ');
    let indent = text.len() - body.len();

    if body.starts_with(char::is_whitespace) {
        return Err(ScriptError::syntax(line, "Invalid indent (use spaces, not tabs)."));
    }
    if indent % INDENT_WIDTH != 0 {
        return Err(ScriptError::syntax(
            line,
            format!("Invalid indent (not multiple of {INDENT_WIDTH})."),
        ));
    }

    let mut tokens = body.split_whitespace();
    let command = tokens.next().unwrap_or_default();
    if !is_command_token(command) {
        return Err(ScriptError::syntax(line, format!("I don't understand \"{body}\".")));
    }

    Ok(Line {
        level: indent / INDENT_WIDTH,
        command,
        args: tokens.map(str::to_string).collect(),
    })
}

/// Parses a whole script.
pub fn parse(source: &str) -> Result<Program> {
    let mut program = Program::default();
    let mut current: Option<FunctionBlock> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim_end();
        let trimmed = text.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Line {
            level,
            command,
            args,
        } = split_line(text, line)?;

        match (level, current.is_some()) {
            (0, _) => {
                if let Some(function) = current.take() {
                    define(&mut program, function);
                }
            }
            (1, true) => {}
            (1, false) => {
                return Err(ScriptError::syntax(line, "Indent changed, but not in function."));
            }
            _ => {
                return Err(ScriptError::syntax(
                    line,
                    "Nested indentation is not supported; function bodies use exactly one level.",
                ));
            }
        }

        if command == "fn" {
            if level > 0 {
                return Err(ScriptError::syntax(line, "Functions cannot be defined inside functions."));
            }
            let mut args = args.into_iter();
            let name = match args.next() {
                Some(name) if is_command_token(&name) && name != "fn" => name,
                Some(name) => {
                    return Err(ScriptError::syntax(line, format!("\"{name}\" is not a valid function name.")));
                }
                None => return Err(ScriptError::syntax(line, "fn needs a name, e.g. fn pillar height")),
            };
            current = Some(FunctionBlock {
                name,
                params: args.collect(),
                body: Vec::new(),
                line,
            });
            continue;
        }

        let statement = Statement {
            command: command.to_string(),
            args,
            line,
        };
        match current.as_mut() {
            Some(function) => function.body.push(statement),
            None => program.statements.push(statement),
        }
    }

    if let Some(function) = current {
        define(&mut program, function);
    }

    Ok(program)
}

fn define(program: &mut Program, function: FunctionBlock) {
    if let Some(previous) = program.functions.get(&function.name) {
        warn!(
            name = %function.name,
            first = previous.line,
            again = function.line,
            "function redefined; the later definition wins"
        );
    }
    program.functions.insert(function.name.clone(), function);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn skips_blank_lines_and_comments() {
        let program = parse("\n# a comment\n   # indented comment\nbox 1 2 3\n\n").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement {
                command: "box".into(),
                args: vec!["1".into(), "2".into(), "3".into()],
                line: 4,
            }]
        );
    }

    #[test]
    fn commands_without_arguments_have_none() {
        let program = parse("reset   \n").unwrap();
        assert!(program.statements[0].args.is_empty());
    }

    #[test]
    fn odd_indent_is_rejected() {
        for script in ["fn a\n box 1 1 1", "fn a\n   box 1 1 1"] {
            let err = parse(script).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax);
            assert_eq!(err.line(), 2);
        }
    }

    #[test]
    fn function_body_then_top_level() {
        let program = parse("fn box2 w\n  box 2 2 2\n  translate 3 0 0\nbox2\nbox2\n").unwrap();

        let function = &program.functions["box2"];
        assert_eq!(function.params, vec!["w".to_string()]);
        assert_eq!(function.body.len(), 2);
        assert_eq!(function.body[1].line, 3);

        assert_eq!(program.statements.len(), 2);
        assert!(program.statements.iter().all(|s| s.command == "box2"));
        assert_eq!(program.statements[0].line, 4);
    }

    #[test]
    fn consecutive_functions_and_empty_bodies() {
        let program = parse("fn empty\nfn one\n  reset\n").unwrap();
        assert!(program.functions["empty"].body.is_empty());
        assert_eq!(program.functions["one"].body.len(), 1);
        assert!(program.statements.is_empty());
    }

    #[test]
    fn indent_outside_function_is_rejected() {
        let err = parse("box 1 1 1\n  box 1 1 1").unwrap_err();
        assert_eq!(err.to_string(), "[Line 2]: Indent changed, but not in function.");
    }

    #[test]
    fn deeper_nesting_is_rejected() {
        let err = parse("fn a\n  reset\n    reset").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for script in ["Box 1 2 3", "box,1", "1box", "\tbox 1 1 1", "fn", "fn Big"] {
            let err = parse(script).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "{script:?}");
        }
    }

    #[test]
    fn later_definition_wins() {
        let program = parse("fn a\n  reset\nfn a\n  reset\n  reset\n").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions["a"].body.len(), 2);
    }
}
