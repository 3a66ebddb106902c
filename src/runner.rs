//! Whole-pipeline entry points: scan → parse → resolve → interpret.
//!
//! The driver and the test-suite both go through [`run_source`]; a REPL keeps
//! one [`Interpreter`] across calls so earlier globals stay visible.

use std::fmt;
use std::io::Write;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit status for command-line usage errors.
pub const EXIT_USAGE: i32 = 64;
/// Exit status when scanning, parsing or resolving reported diagnostics.
pub const EXIT_DATA: i32 = 65;
/// Exit status for an uncaught runtime error.
pub const EXIT_SOFTWARE: i32 = 70;

/// Why a run did not complete.
#[derive(Debug)]
pub enum Failure {
    /// Scan, parse or resolve diagnostics; nothing was executed.
    Static(Vec<LoxError>),
    /// Execution stopped at this error.
    Runtime(LoxError),
}

impl Failure {
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Static(_) => EXIT_DATA,
            Failure::Runtime(_) => EXIT_SOFTWARE,
        }
    }

    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            Failure::Static(errors) => errors.iter().collect(),
            Failure::Runtime(error) => vec![error],
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.diagnostics().iter().map(|e| e.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Scans and parses `source`, reporting lexical and syntax errors together.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, mut errors) = Scanner::new(source).scan_tokens();

    // Parse even a failed scan so syntax errors surface in the same run.
    match Parser::new(tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(errors)
        }
    }
}

/// Runs `source` on `interpreter`.  Resolution must succeed before anything
/// executes.
pub fn run_source<W: Write>(interpreter: &mut Interpreter<W>, source: &str) -> Result<(), Failure> {
    let statements: Vec<Stmt> = parse_source(source).map_err(Failure::Static)?;

    debug!("Parsed {} statement(s)", statements.len());

    Resolver::new(interpreter)
        .resolve(&statements)
        .map_err(Failure::Static)?;

    interpreter.interpret(&statements).map_err(Failure::Runtime)?;

    info!("Run completed");
    Ok(())
}
