//! Compiler front-end and code emitter for the Algolang pedagogical
//! algorithmic language. See `SPEC_FULL.md` for the full repository
//! specification and `DESIGN.md` for the grounding ledger.
#![allow(clippy::only_used_in_recursion)]

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod emitter;
pub mod lexer;
pub mod parser;
pub mod source_buffer;

use ast::Program;
use diagnostics::DiagnosticSink;

/// The full pipeline from source text to either emitted output or a
/// non-empty diagnostic sink, matching `spec.md` §7's "emission is
/// skipped whenever the sink is non-empty at the end of analysis" rule.
pub struct CompileOutput {
    pub program: Option<Program>,
    pub diagnostics: DiagnosticSink,
    /// `Some` only when the sink is empty at the end of analysis.
    pub emitted: Option<String>,
    /// Byte offsets of double-minus numeric literal folds (`spec.md`
    /// §9(a)), populated only when `config.warn_double_minus` is set.
    /// Never a diagnostic: the quirk is intentional and never blocks
    /// compilation.
    pub double_minus_warnings: Vec<usize>,
}

/// Runs the lexer, parser, and analyzer over `source`, then the emitter
/// if (and only if) no diagnostic was produced. `source` must already
/// end with a newline (`spec.md` §6, (B1)); the driver pads this before
/// calling in.
pub fn compile(source: &str, config: &config::CompilerConfig) -> CompileOutput {
    let buf = source_buffer::SourceBuffer::new(source);

    let mut lexer = lexer::Lexer::new(buf.text());
    let tokens = match lexer.tokenize() {
        Ok(tokens) => tokens,
        Err(illegal) => {
            let mut sink = DiagnosticSink::new();
            sink.push(diagnostics::Diagnostic::syntax(
                diagnostics::ErrorKind::IllegalCharacter { ch: illegal.ch },
                illegal.offset,
            ));
            return CompileOutput {
                program: None,
                diagnostics: sink,
                emitted: None,
                double_minus_warnings: Vec::new(),
            };
        }
    };
    let double_minus_warnings = if config.warn_double_minus {
        lexer.double_minus_sites().to_vec()
    } else {
        Vec::new()
    };

    let parse_out = parser::Parser::new(tokens).parse();
    let mut program = match parse_out.program {
        Some(p) => p,
        None => {
            return CompileOutput {
                program: None,
                diagnostics: parse_out.diagnostics,
                emitted: None,
                double_minus_warnings,
            }
        }
    };
    let mut sink = parse_out.diagnostics;

    let (vars, analysis_diags) = analyzer::Analyzer::analyze(&mut program);
    for d in analysis_diags.into_vec() {
        sink.push(d);
    }

    let emitted = if sink.is_empty() {
        Some(emitter::emit(&program, &vars, config))
    } else {
        None
    };

    CompileOutput {
        program: Some(program),
        diagnostics: sink,
        emitted,
        double_minus_warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_program_emits_and_has_no_diagnostics() {
        let out = compile(
            "Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- 1\nFinAlgo\n",
            &config::CompilerConfig::default(),
        );
        assert!(out.diagnostics.is_empty());
        assert!(out.emitted.is_some());
    }

    #[test]
    fn program_with_errors_emits_nothing() {
        let out = compile(
            "Algorithme A\nInstructions:\n  x <-- 1\nFinAlgo\n",
            &config::CompilerConfig::default(),
        );
        assert!(!out.diagnostics.is_empty());
        assert!(out.emitted.is_none());
    }

    #[test]
    fn double_minus_literal_is_reported_as_a_warning_not_a_diagnostic() {
        let out = compile(
            "Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- --3\nFinAlgo\n",
            &config::CompilerConfig::default(),
        );
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.double_minus_warnings.len(), 1);
    }

    #[test]
    fn double_minus_warning_is_suppressed_when_disabled_in_config() {
        let mut config = config::CompilerConfig::default();
        config.warn_double_minus = false;
        let out = compile(
            "Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- --3\nFinAlgo\n",
            &config,
        );
        assert!(out.double_minus_warnings.is_empty());
    }

    #[test]
    fn illegal_character_is_fatal_and_short_circuits_the_pipeline() {
        let out = compile("Algorithme A\n$\n", &config::CompilerConfig::default());
        assert!(out.program.is_none());
        assert!(out.emitted.is_none());
        assert_eq!(out.diagnostics.len(), 1);
    }
}
