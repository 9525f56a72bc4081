//! Lowering of the validated grammar model into parser source text.
//!
//! The [Generator] owns the whole pipeline: lexing and parsing the grammar description,
//! resolution, and emission of the stand-alone parser file. Emission writes into a [String]
//! through [std::fmt::Write], section by section: header, token tables, fixed runtime,
//! token helpers, rule helpers and the entry point.

mod rules;
mod runtime;
mod tokens;

#[cfg(test)]
mod __tests__;

use crate::lexeme::GrammarLexer;
use crate::model::snake_name;
use crate::parsing::GrammarParser;
use crate::resolver::Resolver;
use crate::{Code, DiagnosticSink, Generator, Grammar, GrammarError, Pass, Verbosity};
use std::fmt::{self, Write};

impl Generator {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Compile a grammar description into the source text of a stand-alone parser.
    pub fn compile(&self, code: &Code) -> Result<String, GrammarError> {
        let mut sink = DiagnosticSink::new(self.verbosity);
        self.compile_with_sink(code, &mut sink)
    }

    /// As [compile](Self::compile), reporting through a caller-owned sink.
    pub fn compile_with_sink(
        &self,
        code: &Code,
        sink: &mut DiagnosticSink,
    ) -> Result<String, GrammarError> {
        let lexemes = GrammarLexer::new(code).tokenize(sink);
        sink.end_pass(Pass::Lexical)?;
        let grammar = GrammarParser::new(lexemes).parse(sink);
        sink.end_pass(Pass::Syntax)?;
        Resolver::new(&grammar).resolve(sink)?;
        if sink.verbosity().admits(Verbosity::Debug2) {
            let _ = grammar.print();
        }
        let source = match emit(&grammar, sink) {
            Ok(source) => source,
            Err(err) => {
                sink.error(format!("Failed to write parser source: {}", err), None);
                String::new()
            }
        };
        sink.end_pass(Pass::Generation)?;
        sink.success(format!(
            "Generated a parser for {} rule(s) over {} token(s).",
            grammar.rules.len(),
            grammar.tokens.len()
        ));
        Ok(source)
    }
}

/// Assemble the emitted parser file for a resolved grammar.
pub fn emit(grammar: &Grammar, sink: &mut DiagnosticSink) -> Result<String, fmt::Error> {
    let mut out = String::new();
    emit_header(&mut out, grammar)?;
    tokens::emit_tables(&mut out, grammar, sink)?;
    out.push_str(runtime::RUNTIME);
    tokens::emit_helpers(&mut out, grammar)?;
    rules::emit_rules(&mut out, grammar, sink)?;
    emit_entry(&mut out, grammar)?;
    Ok(out)
}

fn emit_header(out: &mut String, grammar: &Grammar) -> fmt::Result {
    writeln!(
        out,
        "// Generated by gram-gen {}. Do not edit.",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(
        out,
        "// Stand-alone recursive descent parser: {} token(s), {} group(s), {} rule(s).",
        grammar.tokens.len(),
        grammar.groups.len(),
        grammar.rules.len()
    )?;
    writeln!(out, "// External crates required:")?;
    writeln!(out, "//     regex = \"1\"")?;
    writeln!(out, "//     serde_json = \"1\"")?;
    writeln!(out, "#![allow(dead_code, unused_mut, unused_variables)]")?;
    writeln!(out)?;
    writeln!(out, "use regex::Regex;")?;
    writeln!(out, "use serde_json::{{json, Map, Value}};")?;
    writeln!(out, "use std::env;")?;
    writeln!(out, "use std::fs;")?;
    writeln!(out, "use std::path::PathBuf;")?;
    writeln!(out, "use std::process;")?;
    Ok(())
}

fn emit_entry(out: &mut String, grammar: &Grammar) -> fmt::Result {
    out.push_str(runtime::ENTRY_HEAD);
    for rule in &grammar.rules {
        writeln!(
            out,
            "        {:?} => parser.match_{}(),",
            rule.name,
            snake_name(&rule.name)
        )?;
    }
    out.push_str(runtime::ENTRY_TAIL);
    Ok(())
}
