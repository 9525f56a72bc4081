use crate::{Diagnostic, DiagnosticSink, GrammarError, Pass, Position, Verbosity};
use std::fmt::{Display, Formatter};

impl Display for Pass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Pass::Lexical => "lexical",
            Pass::Syntax => "syntax",
            Pass::Resolution => "resolution",
            Pass::Generation => "generation",
        };
        write!(f, "{}", name)
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GrammarError: {} error(s) reported in the {} pass",
            self.count, self.pass
        )
    }
}

impl std::error::Error for GrammarError {}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(p) => write!(f, "[{}] {} @ {}", self.level, self.message, p),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

impl DiagnosticSink {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            entries: Vec::new(),
            pass_errors: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Record a message. Admitted levels are printed to stderr immediately; every message is
    /// retained regardless of verbosity.
    pub fn report(&mut self, level: Verbosity, message: String, position: Option<Position>) {
        let diagnostic = Diagnostic {
            level,
            message,
            position,
        };
        if self.verbosity.admits(level) {
            eprintln!("{}", diagnostic);
        }
        if level == Verbosity::Error {
            self.pass_errors += 1;
        }
        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, message: String, position: Option<Position>) {
        self.report(Verbosity::Error, message, position);
    }

    pub fn warning(&mut self, message: String, position: Option<Position>) {
        self.report(Verbosity::Warning, message, position);
    }

    pub fn success(&mut self, message: String) {
        self.report(Verbosity::Success, message, None);
    }

    pub fn info(&mut self, message: String) {
        self.report(Verbosity::Info, message, None);
    }

    pub fn debug1(&mut self, message: String) {
        self.report(Verbosity::Debug1, message, None);
    }

    pub fn debug2(&mut self, message: String) {
        self.report(Verbosity::Debug2, message, None);
    }

    pub fn debug3(&mut self, message: String) {
        self.report(Verbosity::Debug3, message, None);
    }

    /// Close the current pass batch. Returns an error carrying the batch's error count when the
    /// pass recorded any fatal diagnostic, so the pipeline halts only after the whole pass has
    /// surfaced its batch.
    pub fn end_pass(&mut self, pass: Pass) -> Result<(), GrammarError> {
        let count = self.pass_errors;
        self.pass_errors = 0;
        if count > 0 {
            Err(GrammarError { pass, count })
        } else {
            Ok(())
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.level == Verbosity::Error)
    }

    /// Messages of one level, in recording order.
    pub fn entries_of(&self, level: Verbosity) -> Vec<&Diagnostic> {
        self.entries.iter().filter(|d| d.level == level).collect()
    }
}
