//! Grammar generation tool (gram_gen) is a library to compile a grammar description written in
//! an EBNF-like dialect into a stand-alone recursive descent top down parser.
//! The emitted parser reads source text conforming to the described grammar and produces an
//! Abstract Syntax Tree serialized as JSON.
//!
//! # Overview
//! A language parser is usually developed either by writing custom code by hand or using a
//! parser generator tool.
//! This library takes the generator route: the grammar for the language is written in a small
//! Domain Specific Language, and the tool compiles that grammar into parser source code for the
//! target runtime.
//! The grammar dialect supports regular-expression tokens, token groups, keyword exclusions,
//! optional/sequential/alternative inline groups, and a capture notation which shapes the
//! emitted AST directly from the production rules.
//!
//! # Design
//!
//! Compilation runs in strictly sequential phases.
//! The [GrammarLexer](lexeme::GrammarLexer) splits the description into lexemes,
//! the [GrammarParser](parsing::GrammarParser) builds the in-memory [Grammar] model,
//! the [Resolver](resolver::Resolver) binds names, expands token references, aligns capture
//! shapes and reports semantic diagnostics, and the [Generator] lowers the validated model into
//! a single parser source file.
//! Diagnostics flow through a leveled [DiagnosticSink]; a pass which records any `error`
//! finishes enumerating its batch and then aborts the pipeline.
//!
//! # Example
//!
//! ```
//! use gram_gen::{Code, Generator, Verbosity};
//!
//! let grammar = r#"
//! .token
//!     WS      `\s+`       @skip
//!     INT     `[0-9]+`
//! .end
//! .rules
//!     Number: = INT => v ;
//! .end
//! "#;
//!
//! let generator = Generator::new(Verbosity::Warning);
//! let parser_source = generator.compile(&Code::from(grammar)).unwrap();
//! assert!(parser_source.contains("fn match_number"));
//! ```

mod model;
mod sink;
mod util;
pub mod generate;
pub mod lexeme;
pub mod parsing;
pub mod resolver;

#[cfg(test)]
mod __tests__;

use once_cell::unsync::OnceCell;

pub use model::GrammarTree;
pub use util::{Code, Position, Verbosity};

/// A single leveled message recorded during grammar compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Verbosity,
    pub message: String,
    pub position: Option<Position>,
}

/// Collector for [Diagnostic] messages, batched per compilation pass.
///
/// Messages admitted by the configured verbosity are printed to stderr as they are recorded;
/// every message is retained for later inspection. Errors are fatal for the owning pass but do
/// not interrupt it, so that all independent errors of one pass surface together.
pub struct DiagnosticSink {
    verbosity: Verbosity,
    entries: Vec<Diagnostic>,
    pass_errors: usize,
}

/// The compilation pass a [GrammarError] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Lexical,
    Syntax,
    Resolution,
    Generation,
}

/// An error returned when a compilation pass recorded one or more fatal diagnostics.
#[derive(Debug)]
pub struct GrammarError {
    pub pass: Pass,
    pub count: usize,
}

/// Multiplicity marker carried by every rule [Item].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

/// Token decorators accepted after a token entry's regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decorator {
    Skip,
    Internal,
    Expand,
    RelFilePath,
    AbsFilePath,
    RelDirPath,
    AbsDirPath,
    EnsureRelative,
    EnsureAbsolute,
    LoadAndParse,
    /// `@1`..`@9`: regex capture group whose text becomes the token value.
    GroupIndex(u8),
}

/// Valued rule attributes written inside an `@{ … }` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Key,
    Flip,
    Scope,
    Declare,
    Verbosity,
    Classify,
    Reclassify,
    Retroclassify,
}

/// Unvalued rule directives written inside an `@{ … }` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Merge,
}

/// A terminal definition: an uppercase name bound to a regular expression.
#[derive(Debug, Clone)]
pub struct Token {
    pub name: String,
    pub pattern: String,
    pub decorators: Vec<Decorator>,
    /// Names of [TokenGroup]s whose members must not match as this token.
    pub exclusions: Vec<String>,
    pub classification: OnceCell<String>,
    pub position: Position,
    /// Pattern after `@expand` substitution; set by the resolver for every token.
    pub expanded: OnceCell<String>,
}

/// An ordered set of literal member patterns sharing one uppercase name.
///
/// Groups serve two purposes: they can be matched as rule items, and they can be referenced
/// from a token entry with `^NAME` to exclude their members from that token.
#[derive(Debug, Clone)]
pub struct TokenGroup {
    pub name: String,
    pub members: Vec<String>,
    pub position: Position,
}

/// What a name reference inside a rule resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Token,
    Group,
    Rule,
}

/// The base of a rule [Item], before its multiplicity marker.
#[derive(Debug, Clone)]
pub enum ItemBase {
    /// A reference to a token, token group or rule; bound by the resolver.
    Reference {
        name: String,
        target: OnceCell<RefTarget>,
    },
    /// An inline regex fragment, interned into the grammar's literal table.
    Literal { text: String, index: usize },
    Group(InlineGroup),
}

/// One element of a definition, carrying its multiplicity.
#[derive(Debug, Clone)]
pub struct Item {
    pub base: ItemBase,
    pub multiplicity: Multiplicity,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTag {
    /// `[ … ]`; implicitly zero-or-one, hard commitment past the first item.
    Optional,
    /// `( … )` with a required trailing multiplicity.
    Sequential,
    /// `( … | … )` with a required trailing multiplicity; each branch is one item.
    Alternative,
}

/// An inline group item: groups stay structural nodes of the definition tree rather than
/// desugaring to synthetic rules, so capture shapes can be checked against them directly.
#[derive(Debug, Clone)]
pub struct InlineGroup {
    pub tag: GroupTag,
    pub items: Vec<Item>,
}

/// A named (or ignored) binding from a matched item into the enclosing AST node.
#[derive(Debug, Clone)]
pub enum Capture {
    Binding(CaptureBinding),
    /// Parenthesized sublist mirroring an inline group at the same item position.
    Group(Vec<Capture>, Position),
}

#[derive(Debug, Clone)]
pub struct CaptureBinding {
    /// `None` for the ignore marker `_`.
    pub name: Option<String>,
    /// `*name`: append to a list field instead of assigning.
    pub list: bool,
    /// `name.field`: project a field from the matched sub-node.
    pub field: Option<String>,
    pub position: Position,
}

/// One alternative of a rule: an item sequence plus the optional `=>` capture tail.
#[derive(Debug, Clone)]
pub struct Definition {
    pub items: Vec<Item>,
    pub captures: Option<Vec<Capture>>,
    pub position: Position,
}

/// A production rule with a strict PascalCase name.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub attributes: Vec<AttributeUse>,
    pub directives: Vec<Directive>,
    pub definitions: Vec<Definition>,
    pub position: Position,
    /// Nullability of the whole rule; computed by the resolver.
    pub nullable: OnceCell<bool>,
    /// FIRST set over token patterns; computed by the resolver.
    pub first: OnceCell<Vec<FirstElem>>,
}

/// One attribute occurrence with its argument.
#[derive(Debug, Clone)]
pub struct AttributeUse {
    pub attribute: Attribute,
    pub value: String,
    pub position: Position,
}

/// Element of a FIRST set: the look-ahead alternatives a rule may begin with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FirstElem {
    Token(String),
    Group(String),
    Literal(usize),
}

/// The in-memory grammar model: everything the grammar description declares, in declaration
/// order, plus the interned literal table shared by all rules.
pub struct Grammar {
    pub tokens: Vec<Token>,
    pub groups: Vec<TokenGroup>,
    pub rules: Vec<Rule>,
    /// Distinct inline literal patterns, in first-use order.
    pub literals: Vec<String>,
    /// Default start rule from the grammar-level `@{start:Name}` block.
    pub start: Option<String>,
}

/// Compiles a grammar description into parser source text.
///
/// The generator owns the pipeline: lexing, parsing, resolution and code emission, wired
/// through one [DiagnosticSink].
pub struct Generator {
    verbosity: Verbosity,
}
