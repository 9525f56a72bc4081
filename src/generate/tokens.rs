//! Emission of the token tables and the per-token / per-group helpers.
//!
//! `@internal` tokens exist only as expansion sources and are left out of the emitted table.
//! Exclusion lists become per-token sets of group indices whose members are rejected as exact
//! matches of the matched text.

use crate::model::snake_name;
use crate::{Decorator, DiagnosticSink, Grammar, Token};
use std::fmt::{self, Write};

pub(super) fn emit_tables(
    out: &mut String,
    grammar: &Grammar,
    sink: &mut DiagnosticSink,
) -> fmt::Result {
    out.push_str(super::runtime::TABLE_TYPES);

    let emitted: Vec<&Token> = grammar.tokens.iter().filter(|t| !t.is_internal()).collect();

    writeln!(out, "\nstatic TOKENS: &[TokenSpec] = &[")?;
    for token in &emitted {
        let class = match token.classification.get() {
            Some(tag) => format!("Some({:?})", tag),
            None => "None".to_string(),
        };
        let path = match path_rule(token, sink) {
            Some(rule) => format!("Some({})", rule),
            None => "None".to_string(),
        };
        writeln!(
            out,
            "    TokenSpec {{ name: {:?}, pattern: {:?}, group: {}, skip: {}, class: {}, load: {}, path: {} }},",
            token.name,
            token.expanded_pattern(),
            token.group_index(),
            token.is_skip(),
            class,
            token.has_decorator(Decorator::LoadAndParse),
            path,
        )?;
    }
    writeln!(out, "];\n")?;
    for (index, token) in emitted.iter().enumerate() {
        writeln!(out, "const T_{}: usize = {};", token.name, index)?;
    }

    writeln!(out, "\nstatic GROUPS: &[(&str, &[&str])] = &[")?;
    for group in &grammar.groups {
        write!(out, "    ({:?}, &[", group.name)?;
        for (index, member) in group.members.iter().enumerate() {
            if index != 0 {
                write!(out, ", ")?;
            }
            write!(out, "{:?}", member)?;
        }
        writeln!(out, "]),")?;
    }
    writeln!(out, "];\n")?;
    for (index, group) in grammar.groups.iter().enumerate() {
        writeln!(out, "const G_{}: usize = {};", group.name, index)?;
    }

    writeln!(out, "\nstatic EXCLUSIONS: &[&[usize]] = &[")?;
    for token in &emitted {
        write!(out, "    &[")?;
        for (index, exclusion) in token.exclusions.iter().enumerate() {
            if index != 0 {
                write!(out, ", ")?;
            }
            let group = grammar
                .groups
                .iter()
                .position(|g| &g.name == exclusion)
                .unwrap_or(0);
            write!(out, "{}", group)?;
        }
        writeln!(out, "],")?;
    }
    writeln!(out, "];\n")?;

    writeln!(out, "static LITERALS: &[&str] = &[")?;
    for literal in &grammar.literals {
        writeln!(out, "    {:?},", literal)?;
    }
    writeln!(out, "];\n")?;

    match &grammar.start {
        Some(start) => writeln!(out, "const DEFAULT_START: Option<&str> = Some({:?});", start)?,
        None => writeln!(out, "const DEFAULT_START: Option<&str> = None;")?,
    }
    Ok(())
}

fn path_rule(token: &Token, sink: &mut DiagnosticSink) -> Option<&'static str> {
    let mut rules = token.decorators.iter().filter_map(|decorator| match decorator {
        Decorator::RelFilePath => Some("PathRule::RelFile"),
        Decorator::AbsFilePath => Some("PathRule::AbsFile"),
        Decorator::RelDirPath => Some("PathRule::RelDir"),
        Decorator::AbsDirPath => Some("PathRule::AbsDir"),
        Decorator::EnsureRelative => Some("PathRule::EnsureRel"),
        Decorator::EnsureAbsolute => Some("PathRule::EnsureAbs"),
        _ => None,
    });
    let first = rules.next();
    if rules.next().is_some() {
        sink.warning(
            format!(
                "Token {} carries several path decorators; only the first applies.",
                token.name
            ),
            Some(token.position),
        );
    }
    first
}

pub(super) fn emit_helpers(out: &mut String, grammar: &Grammar) -> fmt::Result {
    writeln!(
        out,
        "\n// ---- token helpers ----------------------------------------------------\n"
    )?;
    writeln!(out, "impl Parser {{")?;
    for token in grammar.tokens.iter().filter(|t| !t.is_internal()) {
        let snake = snake_name(&token.name);
        writeln!(out, "    fn is_{}(&mut self) -> bool {{", snake)?;
        writeln!(out, "        self.is_token(T_{})", token.name)?;
        writeln!(out, "    }}\n")?;
        writeln!(out, "    fn match_{}(&mut self) -> Option<Value> {{", snake)?;
        writeln!(out, "        self.match_token(T_{})", token.name)?;
        writeln!(out, "    }}\n")?;
        writeln!(out, "    fn expect_{}(&mut self) -> Value {{", snake)?;
        writeln!(out, "        self.expect_token(T_{})", token.name)?;
        writeln!(out, "    }}\n")?;
    }
    for group in &grammar.groups {
        let snake = snake_name(&group.name);
        writeln!(out, "    fn is_{}(&mut self) -> bool {{", snake)?;
        writeln!(out, "        self.is_group(G_{})", group.name)?;
        writeln!(out, "    }}\n")?;
        writeln!(out, "    fn match_{}(&mut self) -> Option<Value> {{", snake)?;
        writeln!(out, "        self.match_group(G_{})", group.name)?;
        writeln!(out, "    }}\n")?;
        writeln!(out, "    fn expect_{}(&mut self) -> Value {{", snake)?;
        writeln!(out, "        self.expect_group(G_{})", group.name)?;
        writeln!(out, "    }}\n")?;
    }
    writeln!(out, "}}")?;
    Ok(())
}
