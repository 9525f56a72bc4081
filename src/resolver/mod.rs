//! Name resolution and semantic validation of the grammar model.
//!
//! Four passes run in order: name binding, `@expand` token expansion, capture-shape alignment,
//! and the semantic checks (attribute compatibility, reference restrictions, regex validation,
//! left recursion, doubtful/uncertain groups). Each pass batches its diagnostics; the first
//! pass that records an error aborts the pipeline after completing its batch.

mod captures;
mod expansion;
pub mod nullability;

#[cfg(test)]
mod __tests__;

use crate::model::snake_name;
use crate::{
    Attribute, Decorator, DiagnosticSink, Grammar, GrammarError, Item, ItemBase, Pass, RefTarget,
    Rule, Verbosity,
};
use regex::Regex;
use std::collections::HashSet;
use std::str::FromStr;

pub use captures::{rule_field_presence, FieldPresence};
pub use nullability::{item_first, item_nullable, items_first, rule_first, rule_nullable};

pub struct Resolver<'g> {
    grammar: &'g Grammar,
}

impl<'g> Resolver<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    pub fn resolve(&self, sink: &mut DiagnosticSink) -> Result<(), GrammarError> {
        self.bind_names(sink);
        sink.end_pass(Pass::Resolution)?;
        expansion::expand_tokens(self.grammar, sink);
        sink.end_pass(Pass::Resolution)?;
        captures::align_captures(self.grammar, sink);
        sink.end_pass(Pass::Resolution)?;
        self.check_semantics(sink);
        sink.end_pass(Pass::Resolution)?;
        sink.debug1(format!(
            "Resolved {} tokens, {} groups, {} rules.",
            self.grammar.tokens.len(),
            self.grammar.groups.len(),
            self.grammar.rules.len()
        ));
        Ok(())
    }

    // -------------------------------------------------------------- pass 1: binding

    fn bind_names(&self, sink: &mut DiagnosticSink) {
        for rule in &self.grammar.rules {
            for definition in &rule.definitions {
                for item in &definition.items {
                    self.bind_item(rule, item, sink);
                }
            }
        }
        for token in &self.grammar.tokens {
            for exclusion in &token.exclusions {
                if self.grammar.group(exclusion).is_none() {
                    sink.error(
                        format!(
                            "Exclusion '^{}' on token {} does not name a token group.",
                            exclusion, token.name
                        ),
                        Some(token.position),
                    );
                }
            }
        }
        if let Some(start) = &self.grammar.start {
            if self.grammar.rule(start).is_none() {
                sink.error(format!("Start rule {} is not defined.", start), None);
            }
        }
    }

    fn bind_item(&self, rule: &Rule, item: &Item, sink: &mut DiagnosticSink) {
        match &item.base {
            ItemBase::Reference { name, target } => match self.grammar.resolve_name(name) {
                Some(resolved) => {
                    let _ = target.set(resolved);
                }
                None => sink.error(
                    format!("Reference to undefined name '{}' in rule {}.", name, rule.name),
                    Some(item.position),
                ),
            },
            ItemBase::Group(group) => {
                for inner in &group.items {
                    self.bind_item(rule, inner, sink);
                }
            }
            ItemBase::Literal { .. } => {}
        }
    }

    // -------------------------------------------------------------- pass 4: semantics

    fn check_semantics(&self, sink: &mut DiagnosticSink) {
        self.check_token_patterns(sink);
        self.check_helper_collisions(sink);
        for rule in &self.grammar.rules {
            self.check_rule_attributes(rule, sink);
            for definition in &rule.definitions {
                for item in &definition.items {
                    self.check_item_references(rule, item, sink);
                }
            }
        }
        self.check_scope_declare(sink);
        self.annotate_classifications();
        nullability::check_left_recursion(self.grammar, sink);
        nullability::check_group_shapes(self.grammar, sink);
    }

    /// Every expanded token pattern, group member and inline literal must compile; token
    /// patterns must not match the empty string, and `@N` must name an existing capture group.
    fn check_token_patterns(&self, sink: &mut DiagnosticSink) {
        for token in &self.grammar.tokens {
            match Regex::new(&format!("^(?:{})", token.expanded_pattern())) {
                Ok(regex) => {
                    if regex.is_match("") {
                        sink.error(
                            format!("Token {}'s regex must not match the empty string.", token.name),
                            Some(token.position),
                        );
                    }
                    let index = token.group_index() as usize;
                    if index >= regex.captures_len() {
                        sink.error(
                            format!(
                                "Token {}'s group index @{} exceeds its {} capture group(s).",
                                token.name,
                                index,
                                regex.captures_len() - 1
                            ),
                            Some(token.position),
                        );
                    }
                }
                Err(err) => sink.error(
                    format!("Token {}'s regex fails to compile: {}", token.name, err),
                    Some(token.position),
                ),
            }
            if token.has_decorator(Decorator::LoadAndParse) && self.grammar.start.is_none() {
                sink.error(
                    format!(
                        "Token {} is @loadandparse but the grammar declares no start rule.",
                        token.name
                    ),
                    Some(token.position),
                );
            }
        }
        for group in &self.grammar.groups {
            for member in &group.members {
                if let Err(err) = Regex::new(&format!("^(?:{})$", member)) {
                    sink.error(
                        format!("Group {}'s member regex fails to compile: {}", group.name, err),
                        Some(group.position),
                    );
                }
            }
        }
        for literal in &self.grammar.literals {
            if let Err(err) = Regex::new(&format!("^(?:{})", literal)) {
                sink.error(format!("Inline literal `{}` fails to compile: {}", literal, err), None);
            }
        }
    }

    /// Emitted helper names share one namespace: a token `RGB` and a rule `Rgb` would both
    /// produce `match_rgb`.
    fn check_helper_collisions(&self, sink: &mut DiagnosticSink) {
        let mut taken: HashSet<String> = HashSet::new();
        for token in &self.grammar.tokens {
            taken.insert(snake_name(&token.name));
        }
        for group in &self.grammar.groups {
            taken.insert(snake_name(&group.name));
        }
        for rule in &self.grammar.rules {
            if !taken.insert(snake_name(&rule.name)) {
                sink.error(
                    format!(
                        "Rule {} collides with another definition on the emitted helper name '{}'.",
                        rule.name,
                        snake_name(&rule.name)
                    ),
                    Some(rule.position),
                );
            }
        }
    }

    fn check_rule_attributes(&self, rule: &Rule, sink: &mut DiagnosticSink) {
        let key = rule.attribute(Attribute::Key);
        let flip = rule.attribute(Attribute::Flip);
        let merge = rule.has_directive(crate::Directive::Merge);

        if let Some(flip) = flip {
            if key.is_none() {
                sink.error(
                    format!("Rule {}: flip:{} requires key on the same rule.", rule.name, flip.value),
                    Some(flip.position),
                );
            }
            if !self.captured_somewhere(rule, &flip.value) {
                sink.warning(
                    format!("Rule {}: no definition captures flip target '{}'.", rule.name, flip.value),
                    Some(flip.position),
                );
            }
        }
        if let Some(key) = key {
            if !self.captured_somewhere(rule, &key.value) {
                sink.error(
                    format!("Rule {}: no definition captures key '{}'.", rule.name, key.value),
                    Some(key.position),
                );
            }
        }
        if merge && (key.is_some() || flip.is_some()) {
            sink.error(
                format!("Rule {}: merge cannot be combined with key or flip.", rule.name),
                Some(rule.position),
            );
        }
        if let Some(verbosity) = rule.attribute(Attribute::Verbosity) {
            if Verbosity::from_str(&verbosity.value).is_err() {
                sink.error(
                    format!(
                        "Rule {}: '{}' is not a verbosity level.",
                        rule.name, verbosity.value
                    ),
                    Some(verbosity.position),
                );
            }
        }
        if let Some(declare) = rule.attribute(Attribute::Declare) {
            if !self.captured_somewhere(rule, &declare.value) {
                sink.warning(
                    format!(
                        "Rule {}: declare:{} names a field no definition captures.",
                        rule.name, declare.value
                    ),
                    Some(declare.position),
                );
            }
        }
    }

    fn captured_somewhere(&self, rule: &Rule, field: &str) -> bool {
        rule.definitions.iter().any(|definition| {
            definition.captures.as_ref().map_or(false, |captures| {
                let mut names = Vec::new();
                captures::collect_binding_names(captures, &mut names);
                names.iter().any(|name| *name == field)
            })
        })
    }

    fn check_item_references(&self, rule: &Rule, item: &Item, sink: &mut DiagnosticSink) {
        match &item.base {
            ItemBase::Reference { name, target } => {
                if target.get() == Some(&RefTarget::Token) {
                    if let Some(token) = self.grammar.token(name) {
                        if token.is_internal() {
                            sink.error(
                                format!(
                                    "@internal token {} may not appear as an item in rule {}.",
                                    name, rule.name
                                ),
                                Some(item.position),
                            );
                        }
                        if token.is_skip() {
                            sink.error(
                                format!(
                                    "@skip token {} may not be referenced in rule {}.",
                                    name, rule.name
                                ),
                                Some(item.position),
                            );
                        }
                    }
                }
            }
            ItemBase::Group(group) => {
                for inner in &group.items {
                    self.check_item_references(rule, inner, sink);
                }
            }
            ItemBase::Literal { .. } => {}
        }
    }

    /// `scope:S` with no declare in any reachable descendant, and `declare:N` with no
    /// enclosing scope rule, are both suspicious but harmless.
    fn check_scope_declare(&self, sink: &mut DiagnosticSink) {
        for rule in &self.grammar.rules {
            if let Some(scope) = rule.attribute(Attribute::Scope) {
                let reachable = self.reachable_rules(rule);
                let declared = reachable.iter().any(|name| {
                    self.grammar
                        .rule(name)
                        .map_or(false, |r| r.attribute(Attribute::Declare).is_some())
                });
                if !declared {
                    sink.warning(
                        format!(
                            "Rule {}: scope:{} has no declare in any reachable rule.",
                            rule.name, scope.value
                        ),
                        Some(scope.position),
                    );
                }
            }
        }
        for rule in &self.grammar.rules {
            if let Some(declare) = rule.attribute(Attribute::Declare) {
                let enclosed = self.grammar.rules.iter().any(|outer| {
                    outer.attribute(Attribute::Scope).is_some()
                        && self.reachable_rules(outer).contains(rule.name.as_str())
                });
                if !enclosed {
                    sink.warning(
                        format!(
                            "Rule {}: declare:{} is outside any enclosing scope.",
                            rule.name, declare.value
                        ),
                        Some(declare.position),
                    );
                }
            }
        }
    }

    /// Strict descendants of a rule in the rule-reference graph.
    fn reachable_rules(&self, rule: &Rule) -> HashSet<&'g str> {
        let mut reachable: HashSet<&'g str> = HashSet::new();
        let mut queue: Vec<&'g str> = Vec::new();
        if let Some(rule) = self.grammar.rule(&rule.name) {
            collect_rule_references(rule, &mut queue);
        }
        while let Some(name) = queue.pop() {
            if reachable.insert(name) {
                if let Some(next) = self.grammar.rule(name) {
                    collect_rule_references(next, &mut queue);
                }
            }
        }
        reachable
    }

    /// A rule carrying `classify:C` whose definition is a single token reference pins the
    /// classification onto that token; everything else is tagged dynamically at parse time.
    fn annotate_classifications(&self) {
        for rule in &self.grammar.rules {
            let classify = match rule.attribute(Attribute::Classify) {
                Some(attribute) => attribute,
                None => continue,
            };
            for definition in &rule.definitions {
                if definition.items.len() != 1 {
                    continue;
                }
                if let ItemBase::Reference { name, target } = &definition.items[0].base {
                    if target.get() == Some(&RefTarget::Token) {
                        if let Some(token) = self.grammar.token(name) {
                            let _ = token.classification.set(classify.value.clone());
                        }
                    }
                }
            }
        }
    }
}

fn collect_rule_references<'g>(rule: &'g Rule, out: &mut Vec<&'g str>) {
    fn walk<'g>(item: &'g Item, out: &mut Vec<&'g str>) {
        match &item.base {
            ItemBase::Reference { name, target } => {
                if target.get() == Some(&RefTarget::Rule) {
                    out.push(name);
                }
            }
            ItemBase::Group(group) => {
                for inner in &group.items {
                    walk(inner, out);
                }
            }
            ItemBase::Literal { .. } => {}
        }
    }
    for definition in &rule.definitions {
        for item in &definition.items {
            walk(item, out);
        }
    }
}
