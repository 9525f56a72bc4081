//! Nullability and FIRST-set analysis over the definition item tree.
//!
//! An item is nullable when its multiplicity is `?` or `*`, when it is an optional group, or
//! when it is a sequential/alternative group all of whose items are nullable. FIRST sets walk
//! the same tree and bottom out at token, group and literal leaves, so the generated `is_*`
//! look-aheads never have to call `match_*`.

use crate::{DiagnosticSink, FirstElem, Grammar, GroupTag, Item, ItemBase, RefTarget, Rule};
use std::collections::HashSet;

pub fn rule_nullable(grammar: &Grammar, rule: &Rule) -> bool {
    obtain_rule_nullable(grammar, rule, &mut Vec::new())
}

pub fn item_nullable(grammar: &Grammar, item: &Item) -> bool {
    obtain_item_nullable(grammar, item, &mut Vec::new())
}

fn obtain_rule_nullable<'g>(
    grammar: &'g Grammar,
    rule: &'g Rule,
    visiting: &mut Vec<&'g str>,
) -> bool {
    if let Some(nullable) = rule.nullable.get() {
        return *nullable;
    }
    // A cycle cannot make a rule nullable on its own; the recursion is cut here and the
    // left-recursion check reports the cycle separately.
    if visiting.iter().any(|name| *name == rule.name) {
        return false;
    }
    visiting.push(&rule.name);
    let nullable = rule.definitions.iter().any(|definition| {
        definition
            .items
            .iter()
            .all(|item| obtain_item_nullable(grammar, item, visiting))
    });
    visiting.pop();
    let _ = rule.nullable.set(nullable);
    nullable
}

fn obtain_item_nullable<'g>(
    grammar: &'g Grammar,
    item: &'g Item,
    visiting: &mut Vec<&'g str>,
) -> bool {
    if item.multiplicity.is_optional() {
        return true;
    }
    match &item.base {
        ItemBase::Literal { .. } => false,
        ItemBase::Reference { name, target } => match target.get() {
            Some(RefTarget::Rule) => match grammar.rule(name) {
                Some(rule) => obtain_rule_nullable(grammar, rule, visiting),
                None => false,
            },
            _ => false,
        },
        ItemBase::Group(group) => match group.tag {
            GroupTag::Optional => true,
            GroupTag::Sequential | GroupTag::Alternative => group
                .items
                .iter()
                .all(|inner| obtain_item_nullable(grammar, inner, visiting)),
        },
    }
}

// ---------------------------------------------------------------------- FIRST sets

pub fn rule_first<'g>(grammar: &'g Grammar, rule: &'g Rule) -> Vec<FirstElem> {
    obtain_rule_first(grammar, rule, &mut Vec::new())
}

/// FIRST of an item sequence: each item contributes until the first non-nullable one.
pub fn items_first<'g>(grammar: &'g Grammar, items: &'g [Item]) -> Vec<FirstElem> {
    let mut set = Vec::new();
    collect_items_first(grammar, items, &mut Vec::new(), &mut set);
    set
}

pub fn item_first<'g>(grammar: &'g Grammar, item: &'g Item) -> Vec<FirstElem> {
    let mut set = Vec::new();
    collect_item_first(grammar, item, &mut Vec::new(), &mut set);
    set
}

fn obtain_rule_first<'g>(
    grammar: &'g Grammar,
    rule: &'g Rule,
    visiting: &mut Vec<&'g str>,
) -> Vec<FirstElem> {
    if let Some(first) = rule.first.get() {
        return first.clone();
    }
    if visiting.iter().any(|name| *name == rule.name) {
        return Vec::new();
    }
    visiting.push(&rule.name);
    let mut set = Vec::new();
    for definition in &rule.definitions {
        collect_items_first(grammar, &definition.items, visiting, &mut set);
    }
    visiting.pop();
    let _ = rule.first.set(set.clone());
    set
}

fn collect_items_first<'g>(
    grammar: &'g Grammar,
    items: &'g [Item],
    visiting: &mut Vec<&'g str>,
    set: &mut Vec<FirstElem>,
) {
    for item in items {
        collect_item_first(grammar, item, visiting, set);
        if !obtain_item_nullable(grammar, item, &mut Vec::new()) {
            break;
        }
    }
}

fn collect_item_first<'g>(
    grammar: &'g Grammar,
    item: &'g Item,
    visiting: &mut Vec<&'g str>,
    set: &mut Vec<FirstElem>,
) {
    match &item.base {
        ItemBase::Literal { index, .. } => push_unique(set, FirstElem::Literal(*index)),
        ItemBase::Reference { name, target } => match target.get() {
            Some(RefTarget::Token) => push_unique(set, FirstElem::Token(name.clone())),
            Some(RefTarget::Group) => push_unique(set, FirstElem::Group(name.clone())),
            Some(RefTarget::Rule) => {
                if let Some(rule) = grammar.rule(name) {
                    for element in obtain_rule_first(grammar, rule, visiting) {
                        push_unique(set, element);
                    }
                }
            }
            None => {}
        },
        ItemBase::Group(group) => match group.tag {
            GroupTag::Sequential | GroupTag::Optional => {
                collect_items_first(grammar, &group.items, visiting, set)
            }
            GroupTag::Alternative => {
                for inner in &group.items {
                    collect_item_first(grammar, inner, visiting, set);
                }
            }
        },
    }
}

fn push_unique(set: &mut Vec<FirstElem>, element: FirstElem) {
    if !set.contains(&element) {
        set.push(element);
    }
}

// ---------------------------------------------------------------------- left recursion

/// Report every rule whose look-ahead would recurse into itself before consuming a token.
pub(crate) fn check_left_recursion(grammar: &Grammar, sink: &mut DiagnosticSink) {
    let mut safe: HashSet<String> = HashSet::new();
    let mut reported: HashSet<String> = HashSet::new();
    for rule in &grammar.rules {
        let mut stack = Vec::new();
        walk_leading(grammar, rule, &mut stack, &mut safe, &mut reported, sink);
    }
}

fn walk_leading<'g>(
    grammar: &'g Grammar,
    rule: &'g Rule,
    stack: &mut Vec<&'g str>,
    safe: &mut HashSet<String>,
    reported: &mut HashSet<String>,
    sink: &mut DiagnosticSink,
) {
    if safe.contains(&rule.name) {
        return;
    }
    if stack.iter().any(|name| *name == rule.name) {
        if reported.insert(rule.name.clone()) {
            sink.error(
                format!(
                    "Rule {} is left-recursive ({} -> {}).",
                    rule.name,
                    stack.join(" -> "),
                    rule.name
                ),
                Some(rule.position),
            );
        }
        return;
    }
    stack.push(&rule.name);
    let mut leading = Vec::new();
    for definition in &rule.definitions {
        collect_leading_rules(grammar, &definition.items, &mut leading);
    }
    for name in leading {
        if let Some(next) = grammar.rule(name) {
            walk_leading(grammar, next, stack, safe, reported, sink);
        }
    }
    stack.pop();
    safe.insert(rule.name.clone());
}

/// Rule references reachable at the first consuming position of an item sequence.
fn collect_leading_rules<'g>(grammar: &'g Grammar, items: &'g [Item], out: &mut Vec<&'g str>) {
    for item in items {
        match &item.base {
            ItemBase::Reference { name, target } => {
                if target.get() == Some(&RefTarget::Rule) {
                    out.push(name);
                }
            }
            ItemBase::Group(group) => match group.tag {
                GroupTag::Sequential | GroupTag::Optional => {
                    collect_leading_rules(grammar, &group.items, out)
                }
                GroupTag::Alternative => {
                    for inner in &group.items {
                        collect_leading_rules(grammar, std::slice::from_ref(inner), out);
                    }
                }
            },
            ItemBase::Literal { .. } => {}
        }
        if !item_nullable(grammar, item) {
            break;
        }
    }
}

// ---------------------------------------------------------------------- group diagnostics

/// Doubtful groups (every item independently optional) and uncertain groups (a sequential
/// group led by an optional inline group) are legal but ambiguous; both are warnings.
pub(crate) fn check_group_shapes(grammar: &Grammar, sink: &mut DiagnosticSink) {
    for rule in &grammar.rules {
        for definition in &rule.definitions {
            for item in &definition.items {
                walk_group_shape(grammar, &rule.name, item, sink);
            }
        }
    }
}

fn walk_group_shape(grammar: &Grammar, rule_name: &str, item: &Item, sink: &mut DiagnosticSink) {
    if let ItemBase::Group(group) = &item.base {
        if group.tag != GroupTag::Optional
            && group
                .items
                .iter()
                .all(|inner| item_nullable(grammar, inner))
        {
            sink.warning(
                format!(
                    "Doubtful group in rule {}: every item is independently optional.",
                    rule_name
                ),
                Some(item.position),
            );
        }
        if group.tag == GroupTag::Sequential {
            if let Some(first) = group.items.first() {
                if matches!(first.base, ItemBase::Group(_)) && item_nullable(grammar, first) {
                    sink.warning(
                        format!(
                            "Uncertain group in rule {}: its first item is an optional group.",
                            rule_name
                        ),
                        Some(item.position),
                    );
                }
            }
        }
        for inner in &group.items {
            walk_group_shape(grammar, rule_name, inner, sink);
        }
    }
}
