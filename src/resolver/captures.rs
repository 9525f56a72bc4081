//! Capture-shape alignment.
//!
//! The capture list of a definition mirrors its item tree: every inline group corresponds to a
//! parenthesized sublist at the same position, `_` ignores its item, `*name` requires a
//! repeatable item or enclosing group, and a dotted `name.field` requires the referenced
//! sub-node to provide the field (`value` is guaranteed on token, group and literal matches).

use crate::{
    Attribute, Capture, CaptureBinding, DiagnosticSink, Directive, Grammar, Item, ItemBase,
    RefTarget, Rule,
};

pub(crate) fn align_captures(grammar: &Grammar, sink: &mut DiagnosticSink) {
    for rule in &grammar.rules {
        for definition in &rule.definitions {
            if let Some(captures) = &definition.captures {
                align_list(grammar, rule, &definition.items, captures, false, sink);
            }
        }
    }
}

fn align_list(
    grammar: &Grammar,
    rule: &Rule,
    items: &[Item],
    captures: &[Capture],
    repeatable: bool,
    sink: &mut DiagnosticSink,
) {
    if captures.len() > items.len() {
        let position = match &captures[items.len()] {
            Capture::Binding(binding) => binding.position,
            Capture::Group(_, position) => *position,
        };
        sink.error(
            format!(
                "Rule {} captures {} values for {} items.",
                rule.name,
                captures.len(),
                items.len()
            ),
            Some(position),
        );
    }
    for (item, capture) in items.iter().zip(captures.iter()) {
        align_one(grammar, rule, item, capture, repeatable, sink);
    }
    // Trailing uncaptured items are fine.
}

fn align_one(
    grammar: &Grammar,
    rule: &Rule,
    item: &Item,
    capture: &Capture,
    repeatable: bool,
    sink: &mut DiagnosticSink,
) {
    let repeatable = repeatable || item.multiplicity.is_repeatable();
    match capture {
        Capture::Group(sublist, position) => match &item.base {
            ItemBase::Group(group) => {
                align_list(grammar, rule, &group.items, sublist, repeatable, sink)
            }
            _ => sink.error(
                format!(
                    "Capture sublist in rule {} does not correspond to an inline group.",
                    rule.name
                ),
                Some(*position),
            ),
        },
        Capture::Binding(binding) => align_binding(grammar, rule, item, binding, repeatable, sink),
    }
}

fn align_binding(
    grammar: &Grammar,
    rule: &Rule,
    item: &Item,
    binding: &CaptureBinding,
    repeatable: bool,
    sink: &mut DiagnosticSink,
) {
    let name = match &binding.name {
        Some(name) => name,
        // '_' ignores its item whatever its shape.
        None => return,
    };
    if matches!(item.base, ItemBase::Group(_)) {
        sink.error(
            format!(
                "Capture '{}' in rule {} binds an inline group; use a parenthesized sublist.",
                name, rule.name
            ),
            Some(binding.position),
        );
        return;
    }
    if binding.list && !repeatable {
        sink.error(
            format!(
                "Capture '*{}' in rule {} requires a repeatable item or enclosing group.",
                name, rule.name
            ),
            Some(binding.position),
        );
    }
    if binding.list {
        if let ItemBase::Reference { name: target_name, target } = &item.base {
            let merges = target.get() == Some(&RefTarget::Rule)
                && grammar
                    .rule(target_name)
                    .map_or(false, |referenced| referenced.has_directive(Directive::Merge));
            if merges {
                sink.error(
                    format!(
                        "Capture '*{}' in rule {}: merge rule {} cannot accumulate into a list.",
                        name, rule.name, target_name
                    ),
                    Some(binding.position),
                );
            }
        }
    }
    let field = match &binding.field {
        Some(field) => field,
        None => return,
    };
    match &item.base {
        ItemBase::Literal { .. } => check_value_field(rule, name, field, binding, sink),
        ItemBase::Reference { name: target_name, target } => match target.get() {
            Some(RefTarget::Token) | Some(RefTarget::Group) => {
                check_value_field(rule, name, field, binding, sink)
            }
            Some(RefTarget::Rule) => {
                let referenced = match grammar.rule(target_name) {
                    Some(referenced) => referenced,
                    None => return,
                };
                match rule_field_presence(referenced, field) {
                    FieldPresence::Present => {}
                    FieldPresence::Uncertain => sink.warning(
                        format!(
                            "Capture '{}.{}' in rule {}: field '{}' of {} cannot be checked statically.",
                            name, field, rule.name, field, referenced.name
                        ),
                        Some(binding.position),
                    ),
                    FieldPresence::Absent => sink.error(
                        format!(
                            "Capture '{}.{}' in rule {}: no definition of {} provides field '{}'.",
                            name, field, rule.name, referenced.name, field
                        ),
                        Some(binding.position),
                    ),
                }
            }
            None => {}
        },
        ItemBase::Group(_) => {}
    }
}

fn check_value_field(
    rule: &Rule,
    name: &str,
    field: &str,
    binding: &CaptureBinding,
    sink: &mut DiagnosticSink,
) {
    if field != "value" {
        sink.error(
            format!(
                "Capture '{}.{}' in rule {}: a token match provides only the 'value' field.",
                name, field, rule.name
            ),
            Some(binding.position),
        );
    }
}

pub enum FieldPresence {
    Present,
    Uncertain,
    Absent,
}

/// Whether a rule's node is statically known to carry a field. A rule whose node shape is
/// dynamic (merge, key, flip, or a pass-through definition) can never be checked statically.
pub fn rule_field_presence(rule: &Rule, field: &str) -> FieldPresence {
    if rule
        .attribute(Attribute::Scope)
        .map_or(false, |a| a.value == field)
    {
        return FieldPresence::Present;
    }
    let mut dynamic = rule.has_directive(Directive::Merge)
        || rule.attribute(Attribute::Key).is_some()
        || rule.attribute(Attribute::Flip).is_some();
    let mut in_all = true;
    let mut in_any = false;
    for definition in &rule.definitions {
        match &definition.captures {
            None => {
                if definition.is_pass_through() {
                    dynamic = true;
                }
                in_all = false;
            }
            Some(captures) => {
                let mut names = Vec::new();
                collect_binding_names(captures, &mut names);
                if names.iter().any(|n| *n == field) {
                    in_any = true;
                } else {
                    in_all = false;
                }
            }
        }
    }
    if in_any && in_all {
        FieldPresence::Present
    } else if in_any || dynamic {
        FieldPresence::Uncertain
    } else {
        FieldPresence::Absent
    }
}

/// Binding names at any depth; nested sublists assign into the same rule node.
pub(crate) fn collect_binding_names<'c>(captures: &'c [Capture], out: &mut Vec<&'c str>) {
    for capture in captures {
        match capture {
            Capture::Binding(binding) => {
                if let Some(name) = &binding.name {
                    out.push(name);
                }
            }
            Capture::Group(sublist, _) => collect_binding_names(sublist, out),
        }
    }
}
