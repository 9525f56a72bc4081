//! Emission of the per-rule helpers.
//!
//! Each rule becomes an `is_` look-ahead built solely from its FIRST set, a `match_` function
//! that selects a definition by look-ahead and then commits to it, and (when any definition
//! assembles a node) a `finish_` function carrying the attribute and directive lowering.
//!
//! Multiplicity lowering: `X?` is `if is_x { … }`, `X*` a `while` loop, `X+` one required
//! match followed by the loop, and `[ … ]` commits hard after its first item. Failures past a
//! committed point are fatal, so `match_` either consumes a whole definition or nothing.

use crate::model::{snake_name, upper_snake_name};
use crate::resolver::{item_first, item_nullable, items_first, rule_first};
use crate::{
    Attribute, Capture, CaptureBinding, Definition, DiagnosticSink, Directive, FirstElem, Grammar,
    GroupTag, InlineGroup, Item, ItemBase, Multiplicity, RefTarget, Rule, Verbosity,
};
use std::fmt::{self, Write};
use std::str::FromStr;

pub(super) fn emit_rules(
    out: &mut String,
    grammar: &Grammar,
    sink: &mut DiagnosticSink,
) -> fmt::Result {
    writeln!(
        out,
        "\n// ---- rule helpers -----------------------------------------------------\n"
    )?;
    writeln!(out, "impl Parser {{")?;
    for rule in &grammar.rules {
        emit_rule(out, grammar, rule, sink)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn emit_rule(
    out: &mut String,
    grammar: &Grammar,
    rule: &Rule,
    sink: &mut DiagnosticSink,
) -> fmt::Result {
    let snake = snake_name(&rule.name);

    let first = rule_first(grammar, rule);
    if first.is_empty() {
        sink.warning(
            format!("Rule {} has an empty look-ahead set.", rule.name),
            Some(rule.position),
        );
    }
    writeln!(out, "    fn is_{}(&mut self) -> bool {{", snake)?;
    writeln!(out, "        {}", predicate(&first))?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    fn match_{}(&mut self) -> Option<Value> {{", snake)?;
    for definition in &rule.definitions {
        emit_definition(out, grammar, rule, definition)?;
    }
    writeln!(out, "        None")?;
    writeln!(out, "    }}\n")?;

    if rule
        .definitions
        .iter()
        .any(|definition| builds_node(rule, definition))
    {
        emit_finish(out, rule)?;
    }
    Ok(())
}

/// A pass-through definition returns its single sub-match unwrapped; everything else builds a
/// fresh `{kind, lc}` node.
fn builds_node(rule: &Rule, definition: &Definition) -> bool {
    !(definition.is_pass_through() && rule.attributes.is_empty())
}

fn predicate(first: &[FirstElem]) -> String {
    if first.is_empty() {
        return "false".to_string();
    }
    first
        .iter()
        .map(|element| match element {
            FirstElem::Token(name) | FirstElem::Group(name) => {
                format!("self.is_{}()", snake_name(name))
            }
            FirstElem::Literal(index) => format!("self.is_lit({})", index),
        })
        .collect::<Vec<String>>()
        .join(" || ")
}

fn emit_definition(
    out: &mut String,
    grammar: &Grammar,
    rule: &Rule,
    definition: &Definition,
) -> fmt::Result {
    // A definition all of whose items are nullable can always be entered.
    let guard = if definition
        .items
        .iter()
        .all(|item| item_nullable(grammar, item))
    {
        "true".to_string()
    } else {
        predicate(&items_first(grammar, &definition.items))
    };
    writeln!(out, "        if {} {{", guard)?;
    writeln!(out, "            self.skip();")?;

    if !builds_node(rule, definition) {
        emit_pass_through(out, &definition.items[0])?;
    } else {
        let snake = snake_name(&rule.name);
        let kind = upper_snake_name(&rule.name);
        writeln!(out, "            let mut node = self.new_node({:?});", kind)?;
        writeln!(out, "            let mark = self.classes.len();")?;
        if rule.attribute(Attribute::Scope).is_some() {
            writeln!(out, "            self.push_scope();")?;
        }
        if let Some(verbosity) = rule.attribute(Attribute::Verbosity) {
            let order = Verbosity::from_str(&verbosity.value)
                .map(|level| level.order())
                .unwrap_or(0);
            writeln!(out, "            self.push_verbosity({});", order)?;
        }
        if let Some(classify) = rule.attribute(Attribute::Classify) {
            writeln!(out, "            self.push_class({:?});", classify.value)?;
        }
        if let Some(retro) = rule.attribute(Attribute::Retroclassify) {
            writeln!(out, "            self.retro_class({:?});", retro.value)?;
        }
        let mut emitter = Emitter {
            grammar,
            kind,
            var: 0,
        };
        emitter.items(
            out,
            &definition.items,
            definition.captures.as_deref(),
            3,
        )?;
        writeln!(
            out,
            "            return Some(self.finish_{}(node, mark));",
            snake
        )?;
    }
    writeln!(out, "        }}")?;
    Ok(())
}

fn emit_pass_through(out: &mut String, item: &Item) -> fmt::Result {
    match &item.base {
        ItemBase::Literal { index, .. } => {
            writeln!(out, "            return Some(self.expect_lit({}));", index)
        }
        ItemBase::Reference { name, target } => match target.get() {
            Some(RefTarget::Rule) => {
                let snake = snake_name(name);
                writeln!(
                    out,
                    "            let value = match self.match_{}() {{",
                    snake
                )?;
                writeln!(out, "                Some(value) => value,")?;
                writeln!(
                    out,
                    "                None => self.fail(\"Expected {}.\".to_string()),",
                    name
                )?;
                writeln!(out, "            }};")?;
                writeln!(out, "            return Some(value);")
            }
            _ => writeln!(
                out,
                "            return Some(self.expect_{}());",
                snake_name(name)
            ),
        },
        ItemBase::Group(_) => Ok(()),
    }
}

struct Emitter<'g> {
    grammar: &'g Grammar,
    /// `kind` tag of the enclosing rule's node; also seeds per-iteration merge elements.
    kind: String,
    var: usize,
}

fn pad(depth: usize) -> String {
    "    ".repeat(depth)
}

impl<'g> Emitter<'g> {
    fn fresh(&mut self) -> String {
        let var = format!("v{}", self.var);
        self.var += 1;
        var
    }

    fn items(
        &mut self,
        out: &mut String,
        items: &[Item],
        captures: Option<&[Capture]>,
        depth: usize,
    ) -> fmt::Result {
        for (index, item) in items.iter().enumerate() {
            let capture = captures.and_then(|list| list.get(index));
            self.item(out, item, capture, depth)?;
        }
        Ok(())
    }

    fn item(
        &mut self,
        out: &mut String,
        item: &Item,
        capture: Option<&Capture>,
        depth: usize,
    ) -> fmt::Result {
        match item.multiplicity {
            Multiplicity::One => self.required(out, item, capture, depth),
            Multiplicity::ZeroOrOne => {
                writeln!(out, "{}if {} {{", pad(depth), self.pred(item))?;
                self.required(out, item, capture, depth + 1)?;
                writeln!(out, "{}}}", pad(depth))
            }
            Multiplicity::ZeroOrMore => {
                writeln!(out, "{}while {} {{", pad(depth), self.pred(item))?;
                self.required(out, item, capture, depth + 1)?;
                writeln!(out, "{}}}", pad(depth))
            }
            Multiplicity::OneOrMore => {
                self.required(out, item, capture, depth)?;
                writeln!(out, "{}while {} {{", pad(depth), self.pred(item))?;
                self.required(out, item, capture, depth + 1)?;
                writeln!(out, "{}}}", pad(depth))
            }
        }
    }

    /// The look-ahead guard for one item; constant-time and side-effect free.
    fn pred(&self, item: &Item) -> String {
        match &item.base {
            ItemBase::Reference { name, target } => match target.get() {
                Some(_) => format!("self.is_{}()", snake_name(name)),
                None => "false".to_string(),
            },
            ItemBase::Literal { index, .. } => format!("self.is_lit({})", index),
            ItemBase::Group(_) => predicate(&item_first(self.grammar, item)),
        }
    }

    /// Emit a committed match of the item: failure is fatal, not a backtrack.
    fn required(
        &mut self,
        out: &mut String,
        item: &Item,
        capture: Option<&Capture>,
        depth: usize,
    ) -> fmt::Result {
        if let ItemBase::Group(group) = &item.base {
            let sublist = match capture {
                Some(Capture::Group(list, _)) => Some(list.as_slice()),
                _ => None,
            };
            return self.group_body(out, group, sublist, depth);
        }

        let binding = match capture {
            Some(Capture::Binding(binding)) if binding.name.is_some() => Some(binding),
            _ => None,
        };
        match binding {
            None => self.required_dropped(out, item, depth),
            Some(binding) => self.required_captured(out, item, binding, depth),
        }
    }

    fn required_dropped(&mut self, out: &mut String, item: &Item, depth: usize) -> fmt::Result {
        match &item.base {
            ItemBase::Literal { index, .. } => {
                writeln!(out, "{}self.expect_lit({});", pad(depth), index)
            }
            ItemBase::Reference { name, target } => match target.get() {
                Some(RefTarget::Rule) => {
                    let snake = snake_name(name);
                    writeln!(
                        out,
                        "{}if self.match_{}().is_none() {{",
                        pad(depth),
                        snake
                    )?;
                    writeln!(
                        out,
                        "{}    self.fail(\"Expected {}.\".to_string());",
                        pad(depth),
                        name
                    )?;
                    writeln!(out, "{}}}", pad(depth))
                }
                _ => writeln!(out, "{}self.expect_{}();", pad(depth), snake_name(name)),
            },
            ItemBase::Group(_) => Ok(()),
        }
    }

    fn required_captured(
        &mut self,
        out: &mut String,
        item: &Item,
        binding: &CaptureBinding,
        depth: usize,
    ) -> fmt::Result {
        if matches!(item.base, ItemBase::Group(_)) {
            return Ok(());
        }
        let name = binding.name.as_deref().unwrap_or("_");
        let merges = self.merges(item) && binding.field.is_none();

        // A list capture of a merge rule folds each sub-match into a fresh per-iteration
        // node and appends that; the enclosing node keeps its own kind and fields.
        if merges && binding.list {
            let element = self.fresh();
            writeln!(out, "{}self.skip();", pad(depth))?;
            writeln!(
                out,
                "{}let mut {} = self.new_node({:?});",
                pad(depth),
                element,
                self.kind
            )?;
            let var = self.emit_match(out, item, depth)?;
            writeln!(
                out,
                "{}self.merge_into(&mut {}, {}, Some(\"value\"));",
                pad(depth),
                element,
                var
            )?;
            return writeln!(
                out,
                "{}push_field(&mut node, {:?}, {});",
                pad(depth),
                name,
                element
            );
        }

        let var = self.emit_match(out, item, depth)?;
        if merges {
            return writeln!(
                out,
                "{}self.merge_into(&mut node, {}, Some({:?}));",
                pad(depth),
                var,
                name
            );
        }
        if let Some(field) = &binding.field {
            writeln!(
                out,
                "{}let {} = self.project({}, {:?});",
                pad(depth),
                var,
                var,
                field
            )?;
        }
        if binding.list {
            writeln!(
                out,
                "{}push_field(&mut node, {:?}, {});",
                pad(depth),
                name,
                var
            )
        } else {
            writeln!(
                out,
                "{}set_field(&mut node, {:?}, {});",
                pad(depth),
                name,
                var
            )
        }
    }

    /// Emit the committed match of a non-group item into a fresh variable.
    fn emit_match(
        &mut self,
        out: &mut String,
        item: &Item,
        depth: usize,
    ) -> Result<String, fmt::Error> {
        let var = self.fresh();
        match &item.base {
            ItemBase::Literal { index, .. } => {
                writeln!(
                    out,
                    "{}let {} = self.expect_lit({});",
                    pad(depth),
                    var,
                    index
                )?;
            }
            ItemBase::Reference { name: target_name, target } => match target.get() {
                Some(RefTarget::Rule) => {
                    let snake = snake_name(target_name);
                    writeln!(
                        out,
                        "{}let {} = match self.match_{}() {{",
                        pad(depth),
                        var,
                        snake
                    )?;
                    writeln!(out, "{}    Some(value) => value,", pad(depth))?;
                    writeln!(
                        out,
                        "{}    None => self.fail(\"Expected {}.\".to_string()),",
                        pad(depth),
                        target_name
                    )?;
                    writeln!(out, "{}}};", pad(depth))?;
                }
                _ => {
                    writeln!(
                        out,
                        "{}let {} = self.expect_{}();",
                        pad(depth),
                        var,
                        snake_name(target_name)
                    )?;
                }
            },
            ItemBase::Group(_) => {}
        }
        Ok(var)
    }

    /// Whether the item is a reference to a rule carrying the merge directive.
    fn merges(&self, item: &Item) -> bool {
        if let ItemBase::Reference { name, target } = &item.base {
            if target.get() == Some(&RefTarget::Rule) {
                return self
                    .grammar
                    .rule(name)
                    .map_or(false, |rule| rule.has_directive(Directive::Merge));
            }
        }
        false
    }

    fn group_body(
        &mut self,
        out: &mut String,
        group: &InlineGroup,
        captures: Option<&[Capture]>,
        depth: usize,
    ) -> fmt::Result {
        match group.tag {
            // Hard commitment: once the first item matches, the rest must.
            GroupTag::Optional => {
                writeln!(
                    out,
                    "{}if {} {{",
                    pad(depth),
                    self.pred(&group.items[0])
                )?;
                self.items(out, &group.items, captures, depth + 1)?;
                writeln!(out, "{}}}", pad(depth))
            }
            GroupTag::Sequential => self.items(out, &group.items, captures, depth),
            GroupTag::Alternative => {
                for (index, branch) in group.items.iter().enumerate() {
                    let capture = captures.and_then(|list| list.get(index));
                    if index == 0 {
                        writeln!(out, "{}if {} {{", pad(depth), self.pred(branch))?;
                    } else {
                        writeln!(out, "{}}} else if {} {{", pad(depth), self.pred(branch))?;
                    }
                    self.item(out, branch, capture, depth + 1)?;
                }
                writeln!(out, "{}}} else {{", pad(depth))?;
                writeln!(
                    out,
                    "{}    self.fail(\"Expected one of the alternatives.\".to_string());",
                    pad(depth)
                )?;
                writeln!(out, "{}}}", pad(depth))
            }
        }
    }
}

fn emit_finish(out: &mut String, rule: &Rule) -> fmt::Result {
    let snake = snake_name(&rule.name);
    writeln!(
        out,
        "    fn finish_{}(&mut self, mut node: Value, mark: usize) -> Value {{",
        snake
    )?;
    if rule.attribute(Attribute::Verbosity).is_some() {
        writeln!(out, "        self.pop_verbosity();")?;
    }
    if rule.attribute(Attribute::Classify).is_some() {
        writeln!(out, "        self.pop_class();")?;
    }
    if let Some(reclassify) = rule.attribute(Attribute::Reclassify) {
        writeln!(
            out,
            "        self.reclassify_from(mark, {:?});",
            reclassify.value
        )?;
    }
    if let Some(scope) = rule.attribute(Attribute::Scope) {
        writeln!(
            out,
            "        self.pop_scope_into(&mut node, {:?});",
            scope.value
        )?;
    }
    if let Some(declare) = rule.attribute(Attribute::Declare) {
        writeln!(out, "        self.declare(&node, {:?});", declare.value)?;
    }
    if let Some(key) = rule.attribute(Attribute::Key) {
        writeln!(out, "        if let Value::Object(fields) = &node {{")?;
        writeln!(
            out,
            "            if fields.len() == 3 && fields.contains_key({:?}) {{",
            key.value
        )?;
        writeln!(out, "                return fields[{:?}].clone();", key.value)?;
        writeln!(out, "            }}")?;
        writeln!(out, "        }}")?;
    }
    if let Some(flip) = rule.attribute(Attribute::Flip) {
        writeln!(
            out,
            "        let child = node.as_object_mut().and_then(|fields| fields.remove({:?}));",
            flip.value
        )?;
        writeln!(out, "        if let Some(mut child) = child {{")?;
        writeln!(out, "            match child.as_object_mut() {{")?;
        writeln!(out, "                Some(fields) => {{")?;
        writeln!(
            out,
            "                    fields.insert({:?}.to_string(), node);",
            flip.value
        )?;
        writeln!(out, "                }}")?;
        writeln!(
            out,
            "                None => self.fail(\"Flip target '{}' is not a node.\".to_string()),",
            flip.value
        )?;
        writeln!(out, "            }}")?;
        writeln!(out, "            return child;")?;
        writeln!(out, "        }}")?;
    }
    writeln!(out, "        node")?;
    writeln!(out, "    }}\n")?;
    Ok(())
}
