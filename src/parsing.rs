//! Syntactic analysis of the grammar description.
//!
//! The [GrammarParser] walks the lexeme stream by recursive descent and builds the [Grammar]
//! model. Section order is enforced: zero or one `.token` section, zero or more `.token: NAME`
//! group sections, exactly one `.rules` section; text following the final `.end` is ignored.
//! Errors are reported to the sink and recovery continues at the next entry so the syntax pass
//! surfaces its whole batch at once.

use crate::lexeme::{LexKind, Lexeme};
use crate::{
    Attribute, AttributeUse, Capture, CaptureBinding, Decorator, Definition, DiagnosticSink,
    Directive, Grammar, GroupTag, InlineGroup, Item, Multiplicity, Position, Rule, Token,
    TokenGroup,
};

pub struct GrammarParser {
    lexemes: Vec<Lexeme>,
    cursor: usize,
}

impl GrammarParser {
    pub fn new(lexemes: Vec<Lexeme>) -> Self {
        Self { lexemes, cursor: 0 }
    }

    /// Parse the lexeme stream into a [Grammar].
    pub fn parse(mut self, sink: &mut DiagnosticSink) -> Grammar {
        let mut grammar = Grammar::new();
        let mut seen_tokens = false;

        while let Some(lexeme) = self.peek().cloned() {
            match lexeme.kind {
                LexKind::TokenSection => {
                    self.advance();
                    if self.peek_kind() == Some(LexKind::Colon) {
                        self.advance();
                        self.parse_group_section(&mut grammar, sink);
                    } else {
                        if seen_tokens {
                            sink.error("Duplicate .token section.".into(), Some(lexeme.position));
                        }
                        seen_tokens = true;
                        self.parse_token_section(&mut grammar, sink);
                    }
                }
                LexKind::RulesSection => {
                    self.advance();
                    self.parse_rules_section(&mut grammar, sink);
                    // Text following the final .end is ignored.
                    return grammar;
                }
                _ => {
                    sink.error(
                        format!("Expected a section marker, found '{}'.", lexeme.text),
                        Some(lexeme.position),
                    );
                    self.advance();
                }
            }
        }

        sink.error("Missing .rules section.".into(), None);
        grammar
    }

    // ------------------------------------------------------------------ sections

    fn parse_token_section(&mut self, grammar: &mut Grammar, sink: &mut DiagnosticSink) {
        loop {
            let lexeme = match self.peek().cloned() {
                Some(lexeme) => lexeme,
                None => {
                    sink.error("Missing .end after .token section.".into(), None);
                    return;
                }
            };
            match lexeme.kind {
                LexKind::SectionEnd => {
                    self.advance();
                    return;
                }
                LexKind::UpperIdent => {
                    self.advance();
                    self.parse_token_entry(lexeme, grammar, sink);
                }
                _ => {
                    sink.error(
                        format!(
                            "Expected a token name on its own line, found '{}'.",
                            lexeme.text
                        ),
                        Some(lexeme.position),
                    );
                    self.skip_past_line(lexeme.position.line);
                }
            }
        }
    }

    /// One token entry: `NAME REGEX (decorator | exclusion)*`.
    fn parse_token_entry(&mut self, name: Lexeme, grammar: &mut Grammar, sink: &mut DiagnosticSink) {
        let pattern = match self.peek().cloned() {
            Some(lexeme) if lexeme.kind == LexKind::Regex => {
                self.advance();
                lexeme.text
            }
            Some(lexeme) if lexeme.kind == LexKind::Str => {
                self.advance();
                regex::escape(&lexeme.text)
            }
            other => {
                let position = other.map(|l| l.position).or(Some(name.position));
                sink.error(
                    format!("Token {} is missing its regex literal.", name.text),
                    position,
                );
                self.skip_past_line(name.position.line);
                return;
            }
        };

        let mut token = Token::new(name.text.clone(), pattern, name.position);
        while let Some(lexeme) = self.peek().cloned() {
            match lexeme.kind {
                LexKind::Decorator => {
                    self.advance();
                    match Decorator::from_name(&lexeme.text) {
                        Some(decorator) => {
                            let duplicate_index = matches!(decorator, Decorator::GroupIndex(_))
                                && token
                                    .decorators
                                    .iter()
                                    .any(|d| matches!(d, Decorator::GroupIndex(_)));
                            if duplicate_index {
                                sink.error(
                                    format!(
                                        "Token {} carries more than one group-index decorator.",
                                        token.name
                                    ),
                                    Some(lexeme.position),
                                );
                            } else {
                                token.decorators.push(decorator);
                            }
                        }
                        None => sink.error(
                            format!("Unknown decorator '@{}'.", lexeme.text),
                            Some(lexeme.position),
                        ),
                    }
                }
                LexKind::Exclusion => {
                    self.advance();
                    token.exclusions.push(lexeme.text);
                }
                _ => break,
            }
        }

        if grammar.token(&token.name).is_some() || grammar.group(&token.name).is_some() {
            sink.error(
                format!("Duplicate token definition '{}'.", token.name),
                Some(token.position),
            );
            return;
        }
        grammar.tokens.push(token);
    }

    /// A `.token: NAME` section declaring a token group; the body lines are its member
    /// literals.
    fn parse_group_section(&mut self, grammar: &mut Grammar, sink: &mut DiagnosticSink) {
        let name = match self.expect(LexKind::UpperIdent, "a group name after '.token:'", sink) {
            Some(name) => name,
            None => {
                self.skip_to_section_end(sink);
                return;
            }
        };
        if self.peek_kind() == Some(LexKind::Colon) {
            let colon = self.peek().cloned();
            self.advance();
            sink.warning(
                format!("Trailing colon after group name {}.", name.text),
                colon.map(|l| l.position),
            );
        }

        let mut group = TokenGroup::new(name.text.clone(), name.position);
        loop {
            let lexeme = match self.peek().cloned() {
                Some(lexeme) => lexeme,
                None => {
                    sink.error(
                        format!("Missing .end after .token: {} section.", name.text),
                        None,
                    );
                    break;
                }
            };
            match lexeme.kind {
                LexKind::SectionEnd => {
                    self.advance();
                    break;
                }
                LexKind::Str => {
                    self.advance();
                    group.members.push(regex::escape(&lexeme.text));
                }
                LexKind::Regex => {
                    self.advance();
                    group.members.push(lexeme.text);
                }
                _ => {
                    sink.error(
                        format!(
                            "Expected a member literal in group {}, found '{}'.",
                            name.text, lexeme.text
                        ),
                        Some(lexeme.position),
                    );
                    self.advance();
                }
            }
        }

        if group.members.is_empty() {
            sink.error(
                format!("Token group {} has no members.", group.name),
                Some(group.position),
            );
            return;
        }
        if grammar.token(&group.name).is_some() || grammar.group(&group.name).is_some() {
            sink.error(
                format!("Duplicate token definition '{}'.", group.name),
                Some(group.position),
            );
            return;
        }
        grammar.groups.push(group);
    }

    fn parse_rules_section(&mut self, grammar: &mut Grammar, sink: &mut DiagnosticSink) {
        if self.peek_kind() == Some(LexKind::AttrOpen) {
            self.advance();
            self.parse_grammar_block(grammar, sink);
        }
        loop {
            let lexeme = match self.peek().cloned() {
                Some(lexeme) => lexeme,
                None => {
                    sink.error("Missing .end after .rules section.".into(), None);
                    return;
                }
            };
            match lexeme.kind {
                LexKind::SectionEnd => {
                    self.advance();
                    return;
                }
                LexKind::PascalIdent => {
                    self.advance();
                    self.parse_rule_entry(lexeme, grammar, sink);
                }
                // A single-letter name like "N" lexes as an uppercase identifier but is still
                // valid strict PascalCase.
                LexKind::UpperIdent if crate::lexeme::is_pascal_name(&lexeme.text) => {
                    self.advance();
                    self.parse_rule_entry(lexeme, grammar, sink);
                }
                LexKind::UpperIdent | LexKind::Ident => {
                    sink.error(
                        format!("Rule name '{}' is not strict PascalCase.", lexeme.text),
                        Some(lexeme.position),
                    );
                    self.advance();
                    self.skip_past(LexKind::Semicolon);
                }
                _ => {
                    sink.error(
                        format!("Expected a rule name, found '{}'.", lexeme.text),
                        Some(lexeme.position),
                    );
                    self.advance();
                }
            }
        }
    }

    /// The optional grammar-level `@{ … }` block directly after `.rules`; it holds the default
    /// start rule as `start:Name`.
    fn parse_grammar_block(&mut self, grammar: &mut Grammar, sink: &mut DiagnosticSink) {
        loop {
            let lexeme = match self.peek().cloned() {
                Some(lexeme) => lexeme,
                None => return,
            };
            match lexeme.kind {
                LexKind::CloseBrace => {
                    self.advance();
                    return;
                }
                LexKind::Comma => {
                    self.advance();
                }
                LexKind::Ident if lexeme.text == "start" => {
                    self.advance();
                    if self.expect(LexKind::Colon, "':' after start", sink).is_none() {
                        continue;
                    }
                    match self.peek().cloned() {
                        Some(name)
                            if matches!(name.kind, LexKind::PascalIdent | LexKind::UpperIdent)
                                && crate::lexeme::is_pascal_name(&name.text) =>
                        {
                            self.advance();
                            grammar.start = Some(name.text);
                        }
                        other => {
                            sink.error(
                                "Expected a rule name after start:.".into(),
                                other.map(|l| l.position),
                            );
                        }
                    }
                }
                _ => {
                    sink.error(
                        format!("Unknown grammar-level entry '{}'.", lexeme.text),
                        Some(lexeme.position),
                    );
                    self.advance();
                }
            }
        }
    }

    // ------------------------------------------------------------------ rules

    /// `Name : @{ … }? = Definition ( | Definition )* ;`
    fn parse_rule_entry(&mut self, name: Lexeme, grammar: &mut Grammar, sink: &mut DiagnosticSink) {
        let mut rule = Rule::new(name.text.clone(), name.position);

        if self
            .expect(LexKind::Colon, "':' after the rule name", sink)
            .is_none()
        {
            self.skip_past(LexKind::Semicolon);
            return;
        }
        if self.peek_kind() == Some(LexKind::AttrOpen) {
            self.advance();
            self.parse_attribute_block(&mut rule, sink);
        }
        if self
            .expect(LexKind::Equal, "'=' before the first definition", sink)
            .is_none()
        {
            self.skip_past(LexKind::Semicolon);
            return;
        }

        loop {
            let definition = self.parse_definition(grammar, sink);
            rule.definitions.push(definition);
            match self.peek_kind() {
                Some(LexKind::Pipe) => {
                    self.advance();
                }
                Some(LexKind::Semicolon) => {
                    self.advance();
                    break;
                }
                _ => {
                    let position = self.peek().map(|l| l.position);
                    sink.error(
                        format!("Rule {} is missing its terminating ';'.", rule.name),
                        position.or(Some(name.position)),
                    );
                    break;
                }
            }
        }

        if grammar.rule(&rule.name).is_some() {
            sink.error(
                format!("Duplicate rule definition '{}'.", rule.name),
                Some(rule.position),
            );
            return;
        }
        // Short names such as "N" are legal in both namespaces; a shared spelling would make
        // item references ambiguous.
        if grammar.token(&rule.name).is_some() || grammar.group(&rule.name).is_some() {
            sink.error(
                format!(
                    "Rule name '{}' is already defined in the token namespace.",
                    rule.name
                ),
                Some(rule.position),
            );
            return;
        }
        grammar.rules.push(rule);
    }

    /// Attributes and directives inside a rule's `@{ … }` block.
    fn parse_attribute_block(&mut self, rule: &mut Rule, sink: &mut DiagnosticSink) {
        loop {
            let lexeme = match self.peek().cloned() {
                Some(lexeme) => lexeme,
                None => return,
            };
            match lexeme.kind {
                LexKind::CloseBrace => {
                    self.advance();
                    return;
                }
                LexKind::Comma => {
                    self.advance();
                }
                LexKind::Ident => {
                    self.advance();
                    if let Some(attribute) = Attribute::from_name(&lexeme.text) {
                        if self
                            .expect(LexKind::Colon, "':' after the attribute name", sink)
                            .is_none()
                        {
                            continue;
                        }
                        match self.parse_attribute_value(sink) {
                            Some(value) => rule.attributes.push(AttributeUse {
                                attribute,
                                value,
                                position: lexeme.position,
                            }),
                            None => continue,
                        }
                    } else if let Some(directive) = Directive::from_name(&lexeme.text) {
                        if self.peek_kind() == Some(LexKind::Colon) {
                            sink.error(
                                format!("Directive '{}' takes no value.", lexeme.text),
                                Some(lexeme.position),
                            );
                            self.advance();
                            self.parse_attribute_value(sink);
                        } else if !rule.directives.contains(&directive) {
                            rule.directives.push(directive);
                        }
                    } else {
                        sink.error(
                            format!("Unknown attribute or directive '{}'.", lexeme.text),
                            Some(lexeme.position),
                        );
                    }
                }
                _ => {
                    sink.error(
                        format!("Unexpected '{}' inside an attribute block.", lexeme.text),
                        Some(lexeme.position),
                    );
                    self.advance();
                }
            }
        }
    }

    /// An attribute argument: a name, a dotted name, or a verbosity level.
    fn parse_attribute_value(&mut self, sink: &mut DiagnosticSink) -> Option<String> {
        let mut value = match self.peek().cloned() {
            Some(lexeme)
                if matches!(
                    lexeme.kind,
                    LexKind::Ident | LexKind::PascalIdent | LexKind::UpperIdent
                ) =>
            {
                self.advance();
                lexeme.text
            }
            other => {
                sink.error(
                    "Expected an attribute value.".into(),
                    other.map(|l| l.position),
                );
                return None;
            }
        };
        while self.peek_kind() == Some(LexKind::Dot) {
            self.advance();
            match self.peek().cloned() {
                Some(lexeme)
                    if matches!(
                        lexeme.kind,
                        LexKind::Ident | LexKind::PascalIdent | LexKind::UpperIdent
                    ) =>
                {
                    self.advance();
                    value.push('.');
                    value.push_str(&lexeme.text);
                }
                other => {
                    sink.error(
                        "Expected a name after '.' in an attribute value.".into(),
                        other.map(|l| l.position),
                    );
                    return None;
                }
            }
        }
        Some(value)
    }

    // ------------------------------------------------------------------ definitions

    /// `Item+ ( => Capture+ )?`
    fn parse_definition(&mut self, grammar: &mut Grammar, sink: &mut DiagnosticSink) -> Definition {
        let position = self
            .peek()
            .map(|l| l.position)
            .unwrap_or(Position::new(0, 0));
        let mut definition = Definition::new(position);

        loop {
            match self.peek_kind() {
                None
                | Some(LexKind::Pipe)
                | Some(LexKind::Semicolon)
                | Some(LexKind::SectionEnd)
                | Some(LexKind::Arrow) => break,
                _ => match self.parse_item(grammar, sink) {
                    Some(item) => definition.items.push(item),
                    None => break,
                },
            }
        }

        if definition.items.is_empty() {
            sink.error(
                "A definition must contain at least one item.".into(),
                Some(position),
            );
        }

        if self.peek_kind() == Some(LexKind::Arrow) {
            self.advance();
            definition.captures = Some(self.parse_captures(false, sink));
        }
        definition
    }

    /// A single item: base (name, literal, or inline group) plus its multiplicity marker.
    fn parse_item(&mut self, grammar: &mut Grammar, sink: &mut DiagnosticSink) -> Option<Item> {
        let lexeme = self.peek().cloned()?;
        match lexeme.kind {
            LexKind::UpperIdent | LexKind::PascalIdent => {
                self.advance();
                let multiplicity = self.parse_multiplicity();
                Some(Item::reference(lexeme.text, multiplicity, lexeme.position))
            }
            LexKind::Regex => {
                self.advance();
                let index = grammar.intern_literal(&lexeme.text);
                let multiplicity = self.parse_multiplicity();
                Some(Item::literal(
                    lexeme.text,
                    index,
                    multiplicity,
                    lexeme.position,
                ))
            }
            LexKind::Str => {
                self.advance();
                let pattern = regex::escape(&lexeme.text);
                let index = grammar.intern_literal(&pattern);
                let multiplicity = self.parse_multiplicity();
                Some(Item::literal(pattern, index, multiplicity, lexeme.position))
            }
            LexKind::OpenParen => {
                self.advance();
                self.parse_paren_group(lexeme.position, grammar, sink)
            }
            LexKind::OpenBracket => {
                self.advance();
                self.parse_optional_group(lexeme.position, grammar, sink)
            }
            _ => {
                sink.error(
                    format!("'{}' cannot start a definition item.", lexeme.text),
                    Some(lexeme.position),
                );
                self.advance();
                None
            }
        }
    }

    /// `( … )` with a required trailing multiplicity; a `|` inside makes the group an
    /// alternative whose branches must each be a single item.
    fn parse_paren_group(
        &mut self,
        position: Position,
        grammar: &mut Grammar,
        sink: &mut DiagnosticSink,
    ) -> Option<Item> {
        let mut branches: Vec<Vec<Item>> = vec![Vec::new()];
        loop {
            match self.peek_kind() {
                None | Some(LexKind::Semicolon) | Some(LexKind::SectionEnd) => {
                    sink.error("Unclosed '(' group.".into(), Some(position));
                    return None;
                }
                Some(LexKind::CloseParen) => {
                    self.advance();
                    break;
                }
                Some(LexKind::Pipe) => {
                    self.advance();
                    branches.push(Vec::new());
                }
                _ => match self.parse_item(grammar, sink) {
                    Some(item) => branches.last_mut().unwrap().push(item),
                    None => return None,
                },
            }
        }

        let group = if branches.len() > 1 {
            let mut items = Vec::new();
            for branch in branches {
                match branch.len() {
                    1 => items.extend(branch),
                    0 => sink.error("Empty alternative branch.".into(), Some(position)),
                    _ => sink.error(
                        "An alternative branch must be a single item; parenthesize sequences."
                            .into(),
                        Some(position),
                    ),
                }
            }
            InlineGroup {
                tag: GroupTag::Alternative,
                items,
            }
        } else {
            InlineGroup {
                tag: GroupTag::Sequential,
                items: branches.into_iter().next().unwrap(),
            }
        };

        if group.items.is_empty() {
            sink.error("Empty '(' group.".into(), Some(position));
            return None;
        }

        match self.peek_kind() {
            Some(LexKind::Star) | Some(LexKind::Plus) | Some(LexKind::Question) => {
                let multiplicity = self.parse_multiplicity();
                Some(Item::group(group, multiplicity, position))
            }
            _ => {
                sink.error(
                    "A '(…)' group requires a trailing '?', '*' or '+'.".into(),
                    Some(position),
                );
                Some(Item::group(group, Multiplicity::One, position))
            }
        }
    }

    /// `[ … ]`: implicitly zero-or-one, hard commitment past the first item, no trailing
    /// multiplicity allowed.
    fn parse_optional_group(
        &mut self,
        position: Position,
        grammar: &mut Grammar,
        sink: &mut DiagnosticSink,
    ) -> Option<Item> {
        let mut items = Vec::new();
        loop {
            match self.peek_kind() {
                None | Some(LexKind::Semicolon) | Some(LexKind::SectionEnd) => {
                    sink.error("Unclosed '[' group.".into(), Some(position));
                    return None;
                }
                Some(LexKind::CloseBracket) => {
                    self.advance();
                    break;
                }
                _ => match self.parse_item(grammar, sink) {
                    Some(item) => items.push(item),
                    None => return None,
                },
            }
        }
        if items.is_empty() {
            sink.error("Empty '[' group.".into(), Some(position));
            return None;
        }
        if matches!(
            self.peek_kind(),
            Some(LexKind::Star) | Some(LexKind::Plus) | Some(LexKind::Question)
        ) {
            let marker = self.peek().cloned();
            self.advance();
            sink.error(
                "An optional '[…]' group may not carry a multiplicity.".into(),
                marker.map(|l| l.position),
            );
        }
        Some(Item::group(
            InlineGroup {
                tag: GroupTag::Optional,
                items,
            },
            Multiplicity::One,
            position,
        ))
    }

    fn parse_multiplicity(&mut self) -> Multiplicity {
        let multiplicity = match self.peek_kind() {
            Some(LexKind::Question) => Multiplicity::ZeroOrOne,
            Some(LexKind::Star) => Multiplicity::ZeroOrMore,
            Some(LexKind::Plus) => Multiplicity::OneOrMore,
            _ => return Multiplicity::One,
        };
        self.advance();
        multiplicity
    }

    // ------------------------------------------------------------------ captures

    /// The `=>` tail: names, `_`, `*name`, dotted projections and parenthesized sublists
    /// mirroring inline groups.
    fn parse_captures(&mut self, nested: bool, sink: &mut DiagnosticSink) -> Vec<Capture> {
        let mut captures = Vec::new();
        loop {
            let lexeme = match self.peek().cloned() {
                Some(lexeme) => lexeme,
                None => return captures,
            };
            match lexeme.kind {
                LexKind::Pipe | LexKind::Semicolon | LexKind::SectionEnd => return captures,
                LexKind::CloseParen if nested => {
                    self.advance();
                    return captures;
                }
                LexKind::OpenParen => {
                    self.advance();
                    let sublist = self.parse_captures(true, sink);
                    captures.push(Capture::Group(sublist, lexeme.position));
                }
                LexKind::Star => {
                    self.advance();
                    match self.parse_binding(true, sink) {
                        Some(binding) => captures.push(Capture::Binding(binding)),
                        None => return captures,
                    }
                }
                LexKind::Ident => match self.parse_binding(false, sink) {
                    Some(binding) => captures.push(Capture::Binding(binding)),
                    None => return captures,
                },
                _ => {
                    sink.error(
                        format!("'{}' is not a capture.", lexeme.text),
                        Some(lexeme.position),
                    );
                    self.advance();
                }
            }
        }
    }

    fn parse_binding(&mut self, list: bool, sink: &mut DiagnosticSink) -> Option<CaptureBinding> {
        let lexeme = match self.peek().cloned() {
            Some(lexeme) if lexeme.kind == LexKind::Ident => lexeme,
            other => {
                sink.error("Expected a capture name.".into(), other.map(|l| l.position));
                return None;
            }
        };
        self.advance();
        let name = if lexeme.text == "_" {
            if list {
                sink.warning(
                    "A '*' prefix on '_' has no effect.".into(),
                    Some(lexeme.position),
                );
            }
            None
        } else {
            Some(lexeme.text.clone())
        };

        let mut field = None;
        if self.peek_kind() == Some(LexKind::Dot) {
            self.advance();
            match self.peek().cloned() {
                Some(next) if next.kind == LexKind::Ident => {
                    self.advance();
                    field = Some(next.text);
                }
                other => {
                    sink.error(
                        "Expected a field name after '.' in a capture.".into(),
                        other.map(|l| l.position),
                    );
                }
            }
        }
        Some(CaptureBinding {
            name,
            list,
            field,
            position: lexeme.position,
        })
    }

    // ------------------------------------------------------------------ stream helpers

    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<LexKind> {
        self.peek().map(|l| l.kind)
    }

    fn advance(&mut self) {
        if self.cursor < self.lexemes.len() {
            self.cursor += 1;
        }
    }

    fn expect(&mut self, kind: LexKind, what: &str, sink: &mut DiagnosticSink) -> Option<Lexeme> {
        match self.peek().cloned() {
            Some(lexeme) if lexeme.kind == kind => {
                self.advance();
                Some(lexeme)
            }
            other => {
                let position = other.as_ref().map(|l| l.position);
                let found = other
                    .map(|l| format!("'{}'", l.text))
                    .unwrap_or_else(|| "end of input".into());
                sink.error(format!("Expected {}, found {}.", what, found), position);
                None
            }
        }
    }

    /// Error recovery inside a token section: drop everything left on the broken entry's line.
    fn skip_past_line(&mut self, line: usize) {
        while let Some(lexeme) = self.peek() {
            if lexeme.position.line > line || lexeme.kind == LexKind::SectionEnd {
                return;
            }
            self.cursor += 1;
        }
    }

    /// Error recovery inside the rules section: drop everything up to and including the given
    /// lexeme kind, stopping short of a section boundary.
    fn skip_past(&mut self, kind: LexKind) {
        while let Some(lexeme) = self.peek() {
            if lexeme.kind == LexKind::SectionEnd {
                return;
            }
            let found = lexeme.kind == kind;
            self.cursor += 1;
            if found {
                return;
            }
        }
    }

    fn skip_to_section_end(&mut self, sink: &mut DiagnosticSink) {
        while let Some(lexeme) = self.peek() {
            let found = lexeme.kind == LexKind::SectionEnd;
            self.cursor += 1;
            if found {
                return;
            }
        }
        sink.error("Missing .end marker.".into(), None);
    }
}
