use crate::{
    Attribute, AttributeUse, Decorator, Definition, Directive, Grammar, GroupTag, InlineGroup,
    Item, ItemBase, Multiplicity, Position, RefTarget, Rule, Token, TokenGroup,
};
use once_cell::unsync::OnceCell;
use ptree::TreeItem;
use std::fmt::{Display, Formatter};

impl Grammar {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            groups: Vec::new(),
            rules: Vec::new(),
            literals: Vec::new(),
            start: None,
        }
    }

    pub fn token(&self, name: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&TokenGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Resolve a rule-item reference against the token, group and rule namespaces.
    pub fn resolve_name(&self, name: &str) -> Option<RefTarget> {
        if self.token(name).is_some() {
            Some(RefTarget::Token)
        } else if self.group(name).is_some() {
            Some(RefTarget::Group)
        } else if self.rule(name).is_some() {
            Some(RefTarget::Rule)
        } else {
            None
        }
    }

    /// Intern an inline literal pattern, returning its index in the literal table.
    pub fn intern_literal(&mut self, text: &str) -> usize {
        match self.literals.iter().position(|l| l == text) {
            Some(index) => index,
            None => {
                self.literals.push(text.to_string());
                self.literals.len() - 1
            }
        }
    }

    /// Render the grammar model as a tree on stdout.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(&self.tree())
    }

    pub fn tree(&self) -> GrammarTree {
        let mut children = Vec::new();
        for token in &self.tokens {
            children.push(GrammarTree::leaf(format!(
                "token {} `{}`",
                token.name, token.pattern
            )));
        }
        for group in &self.groups {
            children.push(GrammarTree::leaf(format!(
                "group {} ({} members)",
                group.name,
                group.members.len()
            )));
        }
        for rule in &self.rules {
            let definitions = rule
                .definitions
                .iter()
                .map(|d| GrammarTree {
                    label: "definition".into(),
                    children: d.items.iter().map(GrammarTree::from_item).collect(),
                })
                .collect();
            children.push(GrammarTree {
                label: format!("rule {}", rule.name),
                children: definitions,
            });
        }
        GrammarTree {
            label: "grammar".into(),
            children,
        }
    }
}

/// A lightweight owned rendering of the grammar model for [ptree].
#[derive(Clone)]
pub struct GrammarTree {
    label: String,
    children: Vec<GrammarTree>,
}

impl GrammarTree {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: Vec::new(),
        }
    }

    fn from_item(item: &Item) -> Self {
        match &item.base {
            ItemBase::Group(group) => GrammarTree {
                label: format!("{:?}{}", group.tag, item.multiplicity.suffix()),
                children: group.items.iter().map(GrammarTree::from_item).collect(),
            },
            base => GrammarTree::leaf(format!("{}{}", base, item.multiplicity.suffix())),
        }
    }
}

impl TreeItem for GrammarTree {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(&self.children)
    }
}

impl Token {
    pub fn new(name: String, pattern: String, position: Position) -> Self {
        Self {
            name,
            pattern,
            decorators: Vec::new(),
            exclusions: Vec::new(),
            classification: OnceCell::new(),
            position,
            expanded: OnceCell::new(),
        }
    }

    pub fn has_decorator(&self, decorator: Decorator) -> bool {
        self.decorators.contains(&decorator)
    }

    pub fn is_skip(&self) -> bool {
        self.has_decorator(Decorator::Skip)
    }

    pub fn is_internal(&self) -> bool {
        self.has_decorator(Decorator::Internal)
    }

    pub fn is_expand(&self) -> bool {
        self.has_decorator(Decorator::Expand)
    }

    /// Regex capture group whose text becomes the token value; 0 is the whole match.
    pub fn group_index(&self) -> u8 {
        self.decorators
            .iter()
            .find_map(|d| match d {
                Decorator::GroupIndex(n) => Some(*n),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Pattern after expansion; identical to the written pattern for non-`@expand` tokens.
    pub fn expanded_pattern(&self) -> &str {
        self.expanded.get().map(|s| s.as_str()).unwrap_or(&self.pattern)
    }
}

impl TokenGroup {
    pub fn new(name: String, position: Position) -> Self {
        Self {
            name,
            members: Vec::new(),
            position,
        }
    }
}

impl Rule {
    pub fn new(name: String, position: Position) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            directives: Vec::new(),
            definitions: Vec::new(),
            position,
            nullable: OnceCell::new(),
            first: OnceCell::new(),
        }
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<&AttributeUse> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }

    pub fn has_directive(&self, directive: Directive) -> bool {
        self.directives.contains(&directive)
    }
}

impl Definition {
    pub fn new(position: Position) -> Self {
        Self {
            items: Vec::new(),
            captures: None,
            position,
        }
    }

    /// A definition consisting of a single non-group item with no capture list returns the
    /// sub-match directly instead of wrapping it in a fresh node.
    pub fn is_pass_through(&self) -> bool {
        self.captures.is_none()
            && self.items.len() == 1
            && self.items[0].multiplicity == Multiplicity::One
            && !matches!(self.items[0].base, ItemBase::Group(_))
    }
}

impl Item {
    pub fn reference(name: String, multiplicity: Multiplicity, position: Position) -> Self {
        Self {
            base: ItemBase::Reference {
                name,
                target: OnceCell::new(),
            },
            multiplicity,
            position,
        }
    }

    pub fn literal(text: String, index: usize, multiplicity: Multiplicity, position: Position) -> Self {
        Self {
            base: ItemBase::Literal { text, index },
            multiplicity,
            position,
        }
    }

    pub fn group(group: InlineGroup, multiplicity: Multiplicity, position: Position) -> Self {
        Self {
            base: ItemBase::Group(group),
            multiplicity,
            position,
        }
    }
}

impl Multiplicity {
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Multiplicity::ZeroOrMore | Multiplicity::OneOrMore)
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Multiplicity::ZeroOrOne | Multiplicity::ZeroOrMore)
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Multiplicity::One => "",
            Multiplicity::ZeroOrOne => "?",
            Multiplicity::ZeroOrMore => "*",
            Multiplicity::OneOrMore => "+",
        }
    }
}

impl Display for ItemBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemBase::Reference { name, .. } => write!(f, "{}", name),
            ItemBase::Literal { text, .. } => write!(f, "`{}`", text),
            ItemBase::Group(group) => {
                let (open, close) = match group.tag {
                    GroupTag::Optional => ("[", "]"),
                    _ => ("(", ")"),
                };
                write!(f, "{}", open)?;
                for (index, item) in group.items.iter().enumerate() {
                    if index != 0 {
                        let separator = if group.tag == GroupTag::Alternative {
                            " | "
                        } else {
                            " "
                        };
                        write!(f, "{}", separator)?;
                    }
                    write!(f, "{}{}", item.base, item.multiplicity.suffix())?;
                }
                write!(f, "{}", close)
            }
        }
    }
}

impl Attribute {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "key" => Some(Attribute::Key),
            "flip" => Some(Attribute::Flip),
            "scope" => Some(Attribute::Scope),
            "declare" => Some(Attribute::Declare),
            "verbosity" => Some(Attribute::Verbosity),
            "classify" => Some(Attribute::Classify),
            "reclassify" => Some(Attribute::Reclassify),
            "retroclassify" => Some(Attribute::Retroclassify),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Key => "key",
            Attribute::Flip => "flip",
            Attribute::Scope => "scope",
            Attribute::Declare => "declare",
            Attribute::Verbosity => "verbosity",
            Attribute::Classify => "classify",
            Attribute::Reclassify => "reclassify",
            Attribute::Retroclassify => "retroclassify",
        }
    }
}

impl Directive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "merge" => Some(Directive::Merge),
            _ => None,
        }
    }
}

/// `RgbColor` -> `rgb_color`; token names lowercase as-is (`INT` -> `int`).
pub(crate) fn snake_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index != 0 && !name[..index].ends_with('_') && !name.as_bytes()[index - 1].is_ascii_uppercase() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `RgbColor` -> `RGB_COLOR`: the `kind` tag of emitted rule nodes.
pub(crate) fn upper_snake_name(name: &str) -> String {
    snake_name(name).to_ascii_uppercase()
}

impl Decorator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "skip" => Some(Decorator::Skip),
            "internal" => Some(Decorator::Internal),
            "expand" => Some(Decorator::Expand),
            "relfilepath" => Some(Decorator::RelFilePath),
            "absfilepath" => Some(Decorator::AbsFilePath),
            "reldirpath" => Some(Decorator::RelDirPath),
            "absdirpath" => Some(Decorator::AbsDirPath),
            "ensurerelative" => Some(Decorator::EnsureRelative),
            "ensureabsolute" => Some(Decorator::EnsureAbsolute),
            "loadandparse" => Some(Decorator::LoadAndParse),
            _ => {
                if name.len() == 1 {
                    match name.as_bytes()[0] {
                        d @ b'1'..=b'9' => Some(Decorator::GroupIndex(d - b'0')),
                        _ => None,
                    }
                } else {
                    None
                }
            }
        }
    }
}
