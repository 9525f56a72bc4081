use crate::lexeme::GrammarLexer;
use crate::parsing::GrammarParser;
use crate::{
    Attribute, Code, Decorator, DiagnosticSink, Directive, Grammar, GroupTag, ItemBase,
    Multiplicity, Verbosity,
};

fn parse(text: &str) -> (Grammar, DiagnosticSink) {
    let code = Code::from(text);
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let lexemes = GrammarLexer::new(&code).tokenize(&mut sink);
    let grammar = GrammarParser::new(lexemes).parse(&mut sink);
    (grammar, sink)
}

fn errors(sink: &DiagnosticSink) -> Vec<String> {
    sink.entries_of(Verbosity::Error)
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn token_entries() {
    let (grammar, sink) = parse(
        r#"
.token
    WS      `\s+`           @skip
    WORD    `[a-zA-Z]+`     ^KEYWORD
    PATH    `"([^"]*)"`     @1 @relfilepath
.end
.rules
    N: = WORD => w ;
.end
"#,
    );
    assert!(!sink.has_errors(), "{:?}", errors(&sink));
    assert_eq!(grammar.tokens.len(), 3);
    assert!(grammar.token("WS").unwrap().is_skip());
    assert_eq!(grammar.token("WORD").unwrap().exclusions, vec!["KEYWORD"]);
    let path = grammar.token("PATH").unwrap();
    assert_eq!(path.group_index(), 1);
    assert!(path.has_decorator(Decorator::RelFilePath));
}

#[test]
fn group_section_members_and_trailing_colon() {
    let (grammar, sink) = parse(
        r#"
.token: KEYWORD:
    'if'
    'else'
.end
.rules
    N: = KEYWORD => k ;
.end
"#,
    );
    assert!(!sink.has_errors());
    let group = grammar.group("KEYWORD").unwrap();
    assert_eq!(group.members, vec!["if", "else"]);
    // the tolerated trailing colon is still flagged
    assert!(sink
        .entries_of(Verbosity::Warning)
        .iter()
        .any(|d| d.message.contains("Trailing colon")));
}

#[test]
fn quoted_literals_are_escaped() {
    let (grammar, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    Sum: = INT ( '+' INT )* => left ( _ right ) ;
.end
"#,
    );
    assert!(!sink.has_errors(), "{:?}", errors(&sink));
    // the '+' string literal becomes an escaped regex fragment
    assert_eq!(grammar.literals, vec![r"\+"]);
    let rule = grammar.rule("Sum").unwrap();
    assert_eq!(rule.definitions.len(), 1);
    let items = &rule.definitions[0].items;
    assert_eq!(items.len(), 2);
    match &items[1].base {
        ItemBase::Group(group) => {
            assert_eq!(group.tag, GroupTag::Sequential);
            assert_eq!(group.items.len(), 2);
        }
        other => panic!("expected a group item, got {:?}", other),
    }
    assert_eq!(items[1].multiplicity, Multiplicity::ZeroOrMore);
}

#[test]
fn attributes_and_directives() {
    let (grammar, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    Op: @{key:left, merge} = INT => left ;
.end
"#,
    );
    assert!(!sink.has_errors());
    let rule = grammar.rule("Op").unwrap();
    assert_eq!(rule.attribute(Attribute::Key).unwrap().value, "left");
    assert!(rule.has_directive(Directive::Merge));
}

#[test]
fn grammar_level_start() {
    let (grammar, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules @{start:Program}
    Program: = INT => v ;
.end
"#,
    );
    assert!(!sink.has_errors());
    assert_eq!(grammar.start.as_deref(), Some("Program"));
}

#[test]
fn capture_shapes() {
    let (grammar, sink) = parse(
        r#"
.token
    INT `[0-9]+`
    SEP `,`
.end
.rules
    List: = INT ( SEP INT )* => first ( _ *rest.value ) ;
.end
"#,
    );
    assert!(!sink.has_errors());
    let rule = grammar.rule("List").unwrap();
    let captures = rule.definitions[0].captures.as_ref().unwrap();
    assert_eq!(captures.len(), 2);
    match &captures[1] {
        crate::Capture::Group(sublist, _) => {
            assert_eq!(sublist.len(), 2);
            match &sublist[1] {
                crate::Capture::Binding(binding) => {
                    assert_eq!(binding.name.as_deref(), Some("rest"));
                    assert!(binding.list);
                    assert_eq!(binding.field.as_deref(), Some("value"));
                }
                other => panic!("expected a binding, got {:?}", other),
            }
        }
        other => panic!("expected a sublist, got {:?}", other),
    }
}

#[test]
fn rule_name_convention() {
    let (_, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    RGBColor: = INT => v ;
.end
"#,
    );
    assert!(errors(&sink)
        .iter()
        .any(|m| m.contains("not strict PascalCase")));
}

#[test]
fn single_letter_rule_names_are_valid() {
    let (grammar, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = INT => v ;
.end
"#,
    );
    assert!(!sink.has_errors());
    assert!(grammar.rule("N").is_some());
}

#[test]
fn optional_group_rejects_multiplicity() {
    let (_, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = [ INT ]* => ( v ) ;
.end
"#,
    );
    assert!(errors(&sink)
        .iter()
        .any(|m| m.contains("may not carry a multiplicity")));
}

#[test]
fn paren_group_requires_multiplicity() {
    let (_, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = ( INT INT ) => ( a b ) ;
.end
"#,
    );
    assert!(errors(&sink)
        .iter()
        .any(|m| m.contains("requires a trailing")));
}

#[test]
fn duplicate_definitions() {
    let (_, sink) = parse(
        r#"
.token
    INT `[0-9]+`
    INT `[0-9]`
.end
.rules
    N: = INT => v ;
    N: = INT => v ;
.end
"#,
    );
    let errors = errors(&sink);
    assert!(errors.iter().any(|m| m.contains("Duplicate token")));
    assert!(errors.iter().any(|m| m.contains("Duplicate rule")));
}

#[test]
fn missing_rules_section() {
    let (_, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
"#,
    );
    assert!(errors(&sink).iter().any(|m| m.contains("Missing .rules")));
}

#[test]
fn text_after_final_end_is_ignored() {
    let (grammar, sink) = parse(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = INT => v ;
.end
anything at all ( here ;
"#,
    );
    assert!(!sink.has_errors());
    assert!(grammar.rule("N").is_some());
}

#[test]
fn recovery_collects_several_errors() {
    let (_, sink) = parse(
        r#"
.token
    lower `[a-z]`
    INT
.end
.rules
    N: = INT => v ;
.end
"#,
    );
    // both broken token lines surface in one pass
    assert!(errors(&sink).len() >= 2);
}
