use crate::lexeme::GrammarLexer;
use crate::parsing::GrammarParser;
use crate::resolver::{item_nullable, rule_first, rule_nullable, Resolver};
use crate::{Code, DiagnosticSink, FirstElem, Grammar, Verbosity};

fn resolve(text: &str) -> (Grammar, DiagnosticSink) {
    let code = Code::from(text);
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let lexemes = GrammarLexer::new(&code).tokenize(&mut sink);
    assert!(!sink.has_errors(), "unexpected lexical errors");
    let grammar = GrammarParser::new(lexemes).parse(&mut sink);
    assert!(!sink.has_errors(), "unexpected syntax errors");
    let _ = Resolver::new(&grammar).resolve(&mut sink);
    (grammar, sink)
}

fn messages(sink: &DiagnosticSink, level: Verbosity) -> Vec<String> {
    sink.entries_of(level)
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn undefined_reference_is_an_error() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = MISSING => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("undefined name 'MISSING'")));
}

#[test]
fn expansion_fixed_point() {
    let (grammar, sink) = resolve(
        r#"
.token
    DIGIT `[0-9]`       @internal
    FRAC  `\.DIGIT+`    @internal @expand
    NUM   `DIGIT+FRAC?` @expand
.end
.rules
    N: = NUM => v ;
.end
"#,
    );
    assert!(!sink.has_errors(), "{:?}", messages(&sink, Verbosity::Error));
    assert_eq!(
        grammar.token("FRAC").unwrap().expanded_pattern(),
        r"\.(?:[0-9])+"
    );
    assert_eq!(
        grammar.token("NUM").unwrap().expanded_pattern(),
        r"(?:[0-9])+(?:\.(?:[0-9])+)?"
    );
}

#[test]
fn expansion_cycle_is_an_error() {
    let (_, sink) = resolve(
        r#"
.token
    AA `BB` @expand
    BB `AA` @expand
.end
.rules
    N: = AA => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("Cyclic @expand")));
}

#[test]
fn expansion_unknown_name_is_an_error() {
    let (_, sink) = resolve(
        r#"
.token
    NUM `WAT+` @expand
.end
.rules
    N: = NUM => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("Unknown token name 'WAT'")));
}

#[test]
fn capture_on_group_requires_sublist() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = INT ( INT )* => v w ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("parenthesized sublist")));
}

#[test]
fn list_capture_requires_repetition() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = INT => *v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("requires a repeatable item")));
}

#[test]
fn list_capture_allowed_under_repeated_group() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = ( INT )* => ( *v ) ;
.end
"#,
    );
    assert!(!sink.has_errors(), "{:?}", messages(&sink, Verbosity::Error));
}

#[test]
fn dotted_capture_on_token_must_project_value() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = INT => v.kind ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("only the 'value' field")));
}

#[test]
fn dotted_capture_on_rule_checks_the_field() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    Pair: = INT INT => a b ;
    N: = Pair => p.c ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("no definition of Pair provides field 'c'")));

    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    Pair: = INT INT => a b ;
    N: = Pair => p.a ;
.end
"#,
    );
    assert!(!sink.has_errors());
}

#[test]
fn flip_requires_key() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: @{flip:v} = INT => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("flip:v requires key")));
}

#[test]
fn key_must_be_captured() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: @{key:missing} = INT => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("no definition captures key 'missing'")));
}

#[test]
fn list_capture_of_a_merge_rule_is_rejected() {
    let (_, sink) = resolve(
        r#"
.token
    WS      `\s+` @skip
    FLOAT   `[0-9]+\.[0-9]+`
    INTEGER `[0-9]+`
.end
.rules
    List: = Number+ => *nums ;
    Number: @{merge} = FLOAT | INTEGER ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("merge rule Number cannot accumulate into a list")));
}

#[test]
fn merge_conflicts_with_key() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: @{key:v, merge} = INT => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("merge cannot be combined")));
}

#[test]
fn skip_and_internal_tokens_may_not_be_referenced() {
    let (_, sink) = resolve(
        r#"
.token
    WS    `\s+`   @skip
    DIGIT `[0-9]` @internal
.end
.rules
    N: = WS DIGIT => a b ;
.end
"#,
    );
    let errors = messages(&sink, Verbosity::Error);
    assert!(errors.iter().any(|m| m.contains("@skip token WS")));
    assert!(errors.iter().any(|m| m.contains("@internal token DIGIT")));
}

#[test]
fn scope_without_declare_warns() {
    let (_, sink) = resolve(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    Block: @{scope:names} = INT => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Warning)
        .iter()
        .any(|m| m.contains("no declare in any reachable rule")));
}

#[test]
fn declare_outside_scope_warns() {
    let (_, sink) = resolve(
        r#"
.token
    WORD `[a-z]+`
.end
.rules
    Let: @{declare:name} = WORD => name.value ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Warning)
        .iter()
        .any(|m| m.contains("outside any enclosing scope")));
}

#[test]
fn scope_with_reachable_declare_is_quiet() {
    let (_, sink) = resolve(
        r#"
.token
    WORD `[a-z]+`
    SEMI `;`
.end
.rules
    Block: @{scope:names} = Let+ => *stmts ;
    Let: @{declare:name} = WORD SEMI => name.value _ ;
.end
"#,
    );
    let warnings = messages(&sink, Verbosity::Warning);
    assert!(!warnings.iter().any(|m| m.contains("scope")));
    assert!(!warnings.iter().any(|m| m.contains("enclosing scope")));
}

#[test]
fn doubtful_group_warns() {
    let (_, sink) = resolve(
        r#"
.token
    A `a`
    B `b`
.end
.rules
    N: = ( A? B? )+ ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Warning)
        .iter()
        .any(|m| m.contains("Doubtful group")));
}

#[test]
fn uncertain_group_warns() {
    let (_, sink) = resolve(
        r#"
.token
    A `a`
    B `b`
.end
.rules
    N: = ( ( A )? B )+ ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Warning)
        .iter()
        .any(|m| m.contains("Uncertain group")));
}

#[test]
fn plain_groups_are_quiet() {
    let (_, sink) = resolve(
        r#"
.token
    A `a`
    B `b`
.end
.rules
    N: = ( A B? )+ ;
.end
"#,
    );
    let warnings = messages(&sink, Verbosity::Warning);
    assert!(!warnings.iter().any(|m| m.contains("Doubtful")));
    assert!(!warnings.iter().any(|m| m.contains("Uncertain")));
}

#[test]
fn left_recursion_is_an_error() {
    let (_, sink) = resolve(
        r#"
.token
    PLUS `\+`
    INT  `[0-9]+`
.end
.rules
    Expr: = Expr PLUS | INT ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("left-recursive")));
}

#[test]
fn nullable_and_first_walk() {
    let (grammar, sink) = resolve(
        r#"
.token
    A `a`
    B `b`
.end
.rules
    Maybe: = A? ;
    Pair: = Maybe B ;
.end
"#,
    );
    assert!(!sink.has_errors());
    let maybe = grammar.rule("Maybe").unwrap();
    let pair = grammar.rule("Pair").unwrap();
    assert!(rule_nullable(&grammar, maybe));
    assert!(!rule_nullable(&grammar, pair));
    assert!(item_nullable(&grammar, &maybe.definitions[0].items[0]));
    // Pair's look-ahead sees through the nullable prefix
    let first = rule_first(&grammar, pair);
    assert!(first.contains(&FirstElem::Token("A".to_string())));
    assert!(first.contains(&FirstElem::Token("B".to_string())));
}

#[test]
fn empty_token_match_is_an_error() {
    let (_, sink) = resolve(
        r#"
.token
    BAD `a*`
.end
.rules
    N: = BAD => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("must not match the empty string")));
}

#[test]
fn group_index_must_exist() {
    let (_, sink) = resolve(
        r#"
.token
    PAIR `([a-z])=([0-9])` @3
.end
.rules
    N: = PAIR => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("exceeds its")));
}

#[test]
fn loadandparse_requires_a_start_rule() {
    let (_, sink) = resolve(
        r#"
.token
    PATH `"([^"]*)"` @1 @loadandparse
.end
.rules
    N: = PATH => p ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("no start rule")));
}

#[test]
fn helper_name_collision_is_an_error() {
    let (_, sink) = resolve(
        r#"
.token
    RGB `#[0-9a-f]{6}`
.end
.rules
    Rgb: = RGB => v ;
.end
"#,
    );
    assert!(messages(&sink, Verbosity::Error)
        .iter()
        .any(|m| m.contains("helper name")));
}
