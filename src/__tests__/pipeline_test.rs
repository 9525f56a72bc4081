use crate::lexeme::GrammarLexer;
use crate::parsing::GrammarParser;
use crate::resolver::Resolver;
use crate::{Code, DiagnosticSink, Generator, Verbosity};

const JSON_GRAMMAR: &str = r#"
;; a small JSON dialect
.token
    WS     `\s+`                     @skip
    STRING `"((?:[^"\\]|\\.)*)"`     @1
    NUMBER `[0-9]+(?:\.[0-9]+)?`
    CONST  `true|false|null`
.end
.rules @{start:Json}
    Json:   = Value => v ;
    Value:  @{merge} = Object | Array | STRING | NUMBER | CONST ;
    Object: = '{' [ Member ( ',' Member )* ] '}' ;
    Member: = STRING ':' Value => key _ val ;
    Array:  = '[' [ Value ( ',' Value )* ] ']' ;
.end
"#;

#[test]
fn json_grammar_compiles() {
    let code = Code::from(JSON_GRAMMAR);
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let source = Generator::new(Verbosity::Error)
        .compile_with_sink(&code, &mut sink)
        .unwrap();

    for name in ["json", "value", "object", "member", "array"] {
        assert!(source.contains(&format!("fn is_{}(", name)), "missing is_{}", name);
        assert!(
            source.contains(&format!("fn match_{}(", name)),
            "missing match_{}",
            name
        );
    }
    assert!(source.contains(r#"const DEFAULT_START: Option<&str> = Some("Json");"#));
    assert!(source.contains(r#""Json" => parser.match_json(),"#));
    assert!(sink
        .entries_of(Verbosity::Success)
        .iter()
        .any(|d| d.message.contains("Generated a parser")));
}

#[test]
fn model_tree_prints() {
    let code = Code::from(JSON_GRAMMAR);
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let lexemes = GrammarLexer::new(&code).tokenize(&mut sink);
    let grammar = GrammarParser::new(lexemes).parse(&mut sink);
    Resolver::new(&grammar).resolve(&mut sink).unwrap();

    grammar.print().unwrap();
    assert_eq!(grammar.rules.len(), 5);
    assert_eq!(grammar.literals.len(), 6);
}

#[test]
fn emitted_source_is_deterministic() {
    let code = Code::from(JSON_GRAMMAR);
    let first = Generator::new(Verbosity::Error).compile(&code).unwrap();
    let second = Generator::new(Verbosity::Error).compile(&code).unwrap();
    assert_eq!(first, second);
}

#[test]
fn emitted_nodes_follow_the_ast_contract() {
    let code = Code::from(JSON_GRAMMAR);
    let source = Generator::new(Verbosity::Error).compile(&code).unwrap();
    // every node the runtime builds carries `kind` and 1-based `lc`; token nodes add `value`
    assert!(source.contains(r#""kind": spec.name"#));
    assert!(source.contains(r#""lc": [node_line, node_col]"#));
    assert!(source.contains(r#""value": value"#));

    // the documented shape for `N: = INT => v ;` over "   42   "
    let example: serde_json::Value =
        serde_json::from_str(r#"{"kind":"N","lc":[1,4],"v":"42"}"#).unwrap();
    assert_eq!(example["kind"], "N");
    assert_eq!(example["lc"][0], 1);
    assert_eq!(example["lc"][1], 4);
    assert_eq!(example["v"], "42");
}

#[test]
fn emitted_source_carries_the_dependency_note() {
    let code = Code::from(JSON_GRAMMAR);
    let source = Generator::new(Verbosity::Error).compile(&code).unwrap();
    assert!(source.starts_with("// Generated by gram-gen"));
    assert!(source.contains("//     regex = \"1\""));
    assert!(source.contains("//     serde_json = \"1\""));
}
