use crate::{Code, DiagnosticSink, Generator, Pass, Verbosity};

fn generate(text: &str) -> String {
    let code = Code::from(text);
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    match Generator::new(Verbosity::Error).compile_with_sink(&code, &mut sink) {
        Ok(source) => source,
        Err(err) => panic!("{}: {:?}", err, sink.entries_of(Verbosity::Error)),
    }
}

/// The body of one emitted function, for assertions scoped to a single helper.
fn function_body<'s>(source: &'s str, header: &str) -> &'s str {
    let start = source
        .find(header)
        .unwrap_or_else(|| panic!("missing '{}'", header));
    let end = source[start..]
        .find("\n    }")
        .map(|offset| start + offset)
        .unwrap_or(source.len());
    &source[start..end]
}

#[test]
fn tokens_and_skip() {
    let source = generate(
        r#"
.token
    WS  `\s+`    @skip
    INT `[0-9]+`
.end
.rules
    N: = INT => v ;
.end
"#,
    );
    assert!(source.contains(r#"TokenSpec { name: "WS", pattern: "\\s+", group: 0, skip: true"#));
    assert!(source.contains("const T_INT: usize = 1;"));
    assert!(source.contains("fn is_n(&mut self) -> bool"));
    assert!(source.contains("let v0 = self.expect_int();"));
    assert!(source.contains(r#"set_field(&mut node, "v", v0);"#));
    assert!(source.contains(r#"let mut node = self.new_node("N");"#));
    // the generated parser is a complete program
    assert!(source.contains("fn main()"));
    assert!(source.contains("fn parse(mut parser: Parser, start: &str)"));
}

#[test]
fn exclusion_against_keyword_group() {
    let source = generate(
        r#"
.token
    WORD `[a-zA-Z]+` ^KEYWORD
.end
.token: KEYWORD
    'if'
    'else'
.end
.rules
    N: = WORD => w ;
.end
"#,
    );
    assert!(source.contains(r#"("KEYWORD", &["if", "else"]),"#));
    assert!(source.contains("static EXCLUSIONS: &[&[usize]] = &[\n    &[0],\n];"));
    assert!(source.contains("const G_KEYWORD: usize = 0;"));
}

#[test]
fn key_reduction() {
    let source = generate(
        r#"
.token
    WS  `\s+` @skip
    INT `[0-9]+`
.end
.rules
    Operand: = INT => v ;
    Op: @{key:left} = Operand ( '+' Operand )* => left ( _ right ) ;
.end
"#,
    );
    let finish = function_body(&source, "fn finish_op(");
    assert!(finish.contains(r#"fields.len() == 3 && fields.contains_key("left")"#));
    assert!(finish.contains(r#"return fields["left"].clone();"#));
    // the repeated tail lowers to a look-ahead guarded loop
    assert!(source.contains("while self.is_lit(0) {"));
}

#[test]
fn optional_group_commits_hard() {
    let source = generate(
        r#"
.token
    WS  `\s+` @skip
    INT `[0-9]+`
.end
.rules
    E: = [ '=' INT ] => ( _ v ) ;
.end
"#,
    );
    let body = function_body(&source, "fn match_e(");
    // entered on the first item's look-ahead only
    assert!(body.contains("if self.is_lit(0) {"));
    // past the first item everything is required: a mismatch is fatal, not a no-match
    assert!(body.contains("self.expect_lit(0);"));
    assert!(body.contains("let v0 = self.expect_int();"));
}

#[test]
fn scope_and_declare() {
    let source = generate(
        r#"
.token
    WS   `\s+`    @skip
    WORD `[a-z]+`
.end
.rules
    Block: @{scope:names} = Let+ => *stmts ;
    Let: @{declare:name} = 'let' WORD ';' => _ name.value _ ;
.end
"#,
    );
    assert!(source.contains("self.push_scope();"));
    assert!(source.contains(r#"self.pop_scope_into(&mut node, "names");"#));
    assert!(source.contains(r#"self.declare(&node, "name");"#));
    assert!(source.contains(r#"let v0 = self.project(v0, "value");"#));
    assert!(source.contains(r#"push_field(&mut node, "stmts", v0);"#));
}

#[test]
fn merge_folds_into_the_enclosing_node() {
    let source = generate(
        r#"
.token
    WS      `\s+` @skip
    FLOAT   `[0-9]+\.[0-9]+`
    INTEGER `[0-9]+`
.end
.rules
    Number: @{merge} = FLOAT | INTEGER ;
    Expr: = Number => val ;
.end
"#,
    );
    // merge rules pass their single sub-match through unwrapped
    let number = function_body(&source, "fn match_number(");
    assert!(number.contains("return Some(self.expect_float());"));
    assert!(number.contains("return Some(self.expect_integer());"));
    // and fold into the capturing node at the capture site
    assert!(source.contains(r#"self.merge_into(&mut node, v0, Some("val"));"#));
}

#[test]
fn list_capture_of_a_merge_rule_accumulates_per_iteration() {
    // The resolver rejects this combination outright; the emitter must still lower it to a
    // fresh node per iteration so a directly emitted parser appends instead of clobbering
    // the enclosing node.
    let code = Code::from(
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
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let lexemes = crate::lexeme::GrammarLexer::new(&code).tokenize(&mut sink);
    let grammar = crate::parsing::GrammarParser::new(lexemes).parse(&mut sink);
    assert!(crate::resolver::Resolver::new(&grammar)
        .resolve(&mut sink)
        .is_err());

    let source = crate::generate::emit(&grammar, &mut sink).unwrap();
    let body = function_body(&source, "fn match_list(");
    assert!(body.contains(r#"let mut v0 = self.new_node("LIST");"#));
    assert!(body.contains(r#"self.merge_into(&mut v0, v1, Some("value"));"#));
    assert!(body.contains(r#"push_field(&mut node, "nums", v0);"#));
    // the enclosing node is never the merge target
    assert!(!body.contains("self.merge_into(&mut node,"));
}

#[test]
fn multiplicity_lowering() {
    let source = generate(
        r#"
.token
    A `a`
    B `b`
    C `c`
.end
.rules
    N: = A? B* C+ ;
.end
"#,
    );
    let body = function_body(&source, "fn match_n(");
    assert!(body.contains("if self.is_a() {"));
    assert!(body.contains("while self.is_b() {"));
    assert!(body.contains("self.expect_c();"));
    assert!(body.contains("while self.is_c() {"));
}

#[test]
fn alternative_group_dispatch() {
    let source = generate(
        r#"
.token
    A `a`
    B `b`
.end
.rules
    N: = ( A | B )+ ;
.end
"#,
    );
    let body = function_body(&source, "fn match_n(");
    assert!(body.contains("} else if self.is_b() {"));
    assert!(body.contains("Expected one of the alternatives"));
    assert!(body.contains("while self.is_a() || self.is_b() {"));
}

#[test]
fn look_ahead_never_consumes() {
    let source = generate(
        r#"
.token
    A `a`
    B `b`
.end
.rules
    Inner: = A ;
    Outer: = Inner B ;
.end
"#,
    );
    // is_* bodies are FIRST-set disjunctions over token tests only
    let inner = function_body(&source, "fn is_inner(");
    let outer = function_body(&source, "fn is_outer(");
    assert!(!inner.contains("match_"));
    assert!(!outer.contains("match_"));
    assert!(outer.contains("self.is_a()"));
}

#[test]
fn verbosity_and_classification_attributes() {
    let source = generate(
        r#"
.token
    WORD `[a-z]+`
.end
.rules
    Name: @{verbosity:debug1, classify:name.entity} = WORD ;
.end
"#,
    );
    assert!(source.contains("self.push_verbosity(3);"));
    assert!(source.contains(r#"self.push_class("name.entity");"#));
    assert!(source.contains("self.pop_verbosity();"));
    assert!(source.contains("self.pop_class();"));
    // a single-token definition pins the classification onto the token itself
    assert!(source.contains(r#"class: Some("name.entity")"#));
}

#[test]
fn flip_reparents_the_captured_child() {
    let source = generate(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: @{key:k, flip:p} = INT INT => k p ;
.end
"#,
    );
    let finish = function_body(&source, "fn finish_n(");
    assert!(finish.contains(r#"fields.remove("p")"#));
    assert!(finish.contains("return child;"));
}

#[test]
fn default_start_and_dispatch() {
    let source = generate(
        r#"
.token
    INT `[0-9]+`
.end
.rules @{start:Program}
    Program: = INT => v ;
.end
"#,
    );
    assert!(source.contains(r#"const DEFAULT_START: Option<&str> = Some("Program");"#));
    assert!(source.contains(r#""Program" => parser.match_program(),"#));
}

#[test]
fn bad_grammar_aborts_with_the_failing_pass() {
    let code = Code::from(
        r#"
.token
    INT `[0-9]+`
.end
.rules
    N: = MISSING => v ;
.end
"#,
    );
    let err = Generator::new(Verbosity::Error)
        .compile(&code)
        .expect_err("unresolved reference must abort");
    assert_eq!(err.pass, Pass::Resolution);
    assert_eq!(err.count, 1);
}
