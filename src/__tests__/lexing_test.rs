use crate::lexeme::{GrammarLexer, LexKind};
use crate::{Code, DiagnosticSink, Verbosity};

fn tokenize(text: &str) -> (Vec<(LexKind, String)>, DiagnosticSink) {
    let code = Code::from(text);
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let lexemes = GrammarLexer::new(&code).tokenize(&mut sink);
    (
        lexemes.into_iter().map(|l| (l.kind, l.text)).collect(),
        sink,
    )
}

#[test]
fn token_section_lexemes() {
    let (lexemes, sink) = tokenize(
        r#"
;; keywords of the toy language
.token
    WORD `[a-zA-Z]+` ^KEYWORD @2
.end
"#,
    );
    assert!(!sink.has_errors());
    assert_eq!(
        lexemes,
        vec![
            (LexKind::TokenSection, ".token".to_string()),
            (LexKind::UpperIdent, "WORD".to_string()),
            (LexKind::Regex, "[a-zA-Z]+".to_string()),
            (LexKind::Exclusion, "KEYWORD".to_string()),
            (LexKind::Decorator, "2".to_string()),
            (LexKind::SectionEnd, ".end".to_string()),
        ]
    );
}

#[test]
fn markers_only_at_line_start() {
    let (lexemes, sink) = tokenize("name.value");
    assert!(!sink.has_errors());
    assert_eq!(
        lexemes,
        vec![
            (LexKind::Ident, "name".to_string()),
            (LexKind::Dot, ".".to_string()),
            (LexKind::Ident, "value".to_string()),
        ]
    );
}

#[test]
fn arrow_and_equal() {
    let (lexemes, _) = tokenize("= =>");
    assert_eq!(
        lexemes,
        vec![
            (LexKind::Equal, "=".to_string()),
            (LexKind::Arrow, "=>".to_string()),
        ]
    );
}

#[test]
fn comments_are_blank() {
    let (lexemes, sink) = tokenize(
        ";; a line comment\n;* a block\ncomment *; | ; ;;tail",
    );
    assert!(!sink.has_errors());
    assert_eq!(
        lexemes,
        vec![
            (LexKind::Pipe, "|".to_string()),
            (LexKind::Semicolon, ";".to_string()),
        ]
    );
}

#[test]
fn string_literal_keeps_escapes_except_delimiter() {
    let (lexemes, sink) = tokenize(r"'don\'t' 'a\.b'");
    assert!(!sink.has_errors());
    assert_eq!(
        lexemes,
        vec![
            (LexKind::Str, "don't".to_string()),
            (LexKind::Str, r"a\.b".to_string()),
        ]
    );
}

#[test]
fn attribute_block_open() {
    let (lexemes, _) = tokenize("@{key:left}");
    assert_eq!(lexemes[0], (LexKind::AttrOpen, "@{".to_string()));
    assert_eq!(lexemes[1], (LexKind::Ident, "key".to_string()));
    assert_eq!(lexemes[2], (LexKind::Colon, ":".to_string()));
    assert_eq!(lexemes[3], (LexKind::Ident, "left".to_string()));
    assert_eq!(lexemes[4], (LexKind::CloseBrace, "}".to_string()));
}

#[test]
fn identifier_classification() {
    let (lexemes, _) = tokenize("NAME RgbColor RGBColor n _");
    assert_eq!(lexemes[0].0, LexKind::UpperIdent);
    assert_eq!(lexemes[1].0, LexKind::PascalIdent);
    // consecutive uppercase letters break strict PascalCase
    assert_eq!(lexemes[2].0, LexKind::Ident);
    assert_eq!(lexemes[3].0, LexKind::Ident);
    assert_eq!(lexemes[4].0, LexKind::Ident);
}

#[test]
fn unterminated_literals_are_reported() {
    let (_, sink) = tokenize("`abc");
    assert!(sink.has_errors());

    let (_, sink) = tokenize("'abc\n'");
    assert!(sink.has_errors());

    let (_, sink) = tokenize(";* never closed");
    assert!(sink.has_errors());
}

#[test]
fn positions_are_one_based() {
    let code = Code::from("\n  X");
    let mut sink = DiagnosticSink::new(Verbosity::Error);
    let lexemes = GrammarLexer::new(&code).tokenize(&mut sink);
    assert_eq!(lexemes[0].position.line, 2);
    assert_eq!(lexemes[0].position.column, 3);
}
