//! `@expand` token substitution.
//!
//! Tokens marked `@expand` may reference other tokens by name inside their regex source; each
//! reference is replaced by the referenced token's post-expansion pattern wrapped in a
//! non-capturing group. Expansion is a fixed point computed by recursion with memoization;
//! a cyclic reference is an error.

use crate::{DiagnosticSink, Grammar, Token};

/// A candidate name inside an expansion context: a maximal `[A-Z][A-Z0-9_]*` run of at least
/// two characters on word boundaries. Single letters pass through so character classes such as
/// `[A-Z]` keep their meaning.
const MIN_NAME_LEN: usize = 2;

pub(crate) fn expand_tokens(grammar: &Grammar, sink: &mut DiagnosticSink) {
    for token in &grammar.tokens {
        expand_token(grammar, token, &mut Vec::new(), sink);
    }
}

fn expand_token<'g>(
    grammar: &'g Grammar,
    token: &'g Token,
    visiting: &mut Vec<&'g str>,
    sink: &mut DiagnosticSink,
) -> String {
    if let Some(expanded) = token.expanded.get() {
        return expanded.clone();
    }
    if !token.is_expand() {
        let _ = token.expanded.set(token.pattern.clone());
        return token.pattern.clone();
    }
    if visiting.iter().any(|name| *name == token.name) {
        sink.error(
            format!(
                "Cyclic @expand reference: {} -> {}.",
                visiting.join(" -> "),
                token.name
            ),
            Some(token.position),
        );
        return token.pattern.clone();
    }

    visiting.push(&token.name);
    let pattern = token.pattern.as_str();
    let bytes = pattern.as_bytes();
    let mut result = String::new();
    let mut copied = 0;
    let mut index = 0;
    while index < bytes.len() {
        if !bytes[index].is_ascii_uppercase()
            || (index > 0 && is_word_byte(bytes[index - 1]))
        {
            index += 1;
            continue;
        }
        let mut end = index + 1;
        while end < bytes.len() && matches!(bytes[end], b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            end += 1;
        }
        let bounded = end >= bytes.len() || !is_word_byte(bytes[end]);
        if end - index >= MIN_NAME_LEN && bounded {
            let name = &pattern[index..end];
            match grammar.token(name) {
                Some(referenced) => {
                    result.push_str(&pattern[copied..index]);
                    result.push_str("(?:");
                    result.push_str(&expand_token(grammar, referenced, visiting, sink));
                    result.push(')');
                    copied = end;
                }
                None => {
                    sink.error(
                        format!(
                            "Unknown token name '{}' inside the regex of @expand token {}.",
                            name, token.name
                        ),
                        Some(token.position),
                    );
                }
            }
        }
        index = end;
    }
    result.push_str(&pattern[copied..]);
    visiting.pop();

    let _ = token.expanded.set(result.clone());
    result
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
