//! Fixed source text shared by every emitted parser.
//!
//! The emitted file is assembled as: header + table types + generated tables + [RUNTIME] +
//! generated token/group helpers + generated rule helpers + [ENTRY_HEAD] + generated dispatch
//! arms + [ENTRY_TAIL]. The runtime owns the cursor, the skip routine, the scope stack, the
//! leveled diagnostics and the JSON node plumbing; everything grammar-specific is generated.

/// Type definitions the generated tables are written against.
pub(super) const TABLE_TYPES: &str = r##"
// ---- token tables -----------------------------------------------------

#[derive(Clone, Copy)]
enum PathRule {
    RelFile,
    AbsFile,
    RelDir,
    AbsDir,
    EnsureRel,
    EnsureAbs,
}

struct TokenSpec {
    name: &'static str,
    pattern: &'static str,
    group: usize,
    skip: bool,
    class: Option<&'static str>,
    load: bool,
    path: Option<PathRule>,
}
"##;

pub(super) const RUNTIME: &str = r##"
// ---- runtime ----------------------------------------------------------

const VERBOSITY_LABELS: &[&str] = &[
    "error", "warning", "success", "debug1", "info", "debug2", "debug3", "all",
];

fn verbosity_order(label: &str) -> Option<usize> {
    VERBOSITY_LABELS.iter().position(|known| *known == label)
}

fn excluded(index: usize, text: &str, groups_exact: &[Vec<Regex>]) -> bool {
    EXCLUSIONS[index]
        .iter()
        .any(|group| groups_exact[*group].iter().any(|member| member.is_match(text)))
}

fn token_shaped(value: &Value) -> bool {
    match value.as_object() {
        Some(fields) => {
            fields.len() == 3
                && fields.contains_key("kind")
                && fields.contains_key("lc")
                && fields.contains_key("value")
        }
        None => false,
    }
}

// A token-shaped node collapses to its value when captured.
fn reduce(value: Value) -> Value {
    if token_shaped(&value) {
        value["value"].clone()
    } else {
        value
    }
}

fn set_field(node: &mut Value, key: &str, value: Value) {
    if let Some(fields) = node.as_object_mut() {
        fields.insert(key.to_string(), reduce(value));
    }
}

// The array is created on the first append so an empty list never shadows `key`.
fn push_field(node: &mut Value, key: &str, value: Value) {
    if let Some(fields) = node.as_object_mut() {
        let entry = fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Some(list) = entry.as_array_mut() {
            list.push(reduce(value));
        }
    }
}

type Checkpoint = (usize, usize, usize, usize);

struct Parser {
    src: String,
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<Regex>,
    groups_prefix: Vec<Vec<Regex>>,
    groups_exact: Vec<Vec<Regex>>,
    literals: Vec<Regex>,
    scopes: Vec<Map<String, Value>>,
    verbosity: Vec<usize>,
    classes: Vec<(usize, usize, String)>,
    class_stack: Vec<String>,
    source_dir: PathBuf,
}

impl Parser {
    fn new(src: String, source_dir: PathBuf, verbosity: usize) -> Parser {
        let tokens = TOKENS
            .iter()
            .map(|spec| Regex::new(&format!("^(?:{})", spec.pattern)).expect(spec.name))
            .collect();
        let groups_prefix = GROUPS
            .iter()
            .map(|(name, members)| {
                members
                    .iter()
                    .map(|member| Regex::new(&format!("^(?:{})", member)).expect(name))
                    .collect()
            })
            .collect();
        let groups_exact = GROUPS
            .iter()
            .map(|(name, members)| {
                members
                    .iter()
                    .map(|member| Regex::new(&format!("^(?:{})$", member)).expect(name))
                    .collect()
            })
            .collect();
        let literals = LITERALS
            .iter()
            .map(|pattern| Regex::new(&format!("^(?:{})", pattern)).expect(pattern))
            .collect();
        Parser {
            src,
            pos: 0,
            line: 1,
            col: 1,
            tokens,
            groups_prefix,
            groups_exact,
            literals,
            scopes: Vec::new(),
            verbosity: vec![verbosity],
            classes: Vec::new(),
            class_stack: Vec::new(),
            source_dir,
        }
    }

    // ---- cursor -------------------------------------------------------

    fn checkpoint(&self) -> Checkpoint {
        (self.pos, self.line, self.col, self.classes.len())
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
        self.line = checkpoint.1;
        self.col = checkpoint.2;
        self.classes.truncate(checkpoint.3);
    }

    fn advance(&mut self, length: usize) {
        for byte in self.src.as_bytes()[self.pos..self.pos + length].iter() {
            if *byte == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos += length;
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    // Consume every skip-token match at the cursor.
    fn skip(&mut self) {
        loop {
            let mut consumed = false;
            for (index, spec) in TOKENS.iter().enumerate() {
                if !spec.skip {
                    continue;
                }
                let end = self.tokens[index].find(self.rest()).map(|found| found.end());
                if let Some(end) = end {
                    self.advance(end);
                    consumed = true;
                    break;
                }
            }
            if !consumed {
                return;
            }
        }
    }

    // ---- diagnostics --------------------------------------------------

    fn admits(&self, level: usize) -> bool {
        self.verbosity.last().map_or(false, |top| *top >= level)
    }

    fn diag(&self, level: usize, message: &str) {
        if self.admits(level) {
            eprintln!("[{}] {}", VERBOSITY_LABELS[level], message);
        }
    }

    fn fail(&self, message: String) -> ! {
        eprintln!("SyntaxError: {} @ {}:{}", message, self.line, self.col);
        process::exit(1)
    }

    fn push_verbosity(&mut self, level: usize) {
        self.verbosity.push(level);
    }

    fn pop_verbosity(&mut self) {
        if self.verbosity.len() > 1 {
            self.verbosity.pop();
        }
    }

    // ---- tokens -------------------------------------------------------

    fn try_token(&mut self, index: usize) -> Option<Value> {
        let spec = &TOKENS[index];
        let (end, text, value) = {
            let captures = self.tokens[index].captures(self.rest())?;
            let whole = captures.get(0)?;
            let value = captures
                .get(spec.group)
                .map(|group| group.as_str().to_string())
                .unwrap_or_default();
            (whole.end(), whole.as_str().to_string(), value)
        };
        if excluded(index, &text, &self.groups_exact) {
            return None;
        }
        let start_pos = self.pos;
        let node_line = self.line;
        let node_col = self.col;
        self.advance(end);
        let tag = spec
            .class
            .map(|tag| tag.to_string())
            .or_else(|| self.class_stack.last().cloned());
        if let Some(tag) = tag {
            self.classes.push((start_pos, self.pos, tag));
        }
        let value = self.apply_path_rule(spec, value);
        let mut node = json!({
            "kind": spec.name,
            "lc": [node_line, node_col],
            "value": value,
        });
        if spec.load {
            self.load_and_parse(&mut node);
        }
        self.diag(6, &format!("matched token {}", spec.name));
        Some(node)
    }

    fn is_token(&mut self, index: usize) -> bool {
        let checkpoint = self.checkpoint();
        self.skip();
        let matched = match self.tokens[index].find(self.rest()) {
            Some(found) => !excluded(index, found.as_str(), &self.groups_exact),
            None => false,
        };
        self.restore(checkpoint);
        matched
    }

    fn match_token(&mut self, index: usize) -> Option<Value> {
        let checkpoint = self.checkpoint();
        self.skip();
        match self.try_token(index) {
            Some(node) => Some(node),
            None => {
                self.restore(checkpoint);
                None
            }
        }
    }

    fn expect_token(&mut self, index: usize) -> Value {
        match self.match_token(index) {
            Some(node) => node,
            None => {
                self.skip();
                self.fail(format!("Expected token {}.", TOKENS[index].name))
            }
        }
    }

    fn apply_path_rule(&self, spec: &TokenSpec, value: String) -> String {
        let rule = match spec.path {
            Some(rule) => rule,
            None => return value,
        };
        let path = PathBuf::from(&value);
        match rule {
            PathRule::EnsureRel => {
                if path.is_absolute() {
                    self.fail(format!("'{}' must be a relative path.", value));
                }
                value
            }
            PathRule::EnsureAbs => {
                if path.is_relative() {
                    self.fail(format!("'{}' must be an absolute path.", value));
                }
                value
            }
            PathRule::RelFile | PathRule::RelDir => {
                let resolved = if path.is_absolute() {
                    path
                } else {
                    self.source_dir.join(path)
                };
                resolved.to_string_lossy().into_owned()
            }
            PathRule::AbsFile | PathRule::AbsDir => {
                let resolved = if path.is_absolute() {
                    path
                } else {
                    self.source_dir.join(path)
                };
                match fs::canonicalize(&resolved) {
                    Ok(canonical) => canonical.to_string_lossy().into_owned(),
                    Err(_) => resolved.to_string_lossy().into_owned(),
                }
            }
        }
    }

    // Load the file a @loadandparse token points at and parse it with the default start rule.
    fn load_and_parse(&self, node: &mut Value) {
        let start = match DEFAULT_START {
            Some(start) => start,
            None => self.fail("No default start rule for @loadandparse.".to_string()),
        };
        let value = node["value"].as_str().unwrap_or("").to_string();
        let path = self.source_dir.join(&value);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => self.fail(format!("Cannot load {}: {}", path.display(), err)),
        };
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        let level = self.verbosity.first().copied().unwrap_or(0);
        let sub = Parser::new(text, dir, level);
        match parse(sub, start) {
            Some(ast) => {
                if let Some(fields) = node.as_object_mut() {
                    fields.insert("ast".to_string(), ast);
                }
            }
            None => self.fail(format!("{} does not parse as {}.", path.display(), start)),
        }
    }

    // ---- token groups -------------------------------------------------

    fn try_group(&mut self, index: usize) -> Option<Value> {
        let (end, text) = self.groups_prefix[index]
            .iter()
            .find_map(|member| member.find(self.rest()))
            .map(|found| (found.end(), found.as_str().to_string()))?;
        let node = json!({
            "kind": GROUPS[index].0,
            "lc": [self.line, self.col],
            "value": text,
        });
        self.advance(end);
        Some(node)
    }

    fn is_group(&mut self, index: usize) -> bool {
        let checkpoint = self.checkpoint();
        self.skip();
        let matched = self.groups_prefix[index]
            .iter()
            .any(|member| member.is_match(self.rest()));
        self.restore(checkpoint);
        matched
    }

    fn match_group(&mut self, index: usize) -> Option<Value> {
        let checkpoint = self.checkpoint();
        self.skip();
        match self.try_group(index) {
            Some(node) => Some(node),
            None => {
                self.restore(checkpoint);
                None
            }
        }
    }

    fn expect_group(&mut self, index: usize) -> Value {
        match self.match_group(index) {
            Some(node) => node,
            None => {
                self.skip();
                self.fail(format!("Expected one of group {}.", GROUPS[index].0))
            }
        }
    }

    // ---- inline literals ----------------------------------------------

    fn try_lit(&mut self, index: usize) -> Option<Value> {
        let (end, text) = self.literals[index]
            .find(self.rest())
            .map(|found| (found.end(), found.as_str().to_string()))?;
        let node = json!({
            "kind": "LITERAL",
            "lc": [self.line, self.col],
            "value": text,
        });
        self.advance(end);
        Some(node)
    }

    fn is_lit(&mut self, index: usize) -> bool {
        let checkpoint = self.checkpoint();
        self.skip();
        let matched = self.literals[index].is_match(self.rest());
        self.restore(checkpoint);
        matched
    }

    fn match_lit(&mut self, index: usize) -> Option<Value> {
        let checkpoint = self.checkpoint();
        self.skip();
        match self.try_lit(index) {
            Some(node) => Some(node),
            None => {
                self.restore(checkpoint);
                None
            }
        }
    }

    fn expect_lit(&mut self, index: usize) -> Value {
        match self.match_lit(index) {
            Some(node) => node,
            None => {
                self.skip();
                self.fail(format!("Expected `{}`.", LITERALS[index]))
            }
        }
    }

    // ---- node assembly ------------------------------------------------

    fn new_node(&self, kind: &str) -> Value {
        json!({ "kind": kind, "lc": [self.line, self.col] })
    }

    fn project(&self, value: Value, field: &str) -> Value {
        match value.as_object() {
            Some(fields) => match fields.get(field) {
                Some(projected) => projected.clone(),
                None => self.fail(format!("Missing field '{}' on matched node.", field)),
            },
            None => self.fail(format!(
                "Cannot project field '{}' from a non-node value.",
                field
            )),
        }
    }

    // A merge-directive sub-match folds into the enclosing node: its kind replaces the
    // enclosing kind; a token-shaped sub-match lands under the capture name, other fields are
    // copied across; the sub-node itself is not stored.
    fn merge_into(&self, node: &mut Value, sub: Value, capture: Option<&str>) {
        let sub_fields = match sub.as_object() {
            Some(fields) => fields.clone(),
            None => {
                if let (Some(capture), Some(fields)) = (capture, node.as_object_mut()) {
                    fields.insert(capture.to_string(), sub);
                }
                return;
            }
        };
        let shaped = token_shaped(&sub);
        if let Some(fields) = node.as_object_mut() {
            if let Some(kind) = sub_fields.get("kind") {
                fields.insert("kind".to_string(), kind.clone());
            }
            if shaped {
                if let Some(capture) = capture {
                    fields.insert(capture.to_string(), sub_fields["value"].clone());
                }
            } else {
                for (key, value) in sub_fields.iter() {
                    if key != "kind" && key != "lc" {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }

    // ---- scopes -------------------------------------------------------

    fn push_scope(&mut self) {
        self.scopes.push(Map::new());
    }

    fn pop_scope_into(&mut self, node: &mut Value, key: &str) {
        let scope = self.scopes.pop().unwrap_or_default();
        if let Some(fields) = node.as_object_mut() {
            fields.insert(key.to_string(), Value::Object(scope));
        }
    }

    fn declare(&mut self, node: &Value, key: &str) {
        let name = match node.get(key).and_then(|value| value.as_str()) {
            Some(name) => name.to_string(),
            None => self.fail(format!("declare:{} requires a string field.", key)),
        };
        if self.scopes.is_empty() {
            self.fail(format!("declare:{} outside any scope.", key));
        }
        let duplicate = self
            .scopes
            .last()
            .map_or(false, |top| top.contains_key(&name));
        if duplicate {
            self.fail(format!("Duplicate identifier '{}'.", name));
        }
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name, node.clone());
        }
    }

    // ---- classifications ----------------------------------------------

    fn push_class(&mut self, tag: &str) {
        self.class_stack.push(tag.to_string());
    }

    fn pop_class(&mut self) {
        self.class_stack.pop();
    }

    // Rewrite the classification of every token consumed since the mark.
    fn reclassify_from(&mut self, mark: usize, tag: &str) {
        for record in self.classes.iter_mut().skip(mark) {
            record.2 = tag.to_string();
        }
    }

    // Rewrite the classification of the most recently consumed classified token.
    fn retro_class(&mut self, tag: &str) {
        if let Some(record) = self.classes.last_mut() {
            record.2 = tag.to_string();
        }
    }
}
"##;

pub(super) const ENTRY_HEAD: &str = r##"
// ---- entry point ------------------------------------------------------

fn parse(mut parser: Parser, start: &str) -> Option<Value> {
    let result = match start {
"##;

pub(super) const ENTRY_TAIL: &str = r##"        _ => {
            eprintln!("Unknown start rule '{}'.", start);
            process::exit(2);
        }
    };
    if result.is_some() {
        parser.skip();
        if parser.pos != parser.src.len() {
            parser.fail("Unexpected trailing input.".to_string());
        }
        if parser.admits(5) {
            for (from, to, tag) in &parser.classes {
                eprintln!("[debug2] classify {}..{} as {}", from, to, tag);
            }
        }
    }
    result
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut source_path: Option<String> = None;
    let mut out_path: Option<String> = None;
    let mut start: Option<String> = DEFAULT_START.map(|name| name.to_string());
    let mut verbosity = 0;
    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--out" => {
                index += 1;
                out_path = args.get(index).cloned();
            }
            "--start" => {
                index += 1;
                start = args.get(index).cloned();
            }
            "-v" | "--verbosity" => {
                index += 1;
                verbosity = match args.get(index).and_then(|label| verbosity_order(label)) {
                    Some(order) => order,
                    None => {
                        eprintln!("Unknown verbosity level.");
                        process::exit(2);
                    }
                };
            }
            other if source_path.is_none() => source_path = Some(other.to_string()),
            other => {
                eprintln!("Unexpected argument '{}'.", other);
                process::exit(2);
            }
        }
        index += 1;
    }
    let (source_path, out_path, start) = match (source_path, out_path, start) {
        (Some(source_path), Some(out_path), Some(start)) => (source_path, out_path, start),
        _ => {
            eprintln!("Usage: parser <source_path> --out <ast_path> --start <RuleName> [-v LEVEL]");
            process::exit(2);
        }
    };
    let text = match fs::read_to_string(&source_path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Cannot read {}: {}", source_path, err);
            process::exit(1);
        }
    };
    let source_file = PathBuf::from(&source_path);
    let source_dir = source_file.parent().map(PathBuf::from).unwrap_or_default();
    let parser = Parser::new(text, source_dir, verbosity);
    if let Some(ast) = parse(parser, &start) {
        let pretty = serde_json::to_string_pretty(&ast).unwrap_or_default();
        if let Err(err) = fs::write(&out_path, pretty) {
            eprintln!("Cannot write {}: {}", out_path, err);
            process::exit(1);
        }
    }
}
"##;
