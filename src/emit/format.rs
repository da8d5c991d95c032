//! Rust formatting utilities for code emission.
//!
//! Provides string escaping, identifier conversion, and indentation management.

use inflector::Inflector;

use crate::model::LangType;

/// Rust keywords that need a raw identifier (`r#...`) when used as names.
const RUST_RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers at all.
const RUST_UNRAWABLE: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Escape a string for use in a Rust string literal.
#[must_use]
pub fn escape_rust_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            c => result.push(c),
        }
    }
    result
}

/// Check if a string is a valid (non-raw) Rust identifier.
#[must_use]
pub fn is_valid_rust_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[must_use]
pub fn is_rust_reserved(s: &str) -> bool {
    RUST_RESERVED.contains(&s)
}

/// Strip anything that cannot appear in an identifier, collapsing runs into
/// a single space so case conversion sees word boundaries.
fn identifier_words(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_gap = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_gap && !out.is_empty() {
                out.push(' ');
            }
            out.push(c);
            pending_gap = false;
        } else {
            pending_gap = true;
        }
    }
    out
}

/// Convert a database name to a snake_case Rust value identifier.
///
/// `@UserId` becomes `user_id`, `type` becomes `r#type`, and names that
/// start with a digit get a leading underscore.
#[must_use]
pub fn field_ident(name: &str) -> String {
    let mut ident = identifier_words(name).to_snake_case();
    if ident.is_empty() {
        ident.push_str("value");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RUST_UNRAWABLE.contains(&ident.as_str()) {
        ident.push('_');
    } else if is_rust_reserved(&ident) {
        ident.insert_str(0, "r#");
    }
    ident
}

/// Convert a database name to a PascalCase Rust type identifier.
#[must_use]
pub fn type_ident(name: &str) -> String {
    let mut ident = identifier_words(name).to_pascal_case();
    if ident.is_empty() {
        ident.push_str("Unnamed");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if ident == "Self" {
        ident.push('_');
    }
    ident
}

/// Quote a string literal with double quotes.
#[must_use]
pub fn quote_string(s: &str) -> String {
    format!("\"{}\"", escape_rust_string(s))
}

/// The Rust type emitted for a language type.
#[must_use]
pub fn rust_type(ty: LangType) -> &'static str {
    match ty {
        LangType::String => "String",
        LangType::Int => "i32",
        LangType::Long => "i64",
        LangType::Short => "i16",
        LangType::Byte => "u8",
        LangType::Bool => "bool",
        LangType::Decimal => "rust_decimal::Decimal",
        LangType::Double => "f64",
        LangType::Float => "f32",
        LangType::DateTime => "chrono::NaiveDateTime",
        LangType::Date => "chrono::NaiveDate",
        LangType::Time => "chrono::NaiveTime",
        LangType::Guid => "uuid::Uuid",
        LangType::Bytes => "Vec<u8>",
        LangType::Json | LangType::Object => "serde_json::Value",
    }
}

/// `T` or `Option<T>` depending on nullability.
#[must_use]
pub fn nullable(ty: &str, is_nullable: bool) -> String {
    if is_nullable {
        format!("Option<{}>", ty)
    } else {
        ty.to_string()
    }
}

/// Indentation style for emitted Rust.
#[derive(Debug, Clone)]
pub enum Indent {
    Tabs,
    Spaces(usize),
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(4)
    }
}

impl Indent {
    #[must_use]
    pub fn to_string_owned(&self) -> String {
        match self {
            Indent::Tabs => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(*n),
        }
    }
}

/// A writer that manages indentation for Rust output.
pub struct IndentWriter {
    buffer: String,
    indent_str: String,
    current_indent: usize,
    at_line_start: bool,
}

impl IndentWriter {
    #[must_use]
    pub fn new(indent: Indent) -> Self {
        Self {
            buffer: String::new(),
            indent_str: indent.to_string_owned(),
            current_indent: 0,
            at_line_start: true,
        }
    }

    pub fn indent(&mut self) {
        self.current_indent += 1;
    }

    pub fn dedent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(1);
    }

    fn write_indent_if_needed(&mut self) {
        if self.at_line_start && self.current_indent > 0 {
            for _ in 0..self.current_indent {
                self.buffer.push_str(&self.indent_str);
            }
            self.at_line_start = false;
        }
    }

    /// Write a complete line (with newline at end).
    pub fn write_line(&mut self, s: &str) {
        self.write_indent_if_needed();
        self.buffer.push_str(s);
        self.buffer.push('\n');
        self.at_line_start = true;
    }

    /// Write inline content (no automatic newline).
    pub fn write_inline(&mut self, s: &str) {
        self.write_indent_if_needed();
        self.buffer.push_str(s);
        self.at_line_start = false;
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
        self.at_line_start = true;
    }

    pub fn write_comment(&mut self, comment: &str) {
        self.write_line(&format!("// {}", comment));
    }

    pub fn write_doc(&mut self, doc: &str) {
        self.write_line(&format!("/// {}", doc));
    }

    /// Write `open`, run `body` one level deeper, then write `close`.
    pub fn block(&mut self, open: &str, close: &str, body: impl FnOnce(&mut Self)) {
        self.write_line(open);
        self.indent();
        body(self);
        self.dedent();
        self.write_line(close);
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl Default for IndentWriter {
    fn default() -> Self {
        Self::new(Indent::default())
    }
}
