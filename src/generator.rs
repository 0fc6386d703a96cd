//! # Artifact Generation
//!
//! Turns a cached schema document into a Rust source file with `serde`
//! types describing it. The sync loop treats generation as best-effort: a
//! failed or missing artifact is regenerated on the next change, while the
//! cached schema itself is the authoritative record.
//!
//! ## Inference
//!
//! The generator walks the example JSON once and infers a shape for every
//! value:
//!
//! - objects become structs named after their key in UpperCamelCase,
//! - arrays become `Vec<T>` where `T` is the merge of every element's shape,
//! - integers become `i64`, other numbers `f64`,
//! - `null`, and fields missing from some array elements, become `Option<T>`,
//! - values whose shapes cannot be merged fall back to `serde_json::Value`.
//!
//! Field names are converted to snake_case with a `#[serde(rename)]`
//! attribute whenever the identifier differs from the JSON key.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use heck::{ToSnakeCase, ToUpperCamelCase};
use serde_json::Value;

use crate::error::{Error, Result};

/// Produces a source artifact from an example document
pub trait ArtifactGenerator: Send + Sync {
    /// Generate `<type_name>.rs` inside `output_dir` from `example_json`.
    ///
    /// Returns the path of the written file.
    fn generate(
        &self,
        namespace: &str,
        type_name: &str,
        example_json: &str,
        output_dir: &Path,
    ) -> Result<PathBuf>;
}

/// Generates `serde` structs from example JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTypeGenerator;

impl ArtifactGenerator for RustTypeGenerator {
    fn generate(
        &self,
        namespace: &str,
        type_name: &str,
        example_json: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let source = render_module(namespace, type_name, example_json)?;
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}.rs", type_name));
        fs::write(&path, source)?;
        Ok(path)
    }
}

/// Render the full module text for `example_json`.
pub fn render_module(namespace: &str, type_name: &str, example_json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(example_json)?;
    let shape = Shape::infer(&value);
    if !matches!(shape, Shape::Object(_)) {
        return Err(Error::Generation {
            type_name: type_name.to_string(),
            message: "example document is not a JSON object".to_string(),
        });
    }

    let mut emitter = Emitter::default();
    emitter.reserve(RESERVED_TYPE_NAMES.iter().copied());
    emitter.reserve([type_name]);
    emitter.emit_struct(type_name, &shape);

    let mut out = String::new();
    let _ = writeln!(out, "//! Generated from the cached GetSchema result.");
    let _ = writeln!(out, "//! Namespace: {}", namespace);
    let _ = writeln!(out, "//!");
    let _ = writeln!(out, "//! Regenerated whenever the schema changes; do not edit by hand.");
    out.push('\n');
    out.push_str("use serde::{Deserialize, Serialize};\n");
    for item in emitter.structs {
        out.push('\n');
        out.push_str(&item);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    /// Element type of an empty array
    Unknown,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Nullable(Box<Shape>),
    Array(Box<Shape>),
    Object(Vec<Field>),
    Mixed,
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    key: String,
    shape: Shape,
    optional: bool,
}

impl Shape {
    fn infer(value: &Value) -> Shape {
        match value {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => Shape::Int,
            Value::Number(_) => Shape::Float,
            Value::String(_) => Shape::Str,
            Value::Array(items) => {
                let element = items
                    .iter()
                    .map(Shape::infer)
                    .fold(Shape::Unknown, Shape::merge);
                Shape::Array(Box::new(element))
            }
            Value::Object(map) => Shape::Object(
                map.iter()
                    .map(|(key, value)| Field {
                        key: key.clone(),
                        shape: Shape::infer(value),
                        optional: false,
                    })
                    .collect(),
            ),
        }
    }

    fn merge(self, other: Shape) -> Shape {
        match (self, other) {
            (Shape::Unknown, s) | (s, Shape::Unknown) => s,
            (Shape::Null, Shape::Null) => Shape::Null,
            (Shape::Null, s) | (s, Shape::Null) => s.nullable(),
            (Shape::Nullable(a), b) | (b, Shape::Nullable(a)) => (*a).merge(b).nullable(),
            (Shape::Int, Shape::Float) | (Shape::Float, Shape::Int) => Shape::Float,
            (Shape::Array(a), Shape::Array(b)) => Shape::Array(Box::new((*a).merge(*b))),
            (Shape::Object(a), Shape::Object(b)) => Shape::Object(merge_fields(a, b)),
            (a, b) if a == b => a,
            _ => Shape::Mixed,
        }
    }

    fn nullable(self) -> Shape {
        match self {
            Shape::Nullable(_) | Shape::Null => self,
            other => Shape::Nullable(Box::new(other)),
        }
    }
}

fn merge_fields(left: Vec<Field>, right: Vec<Field>) -> Vec<Field> {
    let mut right: Vec<Option<Field>> = right.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(left.len());

    for field in left {
        let partner = right
            .iter_mut()
            .find(|f| f.as_ref().is_some_and(|f| f.key == field.key))
            .and_then(Option::take);
        merged.push(match partner {
            Some(other) => Field {
                key: field.key,
                optional: field.optional || other.optional,
                shape: field.shape.merge(other.shape),
            },
            None => Field {
                optional: true,
                ..field
            },
        });
    }
    // Keys only present on the right side
    merged.extend(right.into_iter().flatten().map(|f| Field {
        optional: true,
        ..f
    }));
    merged
}

/// Names the generated module refers to; a struct with one of these names
/// would shadow it.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "String",
    "Option",
    "Vec",
    "Box",
    "Result",
    "Self",
    "Serialize",
    "Deserialize",
];

#[derive(Default)]
struct Emitter {
    structs: Vec<String>,
    used_names: HashSet<String>,
}

impl Emitter {
    fn reserve<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.used_names.extend(names.into_iter().map(str::to_string));
    }

    fn unique_name(&mut self, hint: &str) -> String {
        let mut base = hint.to_upper_camel_case();
        if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
            base = format!("T{}", base);
        }
        let name = next_free(&self.used_names, base, "");
        self.used_names.insert(name.clone());
        name
    }

    /// Emit the struct for an object shape under an exact name.
    fn emit_struct(&mut self, name: &str, shape: &Shape) {
        self.used_names.insert(name.to_string());
        let Shape::Object(fields) = shape else {
            return;
        };
        let slot = self.structs.len();
        self.structs.push(String::new());

        let mut idents = HashSet::new();
        let mut body = String::new();
        let _ = writeln!(body, "#[derive(Debug, Clone, Serialize, Deserialize)]");
        let _ = writeln!(body, "pub struct {} {{", name);
        for field in fields {
            let mut ident = field_ident(&field.key);
            if idents.contains(&ident) {
                // A suffixed raw identifier is no longer a keyword
                let base = ident.trim_start_matches("r#").to_string();
                ident = next_free(&idents, base, "_");
            }
            idents.insert(ident.clone());

            let mut ty = self.type_of(&field.key, &field.shape);
            if field.optional && !ty.starts_with("Option<") {
                ty = format!("Option<{}>", ty);
            }
            if ident.trim_start_matches("r#") != field.key {
                let _ = writeln!(body, "    #[serde(rename = {:?})]", field.key);
            }
            let _ = writeln!(body, "    pub {}: {},", ident, ty);
        }
        body.push_str("}\n");
        self.structs[slot] = body;
    }

    fn type_of(&mut self, hint: &str, shape: &Shape) -> String {
        match shape {
            Shape::Unknown | Shape::Mixed => "serde_json::Value".to_string(),
            Shape::Null => "Option<serde_json::Value>".to_string(),
            Shape::Bool => "bool".to_string(),
            Shape::Int => "i64".to_string(),
            Shape::Float => "f64".to_string(),
            Shape::Str => "String".to_string(),
            Shape::Nullable(inner) => format!("Option<{}>", self.type_of(hint, inner)),
            Shape::Array(inner) => format!("Vec<{}>", self.type_of(&singular(hint), inner)),
            Shape::Object(_) => {
                let name = self.unique_name(hint);
                self.emit_struct(&name, shape);
                name
            }
        }
    }
}

/// `base` if unused, otherwise the first of `base{sep}2`, `base{sep}3`, ...
/// that is.
fn next_free(used: &HashSet<String>, base: String, sep: &str) -> String {
    if !used.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}{}{}", base, sep, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{}y", stem)
    } else if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        format!("{}Item", word)
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

fn field_ident(key: &str) -> String {
    let mut ident = key.to_snake_case();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident = format!("field_{}", ident);
    }
    match ident.as_str() {
        // Not allowed as raw identifiers
        "self" | "super" | "crate" | "Self" => format!("{}_", ident),
        k if KEYWORDS.contains(&k) => format!("r#{}", ident),
        _ => ident,
    }
}
