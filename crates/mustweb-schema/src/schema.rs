use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::error::SchemaError;
use crate::value::Value;

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    List(Box<FieldType>),
    /// String-keyed mapping with values of one type.
    Map(Box<FieldType>),
    Optional(Box<FieldType>),
    /// A nested data model; field paths may continue into it.
    Model(Schema),
    DateTime,
    Date,
    Uuid,
    Decimal,
    Enum(String),
    /// Untyped; any further path segment is accepted.
    Any,
    Other(String),
}

impl FieldType {
    /// The nested model reachable through this type, looking through `Optional`.
    pub fn model(&self) -> Option<&Schema> {
        match self {
            FieldType::Model(schema) => Some(schema),
            FieldType::Optional(inner) => inner.model(),
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::Optional(inner) => inner.is_any(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::Str => write!(f, "str"),
            FieldType::List(inner) => write!(f, "list[{inner}]"),
            FieldType::Map(inner) => write!(f, "map[str, {inner}]"),
            FieldType::Optional(inner) => write!(f, "{inner}?"),
            FieldType::Model(schema) => write!(f, "{}", schema.name()),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Date => write!(f, "date"),
            FieldType::Uuid => write!(f, "uuid"),
            FieldType::Decimal => write!(f, "decimal"),
            FieldType::Enum(name) => write!(f, "{name}"),
            FieldType::Any => write!(f, "any"),
            FieldType::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A single field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub default: Value,
}

#[derive(Debug, PartialEq)]
struct SchemaInner {
    name: String,
    fields: Vec<Field>,
}

/// Handle to a data model's field set (name → declared type, plus defaults).
///
/// Cheap to clone; nested models share their declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema(Arc<SchemaInner>);

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.0.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.0.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a field path, checking every segment at its nesting level.
    ///
    /// Returns the declared type of the last segment. The error names the
    /// first segment that is not declared, together with the path up to it.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<FieldType, SchemaError> {
        let mut current = self;
        let mut walked: Vec<&str> = Vec::with_capacity(segments.len());
        let mut resolved: Option<FieldType> = None;

        for (i, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            walked.push(segment);
            let Some(field) = current.get(segment) else {
                return Err(SchemaError::UnknownField {
                    root: self.name().to_string(),
                    path: walked.join("."),
                    segment: segment.to_string(),
                });
            };
            if field.ty.is_any() {
                return Ok(FieldType::Any);
            }
            let is_last = i + 1 == segments.len();
            if is_last {
                resolved = Some(field.ty.clone());
                break;
            }
            match field.ty.model() {
                Some(nested) => current = nested,
                None => {
                    let next = segments[i + 1].as_ref();
                    walked.push(next);
                    return Err(SchemaError::UnknownField {
                        root: self.name().to_string(),
                        path: walked.join("."),
                        segment: next.to_string(),
                    });
                }
            }
        }

        Ok(resolved.unwrap_or_else(|| FieldType::Model(self.clone())))
    }

    /// The default-value tree of this model, in declaration order.
    pub fn defaults(&self) -> Value {
        Value::Map(
            self.0
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.default.clone()))
                .collect(),
        )
    }
}

/// Incremental schema declaration. Errors are reported by [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, ty: FieldType, default: impl Into<Value>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty,
            default: default.into(),
        });
        self
    }

    /// A nested model field whose default is the nested model's defaults.
    pub fn model(self, name: impl Into<String>, schema: &Schema) -> Self {
        let default = schema.defaults();
        self.field(name, FieldType::Model(schema.clone()), default)
    }

    /// An optional field that defaults to null.
    pub fn optional(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(name, FieldType::Optional(Box::new(ty)), Value::Null)
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        for (i, field) in self.fields.iter().enumerate() {
            if !is_identifier(&field.name) || is_reserved_name(&field.name) {
                return Err(SchemaError::InvalidFieldName {
                    schema: self.name.clone(),
                    name: field.name.clone(),
                });
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    name: field.name.clone(),
                });
            }
        }
        Ok(Schema(Arc::new(SchemaInner {
            name: self.name,
            fields: self.fields,
        })))
    }
}

/// Whether `name` can be used as a bare member name in emitted expressions.
pub fn is_identifier(name: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap())
        .is_match(name)
}

/// Words that cannot name a variable in client expressions.
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "Infinity", "instanceof", "interface",
    "let", "NaN", "new", "null", "package", "private", "protected", "public", "return", "static",
    "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void",
    "while", "with", "yield",
];

/// Whether `name` is unusable as a state field even though it is an
/// identifier.
///
/// State fields are bare variables in handler text, so reserved words are
/// out. `$` names belong to the client runtime's magics, and `__res<n>` and
/// `__mustweb*` are the compiler's own bindings.
fn is_reserved_name(name: &str) -> bool {
    static RESULT_BINDING: OnceLock<Regex> = OnceLock::new();
    RESERVED_WORDS.contains(&name)
        || name.starts_with('$')
        || name.starts_with("__mustweb")
        || RESULT_BINDING
            .get_or_init(|| Regex::new(r"^__res[0-9]+$").unwrap())
            .is_match(name)
}
