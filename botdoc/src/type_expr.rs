//! The type grammar of the reference.
//!
//! Field and return types are written as prose: `Array of PhotoSize`, `Integer or String`,
//! `InputFile or String`, `True`. [`normalize`] turns such a phrase into a [`TypeExpr`], whose
//! [`Display`](fmt::Display) output is the canonical string form (`[]PhotoSize`, `ChatId`,
//! `InputFile`, `bool`). Canonical strings are valid input as well, so normalizing twice yields
//! the same expression.

use std::{convert::Infallible, fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;

pub const ARRAY_MARKER: &str = "[]";
pub const UNION_SEPARATOR: &str = " or ";
pub const INPUT_FILE: &str = "InputFile";
pub const CHAT_ID: &str = "ChatId";

const ARRAY_OF: &str = "array of ";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    Int64,
    Float64,
    Bool,
}

impl Scalar {
    pub fn token(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "string" => Some(Self::String),
            "int64" => Some(Self::Int64),
            "float64" => Some(Self::Float64),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Scalar(Scalar),
    /// An object type, possibly one that is never defined in the document.
    Named(String),
    Array(Box<TypeExpr>),
    /// Two or more alternatives.
    Union(Vec<TypeExpr>),
    /// An uploaded file or a reference to one.
    InputFile,
    /// `Integer or String`.
    ChatId,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array_of(inner: TypeExpr) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    /// The union alternatives, or the expression itself when it is not a union.
    pub fn alternatives(&self) -> &[TypeExpr] {
        match self {
            Self::Union(alternatives) => alternatives,
            other => std::slice::from_ref(other),
        }
    }

    /// Removes one array marker, if present.
    pub fn strip_array(&self) -> &TypeExpr {
        match self {
            Self::Array(inner) => inner,
            other => other,
        }
    }

    /// The referenced type name, for named types only.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the value may be an uploaded file, directly or as one union alternative.
    pub fn admits_input_file(&self) -> bool {
        self.alternatives()
            .iter()
            .any(|alternative| *alternative == Self::InputFile)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => f.write_str(scalar.token()),
            Self::Named(name) => f.write_str(name),
            Self::Array(inner) => write!(f, "{ARRAY_MARKER}{inner}"),
            Self::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(UNION_SEPARATOR)?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
            Self::InputFile => f.write_str(INPUT_FILE),
            Self::ChatId => f.write_str(CHAT_ID),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(normalize(s))
    }
}

/// Converts a type phrase from the reference into a type expression.
pub fn normalize(raw: &str) -> TypeExpr {
    let raw = raw.trim();

    match raw {
        "InputFile or String" => return TypeExpr::InputFile,
        "Integer or String" => return TypeExpr::ChatId,
        _ => {}
    }

    let parts = if raw.starts_with("Array of InputMediaAudio") {
        split_media_list(raw)
    } else {
        raw.split(UNION_SEPARATOR).map(str::to_string).collect()
    };

    let mut alternatives = parts
        .iter()
        .map(|part| normalize_alternative(part))
        .collect::<Vec<_>>();

    if alternatives.len() == 1 {
        alternatives.pop().unwrap_or_else(|| TypeExpr::named(raw))
    } else {
        TypeExpr::Union(alternatives)
    }
}

/// `Array of InputMediaAudio, InputMediaDocument, InputMediaPhoto and InputMediaVideo` means an
/// array of any one of these; the reference only spells out `Array of` for the first item.
fn split_media_list(raw: &str) -> Vec<String> {
    let mut parts = raw.split(',').map(str::trim).collect::<Vec<_>>();
    if let Some(last) = parts.pop() {
        parts.extend(last.split(" and ").map(str::trim));
    }
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part.to_string()
            } else {
                format!("Array of {part}")
            }
        })
        .collect()
}

fn normalize_alternative(alternative: &str) -> TypeExpr {
    let alternative = alternative.trim();
    if let Some(inner) = strip_prefix_ignore_case(alternative, ARRAY_OF) {
        return TypeExpr::array_of(normalize(inner));
    }
    if let Some(inner) = alternative.strip_prefix(ARRAY_MARKER) {
        return TypeExpr::array_of(normalize(inner));
    }
    if alternative == INPUT_FILE {
        return TypeExpr::InputFile;
    }
    if alternative == CHAT_ID {
        return TypeExpr::ChatId;
    }
    if let Some(scalar) = Scalar::from_token(alternative) {
        return TypeExpr::Scalar(scalar);
    }

    match alternative.to_lowercase().as_str() {
        "messages" => TypeExpr::named("Message"),
        "boolean" | "true" => TypeExpr::Scalar(Scalar::Bool),
        "float" | "float number" => TypeExpr::Scalar(Scalar::Float64),
        "integer" | "int" => TypeExpr::Scalar(Scalar::Int64),
        "string" => TypeExpr::Scalar(Scalar::String),
        _ => TypeExpr::named(alternative),
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

lazy_static! {
    static ref RETURN_TYPE: Regex = Regex::new(
        r"(?:Returns|On success,).*?((?:[Aa]rray of )?[A-Z]\w+)(?: that were sent| of the sent messages?)? (?:object|is returned|on success)"
    )
    .expect("return type pattern is valid");
}

/// Finds the return type in a method description. Descriptions with unusual wording yield `None`.
pub fn extract_return_type(description: &str) -> Option<TypeExpr> {
    let captures = RETURN_TYPE.captures(description)?;
    Some(normalize(captures.get(1)?.as_str()))
}
