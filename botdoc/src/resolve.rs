//! Mapping of type expressions onto Rust types.

use crate::{
    registry::Registry,
    type_expr::{Scalar, TypeExpr, CHAT_ID, INPUT_FILE},
};

/// Stand-in for values without a single static type: abstract types, unions and anything the
/// grammar does not cover.
pub const DYNAMIC_TYPE: &str = "serde_json::Value";

pub fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::String => "String",
        Scalar::Int64 => "i64",
        Scalar::Float64 => "f64",
        Scalar::Bool => "bool",
    }
}

/// Resolves `expr` to the source text of a Rust type.
///
/// Named types are prefixed with `namespace::` when a namespace is given. Optional values are
/// wrapped in `Option`, except for dynamic values which can represent absence themselves. Optional
/// objects are boxed as well, since objects of the API refer to each other through optional
/// fields (`Message.reply_to_message`). Array elements are always required. Unions are not
/// resolved here: callers that need one type per alternative resolve each alternative on its own.
pub fn resolve(
    registry: &Registry,
    expr: &TypeExpr,
    is_required: bool,
    namespace: Option<&str>,
) -> String {
    let resolved = match expr {
        TypeExpr::Named(name) if registry.is_container(name) => return DYNAMIC_TYPE.to_string(),
        TypeExpr::Named(name) if name.chars().next().is_some_and(char::is_uppercase) => {
            let name = qualify(name, namespace);
            return if is_required {
                name
            } else {
                format!("Option<Box<{name}>>")
            };
        }
        TypeExpr::InputFile => qualify(INPUT_FILE, namespace),
        TypeExpr::ChatId => qualify(CHAT_ID, namespace),
        TypeExpr::Scalar(scalar) => scalar_type(*scalar).to_string(),
        TypeExpr::Array(inner) => format!("Vec<{}>", resolve(registry, inner, true, namespace)),
        TypeExpr::Named(_) | TypeExpr::Union(_) => return DYNAMIC_TYPE.to_string(),
    };

    if is_required {
        resolved
    } else {
        format!("Option<{resolved}>")
    }
}

/// Resolves an optional expression, such as a return type that could not be extracted.
pub fn resolve_opt(
    registry: &Registry,
    expr: Option<&TypeExpr>,
    is_required: bool,
    namespace: Option<&str>,
) -> String {
    match expr {
        Some(expr) => resolve(registry, expr, is_required, namespace),
        None => DYNAMIC_TYPE.to_string(),
    }
}

fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) if !namespace.is_empty() => format!("{namespace}::{name}"),
        _ => name.to_string(),
    }
}
