//! Per-method analysis feeding the request renderer: how union-typed parameters are split into
//! variants, which value encoders a request needs and which nested fields may carry uploads.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet},
};

use crate::{
    registry::{FieldDef, Fields, Registry},
    resolve::resolve,
    type_expr::{Scalar, TypeExpr},
};

/// How a single value is written into a request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    /// Integer, float or boolean, written through `Display`.
    Scalar,
    ChatId,
    Object,
    Array,
    InputFile,
    Dynamic,
}

impl ValueKind {
    pub fn of(registry: &Registry, expr: &TypeExpr) -> Self {
        match expr {
            TypeExpr::Scalar(Scalar::String) => Self::Text,
            TypeExpr::Scalar(_) => Self::Scalar,
            TypeExpr::ChatId => Self::ChatId,
            TypeExpr::InputFile => Self::InputFile,
            TypeExpr::Array(_) => Self::Array,
            TypeExpr::Named(name)
                if registry.is_container(name)
                    || name.chars().next().is_some_and(char::is_uppercase) =>
            {
                Self::Object
            }
            TypeExpr::Named(_) | TypeExpr::Union(_) => Self::Dynamic,
        }
    }

    /// Simple values can be told apart by their type alone.
    pub fn is_simple(self) -> bool {
        matches!(self, Self::Text | Self::Scalar | Self::ChatId)
    }

    pub fn requirement(self) -> Requirement {
        match self {
            Self::Text => Requirement::Text,
            Self::Scalar | Self::ChatId => Requirement::Scalar,
            Self::InputFile => Requirement::File,
            Self::Object | Self::Array | Self::Dynamic => Requirement::Json,
        }
    }
}

/// Encoders a generated request has to import.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
    Text,
    Scalar,
    Json,
    File,
}

impl Requirement {
    /// Name of the helper function implementing this encoder in the generated code.
    pub fn helper(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Scalar => "scalar",
            Self::Json => "json",
            Self::File => "file",
        }
    }
}

/// One alternative of a union-typed value.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    pub type_: TypeExpr,
    /// Resolved Rust type of this alternative, always as a required value.
    pub target: String,
    pub kind: ValueKind,
}

/// Alternatives that share one decoding path.
pub type VariantGroup = Vec<Variant>;

/// Alternatives of `expr` with the chat id alias spelled out as `int64 or string`.
fn variant_alternatives(expr: &TypeExpr) -> Vec<TypeExpr> {
    expr.alternatives()
        .iter()
        .flat_map(|alternative| match alternative {
            TypeExpr::ChatId => vec![
                TypeExpr::Scalar(Scalar::Int64),
                TypeExpr::Scalar(Scalar::String),
            ],
            other => vec![other.clone()],
        })
        .collect()
}

/// Groups the alternatives of a union: each simple alternative forms its own group, all
/// structured ones share a trailing group. Non-union types have no variants.
pub fn variant_groups(
    registry: &Registry,
    expr: &TypeExpr,
    namespace: Option<&str>,
) -> Vec<VariantGroup> {
    let alternatives = variant_alternatives(expr);
    if alternatives.len() < 2 {
        return Vec::new();
    }

    let mut groups = Vec::with_capacity(alternatives.len());
    let mut structured = Vec::new();
    for alternative in alternatives {
        let variant = Variant {
            target: resolve(registry, &alternative, true, namespace),
            kind: ValueKind::of(registry, &alternative),
            type_: alternative,
        };
        if variant.kind.is_simple() {
            groups.push(vec![variant]);
        } else {
            structured.push(variant);
        }
    }
    if !structured.is_empty() {
        groups.push(structured);
    }
    groups
}

/// Encoders needed for a value of type `expr`, one per alternative.
pub fn requirements<'a>(
    registry: &'a Registry,
    expr: &'a TypeExpr,
) -> impl Iterator<Item = Requirement> + 'a {
    expr.alternatives()
        .iter()
        .map(|alternative| ValueKind::of(registry, alternative).requirement())
}

/// Nested fields that may hold an upload, by name, with their own requiredness.
pub type FileLeaves = BTreeMap<String, bool>;

/// Finds the fields of the object(s) a value of type `expr` may hold that accept an upload.
///
/// Every alternative is inspected with one array level removed. Abstract types are expanded into
/// their subtypes. When several objects declare the same leaf, the first one wins.
pub fn file_leaves(registry: &Registry, expr: &TypeExpr) -> FileLeaves {
    let mut leaves = FileLeaves::new();
    let mut visited = HashSet::new();
    for alternative in expr.alternatives() {
        if let Some(name) = alternative.strip_array().type_name() {
            collect_file_leaves(registry, name, &mut visited, &mut leaves);
        }
    }
    leaves
}

fn collect_file_leaves<'a>(
    registry: &'a Registry,
    name: &'a str,
    visited: &mut HashSet<&'a str>,
    leaves: &mut FileLeaves,
) {
    if !visited.insert(name) {
        return;
    }
    let Some(type_def) = registry.type_def(name) else {
        return;
    };

    if type_def.is_container() {
        for subtype in &type_def.subtypes {
            collect_file_leaves(registry, subtype, visited, leaves);
        }
    } else {
        for field in type_def.fields.values() {
            if field.type_.admits_input_file() {
                leaves
                    .entry(field.key.clone())
                    .or_insert(field.is_required);
            }
        }
    }
}

/// Required fields first, then by key.
pub fn field_order(a: (bool, &str), b: (bool, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

pub fn sorted_fields(fields: &Fields) -> Vec<&FieldDef> {
    let mut sorted = fields.values().collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        field_order(
            (a.is_required, a.key.as_str()),
            (b.is_required, b.key.as_str()),
        )
    });
    sorted
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        registry::TypeDef,
        type_expr::normalize,
    };

    fn object(name: &str, fields: &[(&str, TypeExpr, bool)]) -> TypeDef {
        let mut type_def = TypeDef::new(name);
        for (key, type_, is_required) in fields {
            type_def
                .fields
                .insert(key.to_string(), FieldDef::new(*key, type_.clone(), *is_required));
        }
        type_def
    }

    fn registry() -> Registry {
        let string = TypeExpr::Scalar(Scalar::String);
        let mut registry = Registry::new();
        for type_def in [
            object(
                "InputMediaPhoto",
                &[
                    ("type", string.clone(), true),
                    ("media", TypeExpr::InputFile, true),
                ],
            ),
            object(
                "InputMediaVideo",
                &[
                    ("media", TypeExpr::InputFile, true),
                    ("thumbnail", TypeExpr::InputFile, false),
                    ("caption", string.clone(), false),
                ],
            ),
            object("InlineKeyboardMarkup", &[]),
            object("Message", &[("text", string, false)]),
        ] {
            registry.types.insert(type_def.name.clone(), type_def);
        }
        let mut media = TypeDef::new("InputMedia");
        media.subtypes = vec!["InputMediaPhoto".into(), "InputMediaVideo".into()];
        registry.types.insert(media.name.clone(), media);
        registry
    }

    #[test]
    fn non_union_has_no_variants() {
        let registry = registry();
        assert!(variant_groups(&registry, &normalize("String"), None).is_empty());
        assert!(variant_groups(&registry, &normalize("Array of Message"), None).is_empty());
    }

    #[test]
    fn chat_id_splits_into_two_simple_groups() {
        let registry = registry();
        let expr = normalize("Integer or String");
        assert_eq!(expr, TypeExpr::ChatId);

        let groups = variant_groups(&registry, &expr, Some("types"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[0][0].target, "i64");
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[1][0].target, "String");
    }

    #[test]
    fn structured_alternatives_share_a_group() {
        let registry = registry();
        let expr = normalize("InputFile or String or Message or Array of Message or Integer");
        let groups = variant_groups(&registry, &expr, Some("types"));

        let targets = groups
            .iter()
            .map(|group| group.iter().map(|v| v.target.as_str()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(
            targets,
            vec![
                vec!["String"],
                vec!["i64"],
                vec!["types::InputFile", "types::Message", "Vec<types::Message>"],
            ]
        );
    }

    #[test]
    fn requirements_collapse() {
        let registry = registry();
        let mut tags = BTreeSet::new();
        for raw in ["Integer", "Float", "Message or True", "Array of Message", "String"] {
            tags.extend(requirements(&registry, &normalize(raw)));
        }
        tags.extend(requirements(&registry, &TypeExpr::ChatId));
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec![Requirement::Text, Requirement::Scalar, Requirement::Json]
        );
        assert_eq!(
            requirements(&registry, &TypeExpr::InputFile).collect::<Vec<_>>(),
            vec![Requirement::File]
        );
    }

    #[test]
    fn file_leaves_through_container() {
        let registry = registry();
        let leaves = file_leaves(&registry, &TypeExpr::named("InputMedia"));
        assert_eq!(
            leaves.into_iter().collect::<Vec<_>>(),
            vec![("media".to_string(), true), ("thumbnail".to_string(), false)]
        );
    }

    #[test]
    fn file_leaves_through_union_of_arrays() {
        let registry = registry();
        let expr = normalize(
            "Array of InputMediaAudio, InputMediaDocument, InputMediaPhoto and InputMediaVideo",
        );
        let leaves = file_leaves(&registry, &expr);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves.get("media"), Some(&true));
        assert_eq!(leaves.get("thumbnail"), Some(&false));
    }

    #[test]
    fn file_leaves_of_plain_and_array_objects() {
        let registry = registry();
        assert_eq!(
            file_leaves(&registry, &TypeExpr::named("InputMediaPhoto")).len(),
            1
        );
        assert_eq!(
            file_leaves(&registry, &normalize("Array of InputMediaVideo")).len(),
            2
        );
        assert!(file_leaves(&registry, &normalize("Array of Message")).is_empty());
        assert!(file_leaves(&registry, &normalize("Unknown")).is_empty());
        assert!(file_leaves(&registry, &TypeExpr::InputFile).is_empty());
    }

    #[test]
    fn self_referencing_containers_terminate() {
        let mut registry = registry();
        let mut looping = TypeDef::new("Loop");
        looping.subtypes = vec!["Loop".into(), "InputMediaPhoto".into()];
        registry.types.insert("Loop".into(), looping);
        assert_eq!(file_leaves(&registry, &TypeExpr::named("Loop")).len(), 1);
    }

    #[test]
    fn required_fields_sort_first() {
        let mut fields = Fields::new();
        for (key, is_required) in [("b", false), ("d", true), ("a", false), ("c", true)] {
            fields.insert(
                key.into(),
                FieldDef::new(key, TypeExpr::Scalar(Scalar::String), is_required),
            );
        }
        let order = sorted_fields(&fields)
            .into_iter()
            .map(|f| (f.key.as_str(), f.is_required))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![("c", true), ("d", true), ("a", false), ("b", false)]);
    }
}
