//! Data handed to a renderer, one value per generated type or request.

use std::collections::BTreeSet;

use heck::{ToPascalCase, ToSnakeCase};
use tracing::debug;

use crate::{
    registry::{OperationDef, Registry},
    request::{
        file_leaves, requirements, sorted_fields, variant_groups, FileLeaves, Requirement,
        ValueKind, VariantGroup,
    },
    resolve::{resolve, resolve_opt},
    type_expr::TypeExpr,
};

/// Namespace under which requests refer to the generated types.
pub const TYPES_NAMESPACE: &str = "types";

#[derive(Clone, Debug, PartialEq)]
pub struct TypeFieldRender {
    /// Rust field name.
    pub name: String,
    /// Name in the API.
    pub key: String,
    pub canonical: String,
    pub is_required: bool,
    pub target: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeRender {
    pub name: String,
    pub description: String,
    pub fields: Vec<TypeFieldRender>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequestFieldRender {
    pub name: String,
    pub key: String,
    pub type_: TypeExpr,
    pub is_required: bool,
    pub kind: ValueKind,
    pub target: String,
    /// Empty unless the parameter is a union.
    pub variants: Vec<VariantGroup>,
    /// Nested fields that may hold uploads.
    pub file_leaves: FileLeaves,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequestRender {
    /// Method name in the API.
    pub key: String,
    /// Rust type name of the request.
    pub name: String,
    pub file_stem: String,
    pub description: String,
    pub return_type: Option<TypeExpr>,
    pub response_type: String,
    /// Subtypes of an abstract return type.
    pub response_variants: Vec<String>,
    pub fields: Vec<RequestFieldRender>,
    pub requirements: BTreeSet<Requirement>,
}

impl RequestRender {
    pub fn has_media_content(&self) -> bool {
        self.fields.iter().any(|field| !field.file_leaves.is_empty())
    }
}

/// One entry per renderable type, sorted by name.
pub fn build_types(registry: &Registry) -> Vec<TypeRender> {
    registry
        .filtered_type_names()
        .into_iter()
        .filter_map(|name| registry.type_def(name))
        .map(|type_def| TypeRender {
            name: type_def.name.clone(),
            description: type_def.description.clone(),
            fields: sorted_fields(&type_def.fields)
                .into_iter()
                .map(|field| TypeFieldRender {
                    name: field.key.to_snake_case(),
                    key: field.key.clone(),
                    canonical: field.type_.to_string(),
                    is_required: field.is_required,
                    target: resolve(registry, &field.type_, field.is_required, None),
                })
                .collect(),
        })
        .collect()
}

/// One entry per method, sorted by method name.
pub fn build_requests(registry: &Registry) -> Vec<RequestRender> {
    let mut requests = registry
        .operations
        .values()
        .map(|operation| build_request(registry, operation))
        .collect::<Vec<_>>();
    requests.sort_by(|a, b| a.key.cmp(&b.key));
    requests
}

pub fn build_request(registry: &Registry, operation: &OperationDef) -> RequestRender {
    let namespace = Some(TYPES_NAMESPACE);
    let mut required = BTreeSet::new();

    let fields = sorted_fields(&operation.fields)
        .into_iter()
        .map(|field| {
            required.extend(requirements(registry, &field.type_));
            RequestFieldRender {
                name: field.key.to_snake_case(),
                key: field.key.clone(),
                type_: field.type_.clone(),
                is_required: field.is_required,
                kind: ValueKind::of(registry, &field.type_),
                target: resolve(registry, &field.type_, field.is_required, namespace),
                variants: variant_groups(registry, &field.type_, namespace),
                file_leaves: file_leaves(registry, &field.type_),
            }
        })
        .collect::<Vec<_>>();

    let response_variants = operation
        .return_type
        .as_ref()
        .and_then(TypeExpr::type_name)
        .and_then(|name| registry.type_def(name))
        .map(|type_def| {
            type_def
                .subtypes
                .iter()
                .map(|subtype| {
                    resolve(registry, &TypeExpr::named(subtype.as_str()), true, namespace)
                })
                .collect()
        })
        .unwrap_or_default();

    let request = RequestRender {
        key: operation.key.clone(),
        name: operation.key.to_pascal_case(),
        file_stem: operation.key.to_snake_case(),
        description: operation.description.clone(),
        return_type: operation.return_type.clone(),
        response_type: resolve_opt(registry, operation.return_type.as_ref(), true, namespace),
        response_variants,
        fields,
        requirements: required,
    };
    debug!(
        method = %request.key,
        fields = request.fields.len(),
        media = request.has_media_content(),
        "prepared request"
    );
    request
}
