use indexmap::IndexMap;

use crate::type_expr::{TypeExpr, INPUT_FILE};

pub type Fields = IndexMap<String, FieldDef>;

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub key: String,
    pub type_: TypeExpr,
    pub is_required: bool,
}

impl FieldDef {
    pub fn new(key: impl Into<String>, type_: TypeExpr, is_required: bool) -> Self {
        Self {
            key: key.into(),
            type_,
            is_required,
        }
    }
}

/// An object type of the API. A type with subtypes is abstract: it only names the union of its
/// subtypes and its own fields are meaningless.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub description: String,
    pub subtypes: Vec<String>,
    pub fields: Fields,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_container(&self) -> bool {
        !self.subtypes.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperationDef {
    pub key: String,
    pub description: String,
    /// `None` when the description does not state a return type in a recognized form.
    pub return_type: Option<TypeExpr>,
    pub fields: Fields,
}

impl OperationDef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// Everything extracted from the reference. Types refer to each other by name only; references
/// are looked up lazily, so a name may be used before (or without) its own section.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    pub types: IndexMap<String, TypeDef>,
    pub operations: IndexMap<String, OperationDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn operation(&self, key: &str) -> Option<&OperationDef> {
        self.operations.get(key)
    }

    pub fn is_container(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(TypeDef::is_container)
    }

    /// Names of the types that get their own definition in the output, sorted. Abstract types are
    /// only expressed through the unions that use them, and `InputFile` is a helper type.
    pub fn filtered_type_names(&self) -> Vec<&str> {
        let mut names = self
            .types
            .iter()
            .filter(|(name, type_def)| name.as_str() != INPUT_FILE && !type_def.is_container())
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}
