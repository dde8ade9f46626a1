//! Splits the reference page into method and type sections.
//!
//! The content of the page is a flat list of elements below `<div id="dev_page_content">`. A
//! method or type starts at an `<h4>` carrying an anchor, and everything up to the next heading
//! or rule belongs to it: description paragraphs, a fields table and, for abstract types, a
//! list of subtypes.

use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use crate::{
    error::ExtractError,
    registry::{FieldDef, Fields, OperationDef, Registry, TypeDef},
    tree::{child_elements, node_text, tag, tag_with_attr, Finder},
    type_expr::{extract_return_type, normalize, TypeExpr},
};

/// `id` of the element holding the reference content.
pub const CONTENT_ID: &str = "dev_page_content";

/// Fields documented as accepting uploads link to this anchor.
pub const SENDING_FILES_HREF: &str = "#sending-files";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Scope {
    Outside,
    Method(String),
    Type(String),
}

impl Scope {
    fn enter(name: String) -> Self {
        if name.chars().next().is_some_and(char::is_uppercase) {
            Self::Type(name)
        } else if name.is_empty() {
            Self::Outside
        } else {
            Self::Method(name)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TableKind {
    /// Parameter, Type, Required, Description
    Method,
    /// Field, Type, Description
    Type,
}

fn is_section_anchor(element: &ElementRef<'_>) -> bool {
    let element = element.value();
    element.name() == "a"
        && element.attr("class") == Some("anchor")
        && !element.attr("name").unwrap_or_default().contains('-')
}

pub fn extract_str(html: &str) -> Result<Registry, ExtractError> {
    extract(&Html::parse_document(html))
}

pub fn extract(document: &Html) -> Result<Registry, ExtractError> {
    let content = Finder::new(tag_with_attr("div", "id", CONTENT_ID))
        .find_next(document.root_element())
        .ok_or(ExtractError::ContentNotFound { id: CONTENT_ID })?;

    let mut registry = Registry::new();
    let mut scope = Scope::Outside;
    let mut is_first_definition = false;
    // Paragraphs of the current section only; a repeated section starts over.
    let mut description = String::new();
    let mut anchors = Finder::new(is_section_anchor);

    for node in child_elements(content) {
        match node.value().name() {
            "h3" | "hr" => scope = Scope::Outside,
            "h4" => {
                anchors.reset_counters();
                description.clear();
                (scope, is_first_definition) = if anchors.find_next(node).is_some() {
                    enter_section(&mut registry, node_text(node))
                } else {
                    (Scope::Outside, false)
                };
            }
            "p" => {
                append_description(&mut description, node);
                match &scope {
                    Scope::Method(name) => {
                        if let Some(operation) = registry.operations.get_mut(name) {
                            if is_first_definition {
                                operation.description.clone_from(&description);
                            }
                            if let Some(return_type) = extract_return_type(&description) {
                                operation.return_type = Some(return_type);
                            }
                        }
                    }
                    Scope::Type(name) => {
                        if let Some(type_def) = registry.types.get_mut(name) {
                            if is_first_definition {
                                type_def.description.clone_from(&description);
                            }
                        }
                    }
                    Scope::Outside => {}
                }
            }
            "table" => match &scope {
                Scope::Method(name) => {
                    let fields = parse_fields(node, TableKind::Method, name)?;
                    if let Some(operation) = registry.operations.get_mut(name) {
                        operation.fields = fields;
                    }
                }
                Scope::Type(name) => {
                    let fields = parse_fields(node, TableKind::Type, name)?;
                    if let Some(type_def) = registry.types.get_mut(name) {
                        type_def.fields = fields;
                    }
                }
                Scope::Outside => {}
            },
            "ul" => {
                if let Scope::Type(name) = &scope {
                    if let Some(type_def) = registry.types.get_mut(name) {
                        type_def.subtypes = parse_subtypes(node);
                    }
                }
            }
            _ => {}
        }
    }

    for operation in registry.operations.values() {
        if operation.return_type.is_none() {
            warn!(method = %operation.key, "no return type found in description");
        }
    }
    info!(
        types = registry.types.len(),
        operations = registry.operations.len(),
        "extracted schema"
    );

    Ok(registry)
}

/// Registers the section named `name` unless it already exists. Returns the new scope and whether
/// this is the first definition of the name.
fn enter_section(registry: &mut Registry, name: String) -> (Scope, bool) {
    let scope = Scope::enter(name);
    let is_first_definition = match &scope {
        Scope::Type(name) => {
            debug!(%name, "type section");
            if registry.types.contains_key(name) {
                warn!(%name, "type documented twice, keeping the first definition");
                false
            } else {
                registry.types.insert(name.clone(), TypeDef::new(name.as_str()));
                true
            }
        }
        Scope::Method(name) => {
            debug!(%name, "method section");
            if registry.operations.contains_key(name) {
                warn!(%name, "method documented twice, keeping the first definition");
                false
            } else {
                registry
                    .operations
                    .insert(name.clone(), OperationDef::new(name.as_str()));
                true
            }
        }
        Scope::Outside => false,
    };
    (scope, is_first_definition)
}

fn append_description(description: &mut String, paragraph: ElementRef<'_>) {
    let text = node_text(paragraph);
    if text.is_empty() {
        return;
    }
    if !description.is_empty() {
        description.push(' ');
    }
    description.push_str(&text);
}

fn parse_fields(
    table: ElementRef<'_>,
    kind: TableKind,
    section: &str,
) -> Result<Fields, ExtractError> {
    let mut fields = Fields::new();

    let Some(body) = Finder::new(tag("tbody")).find_next(table) else {
        return Ok(fields);
    };

    let mut columns = Finder::new(tag("td"));
    let mut sending_files = Finder::new(tag_with_attr("a", "href", SENDING_FILES_HREF));

    for row in Finder::new(tag("tr")).find_all(body) {
        columns.reset_counters();
        sending_files.reset_counters();

        let cells = columns.find_all(row);
        let field = match (kind, cells.as_slice()) {
            (TableKind::Method, [key, type_, required, description]) => {
                let type_ = if sending_files.find_next(*description).is_some() {
                    TypeExpr::InputFile
                } else {
                    normalize(&node_text(*type_))
                };
                FieldDef::new(node_text(*key), type_, node_text(*required) == "Yes")
            }
            (TableKind::Type, [key, type_, description]) => {
                let type_ = if sending_files.find_next(*description).is_some() {
                    TypeExpr::InputFile
                } else {
                    normalize(&node_text(*type_))
                };
                let is_required = !node_text(*description).starts_with("Optional");
                FieldDef::new(node_text(*key), type_, is_required)
            }
            _ => {
                return Err(ExtractError::UnexpectedTableShape {
                    section: section.to_string(),
                    columns: cells.len(),
                })
            }
        };
        fields.insert(field.key.clone(), field);
    }

    Ok(fields)
}

fn parse_subtypes(list: ElementRef<'_>) -> Vec<String> {
    Finder::new(tag("li"))
        .find_all(list)
        .into_iter()
        .map(node_text)
        .collect()
}
