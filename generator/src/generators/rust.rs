use std::collections::HashSet;

use syn::{parse_quote, Arm, Attribute, Expr, Ident, ImplItem, Item, Stmt, Type};

use dt_botdoc::{
    render::{build_requests, build_types, RequestFieldRender, RequestRender, TypeRender},
    request::ValueKind,
    Registry, Scalar, TypeExpr,
};

use super::{GeneratedCode, GeneratedRequest, Options, RenderError};

use check_keyword::CheckKeyword;
use heck::ToPascalCase;
use quote::{format_ident, quote};
use tracing::debug;

/// How a generated field represents absence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Presence {
    Required,
    /// Wrapped in `Option`.
    Optional,
    /// A dynamic value, absent when null.
    Nullable,
}

impl Presence {
    fn of(is_required: bool, target: &str) -> Self {
        if is_required {
            Self::Required
        } else if target.starts_with("Option<") {
            Self::Optional
        } else {
            Self::Nullable
        }
    }

    fn serde_attr(self) -> Option<Attribute> {
        match self {
            Self::Required => None,
            Self::Optional => Some(parse_quote!(
                #[serde(skip_serializing_if = "Option::is_none")]
            )),
            Self::Nullable => Some(parse_quote!(
                #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
            )),
        }
    }
}

/// How a request parameter is written into the form.
enum Encoding {
    Value(ValueKind),
    /// Union parameter, written by matching on its variant enum.
    Match(Vec<Arm>),
}

impl Encoding {
    fn expr(&self, key: &str, value: Expr) -> Expr {
        match self {
            Self::Value(kind) => encode(*kind, key, &value),
            Self::Match(arms) => parse_quote!(match #value { #(#arms)* }),
        }
    }
}

fn encode(kind: ValueKind, key: &str, value: &Expr) -> Expr {
    match kind {
        ValueKind::Text => parse_quote!(text(params, #key, #value)),
        ValueKind::Scalar | ValueKind::ChatId => parse_quote!(scalar(params, #key, #value)),
        ValueKind::InputFile => parse_quote!(file(params, #key, #value)),
        ValueKind::Object | ValueKind::Array | ValueKind::Dynamic => {
            parse_quote!(json(params, #key, #value)?)
        }
    }
}

fn name_to_ident(name: &str) -> Ident {
    let mut name = name.replace(|c: char| !c.is_ascii_alphanumeric() && c != '_', "_");
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if ["crate", "self", "super", "Self"].contains(&name.as_str()) {
        // These are keywords that are not allowed as raw identifiers
        format_ident!("{}_", name)
    } else if name.is_keyword() {
        format_ident!("r#{}", name)
    } else {
        format_ident!("{}", name)
    }
}

/// Picks `name`, or `name` with a counter when it is already taken.
fn unique_ident(used: &mut HashSet<String>, name: String) -> Ident {
    let mut candidate = name.clone();
    let mut counter = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{name}{counter}");
        counter += 1;
    }
    name_to_ident(&candidate)
}

fn variant_name(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Scalar(Scalar::String) => "String".to_string(),
        TypeExpr::Scalar(Scalar::Int64) => "Integer".to_string(),
        TypeExpr::Scalar(Scalar::Float64) => "Float".to_string(),
        TypeExpr::Scalar(Scalar::Bool) => "Boolean".to_string(),
        TypeExpr::Named(name) => name.to_pascal_case(),
        TypeExpr::Array(inner) => format!("{}List", variant_name(inner)),
        TypeExpr::InputFile => "InputFile".to_string(),
        TypeExpr::ChatId => "ChatId".to_string(),
        TypeExpr::Union(_) => "Other".to_string(),
    }
}

fn doc_attrs(text: &str) -> Vec<Attribute> {
    if text.is_empty() {
        return Vec::new();
    }
    let text = format!(" {text}");
    vec![parse_quote!(#[doc = #text])]
}

fn parse_type(item: &str, target: &str) -> Result<Type, RenderError> {
    syn::parse_str(target)
        .map_err(|err| RenderError::new(item, format!("invalid type `{target}`: {err}")))
}

fn field_attrs(ident: &Ident, key: &str, presence: Presence) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    let name = ident.to_string();
    if name.trim_start_matches("r#") != key {
        attrs.push(parse_quote!(#[serde(rename = #key)]));
    }
    attrs.extend(presence.serde_attr());
    attrs
}

#[derive(Default)]
struct RustVisitor {
    output_items: Vec<Item>,
}

impl RustVisitor {
    fn new() -> Self {
        Self::default()
    }

    /// Types every generated file relies on: the chat id alias, uploads and the request plumbing.
    fn push_helpers(&mut self) {
        self.output_items.push(parse_quote!(
            use serde::{Deserialize, Serialize};
        ));
        self.output_items.push(parse_quote! {
            /// Unique identifier for the target chat or username of the target channel.
            #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(untagged)]
            pub enum ChatId {
                Integer(i64),
                String(String),
            }
        });
        self.output_items.push(parse_quote! {
            impl std::fmt::Display for ChatId {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    match self {
                        Self::Integer(id) => write!(f, "{}", id),
                        Self::String(username) => f.write_str(username),
                    }
                }
            }
        });
        self.output_items.push(parse_quote! {
            /// Contents of a file to be uploaded, or a reference to a file Telegram already knows.
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub enum InputFile {
                Upload { name: String, data: Vec<u8> },
                /// A `file_id` or an HTTP URL.
                Reference(String),
            }
        });
        self.output_items.push(parse_quote! {
            impl Serialize for InputFile {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    match self {
                        Self::Upload { name, .. } => {
                            serializer.serialize_str(&format!("attach://{}", name))
                        }
                        Self::Reference(reference) => serializer.serialize_str(reference),
                    }
                }
            }
        });
        self.output_items.push(parse_quote! {
            impl<'de> Deserialize<'de> for InputFile {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    String::deserialize(deserializer).map(Self::Reference)
                }
            }
        });
        self.output_items.push(parse_quote! {
            /// Form parameters of a request, with uploads kept apart from plain values.
            #[derive(Debug, Default)]
            pub struct RequestParams {
                pub fields: Vec<(String, String)>,
                pub files: Vec<(String, InputFile)>,
            }
        });
        self.output_items.push(parse_quote! {
            /// A field nested in a request parameter that may carry an upload.
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct MediaField {
                /// Parameter holding the nested object.
                pub field: &'static str,
                pub name: &'static str,
                pub required: bool,
            }
        });
        self.output_items.push(parse_quote! {
            pub trait Request: Serialize {
                const METHOD: &'static str;
                type Response: serde::de::DeserializeOwned;
                const MEDIA: &'static [MediaField] = &[];

                fn write_params(&self, params: &mut RequestParams) -> Result<(), serde_json::Error>;
            }
        });
        self.output_items.push(parse_quote! {
            pub mod params {
                use super::{InputFile, RequestParams};

                pub fn text(params: &mut RequestParams, key: &str, value: &str) {
                    params.fields.push((key.to_string(), value.to_string()));
                }

                pub fn scalar(params: &mut RequestParams, key: &str, value: &impl std::fmt::Display) {
                    params.fields.push((key.to_string(), value.to_string()));
                }

                pub fn json(
                    params: &mut RequestParams,
                    key: &str,
                    value: &impl serde::Serialize,
                ) -> Result<(), serde_json::Error> {
                    let value = serde_json::to_string(value)?;
                    params.fields.push((key.to_string(), value));
                    Ok(())
                }

                pub fn file(params: &mut RequestParams, key: &str, value: &InputFile) {
                    match value {
                        InputFile::Upload { .. } => params.files.push((key.to_string(), value.clone())),
                        InputFile::Reference(reference) => {
                            params.fields.push((key.to_string(), reference.clone()))
                        }
                    }
                }
            }
        });
    }

    fn visit_type(&mut self, type_: &TypeRender) -> Result<(), RenderError> {
        let name = name_to_ident(&type_.name);
        let doc = doc_attrs(&type_.description);

        let mut fields = Vec::with_capacity(type_.fields.len());
        for field in &type_.fields {
            let ident = name_to_ident(&field.name);
            let ty = parse_type(&type_.name, &field.target)?;
            let attrs = field_attrs(
                &ident,
                &field.key,
                Presence::of(field.is_required, &field.target),
            );
            fields.push(quote!(#(#attrs)* pub #ident: #ty));
        }

        self.output_items.push(parse_quote! {
            #(#doc)*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct #name {
                #(#fields,)*
            }
        });
        Ok(())
    }
}

/// Builds the variant enum of a union parameter, plus the match arms writing each variant.
fn union_enum(
    item: &str,
    enum_ident: &Ident,
    field: &RequestFieldRender,
) -> Result<(Item, Vec<Arm>), RenderError> {
    let key = field.key.as_str();
    let mut used = HashSet::new();
    let mut variants = Vec::new();
    let mut arms: Vec<Arm> = Vec::new();
    let mut structured = false;

    for variant in field.variants.iter().flatten() {
        let ident = unique_ident(&mut used, variant_name(&variant.type_));
        let ty = parse_type(item, &variant.target)?;
        variants.push(quote!(#ident(#ty)));

        if variant.kind.is_simple() || variant.kind == ValueKind::InputFile {
            let expr = encode(variant.kind, key, &parse_quote!(value));
            arms.push(parse_quote!(#enum_ident::#ident(value) => #expr,));
        } else {
            structured = true;
        }
    }
    if structured {
        arms.push(parse_quote!(other => json(params, #key, other)?,));
    }

    let enum_item = parse_quote! {
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum #enum_ident {
            #(#variants,)*
        }
    };
    Ok((enum_item, arms))
}

/// Untagged enum over the subtypes of an abstract return type.
fn response_enum(
    item: &str,
    response_ident: &Ident,
    targets: &[String],
) -> Result<Item, RenderError> {
    let mut used = HashSet::new();
    let mut variants = Vec::with_capacity(targets.len());
    for target in targets {
        let short = target.rsplit("::").next().unwrap_or(target);
        let ident = unique_ident(&mut used, short.to_pascal_case());
        let ty = parse_type(item, target)?;
        variants.push(quote!(#ident(#ty)));
    }
    Ok(parse_quote! {
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        #[serde(untagged)]
        pub enum #response_ident {
            #(#variants,)*
        }
    })
}

fn generate_request(
    request: &RequestRender,
    options: &Options,
) -> Result<GeneratedRequest, RenderError> {
    let item = request.key.as_str();
    let types_module: syn::Path = syn::parse_str(&options.types_module).map_err(|err| {
        RenderError::new(
            item,
            format!("invalid types module `{}`: {err}", options.types_module),
        )
    })?;
    let name = name_to_ident(&request.name);

    let mut output_items: Vec<Item> = vec![
        parse_quote!(use serde::{Deserialize, Serialize};),
        parse_quote!(use #types_module as types;),
    ];
    if !request.requirements.is_empty() {
        let helpers = request
            .requirements
            .iter()
            .map(|requirement| format_ident!("{}", requirement.helper()));
        output_items.push(parse_quote!(use self::types::params::{#(#helpers),*};));
    }

    let mut extra_items = Vec::new();
    let mut fields = Vec::with_capacity(request.fields.len());
    let mut writes: Vec<Stmt> = Vec::with_capacity(request.fields.len());
    for field in &request.fields {
        let ident = name_to_ident(&field.name);
        let key = field.key.as_str();

        let (ty, presence, encoding): (Type, _, _) =
            if field.type_.is_union() {
                let enum_ident =
                    name_to_ident(&format!("{}{}", request.name, field.name.to_pascal_case()));
                let (enum_item, arms) = union_enum(item, &enum_ident, field)?;
                extra_items.push(enum_item);
                if field.is_required {
                    (parse_quote!(#enum_ident), Presence::Required, Encoding::Match(arms))
                } else {
                    (
                        parse_quote!(Option<#enum_ident>),
                        Presence::Optional,
                        Encoding::Match(arms),
                    )
                }
            } else {
                (
                    parse_type(item, &field.target)?,
                    Presence::of(field.is_required, &field.target),
                    Encoding::Value(field.kind),
                )
            };

        let attrs = field_attrs(&ident, key, presence);
        fields.push(quote!(#(#attrs)* pub #ident: #ty));

        writes.push(match presence {
            Presence::Required => {
                let expr = encoding.expr(key, parse_quote!(&self.#ident));
                parse_quote!(#expr;)
            }
            Presence::Optional => {
                let expr = encoding.expr(key, parse_quote!(value));
                parse_quote! {
                    if let Some(value) = &self.#ident {
                        #expr;
                    }
                }
            }
            Presence::Nullable => {
                let expr = encoding.expr(key, parse_quote!(&self.#ident));
                parse_quote! {
                    if !self.#ident.is_null() {
                        #expr;
                    }
                }
            }
        });
    }

    let response: Type = if request.response_variants.is_empty() {
        parse_type(item, &request.response_type)?
    } else {
        let response_ident = name_to_ident(&format!("{}Response", request.name));
        extra_items.push(response_enum(
            item,
            &response_ident,
            &request.response_variants,
        )?);
        parse_quote!(#response_ident)
    };

    let media = request
        .fields
        .iter()
        .flat_map(|field| {
            let key = field.key.as_str();
            field.file_leaves.iter().map(move |(name, required)| -> Expr {
                parse_quote!(types::MediaField { field: #key, name: #name, required: #required })
            })
        })
        .collect::<Vec<_>>();
    let media_const: Option<ImplItem> = (!media.is_empty())
        .then(|| parse_quote!(const MEDIA: &'static [types::MediaField] = &[#(#media),*];));

    let doc = doc_attrs(&request.description);
    output_items.push(parse_quote! {
        #(#doc)*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct #name {
            #(#fields,)*
        }
    });
    output_items.extend(extra_items);
    output_items.push(parse_quote! {
        impl types::Request for #name {
            const METHOD: &'static str = #item;
            type Response = #response;
            #media_const

            fn write_params(&self, params: &mut types::RequestParams) -> Result<(), serde_json::Error> {
                #(#writes)*
                Ok(())
            }
        }
    });

    debug!(method = item, media = media.len(), "rendered request");
    Ok(GeneratedRequest {
        file_stem: request.file_stem.clone(),
        source: unparse(output_items),
    })
}

fn unparse(items: Vec<Item>) -> String {
    let doc_comment = concat!(
        " Generated by ",
        env!("CARGO_PKG_NAME"),
        " ",
        env!("CARGO_PKG_VERSION")
    );
    let root = syn::File {
        shebang: None,
        attrs: vec![
            parse_quote!(#![doc = #doc_comment]),
            parse_quote!(#![allow(dead_code, unused_imports, unused_variables)]),
        ],
        items,
    };
    prettyplease::unparse(&root)
}

pub fn generate(registry: &Registry, options: &Options) -> Result<GeneratedCode, RenderError> {
    let mut visitor = RustVisitor::new();
    visitor.push_helpers();
    for type_ in build_types(registry) {
        visitor.visit_type(&type_)?;
    }
    let types = unparse(visitor.output_items);

    let requests = build_requests(registry)
        .iter()
        .map(|request| generate_request(request, options))
        .collect::<Result<Vec<_>, _>>()?;

    let modules = requests
        .iter()
        .map(|request| -> Item {
            let module = name_to_ident(&request.file_stem);
            parse_quote!(pub mod #module;)
        })
        .collect();
    let requests_mod = unparse(modules);

    Ok(GeneratedCode {
        types,
        requests,
        requests_mod,
    })
}

#[cfg(test)]
mod tests {
    use dt_botdoc::{extract_str, FieldDef, OperationDef, TypeDef};
    use pretty_assertions::assert_eq;

    use super::*;

    const API: &str = include_str!("../../../botdoc/tests/fixtures/api.html");

    fn generated() -> GeneratedCode {
        let registry = extract_str(API).unwrap();
        generate(&registry, &Options::default()).unwrap()
    }

    fn request<'a>(code: &'a GeneratedCode, file_stem: &str) -> &'a str {
        &code
            .requests
            .iter()
            .find(|request| request.file_stem == file_stem)
            .unwrap()
            .source
    }

    #[test]
    fn identifiers() {
        assert_eq!(name_to_ident("type").to_string(), "r#type");
        assert_eq!(name_to_ident("self").to_string(), "self_");
        assert_eq!(name_to_ident("3d").to_string(), "_3d");
        assert_eq!(name_to_ident("file-id").to_string(), "file_id");
        assert_eq!(name_to_ident("message_id").to_string(), "message_id");
    }

    #[test]
    fn generated_files_parse() {
        let code = generated();
        syn::parse_file(&code.types).unwrap();
        syn::parse_file(&code.requests_mod).unwrap();
        for request in &code.requests {
            syn::parse_file(&request.source)
                .unwrap_or_else(|err| panic!("{}: {err}\n{}", request.file_stem, request.source));
        }
        assert!(code.types.starts_with("//! Generated by dt-botdoc-generator"));
    }

    #[test]
    fn types() {
        let code = generated();
        assert!(code.types.contains("pub enum ChatId"));
        assert!(code.types.contains("pub trait Request: Serialize"));
        assert!(code.types.contains("pub struct Message {"));
        assert!(code.types.contains("pub message: Option<Box<Message>>"));
        assert!(code.types.contains("pub photo: Option<Vec<PhotoSize>>"));
        assert!(code.types.contains("pub r#type: String"));
        assert!(code.types.contains("pub thumbnail: Option<InputFile>"));
        assert!(code.types.contains("/// This object represents a message."));
        assert!(!code.types.contains("pub struct InputMedia {"));
        assert!(!code.types.contains("pub struct InputFile"));
    }

    #[test]
    fn request_module_lists_every_method() {
        let code = generated();
        let stems = code
            .requests
            .iter()
            .map(|request| request.file_stem.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            stems,
            vec![
                "edit_message_media",
                "get_updates",
                "log_out",
                "send_media_group",
                "send_message",
                "send_photo",
            ]
        );
        for stem in stems {
            assert!(code.requests_mod.contains(&format!("pub mod {stem};")));
        }
    }

    #[test]
    fn union_parameter() {
        let code = generated();
        let source = request(&code, "send_message");
        assert!(source.contains("use super::super::types as types;"));
        assert!(source.contains("pub struct SendMessage {"));
        assert!(source.contains("pub enum SendMessageReplyMarkup {"));
        assert!(source.contains("InlineKeyboardMarkup(types::InlineKeyboardMarkup)"));
        assert!(source.contains("pub reply_markup: Option<SendMessageReplyMarkup>"));
        assert!(source.contains("const METHOD: &'static str = \"sendMessage\";"));
        assert!(source.contains("type Response = types::Message;"));
        assert!(source.contains("scalar(params, \"chat_id\", &self.chat_id);"));
        assert!(source.contains("text(params, \"text\", &self.text);"));
        assert!(source.contains("other => json(params, \"reply_markup\", other)?"));
        assert!(!source.contains("const MEDIA"));
    }

    #[test]
    fn upload_parameter() {
        let code = generated();
        let source = request(&code, "send_photo");
        assert!(source.contains("pub photo: types::InputFile"));
        assert!(source.contains("file(params, \"photo\", &self.photo);"));
        assert!(source.contains("pub caption: Option<String>"));
    }

    #[test]
    fn media_fields() {
        let code = generated();
        let source = request(&code, "edit_message_media");
        assert!(source.contains("const MEDIA: &'static [types::MediaField]"));
        assert!(source.contains("name: \"thumbnail\""));
        assert!(source.contains("pub media: serde_json::Value"));
        assert!(source.contains("json(params, \"media\", &self.media)?;"));

        let source = request(&code, "send_media_group");
        assert!(source.contains("pub enum SendMediaGroupMedia {"));
        assert!(source.contains("InputMediaPhotoList(Vec<types::InputMediaPhoto>)"));
    }

    #[test]
    fn missing_return_type_is_dynamic() {
        let code = generated();
        let source = request(&code, "log_out");
        assert!(source.contains("type Response = serde_json::Value;"));
        assert!(source.contains("pub struct LogOut"));
        assert!(!source.contains("use self::types::params"));
    }

    #[test]
    fn abstract_return_type() {
        let mut registry = Registry::new();
        let mut scope = TypeDef::new("BotCommandScope");
        scope.subtypes = vec!["BotCommandScopeDefault".into(), "BotCommandScopeChat".into()];
        registry.types.insert(scope.name.clone(), scope);
        let mut operation = OperationDef::new("getMyScope");
        operation.return_type = Some(TypeExpr::named("BotCommandScope"));
        registry
            .operations
            .insert(operation.key.clone(), operation);

        let code = generate(&registry, &Options::default()).unwrap();
        let source = &code.requests[0].source;
        syn::parse_file(source).unwrap();
        assert!(source.contains("pub enum GetMyScopeResponse {"));
        assert!(source.contains("BotCommandScopeChat(types::BotCommandScopeChat)"));
        assert!(source.contains("type Response = GetMyScopeResponse;"));
    }

    #[test]
    fn custom_types_module() {
        let registry = extract_str(API).unwrap();
        let options = Options {
            types_module: "crate::api::types".to_string(),
        };
        let code = generate(&registry, &options).unwrap();
        assert!(request(&code, "send_message").contains("use crate::api::types as types;"));

        let options = Options {
            types_module: "not a path".to_string(),
        };
        let err = generate(&registry, &options).unwrap_err();
        assert!(err.to_string().contains("invalid types module"));
    }

    #[test]
    fn optional_dynamic_fields_default_to_null() {
        let mut registry = Registry::new();
        let mut origin = TypeDef::new("Origin");
        origin.subtypes = vec!["OriginUser".into(), "OriginChat".into()];
        registry.types.insert(origin.name.clone(), origin);
        let mut holder = TypeDef::new("Holder");
        for (key, type_, is_required) in [
            ("id", TypeExpr::Scalar(Scalar::Int64), true),
            ("origin", TypeExpr::named("Origin"), false),
        ] {
            holder
                .fields
                .insert(key.into(), FieldDef::new(key, type_, is_required));
        }
        registry.types.insert(holder.name.clone(), holder);

        let code = generate(&registry, &Options::default()).unwrap();
        syn::parse_file(&code.types).unwrap();
        let lines = code.types.lines().collect::<Vec<_>>();
        let field = lines
            .iter()
            .position(|line| line.contains("pub origin: serde_json::Value"))
            .unwrap();
        assert!(lines[field - 1].contains("default"), "{}", lines[field - 1]);
        assert!(lines[field - 1].contains("serde_json::Value::is_null"));
    }
}
