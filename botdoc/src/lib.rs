//! Extraction of a typed schema from the Telegram Bot API reference page.
//!
//! The pipeline runs leaves first: [`sectionizer`] walks the HTML document and fills a
//! [`Registry`], [`type_expr`] turns the informal type phrases of the reference into
//! [`TypeExpr`] values, [`resolve`] maps those onto Rust types and [`request`] prepares the
//! per-method data consumed by a renderer (see [`render`]).

pub mod error;
pub mod registry;
pub mod render;
pub mod request;
pub mod resolve;
pub mod sectionizer;
pub mod tree;
pub mod type_expr;

pub use error::ExtractError;
pub use registry::{FieldDef, Fields, OperationDef, Registry, TypeDef};
pub use render::{RequestRender, TypeRender};
pub use sectionizer::{extract, extract_str};
pub use type_expr::{Scalar, TypeExpr};

/// Location of the reference this crate was written against.
pub const TELEGRAM_BOT_API_URL: &str = "https://core.telegram.org/bots/api";
