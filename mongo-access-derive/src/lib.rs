#![recursion_limit = "128"]
//! # mongo_access Derive Macros
//!
//! ### `CollectionEntity`
//!
//! Derives the `CollectionEntity` trait for structs, attaching the database
//! and collection the type is stored in.
//!
//! - **Supported for**: structs (named, tuple or unit)
//! - **Container attribute**: `#[mapping(database = "...", collection = "...")]`
//!
//! # Examples
//!
//! ```rust,ignore
//! use mongo_access_derive::CollectionEntity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, CollectionEntity)]
//! #[mapping(database = "shop", collection = "orders")]
//! pub struct Order {
//!     pub status: String,
//! }
//! ```
//!
//! A struct without `#[mapping]` still derives, and reports the missing
//! mapping at runtime on first access. Unknown keys are compile errors.

extern crate proc_macro;
mod collection_entity;

use crate::collection_entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `CollectionEntity` trait.
///
/// # Attributes
///
/// - `#[mapping(database = "db", collection = "coll")]` - target of the entity
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum or union
/// - The `mapping` attribute has an unknown key or a non-string value
/// - A key is given twice
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize, CollectionEntity)]
/// #[mapping(database = "billing", collection = "invoices")]
/// pub struct Invoice {
///     pub total: i64,
/// }
/// ```
#[proc_macro_derive(CollectionEntity, attributes(mapping))]
pub fn derive_collection_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(_) => match generate_entity_for_struct(&ast) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive CollectionEntity for enums. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive CollectionEntity for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
