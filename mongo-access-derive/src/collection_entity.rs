use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Result};

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut mapping_found = false;
    let mut database: Option<String> = None;
    let mut collection: Option<String> = None;

    for attr in &ast.attrs {
        if attr.path().is_ident("mapping") {
            if mapping_found {
                return Err(syn::Error::new_spanned(
                    attr,
                    "Multiple mapping attributes are not allowed",
                ));
            }
            mapping_found = true;

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("database") {
                    if database.is_some() {
                        return Err(meta.error("database is already set"));
                    }
                    let s: LitStr = meta.value()?.parse()?;
                    database = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("collection") {
                    if collection.is_some() {
                        return Err(meta.error("collection is already set"));
                    }
                    let s: LitStr = meta.value()?.parse()?;
                    collection = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("Unknown mapping attribute, expected `database` or `collection`"))
                }
            })?;
        }
    }

    // a missing key becomes an empty name, reported on first access
    let mapping_code = if mapping_found {
        let database = database.unwrap_or_default();
        let collection = collection.unwrap_or_default();
        quote! {
            fn mapping_information() -> Option<mongo_access::MappingInformation> {
                Some(mongo_access::MappingInformation::new(#database, #collection))
            }
        }
    } else {
        quote! {
            fn mapping_information() -> Option<mongo_access::MappingInformation> {
                None
            }
        }
    };

    let gen = quote! {
        impl #impl_generics mongo_access::CollectionEntity for #name #ty_generics #where_clause {
            #mapping_code
        }
    };

    Ok(TokenStream::from(gen))
}
