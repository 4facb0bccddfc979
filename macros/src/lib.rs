//! # Macros — code generation for the Gridloop domain model
//!
//! Every boundary the engine talks to (the local store, the remote document
//! store) represents strategy kinds, cycle kinds and sides as plain strings.
//! Hand-writing `Display`/`FromStr`/`Serialize`/`Deserialize` for every
//! fieldless enum in `gridloop-markets` would be the same ten lines repeated
//! for each one, so this crate derives them from the variant names instead.
//!
//! ## `SnakeCaseKind`
//!
//! Derives `Display`, `FromStr`, `Serialize` and `Deserialize` for a
//! fieldless enum, converting `PascalCase` variants to `snake_case` strings
//! on the wire.
//!
//! ```rust,ignore
//! use gridloop_macros::SnakeCaseKind;
//!
//! #[derive(SnakeCaseKind, Debug, Clone, Copy, PartialEq, Eq)]
//! enum CycleStatus {
//!     Initial,
//!     Active,
//!     Recovery,
//!     Closed,
//! }
//!
//! assert_eq!(CycleStatus::Recovery.to_string(), "recovery");
//! assert_eq!("active".parse::<CycleStatus>().unwrap(), CycleStatus::Active);
//! ```

extern crate proc_macro;

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

#[proc_macro_derive(SnakeCaseKind)]
pub fn snake_case_kind_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput =
        syn::parse(input).expect("SnakeCaseKind: failed to parse input TokenStream");

    let name = &ast.ident;
    let Data::Enum(data) = &ast.data else {
        panic!("SnakeCaseKind can only be derived for enums");
    };

    let mut variant_idents = Vec::new();
    let mut variant_strs = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            panic!("SnakeCaseKind only supports fieldless (unit) variants");
        }
        variant_idents.push(variant.ident.clone());
        variant_strs.push(variant.ident.to_string().to_case(Case::Snake));
    }

    let display_arms = variant_idents.iter().zip(variant_strs.iter()).map(|(v, s)| {
        quote! { #name::#v => write!(f, #s) }
    });

    let from_str_arms = variant_idents.iter().zip(variant_strs.iter()).map(|(v, s)| {
        quote! { #s => Ok(#name::#v) }
    });

    let generated = quote! {
        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    #(#display_arms),*
                }
            }
        }

        impl std::str::FromStr for #name {
            type Err = String;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                match input {
                    #(#from_str_arms,)*
                    other => Err(format!(
                        concat!(stringify!(#name), ": unrecognised kind {:?}"),
                        other
                    )),
                }
            }
        }

        impl serde::Serialize for #name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::ser::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for #name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::de::Deserializer<'de>,
            {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };

    TokenStream::from(generated)
}
