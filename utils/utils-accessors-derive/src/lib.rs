//! # Accessor Derive
//!
//! Derive macro for builder-style setters on plain configuration structs
//! such as allocation requests.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitBool, parse_macro_input, spanned::Spanned};

/// Derive to generate `.set_<field>(&mut self, value) -> &mut Self` and
/// `.with_<field>(self, value) -> Self` for each **named** field.
///
/// - Accepting anything convertible: `#[setters(into)]` makes both setters
///   take `impl Into<Ty>`. Such `with_` setters are not `const`.
///
/// # Example
///
/// ```
/// use utils_accessors_derive::Setters;
///
/// #[derive(Setters)]
/// struct Request {
///     size: u64,
///     #[setters(into)]
///     hint: u64,
/// }
///
/// let mut r = Request { size: 1, hint: 0 };
/// r.set_size(10).set_size(11);
/// let r = r.with_hint(0x1000_u32).with_size(0x2000);
/// assert_eq!((r.size, r.hint), (0x2000, 0x1000));
/// ```
#[proc_macro_derive(Setters, attributes(setters))]
pub fn derive_generate_setters(input: TokenStream) -> TokenStream {
    let DeriveInput {
        ident,
        generics,
        data,
        ..
    } = parse_macro_input!(input as DeriveInput);

    let fields = match data {
        Data::Struct(s) => match s.fields {
            Fields::Named(n) => n.named,
            Fields::Unnamed(u) => {
                return syn::Error::new(u.span(), "Setters only supports named fields")
                    .to_compile_error()
                    .into();
            }
            Fields::Unit => {
                return syn::Error::new(ident.span(), "Setters does not apply to unit structs")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new(ident.span(), "Setters can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut methods = Vec::new();

    for field in &fields {
        let Some(fname) = &field.ident else { continue };
        let options = match FieldOptions::parse(field) {
            Ok(options) => options,
            Err(e) => return e.to_compile_error().into(),
        };

        let ty = &field.ty;
        let set_name = format_ident!("set_{}", fname);
        let with_name = format_ident!("with_{}", fname);
        let set_doc = format!("Sets `{fname}` in place.");
        let with_doc = format!("Returns `self` with `{fname}` replaced.");

        if options.into {
            methods.push(quote! {
                #[doc = #set_doc]
                #[inline]
                pub fn #set_name(&mut self, value: impl ::core::convert::Into<#ty>) -> &mut Self {
                    self.#fname = value.into();
                    self
                }

                #[doc = #with_doc]
                #[inline]
                #[must_use]
                pub fn #with_name(mut self, value: impl ::core::convert::Into<#ty>) -> Self {
                    self.#fname = value.into();
                    self
                }
            });
        } else {
            methods.push(quote! {
                #[doc = #set_doc]
                #[inline]
                pub fn #set_name(&mut self, value: #ty) -> &mut Self {
                    self.#fname = value;
                    self
                }

                #[doc = #with_doc]
                #[inline]
                #[must_use]
                pub const fn #with_name(mut self, value: #ty) -> Self {
                    self.#fname = value;
                    self
                }
            });
        }
    }

    let expanded = quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    };

    TokenStream::from(expanded)
}

/// Options from `#[setters(...)]` on a single field.
#[derive(Default)]
struct FieldOptions {
    into: bool,
}

impl FieldOptions {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("setters") {
                continue;
            }

            // Accept #[setters(into)] and #[setters(into = true)]
            attr.parse_nested_meta(|meta| {
                if !meta.path.is_ident("into") {
                    return Err(meta.error("expected `into`"));
                }

                options.into = if meta.input.is_empty() {
                    true
                } else {
                    meta.value()?.parse::<LitBool>()?.value
                };
                Ok(())
            })?;
        }
        Ok(options)
    }
}
