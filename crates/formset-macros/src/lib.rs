use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Turn a function into a composable.
///
/// The body runs inside a group keyed by the call site of the function
/// definition, so every invocation gets its own remembered slots and a
/// recompose scope that state reads can subscribe to.
#[proc_macro_attribute]
pub fn composable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_tokens = TokenStream2::from(attr);
    if !attr_tokens.is_empty() {
        return syn::Error::new_spanned(attr_tokens, "composable takes no arguments")
            .to_compile_error()
            .into();
    }

    let mut func = parse_macro_input!(item as ItemFn);
    if func.sig.asyncness.is_some() {
        return syn::Error::new_spanned(func.sig.asyncness, "composable functions cannot be async")
            .to_compile_error()
            .into();
    }

    let original_block = func.block.clone();
    let key_expr = quote! { ::formset_core::location_key(file!(), line!(), column!()) };

    let wrapped = quote! {
        {
            ::formset_core::with_current_composer(move |__composer| {
                __composer.with_group(#key_expr, move |_| #original_block)
            })
        }
    };
    func.block = Box::new(syn::parse_quote!(#wrapped));

    TokenStream::from(quote! { #func })
}
