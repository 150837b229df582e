//! `#[method]` implementation
//!
//! Input:
//! ```ignore
//! #[method]
//! fn divide(a: i64, b: i64) -> Result<i64, String> {
//!     Ok(a / b)
//! }
//! ```
//!
//! Generated output:
//! ```ignore
//! fn divide() -> Box<dyn jrmc_server::Method> {
//!     fn inner_method(a: i64, b: i64) -> Result<i64, String> {
//!         Ok(a / b)
//!     }
//!
//!     jrmc_server::from_typed_fn(|(__arg0, __arg1,): (i64, i64,)| inner_method(__arg0, __arg1))
//! }
//! ```
//!
//! The positional params of a request are deserialized as a tuple of the
//! argument types, so a wrong count or type is reported by serde.
//!
//! Generated code names the server crate as `jrmc_server` unless the
//! attribute says otherwise: `#[method(crate = jrmc::server)]` emits
//! `jrmc::server::Method` and `jrmc::server::from_typed_fn` instead.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, parse_quote, FnArg, Ident, ItemFn, Path, ReturnType};

/// Entry point for `#[method]`
///
/// # Arguments
///
/// * `attr` - The attribute's own arguments (empty, or `crate = <path>`)
/// * `input` - The token stream of the attributed function
///
/// # Returns
///
/// The generated factory function, or a `compile_error!` pointing at the
/// offending part of the signature.
pub fn method_impl(attr: TokenStream, input: TokenStream) -> TokenStream {
    // Path to the server crate, overridable with `crate = some::path`
    let mut krate: Path = parse_quote!(jrmc_server);
    let arguments = syn::meta::parser(|meta| {
        if meta.path.is_ident("crate") {
            krate = meta.value()?.parse()?;
            Ok(())
        } else {
            Err(meta.error("unsupported #[method] argument, expected `crate = <path>`"))
        }
    });
    parse_macro_input!(attr with arguments);

    // Parse the input tokens as a function item
    let input_fn = parse_macro_input!(input as ItemFn);

    match expand(&input_fn, &krate) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

/// Build the factory function for `input_fn`
///
/// Signature problems come back as spanned `syn::Error`s so the compiler
/// points at the `async` keyword, the generics or the receiver.
fn expand(input_fn: &ItemFn, krate: &Path) -> syn::Result<proc_macro2::TokenStream> {
    let sig = &input_fn.sig;

    // Reject signatures the generated closure cannot call:
    // dispatch is synchronous, and the argument types must be concrete to
    // be deserialized

    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[method] functions are called synchronously; remove `async`",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[method] functions cannot be generic",
        ));
    }

    // Collect the argument types in order; they become the tuple the
    // params array is deserialized into
    let mut arg_types = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Typed(pat_type) => arg_types.push(pat_type.ty.as_ref()),
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[method] cannot be applied to methods taking `self`",
                ))
            }
        }
    }

    // The body must produce a Result; `from_typed_fn` relies on it
    let return_type = match &sig.output {
        ReturnType::Type(_, ty) => quote! { #ty },
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "#[method] functions must return a Result",
            ))
        }
    };

    let fn_name = &sig.ident; // Factory keeps the original name
    let fn_vis = &input_fn.vis; // and visibility
    let fn_attrs = &input_fn.attrs; // Doc comments, cfg, allow(...)
    let fn_block = &input_fn.block; // The user's implementation
    let fn_inputs = &sig.inputs; // Original parameter list, patterns included

    // Fresh names for the destructured tuple, independent of the user's
    // argument patterns (which may be `_` or destructuring themselves)
    let arg_names: Vec<Ident> = (0..arg_types.len())
        .map(|i| Ident::new(&format!("__arg{}", i), Span::call_site()))
        .collect();

    // `[(); 0]` deserializes from an empty array, `()` would expect null
    let adapter = if arg_types.is_empty() {
        quote! { |_: [(); 0]| inner_method() }
    } else {
        quote! { |(#(#arg_names,)*): (#(#arg_types,)*)| inner_method(#(#arg_names),*) }
    };

    Ok(quote! {
        // Preserve all original attributes (doc comments, cfg, etc.)
        #(#fn_attrs)*
        #fn_vis fn #fn_name() -> Box<dyn #krate::Method> {
            // The original function, unchanged, under a private name
            fn inner_method(#fn_inputs) -> #return_type #fn_block

            // Deserialize the params tuple and forward it by position
            #krate::from_typed_fn(#adapter)
        }
    })
}
