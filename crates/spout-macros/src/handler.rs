use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Ident, ItemFn, LitStr, parse_macro_input};

/// Handler name given to `#[register_handler(...)]`.
struct HandlerName(LitStr);

impl Parse for HandlerName {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            let lit: LitStr = input.parse()?;
            if lit.value().trim().is_empty() {
                return Err(syn::Error::new(lit.span(), "handler name must not be empty"));
            }
            Ok(Self(lit))
        } else {
            let ident: Ident = input.parse()?;
            Ok(Self(LitStr::new(&ident.to_string(), ident.span())))
        }
    }
}

/// Implementation of `#[register_handler(name)]` attribute macro.
///
/// Leaves the decorated `fn` unchanged and appends a
/// `#[::spout_core::linkme::distributed_slice]` static that wires the function
/// into `HANDLER_REGISTRY` in `spout-core`.
pub fn register_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    let HandlerName(name) = parse_macro_input!(attr as HandlerName);
    let func = parse_macro_input!(item as ItemFn);

    if let Some(asyncness) = func.sig.asyncness {
        return syn::Error::new(asyncness.span, "handler factories must not be async")
            .into_compile_error()
            .into();
    }
    if !func.sig.inputs.is_empty() {
        return syn::Error::new_spanned(
            &func.sig.inputs,
            "handler factories must take no arguments",
        )
        .into_compile_error()
        .into();
    }

    let fn_name = &func.sig.ident;
    let fn_name_upper = fn_name.to_string().to_uppercase();
    let static_name = Ident::new(
        &format!("_HANDLER_REGISTER_{fn_name_upper}"),
        Span::call_site(),
    );

    quote! {
        #func

        #[::spout_core::linkme::distributed_slice(::spout_core::HANDLER_REGISTRY)]
        #[linkme(crate = ::spout_core::linkme)]
        static #static_name: ::spout_core::HandlerRegistration =
            ::spout_core::HandlerRegistration {
                name: #name,
                factory: || -> ::spout_core::BoxedHandler {
                    ::std::boxed::Box::new(#fn_name())
                },
            };
    }
    .into()
}
