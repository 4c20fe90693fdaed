use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, FnArg, Ident, ItemFn, LitBool, Path,
    ReturnType, Token,
};

struct TransactionArgs {
    isolation: Option<Path>,
    propagation: Option<Path>,
    read_only: Option<bool>,
    manager: Option<Ident>,
}

impl Parse for TransactionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut isolation = None;
        let mut propagation = None;
        let mut read_only = None;
        let mut manager = None;

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if key == "isolation" {
                isolation = Some(input.parse()?);
            } else if key == "propagation" {
                propagation = Some(input.parse()?);
            } else if key == "read_only" {
                let b: LitBool = input.parse()?;
                read_only = Some(b.value);
            } else if key == "manager" {
                manager = Some(input.parse()?);
            } else {
                return Err(syn::Error::new_spanned(
                    key,
                    "expected one of: isolation, propagation, read_only, manager",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(TransactionArgs {
            isolation,
            propagation,
            read_only,
            manager,
        })
    }
}

pub fn transactional_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as TransactionArgs);
    let mut input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "#[transactional] can only be used on async functions",
        )
        .to_compile_error()
        .into();
    }

    if !matches!(input.sig.inputs.first(), Some(FnArg::Receiver(_))) {
        return syn::Error::new_spanned(
            &input.sig,
            "#[transactional] methods must take self to reach their transaction manager",
        )
        .to_compile_error()
        .into();
    }

    let method_name = &input.sig.ident;
    let block = &input.block;

    // Pins the body's type so `?` inside it converts into the method's error type.
    let body = match &input.sig.output {
        ReturnType::Type(_, ty) => quote! {
            async move {
                let __result: #ty = (async move #block).await;
                __result
            }
        },
        ReturnType::Default => {
            return syn::Error::new_spanned(
                &input.sig,
                "#[transactional] methods must return a Result",
            )
            .to_compile_error()
            .into();
        }
    };

    // A bare variant name maps onto the beanwire enums; a longer path is used as-is.
    let isolation_code = match &args.isolation {
        Some(path) => {
            let path = enum_path(path, quote!(::beanwire::transactional::IsolationLevel));
            quote! { ::core::option::Option::Some(#path) }
        }
        None => quote! { ::core::option::Option::None },
    };

    let propagation_code = match &args.propagation {
        Some(path) => enum_path(path, quote!(::beanwire::transactional::Propagation)),
        None => quote! { ::beanwire::transactional::Propagation::Required },
    };

    let read_only_code = args.read_only.unwrap_or(false);

    let manager_field = args
        .manager
        .clone()
        .unwrap_or_else(|| Ident::new("transaction_manager", proc_macro2::Span::call_site()));

    let new_block = quote! {
        {
            let __options = ::beanwire::transactional::TransactionOptions {
                name: ::core::option::Option::Some(::std::format!(
                    "{}::{}",
                    ::core::any::type_name::<Self>(),
                    ::core::stringify!(#method_name),
                )),
                propagation: #propagation_code,
                isolation: #isolation_code,
                read_only: #read_only_code,
            };

            let __manager = match ::beanwire::transactional::TransactionManagerSource::transaction_manager(
                &self.#manager_field,
            ) {
                ::core::result::Result::Ok(manager) => manager,
                ::core::result::Result::Err(e) => {
                    return ::core::result::Result::Err(::core::convert::From::from(e));
                }
            };

            ::beanwire::transactional::execute(&*__manager, __options, #body).await
        }
    };

    input.block = match syn::parse2(new_block) {
        Ok(block) => block,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(quote! {
        #input
    })
}

fn enum_path(path: &Path, enum_type: TokenStream2) -> TokenStream2 {
    match path.get_ident() {
        Some(variant) => quote! { #enum_type::#variant },
        None => quote! { #path },
    }
}
