use darling::ast::{Data, Fields};
use darling::util::{Flag, Ignored, PathList};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Generics, Ident, Path, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(bean), supports(struct_named, struct_unit))]
struct BeanArgs {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, BeanField>,
    #[darling(default)]
    component: Flag,
    #[darling(default)]
    service: Flag,
    #[darling(default)]
    repository: Flag,
    #[darling(default)]
    controller: Flag,
    #[darling(default)]
    implements: PathList,
    #[darling(default)]
    factory: Option<Path>,
}

#[derive(FromField)]
struct BeanField {
    ident: Option<Ident>,
    ty: Type,
}

pub fn derive_bean(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match BeanArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(e) => return e.write_errors().into(),
    };

    match generate_bean_impl(args) {
        Ok(expanded) => expanded.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn generate_bean_impl(args: BeanArgs) -> syn::Result<TokenStream2> {
    let struct_name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();
    let stereotype = stereotype(&args)?;

    let fields = match &args.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "#[derive(Bean)] can only be applied to structs",
            ))
        }
    };

    let instantiate_body = match &args.factory {
        Some(factory) => quote! { #factory() },
        None => {
            let initializers = default_initializers(fields);
            quote! { ::core::result::Result::Ok(Self { #(#initializers),* }) }
        }
    };

    // Autowired<T> fields are the injection points
    let injection_points = fields
        .iter()
        .filter(|field| is_autowired(&field.ty))
        .filter_map(|field| field.ident.as_ref())
        .map(|name| {
            quote! {
                ::beanwire::di::InjectionPoint::new(::core::stringify!(#name), &self.#name)
            }
        });

    let interfaces = args.implements.iter().map(|path| {
        quote! {
            ::beanwire::di::Interface::of::<dyn #path, Self>(
                |bean: ::std::sync::Arc<Self>| -> ::std::sync::Arc<dyn #path> { bean }
            )
        }
    });

    let registration = match stereotype {
        Some(variant) => {
            if !args.generics.params.is_empty() {
                return Err(syn::Error::new_spanned(
                    &args.generics,
                    "stereotype registration requires a non-generic struct",
                ));
            }
            quote! {
                ::beanwire::inventory::submit! {
                    ::beanwire::scan::ComponentRegistration::new(
                        ::beanwire::scan::Stereotype::#variant,
                        ::core::module_path!(),
                        ::core::any::type_name::<#struct_name>,
                        ::beanwire::di::BeanDefinition::of::<#struct_name>,
                    )
                }
            }
        }
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::beanwire::Bean for #struct_name #ty_generics #where_clause {
            fn instantiate() -> ::beanwire::Result<Self> {
                #instantiate_body
            }

            fn interfaces() -> ::std::vec::Vec<::beanwire::di::Interface> {
                ::std::vec![#(#interfaces),*]
            }

            fn injection_points(&self) -> ::std::vec::Vec<::beanwire::di::InjectionPoint<'_>> {
                ::std::vec![#(#injection_points),*]
            }
        }

        #registration
    })
}

/// At most one stereotype flag may be set.
fn stereotype(args: &BeanArgs) -> syn::Result<Option<Ident>> {
    let flags = [
        ("Component", &args.component),
        ("Service", &args.service),
        ("Repository", &args.repository),
        ("Controller", &args.controller),
    ];

    let mut selected = flags.iter().filter(|(_, flag)| flag.is_present());
    let first = selected.next();
    if let Some((_, extra)) = selected.next() {
        return Err(syn::Error::new(
            extra.span(),
            "a bean can carry only one stereotype",
        ));
    }

    Ok(first.map(|(name, flag)| Ident::new(name, flag.span())))
}

fn default_initializers(fields: &Fields<BeanField>) -> Vec<TokenStream2> {
    fields
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .map(|name| quote! { #name: ::core::default::Default::default() })
        .collect()
}

/// Matches `Autowired<T>` by its last path segment, so `beanwire::Autowired`
/// and a bare `Autowired` import both count.
fn is_autowired(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Autowired"),
        _ => false,
    }
}
