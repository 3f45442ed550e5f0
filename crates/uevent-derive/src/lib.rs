//! Derive macro for the `ObjectType` trait.
//!
//! # Usage
//!
//! ```ignore
//! use uevent::{ObjectType, TypeBuilder};
//!
//! #[derive(ObjectType)]
//! #[object(methods = Door::methods)]
//! pub struct Door {
//!     open: AtomicBool,
//! }
//!
//! impl Door {
//!     fn methods(builder: &mut TypeBuilder<Self>) {
//!         builder.method1("set_open", |door: &Door, open: bool| {
//!             door.open.store(open, Ordering::Relaxed);
//!         });
//!     }
//! }
//!
//! // Renamed, with no persistent-listener methods
//! #[derive(ObjectType)]
//! #[object(name = "Key")]
//! pub struct DoorKey;
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, LitStr, Path, parse_macro_input};

#[derive(Default)]
struct ObjectArgs {
    name: Option<LitStr>,
    methods: Option<Path>,
}

impl ObjectArgs {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut args = Self::default();
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("object")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    args.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("methods") {
                    args.methods = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `name` or `methods`"))
                }
            })?;
        }
        Ok(args)
    }
}

/// Derive macro for the `ObjectType` trait.
///
/// Non-generic types are also submitted to the global type inventory, so
/// `Runtime::global()` knows them without explicit registration.
///
/// # Attributes
///
/// - `#[object(name = "...")]` - Short type name. Defaults to the identifier.
/// - `#[object(methods = path)]` - Function `fn(&mut TypeBuilder<Self>)`
///   describing the methods persistent listeners may bind to.
#[proc_macro_derive(ObjectType, attributes(object))]
pub fn derive_object_type(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let args = match ObjectArgs::parse(&input) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let type_name_str = args
        .name
        .map_or_else(|| name.to_string(), |name| name.value());

    let describe = args.methods.map(|methods| {
        quote! {
            fn describe(builder: &mut ::uevent::TypeBuilder<Self>) {
                #methods(builder);
            }
        }
    });

    let registration = if input.generics.params.is_empty() {
        quote! {
            ::uevent::inventory::submit! {
                ::uevent::TypeRegistration::new(::uevent::register_type::<#name>)
            }
        }
    } else {
        TokenStream2::new()
    };

    let expanded = quote! {
        impl #impl_generics ::uevent::ObjectType for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name_str
            }

            #describe
        }

        #registration
    };

    TokenStream::from(expanded)
}
