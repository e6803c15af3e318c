use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelReceiver {
	ident: syn::Ident,
	generics: syn::Generics,
	data: ast::Data<(), FieldReceiver>,
	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct FieldReceiver {
	ident: Option<syn::Ident>,
	ty: syn::Type,
	vis: syn::Visibility,
	attrs: Vec<syn::Attribute>,
}

/// Whether the field is never read from client input.
fn is_server_owned(attr: &syn::Attribute) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	list.path.is_ident("serde")
		&& list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelReceiver::from_derive_input(&input) {
		Ok(receiver) => receiver,
		Err(e) => return e.write_errors().into(),
	};

	let vis = &input.vis;
	let generics = &receiver.generics;
	let attrs = &receiver.attrs;
	let create_ident = format_ident!("Create{}Input", receiver.ident);
	let update_ident = format_ident!("Update{}Input", receiver.ident);

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(&input.ident, "#[model] only supports named structs")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter(|field| !field.attrs.iter().any(is_server_owned))
		.filter_map(|field| Some((&field.attrs, field.ident.as_ref()?, &field.ty, &field.vis)))
		.collect::<Vec<_>>();

	let create_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	let update_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: Option<#ty>,
		}
	});

	quote! {
		#input

		#(#attrs)*
		#vis struct #create_ident #generics {
			#(#create_fields)*
		}

		#(#attrs)*
		#vis struct #update_ident #generics {
			#(#update_fields)*
		}
	}
	.into()
}
