mod model;
mod route;

use proc_macro::TokenStream;

/// Generates a `<name>_docs` function for an aide route from the handler's doc comment.
///
/// The first line of the doc comment becomes the operation summary and the
/// remaining lines the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Generates `CreateXInput` and `UpdateXInput` structs for a model.
///
/// Fields marked `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out
/// of both. The create input keeps the remaining fields verbatim, the update
/// input wraps each of them in an `Option`.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
