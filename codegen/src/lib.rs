use proc_macro2::TokenStream;

use distil_wsdl::{self as wsdl, error::Error, model::Distillation, Options};

mod codegen;

/// Runs the whole pipeline over a source (raw XML, path, or URL) and
/// emits the generated module tree.
pub fn from_source<S: AsRef<str>>(source: S, options: &Options) -> Result<TokenStream, Error> {
    let model = wsdl::distil(source, options)?;
    Ok(from_model(&model))
}

pub fn from_model(model: &Distillation) -> TokenStream {
    codegen::codegen(model)
}
