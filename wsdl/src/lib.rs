use std::path::Path;
use url::Url;

mod parser;
mod resolver;
mod services;

pub mod error;
pub mod model;
pub mod names;
pub mod store;
pub mod types;

pub use resolver::{primitive_for, ResolvedTypes};

use error::Error;
use model::Distillation;
use types::Extracted;

/// Configuration accepted by the translation entry point.
#[derive(Default, Debug, Clone)]
pub struct Options {
    /// Prefix applied to every generated type and service name.
    pub class_prefix: String,
    /// Opaque namespace label passed through to code emission.
    pub namespace: String,
}

/// Runs the extraction stage: a raw XML source in, the complete
/// definition store out. The source may be raw XML text, a file path,
/// or a `file`/`http(s)` URL.
pub fn extract<S: AsRef<str>>(source: S) -> Result<Extracted, Error> {
    let source = source.as_ref();

    if source.trim_start().starts_with('<') {
        return parser::parse_str(source);
    }

    let url = {
        match Url::parse(source) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
                Path::new(source)
                    .canonicalize()
                    .map_err(|err| Error::PathConversionError(Some(err)))?,
            )
            .map_err(|()| Error::PathConversionError(None))?,
            Err(err) => return Err(err.into()),
        }
    };

    parser::parse(url)
}

/// Runs the full pipeline: extract, resolve, then assemble the derived
/// records and the service model. Fails without producing a partial
/// model on any structural error.
pub fn distil<S: AsRef<str>>(source: S, options: &Options) -> Result<Distillation, Error> {
    distil_extracted(extract(source)?, options)
}

/// Resolution and model assembly over an already-extracted document
/// set. Each stage is a pure function of the previous stage's output.
pub fn distil_extracted(extracted: Extracted, options: &Options) -> Result<Distillation, Error> {
    let resolved = resolver::resolve(&extracted, &options.class_prefix)?;
    let records = model::derive_records(&extracted, &resolved, &options.class_prefix)?;
    let services = services::build(&extracted, &resolved)?;

    Ok(Distillation {
        records,
        services,
        namespaces: extracted.namespaces,
        target_namespace: options.namespace.clone(),
    })
}
