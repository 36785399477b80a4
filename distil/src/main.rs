use std::{fs, path::PathBuf};

use structopt::StructOpt;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use distil_wsdl::Options;

#[derive(Debug, StructOpt)]
#[structopt(about = "Generate typed client code from a WSDL document")]
struct Args {
    /// File to write the generated code to
    #[structopt(short, long, default_value = "./output.rs")]
    output: PathBuf,

    /// Prefix applied to every generated type and service name
    #[structopt(short, long, default_value = "")]
    prefix: String,

    /// Namespace label carried into the generated module
    #[structopt(short, long, default_value = "")]
    namespace: String,

    /// WSDL source: a file path, an http(s) URL, or raw XML
    input: String,
}

#[derive(Debug, Error)]
enum Error {
    #[error("Error processing WSDL document")]
    Distil(#[from] distil_wsdl::error::Error),

    #[error("Generated code is not valid Rust")]
    Parse(#[from] syn::Error),

    #[error("Error writing output file")]
    Write(#[from] std::io::Error),
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = Options {
        class_prefix: args.prefix,
        namespace: args.namespace,
    };

    let tokens = distil_codegen::from_source(&args.input, &options)?;
    let file = syn::parse2::<syn::File>(tokens)?;

    fs::write(&args.output, prettyplease::unparse(&file))?;
    info!(output = %args.output.display(), "wrote generated code");

    Ok(())
}
