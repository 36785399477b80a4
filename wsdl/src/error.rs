use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(quick_xml::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Root element of document must be a WSDL <definitions> or an XML Schema <schema>, found <{0}>")]
    InvalidDocument(String),

    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("Invalid type reference '{0}'")]
    MalformedReference(String),

    #[error("Unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    #[error("Invalid simple type definition {0} (unions are not supported)")]
    UnsupportedUnion(String),

    #[error("Invalid complex type element {type_name}::{element}: minOccurs ({min}) > maxOccurs ({max})")]
    InvalidCardinality {
        type_name: String,
        element: String,
        min: u32,
        max: u32,
    },

    #[error("Invalid occurrence bound '{0}'")]
    InvalidOccurs(String),

    #[error("Cannot follow import of '{0}' from an in-memory document")]
    UnresolvableImport(String),

    #[error("Expected type {0} was not defined in the document")]
    UndefinedType(String),

    #[error("Expected simple type {0} was not defined in the document")]
    UndefinedSimpleType(String),

    #[error("Simple type {0} is defined in terms of itself")]
    CyclicDefinition(String),

    #[error("No {element} found for {context}")]
    MissingElement {
        element: &'static str,
        context: String,
    },
}
