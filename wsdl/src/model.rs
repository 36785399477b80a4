use crate::{
    error::Error,
    names::Namespaces,
    resolver::ResolvedTypes,
    types::Extracted,
};

/// Class name every record without an explicit extension base derives
/// from (prefixed like any other generated name).
pub const DEFAULT_BASE: &str = "BaseType";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Str,
}

/// Concrete classification of a type reference: a schema primitive, a
/// generated record type, or the dynamic "any" fallback for anonymous
/// element types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Primitive(Primitive),
    Object(String),
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub ty: ResolvedType,
    pub is_array: bool,
}

/// The code-generation-ready form of one complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    /// Generated (prefixed) class name.
    pub name: String,
    /// Local element name the type answers to on the wire.
    pub xml_name: String,
    pub namespace_idx: usize,
    pub base: String,
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationModel {
    pub name: String,
    pub args: Vec<(String, ResolvedType)>,
    pub ret: ResolvedType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceModel {
    pub name: String,
    pub location: String,
    pub operations: Vec<OperationModel>,
}

/// The resolved output of one translation run.
#[derive(Debug)]
pub struct Distillation {
    pub records: Vec<DerivedRecord>,
    pub services: Vec<ServiceModel>,
    pub namespaces: Namespaces,
    /// Opaque namespace label passed through to code emission.
    pub target_namespace: String,
}

/// Builds one record per complex type, in store order. Requires the
/// resolved map to be fully populated.
pub fn derive_records(
    extracted: &Extracted,
    resolved: &ResolvedTypes,
    class_prefix: &str,
) -> Result<Vec<DerivedRecord>, Error> {
    let mut records = Vec::new();

    for complex in extracted.definitions.complex_types() {
        let base = complex.base_name.as_deref().unwrap_or(DEFAULT_BASE);
        let mut fields = Vec::new();

        for element in complex.elements() {
            let key = element.ty.key(&extracted.namespaces);
            let ty = resolved
                .get(&key)
                .ok_or_else(|| Error::UndefinedType(key.clone()))?;

            fields.push(RecordField {
                name: element.name.clone(),
                ty: ty.clone(),
                is_array: element.is_array,
            });
        }

        records.push(DerivedRecord {
            name: format!("{}{}", class_prefix, complex.name.name),
            xml_name: complex.name.name.clone(),
            namespace_idx: complex.name.index(),
            base: format!("{}{}", class_prefix, base),
            fields,
        });
    }

    Ok(records)
}
