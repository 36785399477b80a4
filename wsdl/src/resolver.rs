use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    error::Error,
    model::{Primitive, ResolvedType},
    names::URI_XML_SCHEMA,
    store::SimpleTypeDef,
    types::Extracted,
};

/// Maps XML Schema built-in local names onto target primitives. Any
/// built-in name outside the table resolves to a string, not an error.
pub fn primitive_for(local_name: &str) -> Primitive {
    match local_name {
        "boolean" => Primitive::Bool,

        "float" | "double" | "decimal" => Primitive::Float,

        "integer" | "nonPositiveInteger" | "negativeInteger" | "long" | "int" | "short"
        | "byte" | "nonNegativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" | "positiveInteger" => Primitive::Int,

        _ => Primitive::Str,
    }
}

/// The memoized resolution cache: once a qualified name is present it
/// is authoritative and never overwritten.
#[derive(Default, Debug)]
pub struct ResolvedTypes {
    map: HashMap<String, ResolvedType>,
}

impl ResolvedTypes {
    pub fn get(&self, key: &str) -> Option<&ResolvedType> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn insert(&mut self, key: String, ty: ResolvedType) {
        self.map.entry(key).or_insert(ty);
    }
}

struct Resolver<'a> {
    extracted: &'a Extracted,
    class_prefix: &'a str,
    resolved: ResolvedTypes,
    resolving: HashSet<String>,
}

/// Converts every type reference gathered by extraction into a
/// concrete classification. Extraction must have completed: lookups
/// run against the full definition store. Resolution itself is
/// pull-based and order-independent.
pub fn resolve(extracted: &Extracted, class_prefix: &str) -> Result<ResolvedTypes, Error> {
    let mut resolver = Resolver {
        extracted,
        class_prefix,
        resolved: ResolvedTypes::default(),
        resolving: HashSet::new(),
    };

    resolver.resolve_complex_types()?;
    resolver.resolve_simple_types()?;

    debug!(resolved = resolver.resolved.len(), "resolution complete");
    Ok(resolver.resolved)
}

impl<'a> Resolver<'a> {
    fn is_schema_namespace(&self, namespace_idx: usize) -> bool {
        self.extracted.namespaces.get(namespace_idx) == URI_XML_SCHEMA
    }

    fn resolve_complex_types(&mut self) -> Result<(), Error> {
        let definitions = &self.extracted.definitions;

        for complex in definitions.complex_types() {
            for element in complex.elements() {
                let reference = &element.ty;
                let key = reference.key(&self.extracted.namespaces);

                if self.is_schema_namespace(reference.namespace_idx()) {
                    self.resolved.insert(
                        key,
                        ResolvedType::Primitive(primitive_for(reference.local_name())),
                    );
                } else if !definitions.contains(&key) {
                    if !reference.local_name().is_empty() {
                        return Err(Error::UndefinedType(key));
                    }

                    // An element with no declared type: the dynamic
                    // "any" fallback rather than an error.
                    self.resolved.insert(key, ResolvedType::Dynamic);
                }
            }

            self.resolved.insert(
                complex.name.key(&self.extracted.namespaces),
                ResolvedType::Object(format!("{}{}", self.class_prefix, complex.name.name)),
            );
        }

        Ok(())
    }

    fn resolve_simple_types(&mut self) -> Result<(), Error> {
        for simple in self.extracted.definitions.simple_types() {
            let key = simple.name.key(&self.extracted.namespaces);
            self.resolve_simple_type(&key, simple)?;
        }

        Ok(())
    }

    fn resolve_simple_type(
        &mut self,
        key: &str,
        simple: &SimpleTypeDef,
    ) -> Result<ResolvedType, Error> {
        if let Some(existing) = self.resolved.get(key) {
            return Ok(existing.clone());
        }

        if !self.resolving.insert(key.to_owned()) {
            return Err(Error::CyclicDefinition(key.to_owned()));
        }

        let base = &simple.base;
        let base_key = base.key(&self.extracted.namespaces);

        // List vs restriction does not affect the resolved scalar.
        let resolved = if self.is_schema_namespace(base.namespace_idx()) {
            let primitive = ResolvedType::Primitive(primitive_for(base.local_name()));
            self.resolved.insert(base_key, primitive.clone());
            primitive
        } else if let Some(base_def) = self.extracted.definitions.simple(&base_key) {
            self.resolve_simple_type(&base_key, base_def)?
        } else {
            return Err(Error::UndefinedSimpleType(base_key));
        };

        self.resolving.remove(key);
        self.resolved.insert(key.to_owned(), resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        names::{Namespaces, QName, RefRegistry},
        store::{ComplexTypeDef, Definitions, ElementDef, SimpleKind},
        types::WsdlParts,
    };
    use std::rc::Rc;

    const TNS: &str = "urn:test";

    struct Builder {
        namespaces: Namespaces,
        registry: RefRegistry,
        definitions: Definitions,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                namespaces: Namespaces::default(),
                registry: RefRegistry::default(),
                definitions: Definitions::default(),
            }
        }

        fn reference(&mut self, namespace: &str, name: &str) -> Rc<crate::names::TypeReference> {
            self.registry
                .intern(QName::new(&mut self.namespaces, namespace, name.to_owned()))
        }

        fn complex(&mut self, name: &str, elements: &[(&str, &str, &str, bool)]) {
            let qname = QName::new(&mut self.namespaces, TNS, name.to_owned());
            let mut def = ComplexTypeDef::new(qname, None);

            for (element_name, namespace, type_name, is_array) in elements {
                let ty = self.reference(namespace, type_name);
                def.push_element(ElementDef {
                    name: (*element_name).to_owned(),
                    ty,
                    is_array: *is_array,
                });
            }

            self.definitions.add_complex(&self.namespaces, def);
        }

        fn simple(&mut self, name: &str, base_namespace: &str, base_name: &str) {
            let base = self.reference(base_namespace, base_name);
            let qname = QName::new(&mut self.namespaces, TNS, name.to_owned());
            self.definitions.add_simple(
                &self.namespaces,
                SimpleTypeDef {
                    name: qname,
                    base,
                    kind: SimpleKind::Restriction,
                },
            );
        }

        fn finish(self) -> Extracted {
            Extracted {
                definitions: self.definitions,
                wsdl: WsdlParts::default(),
                namespaces: self.namespaces,
                refs: self.registry,
            }
        }
    }

    #[test]
    fn primitive_table_covers_the_builtin_families() {
        for name in [
            "integer",
            "nonPositiveInteger",
            "negativeInteger",
            "long",
            "int",
            "short",
            "byte",
            "nonNegativeInteger",
            "unsignedLong",
            "unsignedInt",
            "unsignedShort",
            "unsignedByte",
            "positiveInteger",
        ] {
            assert_eq!(primitive_for(name), Primitive::Int, "{}", name);
        }

        for name in ["float", "double", "decimal"] {
            assert_eq!(primitive_for(name), Primitive::Float, "{}", name);
        }

        assert_eq!(primitive_for("boolean"), Primitive::Bool);

        // Every other built-in defaults to string rather than erroring.
        for name in ["string", "token", "anyURI", "dateTime", "base64Binary"] {
            assert_eq!(primitive_for(name), Primitive::Str, "{}", name);
        }
    }

    #[test]
    fn complex_type_fields_resolve_to_primitives_and_objects() {
        let mut builder = Builder::new();
        builder.complex(
            "Person",
            &[
                ("name", URI_XML_SCHEMA, "string", false),
                ("age", URI_XML_SCHEMA, "int", false),
            ],
        );
        builder.complex("Team", &[("members", TNS, "Person", true)]);

        let extracted = builder.finish();
        let resolved = resolve(&extracted, "").unwrap();

        assert_eq!(
            resolved.get(&format!("{}#string", URI_XML_SCHEMA)),
            Some(&ResolvedType::Primitive(Primitive::Str))
        );
        assert_eq!(
            resolved.get(&format!("{}#int", URI_XML_SCHEMA)),
            Some(&ResolvedType::Primitive(Primitive::Int))
        );
        assert_eq!(
            resolved.get("urn:test#Person"),
            Some(&ResolvedType::Object("Person".into()))
        );
        assert_eq!(
            resolved.get("urn:test#Team"),
            Some(&ResolvedType::Object("Team".into()))
        );
    }

    #[test]
    fn class_prefix_is_applied_to_object_names() {
        let mut builder = Builder::new();
        builder.complex("Person", &[]);

        let extracted = builder.finish();
        let resolved = resolve(&extracted, "Api").unwrap();

        assert_eq!(
            resolved.get("urn:test#Person"),
            Some(&ResolvedType::Object("ApiPerson".into()))
        );
    }

    #[test]
    fn empty_local_name_resolves_to_dynamic() {
        let mut builder = Builder::new();
        builder.complex("Holder", &[("payload", TNS, "", false)]);

        let extracted = builder.finish();
        let resolved = resolve(&extracted, "").unwrap();

        assert_eq!(resolved.get("urn:test#"), Some(&ResolvedType::Dynamic));
    }

    #[test]
    fn undefined_reference_fails_naming_the_qualified_name() {
        let mut builder = Builder::new();
        builder.complex("Person", &[("pet", TNS, "Animal", false)]);

        let extracted = builder.finish();
        let error = resolve(&extracted, "").unwrap_err();

        match error {
            Error::UndefinedType(key) => assert_eq!(key, "urn:test#Animal"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn simple_type_chains_resolve_transitively() {
        let mut builder = Builder::new();
        builder.simple("C", URI_XML_SCHEMA, "long");
        builder.simple("B", TNS, "C");
        builder.simple("A", TNS, "B");

        let extracted = builder.finish();
        let resolved = resolve(&extracted, "").unwrap();

        for name in ["A", "B", "C"] {
            assert_eq!(
                resolved.get(&format!("urn:test#{}", name)),
                Some(&ResolvedType::Primitive(Primitive::Int)),
                "{}",
                name
            );
        }
    }

    #[test]
    fn simple_type_with_unknown_builtin_base_resolves_to_string() {
        let mut builder = Builder::new();
        builder.simple("Token", URI_XML_SCHEMA, "normalizedString");

        let extracted = builder.finish();
        let resolved = resolve(&extracted, "").unwrap();

        assert_eq!(
            resolved.get("urn:test#Token"),
            Some(&ResolvedType::Primitive(Primitive::Str))
        );
    }

    #[test]
    fn undefined_simple_type_base_is_fatal() {
        let mut builder = Builder::new();
        builder.simple("A", TNS, "Missing");

        let extracted = builder.finish();
        let error = resolve(&extracted, "").unwrap_err();

        match error {
            Error::UndefinedSimpleType(key) => assert_eq!(key, "urn:test#Missing"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn simple_type_base_cycles_are_detected() {
        let mut builder = Builder::new();
        builder.simple("A", TNS, "B");
        builder.simple("B", TNS, "A");

        let extracted = builder.finish();
        let error = resolve(&extracted, "").unwrap_err();

        assert!(matches!(error, Error::CyclicDefinition(_)));
    }

    #[test]
    fn resolution_entries_are_never_overwritten() {
        let mut builder = Builder::new();
        // Person is both referenced and defined; the object entry must
        // survive repeated classification of the same key.
        builder.complex("Person", &[("friend", TNS, "Person", false)]);

        let extracted = builder.finish();
        let resolved = resolve(&extracted, "").unwrap();

        assert_eq!(
            resolved.get("urn:test#Person"),
            Some(&ResolvedType::Object("Person".into()))
        );
    }
}
