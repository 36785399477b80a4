use std::{collections::HashMap, rc::Rc};

pub const URI_XML_SCHEMA: &str = "http://www.w3.org/2001/XMLSchema";
pub const URI_WSDL_SCHEMA: &str = "http://schemas.xmlsoap.org/wsdl/";

/// Interning table for namespace URIs. Qualified names hold an index
/// into this table rather than owning the URI string.
#[derive(Default, Debug, Clone)]
pub struct Namespaces(Vec<String>);

impl Namespaces {
    pub fn namespaces(&self) -> &[String] {
        &self.0
    }

    pub fn add_or_get(&mut self, namespace: &str) -> usize {
        if let Some(index) = self.index_of(namespace) {
            index
        } else {
            let index = self.0.len();
            self.0.push(namespace.to_owned());
            index
        }
    }

    pub fn get(&self, index: usize) -> &str {
        &self.0[index]
    }

    fn index_of(&self, namespace: &str) -> Option<usize> {
        self.0.iter().position(|value| value == namespace)
    }
}

/// A namespace-qualified name. Two qualified names identify the same
/// type or element iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    namespace_idx: usize,
    pub name: String,
}

impl QName {
    pub fn new(namespaces: &mut Namespaces, namespace: &str, name: String) -> Self {
        Self {
            namespace_idx: namespaces.add_or_get(namespace),
            name,
        }
    }

    pub fn index(&self) -> usize {
        self.namespace_idx
    }

    /// Canonical string key, `namespace + "#" + name`.
    pub fn key(&self, namespaces: &Namespaces) -> String {
        format!("{}#{}", namespaces.get(self.namespace_idx), self.name)
    }
}

/// An unresolved pointer to a type, created during extraction and
/// consumed read-only during resolution.
#[derive(Debug, PartialEq, Eq)]
pub struct TypeReference {
    name: QName,
}

impl TypeReference {
    pub fn qname(&self) -> &QName {
        &self.name
    }

    pub fn namespace_idx(&self) -> usize {
        self.name.index()
    }

    pub fn local_name(&self) -> &str {
        &self.name.name
    }

    pub fn key(&self, namespaces: &Namespaces) -> String {
        self.name.key(namespaces)
    }
}

/// Interns type references by qualified name: repeated requests for
/// the same name return the identical `Rc`, so resolution results can
/// be cached by key or by reference identity interchangeably.
#[derive(Default, Debug)]
pub struct RefRegistry {
    refs: HashMap<QName, Rc<TypeReference>>,
}

impl RefRegistry {
    pub fn intern(&mut self, qname: QName) -> Rc<TypeReference> {
        self.refs
            .entry(qname.clone())
            .or_insert_with(|| Rc::new(TypeReference { name: qname }))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_interning_is_stable() {
        let mut namespaces = Namespaces::default();
        let a = namespaces.add_or_get("urn:one");
        let b = namespaces.add_or_get("urn:two");
        let c = namespaces.add_or_get("urn:one");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(namespaces.get(b), "urn:two");
    }

    #[test]
    fn qname_key_is_namespace_hash_name() {
        let mut namespaces = Namespaces::default();
        let qname = QName::new(&mut namespaces, "urn:one", "Person".into());

        assert_eq!(qname.key(&namespaces), "urn:one#Person");
    }

    #[test]
    fn repeated_reference_requests_return_the_identical_instance() {
        let mut namespaces = Namespaces::default();
        let mut registry = RefRegistry::default();

        let first = registry.intern(QName::new(&mut namespaces, "urn:one", "Person".into()));
        let second = registry.intern(QName::new(&mut namespaces, "urn:one", "Person".into()));
        let other = registry.intern(QName::new(&mut namespaces, "urn:one", "Team".into()));

        assert!(Rc::ptr_eq(&first, &second));
        assert!(!Rc::ptr_eq(&first, &other));
    }
}
