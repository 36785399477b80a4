use std::{collections::HashMap, rc::Rc};

use crate::names::{Namespaces, QName, TypeReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleKind {
    Restriction,
    List,
}

/// A simple type: a restriction or list over a base type. The base
/// must eventually resolve to a schema primitive or another simple
/// type; unions are rejected at extraction time.
#[derive(Debug)]
pub struct SimpleTypeDef {
    pub name: QName,
    pub base: Rc<TypeReference>,
    pub kind: SimpleKind,
}

#[derive(Debug, Clone)]
pub struct ElementDef {
    pub name: String,
    pub ty: Rc<TypeReference>,
    pub is_array: bool,
}

/// A complex type: an ordered sequence of named, typed elements,
/// optionally extending another complex type.
#[derive(Debug)]
pub struct ComplexTypeDef {
    pub name: QName,
    pub base_name: Option<String>,
    elements: Vec<ElementDef>,
}

impl ComplexTypeDef {
    pub fn new(name: QName, base_name: Option<String>) -> Self {
        Self {
            name,
            base_name,
            elements: Vec::new(),
        }
    }

    /// Appends an element, keeping document order. A repeated name
    /// replaces the earlier entry in place (map-assignment semantics).
    pub fn push_element(&mut self, element: ElementDef) {
        if let Some(existing) = self
            .elements
            .iter_mut()
            .find(|existing| existing.name == element.name)
        {
            *existing = element;
        } else {
            self.elements.push(element);
        }
    }

    pub fn elements(&self) -> &[ElementDef] {
        &self.elements
    }
}

/// The two parallel type catalogs built by extraction, keyed by
/// qualified name and iterable in document order.
#[derive(Default, Debug)]
pub struct Definitions {
    simple: Vec<SimpleTypeDef>,
    simple_index: HashMap<String, usize>,
    complex: Vec<ComplexTypeDef>,
    complex_index: HashMap<String, usize>,
}

impl Definitions {
    pub fn add_simple(&mut self, namespaces: &Namespaces, def: SimpleTypeDef) {
        let key = def.name.key(namespaces);

        if let Some(&index) = self.simple_index.get(&key) {
            self.simple[index] = def;
        } else {
            self.simple_index.insert(key, self.simple.len());
            self.simple.push(def);
        }
    }

    pub fn add_complex(&mut self, namespaces: &Namespaces, def: ComplexTypeDef) {
        let key = def.name.key(namespaces);

        if let Some(&index) = self.complex_index.get(&key) {
            self.complex[index] = def;
        } else {
            self.complex_index.insert(key, self.complex.len());
            self.complex.push(def);
        }
    }

    pub fn simple(&self, key: &str) -> Option<&SimpleTypeDef> {
        self.simple_index.get(key).map(|&index| &self.simple[index])
    }

    pub fn complex(&self, key: &str) -> Option<&ComplexTypeDef> {
        self.complex_index
            .get(key)
            .map(|&index| &self.complex[index])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.simple_index.contains_key(key) || self.complex_index.contains_key(key)
    }

    pub fn simple_types(&self) -> &[SimpleTypeDef] {
        &self.simple
    }

    pub fn complex_types(&self) -> &[ComplexTypeDef] {
        &self.complex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::RefRegistry;

    fn element(
        namespaces: &mut Namespaces,
        registry: &mut RefRegistry,
        name: &str,
        ty: &str,
    ) -> ElementDef {
        ElementDef {
            name: name.to_owned(),
            ty: registry.intern(QName::new(namespaces, "urn:test", ty.to_owned())),
            is_array: false,
        }
    }

    #[test]
    fn duplicate_element_names_keep_the_last_occurrence() {
        let mut namespaces = Namespaces::default();
        let mut registry = RefRegistry::default();

        let name = QName::new(&mut namespaces, "urn:test", "Person".into());
        let mut def = ComplexTypeDef::new(name, None);

        def.push_element(element(&mut namespaces, &mut registry, "id", "First"));
        def.push_element(element(&mut namespaces, &mut registry, "name", "Name"));
        def.push_element(element(&mut namespaces, &mut registry, "id", "Second"));

        assert_eq!(def.elements().len(), 2);
        assert_eq!(def.elements()[0].name, "id");
        assert_eq!(def.elements()[0].ty.local_name(), "Second");
        assert_eq!(def.elements()[1].name, "name");
    }

    #[test]
    fn definitions_are_looked_up_by_qualified_key() {
        let mut namespaces = Namespaces::default();
        let mut store = Definitions::default();

        let name = QName::new(&mut namespaces, "urn:test", "Person".into());
        store.add_complex(&namespaces, ComplexTypeDef::new(name, None));

        assert!(store.contains("urn:test#Person"));
        assert!(store.complex("urn:test#Person").is_some());
        assert!(store.complex("urn:other#Person").is_none());
    }
}
