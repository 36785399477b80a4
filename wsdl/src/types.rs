use std::rc::Rc;

use crate::{
    names::{Namespaces, QName, RefRegistry, TypeReference},
    store::Definitions,
};

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub element: Rc<TypeReference>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: QName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub input: Option<QName>,
    pub output: Option<QName>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: QName,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: QName,
    pub ty: QName,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub binding: QName,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub ports: Vec<Port>,
}

/// The WSDL structural elements feeding the service model. These are
/// collected by the same extraction pass as the type definitions but
/// involve no resolution of their own.
#[derive(Default, Debug)]
pub struct WsdlParts {
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

impl WsdlParts {
    pub fn message(&self, name: &QName) -> Option<&Message> {
        self.messages.iter().find(|message| &message.name == name)
    }

    pub fn port_type(&self, name: &QName) -> Option<&PortType> {
        self.port_types
            .iter()
            .find(|port_type| &port_type.name == name)
    }

    pub fn binding(&self, name: &QName) -> Option<&Binding> {
        self.bindings.iter().find(|binding| &binding.name == name)
    }
}

/// Output of the extraction stage: the complete definition store plus
/// the per-run interning state. Resolution requires this to be fully
/// built before it starts.
#[derive(Debug)]
pub struct Extracted {
    pub definitions: Definitions,
    pub wsdl: WsdlParts,
    pub namespaces: Namespaces,
    pub refs: RefRegistry,
}
