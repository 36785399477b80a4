use quick_xml::{
    events::{attributes::Attributes, BytesStart, Event},
    Reader,
};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    rc::Rc,
};
use tracing::{debug, trace};
use url::Url;

use super::{
    error::Error,
    names::{Namespaces, QName, RefRegistry, TypeReference, URI_WSDL_SCHEMA, URI_XML_SCHEMA},
    store::{ComplexTypeDef, Definitions, ElementDef, SimpleKind, SimpleTypeDef},
    types::{Binding, Extracted, Message, Operation, Part, Port, PortType, Service, WsdlParts},
};

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(reader.decode(attribute.value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

/// Splits `prefix:local` / bare `local`. More than one colon is a
/// malformed reference.
fn split_reference(value: &str) -> Result<(Option<&str>, &str), Error> {
    let mut parts = value.splitn(3, ':');
    let first = parts.next().unwrap_or("");

    match (parts.next(), parts.next()) {
        (None, _) => Ok((None, first)),
        (Some(second), None) => Ok((Some(first), second)),
        (Some(_), Some(_)) => Err(Error::MalformedReference(value.to_owned())),
    }
}

fn local_part(value: &str) -> &str {
    value.rsplit(':').next().unwrap_or(value)
}

fn require(
    value: Option<String>,
    element: &str,
    attribute: &'static str,
) -> Result<String, Error> {
    value.ok_or_else(|| Error::MissingAttribute {
        element: element.to_owned(),
        attribute,
    })
}

#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    prefixes: HashMap<Option<String>, String>,
    scopes: Vec<Vec<(Option<String>, Option<String>)>>,
}

impl CurrentNamespaces {
    fn push_target_namespace(&mut self, namespace: String) {
        self.target.push(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    fn open_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Binds a prefix for the current element scope, remembering any
    /// shadowed binding so it can be restored when the scope closes.
    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        let previous = self.prefixes.insert(prefix.clone(), namespace.to_owned());

        if let Some(scope) = self.scopes.last_mut() {
            scope.push((prefix, previous));
        }
    }

    fn close_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (prefix, previous) in scope.into_iter().rev() {
                match previous {
                    Some(namespace) => {
                        self.prefixes.insert(prefix, namespace);
                    }
                    None => {
                        self.prefixes.remove(&prefix);
                    }
                }
            }
        }
    }
}

/// Accumulated body of a complex type while its children are being
/// walked: an optional extension base and an optional field sequence.
#[derive(Default, Debug)]
struct ComplexBody {
    base: Option<String>,
    fields: Option<Vec<ElementDef>>,
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema,
    Element {
        name: String,
        inline: Option<ComplexBody>,
    },
    ComplexType {
        name: Option<String>,
        body: ComplexBody,
    },
    ComplexContent {
        base: Option<String>,
        fields: Option<Vec<ElementDef>>,
    },
    Extension {
        base: String,
        fields: Option<Vec<ElementDef>>,
    },
    Sequence(Vec<ElementDef>),
    SequenceElement(ElementDef),
    SimpleType {
        name: String,
        base: Option<(Rc<TypeReference>, SimpleKind)>,
    },
    Restriction {
        base: Rc<TypeReference>,
    },
    List {
        base: Rc<TypeReference>,
    },

    Message {
        name: String,
        parts: Vec<Part>,
    },
    Part(Part),

    PortType {
        name: String,
        operations: Vec<Operation>,
    },
    Operation {
        name: String,
        input: Option<QName>,
        output: Option<QName>,
    },
    Input {
        message: QName,
    },
    Output {
        message: QName,
    },

    Binding {
        name: String,
        ty: QName,
    },

    Service {
        name: String,
        ports: Vec<Port>,
    },
    Port {
        name: String,
        binding: QName,
        address: Option<String>,
    },
    Address {
        location: String,
    },

    Import,

    Other(String),
}

struct Parser {
    root: Option<Url>,

    definitions: Definitions,
    wsdl: WsdlParts,
    namespaces: Namespaces,
    refs: RefRegistry,
    current: CurrentNamespaces,
}

impl Parser {
    fn new(root: Option<Url>) -> Self {
        Self {
            root,

            definitions: Default::default(),
            wsdl: Default::default(),
            namespaces: Default::default(),
            refs: Default::default(),
            current: Default::default(),
        }
    }

    fn finish(self) -> Extracted {
        debug!(
            complex = self.definitions.complex_types().len(),
            simple = self.definitions.simple_types().len(),
            messages = self.wsdl.messages.len(),
            services = self.wsdl.services.len(),
            "extraction complete"
        );

        Extracted {
            definitions: self.definitions,
            wsdl: self.wsdl,
            namespaces: self.namespaces,
            refs: self.refs,
        }
    }

    fn target_qname(&mut self, name: String) -> Result<QName, Error> {
        match self.current.target.last() {
            Some(target) => {
                let target = target.clone();
                Ok(QName::new(&mut self.namespaces, &target, name))
            }
            None => Err(Error::MissingAttribute {
                element: name,
                attribute: "targetNamespace",
            }),
        }
    }

    /// Parses a possibly-prefixed name into a qualified name. An
    /// unprefixed name belongs to the nearest enclosing target
    /// namespace; a prefixed one goes through the in-scope prefix map.
    fn resolve_qname(&mut self, value: &str) -> Result<QName, Error> {
        let (prefix, local) = split_reference(value)?;

        match prefix {
            None => self.target_qname(local.to_owned()),
            Some(prefix) => match self.current.prefixes.get(&Some(prefix.to_owned())) {
                Some(namespace) => {
                    let namespace = namespace.clone();
                    Ok(QName::new(&mut self.namespaces, &namespace, local.to_owned()))
                }
                None => Err(Error::UnknownPrefix(prefix.to_owned())),
            },
        }
    }

    /// Interns a type reference for a type-valued attribute. A missing
    /// or empty attribute produces a reference with an empty local
    /// name, the dynamic/any placeholder.
    fn resolve_ref(&mut self, value: Option<String>) -> Result<Rc<TypeReference>, Error> {
        let value = value.unwrap_or_default();
        let qname = self.resolve_qname(&value)?;
        Ok(self.refs.intern(qname))
    }

    fn register_complex(&mut self, name: String, body: ComplexBody) -> Result<(), Error> {
        let qname = self.target_qname(name)?;
        let mut def = ComplexTypeDef::new(qname, body.base);

        for element in body.fields.unwrap_or_default() {
            def.push_element(element);
        }

        self.definitions.add_complex(&self.namespaces, def);
        Ok(())
    }

    fn sequence_element<B: BufRead>(
        &mut self,
        stack: &[ParseState],
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<ElementDef, Error> {
        let [name, ty, min_occurs, max_occurs] = get_attributes(
            reader,
            start.attributes(),
            ["name", "type", "minOccurs", "maxOccurs"],
        )?;

        let name = require(name, "element", "name")?;
        let ty = self.resolve_ref(ty)?;

        let parse_bound = |value: &str| {
            value
                .parse::<u32>()
                .map_err(|_| Error::InvalidOccurs(value.to_owned()))
        };

        let min = match &min_occurs {
            Some(value) => parse_bound(value)?,
            None => 1,
        };

        let is_array = match max_occurs.as_deref() {
            Some("unbounded") => true,
            other => {
                let max = match other {
                    Some(value) => parse_bound(value)?,
                    None => 1,
                };

                if min > max {
                    return Err(Error::InvalidCardinality {
                        type_name: enclosing_type_name(stack),
                        element: name,
                        min,
                        max,
                    });
                }

                max > 1
            }
        };

        Ok(ElementDef { name, ty, is_array })
    }

    fn follow_import(&mut self, location: String) -> Result<(), Error> {
        match self.root.clone() {
            Some(root) => self.parse_url(root.join(&location)?),
            None => Err(Error::UnresolvableImport(location)),
        }
    }

    fn parse_url(&mut self, url: Url) -> Result<(), Error> {
        debug!(url = %url, "parsing document");

        match url.scheme() {
            "file" => self.parse_xml(
                Reader::from_file(
                    url.to_file_path()
                        .map_err(|()| Error::PathConversionError(None))?,
                )
                .map_err(Error::FileOpenError)?,
            ),

            "http" | "https" => self.parse_xml(Reader::from_reader(BufReader::new(
                reqwest::blocking::get(url)?,
            ))),

            other => Err(Error::UnsupportedScheme(other.into())),
        }
    }

    fn parse_xml<B: BufRead>(&mut self, mut reader: Reader<B>) -> Result<(), Error> {
        let mut stack = Vec::new();
        let mut buffer = Vec::new();
        let mut namespace_buffer = Vec::new();

        loop {
            buffer.clear();

            let (namespace, event) =
                reader.read_namespaced_event(&mut buffer, &mut namespace_buffer)?;

            match event {
                Event::Decl(..) => (),

                Event::Start(start) => {
                    self.handle_start(&mut stack, &reader, start, namespace)?
                }
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, start, namespace)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Eof => break,

                _ => (),
            }
        }

        Ok(())
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesStart<'_>,
        namespace_bytes: Option<&[u8]>,
    ) -> Result<(), Error> {
        let (prefix, local_name) = split_reference(reader.decode(start.name())?)?;
        let element_namespace = namespace_bytes
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("")
            .to_owned();

        let state = stack.pop();
        let mut new_state = Some(ParseState::Other(local_name.to_owned()));

        self.current.open_scope();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let (key_prefix, key_local) = split_reference(key)?;

            if key_prefix == Some("xmlns") {
                self.current.add_namespace_prefix(
                    Some(key_local.to_owned()),
                    reader.decode(attribute.value.as_ref())?,
                );
            } else if key_prefix.is_none() && key_local == "xmlns" {
                self.current
                    .add_namespace_prefix(None, reader.decode(attribute.value.as_ref())?);
            }
        }

        match state {
            None => match (local_name, element_namespace.as_str()) {
                ("definitions", URI_WSDL_SCHEMA) => {
                    let [target] = get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    self.current
                        .push_target_namespace(target.unwrap_or_else(|| element_namespace.clone()));

                    new_state = Some(ParseState::Definitions);
                }

                ("schema", URI_XML_SCHEMA) => {
                    self.open_schema(reader, &start, prefix, &element_namespace)?;
                    new_state = Some(ParseState::Schema);
                }

                _ => return Err(Error::InvalidDocument(local_name.to_owned())),
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;
                    self.follow_import(require(location, local_name, "location")?)?;

                    new_state = Some(ParseState::Import);
                }

                "types" => new_state = Some(ParseState::Types),

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Message {
                        name: require(name, local_name, "name")?,
                        parts: Vec::new(),
                    });
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::PortType {
                        name: require(name, local_name, "name")?,
                        operations: Vec::new(),
                    });
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;
                    let ty = self.resolve_qname(&require(ty, local_name, "type")?)?;

                    new_state = Some(ParseState::Binding {
                        name: require(name, local_name, "name")?,
                        ty,
                    });
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Service {
                        name: require(name, local_name, "name")?,
                        ports: Vec::new(),
                    });
                }

                _ => trace!(element = local_name, "skipping element in definitions"),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => {
                    self.open_schema(reader, &start, prefix, &element_namespace)?;
                    new_state = Some(ParseState::Schema);
                }

                "import" | "include" => {
                    let [location] =
                        get_attributes(reader, start.attributes(), ["schemaLocation"])?;
                    self.follow_import(require(location, local_name, "schemaLocation")?)?;

                    new_state = Some(ParseState::Import);
                }

                _ => trace!(element = local_name, "skipping element in types"),
            },

            Some(ParseState::Schema) => match local_name {
                "element" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Element {
                        name: require(name, local_name, "name")?,
                        inline: None,
                    });
                }

                "complexType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::ComplexType {
                        name,
                        body: ComplexBody::default(),
                    });
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::SimpleType {
                        name: require(name, local_name, "name")?,
                        base: None,
                    });
                }

                "import" | "include" => {
                    let [location] =
                        get_attributes(reader, start.attributes(), ["schemaLocation"])?;
                    self.follow_import(require(location, local_name, "schemaLocation")?)?;

                    new_state = Some(ParseState::Import);
                }

                _ => trace!(element = local_name, "skipping element in schema"),
            },

            Some(ParseState::Element { .. }) => match local_name {
                "complexType" => {
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        body: ComplexBody::default(),
                    })
                }

                _ => trace!(element = local_name, "skipping element in element"),
            },

            Some(ParseState::ComplexType { .. }) => match local_name {
                "sequence" => new_state = Some(ParseState::Sequence(Vec::new())),

                "complexContent" => {
                    new_state = Some(ParseState::ComplexContent {
                        base: None,
                        fields: None,
                    })
                }

                _ => trace!(element = local_name, "skipping element in complexType"),
            },

            Some(ParseState::ComplexContent { .. }) => match local_name {
                "extension" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = require(base, local_name, "base")?;

                    new_state = Some(ParseState::Extension {
                        base: local_part(&base).to_owned(),
                        fields: None,
                    });
                }

                _ => trace!(element = local_name, "skipping element in complexContent"),
            },

            Some(ParseState::Extension { .. }) => match local_name {
                "sequence" => new_state = Some(ParseState::Sequence(Vec::new())),

                _ => trace!(element = local_name, "skipping element in extension"),
            },

            Some(ParseState::Sequence(_)) => match local_name {
                "element" => {
                    let element = {
                        let parents = &stack[..];
                        self.sequence_element(parents, reader, &start)?
                    };

                    new_state = Some(ParseState::SequenceElement(element));
                }

                _ => trace!(element = local_name, "skipping element in sequence"),
            },

            Some(ParseState::SequenceElement(_)) => {
                // Inline anonymous content on a sequence element is not
                // classified here; the element keeps its empty type
                // reference and resolves to the dynamic fallback.
                trace!(element = local_name, "skipping inline content in sequence element");
            }

            Some(ParseState::SimpleType { ref name, .. }) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = self.resolve_ref(Some(require(base, local_name, "base")?))?;

                    new_state = Some(ParseState::Restriction { base });
                }

                "list" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = self.resolve_ref(Some(require(base, local_name, "base")?))?;

                    new_state = Some(ParseState::List { base });
                }

                "union" => {
                    let name = name.clone();
                    let qname = self.target_qname(name)?;
                    return Err(Error::UnsupportedUnion(qname.key(&self.namespaces)));
                }

                _ => trace!(element = local_name, "skipping element in simpleType"),
            },

            Some(ParseState::Restriction { .. } | ParseState::List { .. }) => {
                trace!(element = local_name, "skipping restriction facet");
            }

            Some(ParseState::Message { .. }) => match local_name {
                "part" => {
                    let [name, element] =
                        get_attributes(reader, start.attributes(), ["name", "element"])?;

                    new_state = Some(ParseState::Part(Part {
                        name: require(name, local_name, "name")?,
                        element: self.resolve_ref(element)?,
                    }));
                }

                _ => trace!(element = local_name, "skipping element in message"),
            },

            Some(ParseState::Part(_)) => {
                trace!(element = local_name, "skipping element in part");
            }

            Some(ParseState::PortType { .. }) => match local_name {
                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Operation {
                        name: require(name, local_name, "name")?,
                        input: None,
                        output: None,
                    });
                }

                _ => trace!(element = local_name, "skipping element in portType"),
            },

            Some(ParseState::Operation { .. }) => match local_name {
                "input" | "output" => {
                    let [message] = get_attributes(reader, start.attributes(), ["message"])?;
                    let message = self.resolve_qname(&require(message, local_name, "message")?)?;

                    if local_name == "input" {
                        new_state = Some(ParseState::Input { message });
                    } else {
                        new_state = Some(ParseState::Output { message });
                    }
                }

                _ => trace!(element = local_name, "skipping element in operation"),
            },

            Some(ParseState::Input { .. } | ParseState::Output { .. }) => {
                trace!(element = local_name, "skipping element in operation message");
            }

            Some(ParseState::Binding { .. }) => {
                trace!(element = local_name, "skipping element in binding");
            }

            Some(ParseState::Service { .. }) => match local_name {
                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;
                    let binding = self.resolve_qname(&require(binding, local_name, "binding")?)?;

                    new_state = Some(ParseState::Port {
                        name: require(name, local_name, "name")?,
                        binding,
                        address: None,
                    });
                }

                _ => trace!(element = local_name, "skipping element in service"),
            },

            Some(ParseState::Port { .. }) => match local_name {
                "address" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;

                    new_state = Some(ParseState::Address {
                        location: require(location, local_name, "location")?,
                    });
                }

                _ => trace!(element = local_name, "skipping element in port"),
            },

            Some(ParseState::Address { .. }) => {
                trace!(element = local_name, "skipping element in address");
            }

            Some(ParseState::Import) => {
                trace!(element = local_name, "skipping element in import");
            }

            Some(ParseState::Other(ref parent)) => {
                trace!(element = local_name, parent = parent.as_str(), "skipping element");
            }
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn open_schema<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
        prefix: Option<&str>,
        element_namespace: &str,
    ) -> Result<(), Error> {
        let [target] = get_attributes(reader, start.attributes(), ["targetNamespace"])?;
        self.current
            .push_target_namespace(target.unwrap_or_else(|| element_namespace.to_owned()));
        self.current
            .add_namespace_prefix(prefix.map(ToOwned::to_owned), element_namespace);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), Error> {
        self.current.close_scope();

        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions | ParseState::Schema) => {
                self.current.pop_target_namespace()
            }

            Some(ParseState::Element { name, inline }) => {
                if let Some(body) = inline {
                    self.register_complex(name, body)?;
                } else {
                    trace!(element = name.as_str(), "skipping element without inline type");
                }
            }

            Some(ParseState::ComplexType { name, body }) => match next_state {
                Some(ParseState::Element { ref mut inline, .. }) => *inline = Some(body),

                // An anonymous type nested in a sequence element is
                // left unclassified; the owning element resolves to
                // the dynamic fallback.
                Some(ParseState::SequenceElement(_)) => (),

                _ => {
                    let name = require(name, "complexType", "name")?;
                    self.register_complex(name, body)?;
                }
            },

            Some(ParseState::ComplexContent { base, fields }) => match next_state {
                Some(ParseState::ComplexType { ref mut body, .. }) => {
                    body.base = base;

                    if body.fields.is_none() {
                        body.fields = fields;
                    }
                }

                _ => trace!("ignoring complexContent outside complexType"),
            },

            Some(ParseState::Extension { base, fields }) => match next_state {
                Some(ParseState::ComplexContent {
                    base: ref mut content_base,
                    fields: ref mut content_fields,
                }) => {
                    *content_base = Some(base);
                    *content_fields = fields;
                }

                _ => trace!("ignoring extension outside complexContent"),
            },

            Some(ParseState::Sequence(elements)) => match next_state {
                Some(ParseState::ComplexType { ref mut body, .. }) if body.fields.is_none() => {
                    body.fields = Some(elements)
                }

                Some(ParseState::Extension { ref mut fields, .. }) if fields.is_none() => {
                    *fields = Some(elements)
                }

                _ => trace!("ignoring sequence outside complexType"),
            },

            Some(ParseState::SequenceElement(element)) => match next_state {
                Some(ParseState::Sequence(ref mut elements)) => elements.push(element),
                _ => trace!("ignoring element outside sequence"),
            },

            Some(ParseState::SimpleType { name, base }) => match base {
                Some((base, kind)) => {
                    let qname = self.target_qname(name)?;
                    self.definitions.add_simple(
                        &self.namespaces,
                        SimpleTypeDef {
                            name: qname,
                            base,
                            kind,
                        },
                    );
                }

                None => {
                    let qname = self.target_qname(name)?;
                    return Err(Error::UnsupportedUnion(qname.key(&self.namespaces)));
                }
            },

            Some(ParseState::Restriction { base }) => match next_state {
                Some(ParseState::SimpleType {
                    base: ref mut simple_base,
                    ..
                }) => *simple_base = Some((base, SimpleKind::Restriction)),
                _ => trace!("ignoring restriction outside simpleType"),
            },

            Some(ParseState::List { base }) => match next_state {
                Some(ParseState::SimpleType {
                    base: ref mut simple_base,
                    ..
                }) => *simple_base = Some((base, SimpleKind::List)),
                _ => trace!("ignoring list outside simpleType"),
            },

            Some(ParseState::Message { name, parts }) => {
                let name = self.target_qname(name)?;
                self.wsdl.messages.push(Message { name, parts });
            }

            Some(ParseState::Part(part)) => match next_state {
                Some(ParseState::Message { ref mut parts, .. }) => parts.push(part),
                _ => trace!("ignoring part outside message"),
            },

            Some(ParseState::PortType { name, operations }) => {
                let name = self.target_qname(name)?;
                self.wsdl.port_types.push(PortType { name, operations });
            }

            Some(ParseState::Operation {
                name,
                input,
                output,
            }) => match next_state {
                Some(ParseState::PortType {
                    ref mut operations, ..
                }) => operations.push(Operation {
                    name,
                    input,
                    output,
                }),
                _ => trace!("ignoring operation outside portType"),
            },

            Some(ParseState::Input { message }) => match next_state {
                Some(ParseState::Operation { ref mut input, .. }) if input.is_none() => {
                    *input = Some(message)
                }
                _ => trace!("ignoring input outside operation"),
            },

            Some(ParseState::Output { message }) => match next_state {
                Some(ParseState::Operation { ref mut output, .. }) if output.is_none() => {
                    *output = Some(message)
                }
                _ => trace!("ignoring output outside operation"),
            },

            Some(ParseState::Binding { name, ty }) => {
                let name = self.target_qname(name)?;
                self.wsdl.bindings.push(Binding { name, ty });
            }

            Some(ParseState::Service { name, ports }) => {
                self.wsdl.services.push(Service { name, ports });
            }

            Some(ParseState::Port {
                name,
                binding,
                address,
            }) => match next_state {
                Some(ParseState::Service { ref mut ports, .. }) => {
                    let location = address.ok_or_else(|| Error::MissingElement {
                        element: "address",
                        context: format!("port {}", name),
                    })?;

                    ports.push(Port {
                        name,
                        binding,
                        location,
                    });
                }
                _ => trace!("ignoring port outside service"),
            },

            Some(ParseState::Address { location }) => match next_state {
                Some(ParseState::Port {
                    ref mut address, ..
                }) => *address = Some(location),
                _ => trace!("ignoring address outside port"),
            },

            _ => (),
        }

        stack.extend(next_state);
        Ok(())
    }
}

fn enclosing_type_name(stack: &[ParseState]) -> String {
    for state in stack.iter().rev() {
        match state {
            ParseState::ComplexType {
                name: Some(name), ..
            } => return name.clone(),
            ParseState::Element { name, .. } => return name.clone(),
            _ => (),
        }
    }

    String::new()
}

pub fn parse(url: Url) -> Result<Extracted, Error> {
    let mut parser = Parser::new(Some(url.clone()));
    parser.parse_url(url)?;
    Ok(parser.finish())
}

pub fn parse_str(text: &str) -> Result<Extracted, Error> {
    let mut parser = Parser::new(None);
    parser.parse_xml(Reader::from_str(text))?;
    Ok(parser.finish())
}
