use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use distil_wsdl::model::{
    DerivedRecord, Distillation, OperationModel, Primitive, RecordField, ResolvedType,
    ServiceModel,
};

trait Codegen {
    fn codegen(&self) -> TokenStream;
}

/// Where a generated type path is being spelled from: inside the
/// `types` module itself, or from the sibling `services` module.
#[derive(Clone, Copy)]
enum Scope {
    Types,
    Services,
}

pub(crate) fn codegen(model: &Distillation) -> TokenStream {
    let attributes = model
        .namespaces
        .namespaces()
        .iter()
        .enumerate()
        .map(|(index, namespace)| {
            let key = format!("xmlns:ns{}", index);
            quote!((#key, #namespace))
        });

    let target = (!model.target_namespace.is_empty()).then(|| {
        let namespace = &model.target_namespace;
        quote!(pub const TARGET_NAMESPACE: &str = #namespace;)
    });

    let by_name: HashMap<&str, &DerivedRecord> = model
        .records
        .iter()
        .map(|record| (record.name.as_str(), record))
        .collect();

    let records = model
        .records
        .iter()
        .map(|record| record_tokens(record, &flattened_fields(record, &by_name)));

    let services = model.services.iter().map(Codegen::codegen);

    quote! {
        pub mod types {
            #target

            fn with_attributes<'a>(
                start: distil_util::xml::events::BytesStart<'a>,
            ) -> distil_util::xml::events::BytesStart<'a> {
                start.with_attributes([#(#attributes),*])
            }

            #(#records)*
        }

        pub mod services {
            #(#services)*
        }
    }
}

/// Walks the extension chain root-first and merges the inherited
/// fields into one flat list, later declarations replacing earlier
/// ones of the same name. Bases that resolve to no generated record
/// (the implicit default base included) contribute nothing.
fn flattened_fields<'a>(
    record: &'a DerivedRecord,
    by_name: &HashMap<&str, &'a DerivedRecord>,
) -> Vec<&'a RecordField> {
    let mut chain = Vec::new();
    let mut current = Some(record);

    while let Some(link) = current {
        // Malformed documents can put a type on its own base chain.
        if chain.iter().any(|seen: &&DerivedRecord| seen.name == link.name) {
            break;
        }

        chain.push(link);
        current = by_name.get(link.base.as_str()).copied();
    }

    let mut fields: Vec<&RecordField> = Vec::new();

    for link in chain.iter().rev() {
        for field in &link.fields {
            if let Some(existing) = fields.iter_mut().find(|seen| seen.name == field.name) {
                *existing = field;
            } else {
                fields.push(field);
            }
        }
    }

    fields
}

fn record_tokens(record: &DerivedRecord, fields: &[&RecordField]) -> TokenStream {
    let name = format_ident!("{}", &record.name);
    let xml_name = &record.xml_name;
    let qualified = format!("ns{}:{}", record.namespace_idx, record.xml_name);

    let members = fields.iter().map(|field| {
        let ident = format_ident!("{}", &field.name);
        let ty = type_tokens(&field.ty, Scope::Types);

        if field.is_array {
            quote!(pub #ident: Vec<#ty>,)
        } else {
            quote!(pub #ident: #ty,)
        }
    });

    let writes = fields.iter().map(|field| field_to_xml(field));
    let reads = fields.iter().map(|field| field_from_xml(field));

    quote! {
        #[derive(Debug, Clone, Default)]
        pub struct #name {
            #(#members)*
        }

        impl #name {
            pub const XML_NAME: &'static str = #xml_name;

            fn write_fields<W: std::io::Write>(
                &self,
                writer: &mut distil_util::xml::Writer<W>,
            ) -> Result<(), distil_util::xml::Error> {
                #(#writes)*
                Ok(())
            }

            fn read_fields<R: std::io::BufRead>(
                reader: &mut distil_util::xml::Reader<R>,
                buffer: &mut Vec<u8>,
            ) -> Result<Self, distil_util::xml::Error> {
                let result = Self {
                    #(#reads)*
                };

                distil_util::xml::expect_end(reader, buffer)?;
                Ok(result)
            }
        }

        impl distil_util::xml::ToXml for #name {
            fn to_xml<W: std::io::Write>(
                &self,
                writer: &mut distil_util::xml::Writer<W>,
                top_level: bool,
            ) -> Result<(), distil_util::xml::Error> {
                let start = distil_util::xml::events::BytesStart::owned_name(#qualified);
                let start = if top_level { with_attributes(start) } else { start };

                writer.write_event(distil_util::xml::events::Event::Start(start.to_borrowed()))?;
                self.write_fields(writer)?;
                writer.write_event(distil_util::xml::events::Event::End(start.to_end()))?;

                Ok(())
            }
        }

        impl distil_util::xml::FromXml for #name {
            fn from_xml<R: std::io::BufRead>(
                reader: &mut distil_util::xml::Reader<R>,
                buffer: &mut Vec<u8>,
            ) -> Result<Self, distil_util::xml::Error> {
                distil_util::xml::expect_start(reader, buffer, Self::XML_NAME)?;
                Self::read_fields(reader, buffer)
            }
        }
    }
}

fn type_tokens(ty: &ResolvedType, scope: Scope) -> TokenStream {
    match ty {
        ResolvedType::Primitive(Primitive::Bool) => quote!(bool),
        ResolvedType::Primitive(Primitive::Int) => quote!(i64),
        ResolvedType::Primitive(Primitive::Float) => quote!(f64),
        ResolvedType::Primitive(Primitive::Str) => quote!(String),

        ResolvedType::Object(name) => {
            let ident = format_ident!("{}", name);

            match scope {
                Scope::Types => quote!(#ident),
                Scope::Services => quote!(super::types::#ident),
            }
        }

        ResolvedType::Dynamic => quote!(distil_util::xml::AnyValue),
    }
}

/// Emits the statements serialising one value expression as an element
/// with the given name and text content.
fn scalar_to_xml(xml_name: &str, value: TokenStream) -> TokenStream {
    quote! {
        {
            let element = distil_util::xml::events::BytesStart::owned_name(#xml_name);
            let text = format!("{}", #value);

            writer.write_event(distil_util::xml::events::Event::Start(element.to_borrowed()))?;
            writer.write_event(distil_util::xml::events::Event::Text(
                distil_util::xml::events::BytesText::from_plain_str(&text),
            ))?;
            writer.write_event(distil_util::xml::events::Event::End(element.to_end()))?;
        }
    }
}

fn field_to_xml(field: &RecordField) -> TokenStream {
    let ident = format_ident!("{}", &field.name);
    let xml_name = &field.name;

    match (&field.ty, field.is_array) {
        (ResolvedType::Object(_), false) => quote! {
            {
                let element = distil_util::xml::events::BytesStart::owned_name(#xml_name);

                writer.write_event(distil_util::xml::events::Event::Start(element.to_borrowed()))?;
                self.#ident.write_fields(writer)?;
                writer.write_event(distil_util::xml::events::Event::End(element.to_end()))?;
            }
        },

        (ResolvedType::Object(_), true) => quote! {
            for item in &self.#ident {
                let element = distil_util::xml::events::BytesStart::owned_name(#xml_name);

                writer.write_event(distil_util::xml::events::Event::Start(element.to_borrowed()))?;
                item.write_fields(writer)?;
                writer.write_event(distil_util::xml::events::Event::End(element.to_end()))?;
            }
        },

        (_, false) => scalar_to_xml(&field.name, quote!(self.#ident)),

        (_, true) => {
            let write = scalar_to_xml(&field.name, quote!(item));

            quote! {
                for item in &self.#ident {
                    #write
                }
            }
        }
    }
}

fn field_from_xml(field: &RecordField) -> TokenStream {
    let ident = format_ident!("{}", &field.name);
    let xml_name = &field.name;

    match (&field.ty, field.is_array) {
        (ResolvedType::Object(name), false) => {
            let ty = format_ident!("{}", name);

            quote! {
                #ident: {
                    distil_util::xml::expect_start(reader, buffer, #xml_name)?;
                    #ty::read_fields(reader, buffer)?
                },
            }
        }

        (ResolvedType::Object(name), true) => {
            let ty = format_ident!("{}", name);

            quote! {
                #ident: {
                    let mut items = Vec::new();

                    while distil_util::xml::try_start(reader, buffer, #xml_name)? {
                        items.push(#ty::read_fields(reader, buffer)?);
                    }

                    items
                },
            }
        }

        (_, false) => quote! {
            #ident: {
                distil_util::xml::expect_start(reader, buffer, #xml_name)?;
                let value = distil_util::xml::expect_value(reader, buffer)?;
                distil_util::xml::expect_end(reader, buffer)?;
                value
            },
        },

        (_, true) => quote! {
            #ident: {
                let mut items = Vec::new();

                while distil_util::xml::try_start(reader, buffer, #xml_name)? {
                    items.push(distil_util::xml::expect_value(reader, buffer)?);
                    distil_util::xml::expect_end(reader, buffer)?;
                }

                items
            },
        },
    }
}

impl Codegen for ServiceModel {
    fn codegen(&self) -> TokenStream {
        let name = format_ident!("{}", &self.name);
        let location = &self.location;
        let requests = self.operations.iter().map(request_tokens);
        let methods = self.operations.iter().map(method_tokens);

        quote! {
            #(#requests)*

            pub struct #name {
                client: distil_util::soap::Client,
            }

            impl #name {
                pub fn new() -> Self {
                    Self {
                        client: distil_util::soap::Client::new(#location),
                    }
                }

                #(#methods)*
            }
        }
    }
}

/// One struct per operation carrying its input parts, serialised as
/// the operation element wrapping one element per argument.
fn request_tokens(operation: &OperationModel) -> TokenStream {
    let ident = format_ident!("{}Request", &operation.name);
    let op_name = &operation.name;

    let members = operation.args.iter().map(|(arg, ty)| {
        let arg = format_ident!("{}", arg);
        let ty = type_tokens(ty, Scope::Services);
        quote!(pub #arg: #ty,)
    });

    let writes = operation.args.iter().map(|(arg, ty)| {
        let ident = format_ident!("{}", arg);

        match ty {
            ResolvedType::Object(_) => quote! {
                distil_util::xml::ToXml::to_xml(&self.#ident, writer, top_level)?;
            },
            _ => scalar_to_xml(arg, quote!(self.#ident)),
        }
    });

    quote! {
        #[derive(Debug, Clone)]
        pub struct #ident {
            #(#members)*
        }

        impl distil_util::xml::ToXml for #ident {
            fn to_xml<W: std::io::Write>(
                &self,
                writer: &mut distil_util::xml::Writer<W>,
                top_level: bool,
            ) -> Result<(), distil_util::xml::Error> {
                let start = distil_util::xml::events::BytesStart::owned_name(#op_name);

                writer.write_event(distil_util::xml::events::Event::Start(start.to_borrowed()))?;
                #(#writes)*
                writer.write_event(distil_util::xml::events::Event::End(start.to_end()))?;

                let _ = top_level;
                Ok(())
            }
        }
    }
}

fn method_tokens(operation: &OperationModel) -> TokenStream {
    let method = format_ident!("{}", &operation.name);
    let request = format_ident!("{}Request", &operation.name);
    let ret = type_tokens(&operation.ret, Scope::Services);

    let parameters = operation.args.iter().map(|(arg, ty)| {
        let arg = format_ident!("{}", arg);
        let ty = type_tokens(ty, Scope::Services);
        quote!(#arg: #ty)
    });

    let names = operation
        .args
        .iter()
        .map(|(arg, _)| format_ident!("{}", arg));

    quote! {
        pub fn #method(&self, #(#parameters),*) -> Result<#ret, distil_util::soap::Error> {
            let request = #request {
                #(#names,)*
            };

            let response: distil_util::soap::Envelope<#ret> =
                self.client.send(distil_util::soap::Envelope::new(request))?;

            Ok(response.into_body())
        }
    }
}

#[cfg(test)]
mod tests {
    use distil_wsdl::names::Namespaces;

    use super::*;

    fn str_field(name: &str) -> RecordField {
        RecordField {
            name: name.into(),
            ty: ResolvedType::Primitive(Primitive::Str),
            is_array: false,
        }
    }

    fn model() -> Distillation {
        let mut namespaces = Namespaces::default();
        let people = namespaces.add_or_get("urn:people");

        let person = DerivedRecord {
            name: "ApiPerson".into(),
            xml_name: "Person".into(),
            namespace_idx: people,
            base: "ApiBaseType".into(),
            fields: vec![
                str_field("name"),
                RecordField {
                    name: "age".into(),
                    ty: ResolvedType::Primitive(Primitive::Int),
                    is_array: false,
                },
            ],
        };

        let member = DerivedRecord {
            name: "ApiTeamMember".into(),
            xml_name: "TeamMember".into(),
            namespace_idx: people,
            base: "ApiPerson".into(),
            fields: vec![str_field("role")],
        };

        let team = DerivedRecord {
            name: "ApiTeam".into(),
            xml_name: "Team".into(),
            namespace_idx: people,
            base: "ApiBaseType".into(),
            fields: vec![RecordField {
                name: "members".into(),
                ty: ResolvedType::Object("ApiTeamMember".into()),
                is_array: true,
            }],
        };

        let service = ServiceModel {
            name: "PeopleService".into(),
            location: "http://example.com/people".into(),
            operations: vec![OperationModel {
                name: "GetTeam".into(),
                args: vec![(
                    "teamId".into(),
                    ResolvedType::Primitive(Primitive::Int),
                )],
                ret: ResolvedType::Object("ApiTeam".into()),
            }],
        };

        Distillation {
            records: vec![person, member, team],
            services: vec![service],
            namespaces,
            target_namespace: "Generated\\People".into(),
        }
    }

    #[test]
    fn records_become_structs_with_xml_impls() {
        let generated = codegen(&model()).to_string();

        assert!(generated.contains("pub struct ApiPerson"));
        assert!(generated.contains("pub name : String"));
        assert!(generated.contains("pub age : i64"));
        assert!(generated.contains("impl distil_util :: xml :: ToXml for ApiPerson"));
        assert!(generated.contains("impl distil_util :: xml :: FromXml for ApiPerson"));
    }

    #[test]
    fn extension_fields_are_flattened_base_first() {
        let generated = codegen(&model()).to_string();

        let member = generated
            .find("pub struct ApiTeamMember")
            .expect("member struct generated");
        let body = &generated[member..];

        let name = body.find("pub name : String").expect("inherited field");
        let role = body.find("pub role : String").expect("own field");

        assert!(name < role);
    }

    #[test]
    fn array_fields_become_vectors() {
        let generated = codegen(&model()).to_string();

        assert!(generated.contains("pub members : Vec < ApiTeamMember >"));
    }

    #[test]
    fn object_fields_use_the_schema_element_name_on_the_wire() {
        let generated = codegen(&model()).to_string();

        // Readers and writers both address the field's element name,
        // not the referenced type's name.
        assert!(generated.contains("try_start (reader , buffer , \"members\")"));
        assert!(generated.contains("ApiTeamMember :: read_fields (reader , buffer)"));
        assert!(generated.contains("owned_name (\"members\")"));
    }

    #[test]
    fn namespace_table_feeds_top_level_attributes() {
        let generated = codegen(&model()).to_string();

        assert!(generated.contains("\"xmlns:ns0\""));
        assert!(generated.contains("\"urn:people\""));
    }

    #[test]
    fn services_get_a_client_facade_per_operation() {
        let generated = codegen(&model()).to_string();

        assert!(generated.contains("pub struct PeopleService"));
        assert!(generated.contains("pub struct GetTeamRequest"));
        assert!(generated.contains("pub fn GetTeam"));
        assert!(generated
            .contains("Result < super :: types :: ApiTeam , distil_util :: soap :: Error >"));
        assert!(generated.contains("\"http://example.com/people\""));
    }

    #[test]
    fn target_namespace_is_carried_as_a_constant() {
        let generated = codegen(&model()).to_string();

        assert!(generated.contains("pub const TARGET_NAMESPACE"));
        assert!(generated.contains("Generated\\\\People"));
    }
}
