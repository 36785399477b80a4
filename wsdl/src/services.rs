use tracing::debug;

use crate::{
    error::Error,
    model::{OperationModel, ResolvedType, ServiceModel},
    resolver::ResolvedTypes,
    types::{Extracted, Message},
};

fn part_type(
    extracted: &Extracted,
    resolved: &ResolvedTypes,
    part: &crate::types::Part,
) -> Result<ResolvedType, Error> {
    let key = part.element.key(&extracted.namespaces);

    resolved
        .get(&key)
        .cloned()
        .ok_or(Error::UndefinedType(key))
}

fn message<'a>(extracted: &'a Extracted, name: &crate::names::QName) -> Result<&'a Message, Error> {
    extracted
        .wsdl
        .message(name)
        .ok_or_else(|| Error::MissingElement {
            element: "message",
            context: name.key(&extracted.namespaces),
        })
}

/// Builds the client-facade model from the WSDL structural elements,
/// resolving every message part through the resolved type map.
/// Assumes a single port per service.
pub fn build(extracted: &Extracted, resolved: &ResolvedTypes) -> Result<Vec<ServiceModel>, Error> {
    let mut services = Vec::new();

    for service in &extracted.wsdl.services {
        let port = service.ports.first().ok_or_else(|| Error::MissingElement {
            element: "port",
            context: format!("service {}", service.name),
        })?;

        let binding =
            extracted
                .wsdl
                .binding(&port.binding)
                .ok_or_else(|| Error::MissingElement {
                    element: "binding",
                    context: format!("port {}", port.name),
                })?;

        let port_type =
            extracted
                .wsdl
                .port_type(&binding.ty)
                .ok_or_else(|| Error::MissingElement {
                    element: "portType",
                    context: binding.ty.key(&extracted.namespaces),
                })?;

        let mut operations = Vec::new();

        for operation in &port_type.operations {
            let input = operation
                .input
                .as_ref()
                .ok_or_else(|| Error::MissingElement {
                    element: "input",
                    context: format!("operation {}", operation.name),
                })?;

            let mut args = Vec::new();
            for part in &message(extracted, input)?.parts {
                args.push((part.name.clone(), part_type(extracted, resolved, part)?));
            }

            let output = operation
                .output
                .as_ref()
                .ok_or_else(|| Error::MissingElement {
                    element: "output",
                    context: format!("operation {}", operation.name),
                })?;

            let output_message = message(extracted, output)?;
            let ret_part = output_message
                .parts
                .first()
                .ok_or_else(|| Error::MissingElement {
                    element: "part",
                    context: output.key(&extracted.namespaces),
                })?;

            operations.push(OperationModel {
                name: operation.name.clone(),
                args,
                ret: part_type(extracted, resolved, ret_part)?,
            });
        }

        debug!(
            service = service.name.as_str(),
            operations = operations.len(),
            "service model built"
        );

        services.push(ServiceModel {
            name: service.name.clone(),
            location: port.location.clone(),
            operations,
        });
    }

    Ok(services)
}
