use super::xml::{
    self,
    events::{BytesStart, Event},
    expect_end, expect_start, FromXml, Reader, ToXml, Writer,
};

use bytes::Buf;
use reqwest::blocking::Client as Reqwest;
use std::io::{BufRead, BufReader, Cursor, Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("SOAP transport error")]
    Transport(#[from] reqwest::Error),

    #[error("SOAP envelope error")]
    Envelope(#[from] xml::Error),
}

/// Blocking SOAP 1.1 client bound to one endpoint. Generated service
/// facades hold one of these per port.
pub struct Client {
    client: Reqwest,
    url: &'static str,
}

#[derive(Debug)]
pub struct Envelope<T> {
    body: T,
}

impl Client {
    pub fn new(url: &'static str) -> Self {
        Self {
            client: Reqwest::new(),
            url,
        }
    }

    pub fn send<T: ToXml, U: FromXml>(
        &self,
        request_envelope: Envelope<T>,
    ) -> Result<Envelope<U>, Error> {
        let response = self
            .client
            .post(self.url)
            .body(request_envelope.to_request()?)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .send()?;

        Ok(Envelope::<U>::from_response(response.bytes()?.reader())?)
    }
}

impl<T> Envelope<T> {
    pub fn new(body: T) -> Self {
        Self { body }
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

impl<T: ToXml> Envelope<T> {
    pub fn to_request(&self) -> Result<Vec<u8>, xml::Error> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        self.to_xml(&mut writer, true)?;
        Ok(writer.into_inner().into_inner())
    }
}

impl<T: FromXml> Envelope<T> {
    pub fn from_response<R: Read>(read: R) -> Result<Self, xml::Error> {
        let mut reader = Reader::from_reader(BufReader::new(read));
        let mut buffer = Vec::new();
        Self::from_xml(&mut reader, &mut buffer)
    }
}

impl<T: ToXml> ToXml for Envelope<T> {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, top_level: bool) -> Result<(), xml::Error> {
        let envelope = BytesStart::owned_name("soapenv:Envelope")
            .with_attributes([("xmlns:soapenv", "http://schemas.xmlsoap.org/soap/envelope/")]);
        let body = BytesStart::owned_name("soapenv:Body");

        writer.write_event(Event::Start(envelope.to_borrowed()))?;
        writer.write_event(Event::Start(body.to_borrowed()))?;
        self.body.to_xml(writer, top_level)?;
        writer.write_event(Event::End(body.to_end()))?;
        writer.write_event(Event::End(envelope.to_end()))?;

        Ok(())
    }
}

impl<T: FromXml> FromXml for Envelope<T> {
    fn from_xml<R: BufRead>(reader: &mut Reader<R>, buffer: &mut Vec<u8>) -> Result<Self, xml::Error> {
        expect_start(reader, buffer, "Envelope")?;
        expect_start(reader, buffer, "Body")?;
        let body = T::from_xml(reader, buffer)?;
        expect_end(reader, buffer)?;
        expect_end(reader, buffer)?;

        Ok(Self::new(body))
    }
}
