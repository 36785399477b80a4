use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use quick_xml::events::Event;
use thiserror::Error;

pub use quick_xml::{events, Writer};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error reading XML")]
    Xml(#[from] quick_xml::Error),

    #[error("Unexpected XML content: expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("Unable to parse element value '{0}'")]
    Value(String),
}

/// Streaming reader with one event of lookahead, so callers can probe
/// for repeated elements without consuming the event that ends them.
pub struct Reader<R: BufRead> {
    inner: quick_xml::Reader<R>,
    peeked: Option<Event<'static>>,
}

impl<R: BufRead> Reader<R> {
    pub fn from_reader(reader: R) -> Self {
        let mut inner = quick_xml::Reader::from_reader(reader);
        inner.trim_text(true);
        inner.expand_empty_elements(true);

        Self {
            inner,
            peeked: None,
        }
    }

    fn next_event(&mut self, buffer: &mut Vec<u8>) -> Result<Event<'static>, Error> {
        if let Some(event) = self.peeked.take() {
            return Ok(event);
        }

        buffer.clear();
        Ok(self.inner.read_event(buffer)?.into_owned())
    }

    fn peek_event(&mut self, buffer: &mut Vec<u8>) -> Result<&Event<'static>, Error> {
        if self.peeked.is_none() {
            buffer.clear();
            self.peeked = Some(self.inner.read_event(buffer)?.into_owned());
        }

        Ok(self.peeked.as_ref().expect("peeked event just filled"))
    }
}

pub trait ToXml {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, top_level: bool) -> Result<(), Error>;
}

pub trait FromXml: Sized {
    fn from_xml<R: BufRead>(reader: &mut Reader<R>, buffer: &mut Vec<u8>) -> Result<Self, Error>;
}

fn local_name(name: &[u8]) -> &[u8] {
    name.rsplit(|byte| *byte == b':').next().unwrap_or(name)
}

/// Consumes the next event, which must be a start tag with the given
/// local name.
pub fn expect_start<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    name: &str,
) -> Result<(), Error> {
    match reader.next_event(buffer)? {
        Event::Start(start) if local_name(start.name()) == name.as_bytes() => Ok(()),
        event => Err(Error::Unexpected {
            expected: format!("<{}>", name),
            found: format!("{:?}", event),
        }),
    }
}

/// Consumes the next event, which must be a start tag of any name.
pub fn expect_any_start<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(), Error> {
    match reader.next_event(buffer)? {
        Event::Start(_) => Ok(()),
        event => Err(Error::Unexpected {
            expected: "a start tag".into(),
            found: format!("{:?}", event),
        }),
    }
}

/// Consumes a start tag with the given local name if it is next,
/// returning whether it was.
pub fn try_start<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    name: &str,
) -> Result<bool, Error> {
    if peek_start(reader, buffer, name)? {
        reader.next_event(buffer)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Reports whether the next event is a start tag with the given local
/// name, without consuming it.
pub fn peek_start<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    name: &str,
) -> Result<bool, Error> {
    Ok(matches!(
        reader.peek_event(buffer)?,
        Event::Start(start) if local_name(start.name()) == name.as_bytes()
    ))
}

/// Consumes a text event and parses it into the target type.
pub fn expect_value<T: FromStr, R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<T, Error> {
    match reader.next_event(buffer)? {
        Event::Text(text) => {
            let unescaped = text.unescaped()?;
            let decoded = std::str::from_utf8(unescaped.as_ref())
                .map_err(|_| Error::Value(String::from_utf8_lossy(unescaped.as_ref()).into()))?;

            decoded
                .trim()
                .parse()
                .map_err(|_| Error::Value(decoded.to_owned()))
        }

        event => Err(Error::Unexpected {
            expected: "text content".into(),
            found: format!("{:?}", event),
        }),
    }
}

/// Consumes the next event, which must be an end tag.
pub fn expect_end<R: BufRead>(reader: &mut Reader<R>, buffer: &mut Vec<u8>) -> Result<(), Error> {
    match reader.next_event(buffer)? {
        Event::End(_) => Ok(()),
        event => Err(Error::Unexpected {
            expected: "an end tag".into(),
            found: format!("{:?}", event),
        }),
    }
}

/// String-backed payload for fields whose schema type is the dynamic
/// "any" fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnyValue(pub String);

impl FromStr for AnyValue {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(value.to_owned()))
    }
}

impl std::fmt::Display for AnyValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(formatter)
    }
}

macro_rules! impl_from_xml_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl FromXml for $ty {
            fn from_xml<R: BufRead>(
                reader: &mut Reader<R>,
                buffer: &mut Vec<u8>,
            ) -> Result<Self, Error> {
                expect_any_start(reader, buffer)?;
                let value = expect_value(reader, buffer)?;
                expect_end(reader, buffer)?;
                Ok(value)
            }
        }
    )*};
}

impl_from_xml_scalar!(bool, i64, f64, String, AnyValue);

impl ToXml for AnyValue {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, _top_level: bool) -> Result<(), Error> {
        let text = events::BytesText::from_plain_str(&self.0);
        writer.write_event(Event::Text(text))?;
        Ok(())
    }
}
