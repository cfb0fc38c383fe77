//! Reading MML text into a flat stream of element events.

use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseResult;

/// One element-level event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MomlEvent {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
}

/// Read every event of `text`. Self-closing elements produce a start
/// followed by an end. Whitespace-only text is dropped.
pub(crate) fn read_events(text: &str) -> ParseResult<Vec<MomlEvent>> {
    let mut reader = Reader::from_str(text);
    let mut events = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                events.push(start_event(&e)?);
            }
            Event::Empty(e) => {
                let start = start_event(&e)?;
                if let MomlEvent::Start { name, .. } = &start {
                    let name = name.clone();
                    events.push(start);
                    events.push(MomlEvent::End { name });
                }
            }
            Event::End(e) => {
                let name = str::from_utf8(e.name().as_ref())?.to_string();
                events.push(MomlEvent::End { name });
            }
            Event::Text(t) => {
                let text = t.decode()?;
                if !text.trim().is_empty() {
                    events.push(MomlEvent::Text(text.into_owned()));
                }
            }
            Event::CData(c) => {
                let text = c.decode()?;
                if !text.trim().is_empty() {
                    events.push(MomlEvent::Text(text.into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(events)
}

fn start_event(e: &BytesStart<'_>) -> ParseResult<MomlEvent> {
    let name = str::from_utf8(e.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attribute in e.attributes() {
        let attribute = attribute?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(MomlEvent::Start { name, attributes })
}
