//! XML to value-tree conversion.
//!
//! # Mapping
//! ```text
//! <server port="80">            {"server": {
//!   <name>web</name>        =>      "-port": "80",
//!   <alias>a</alias>                "name": "web",
//!   <alias>b</alias>                "alias": ["a", "b"]
//! </server>                     }}
//! ```
//! Leaf elements without attributes collapse to their text. Elements with
//! both attributes/children and text keep the text under `#text`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn document() -> Self {
        Self {
            name: String::new(),
            fields: Map::new(),
            text: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("<{name}>: {e}"))?;
            let key = format!("-{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr
                .unescape_value()
                .map_err(|e| format!("<{name}>: {e}"))?
                .into_owned();
            fields.insert(key, Value::String(value));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn into_entry(self) -> (String, Value) {
        let value = if self.fields.is_empty() {
            Value::String(self.text)
        } else {
            let mut fields = self.fields;
            if !self.text.is_empty() {
                fields.insert("#text".to_string(), Value::String(self.text));
            }
            Value::Object(fields)
        };
        (self.name, value)
    }
}

pub(crate) fn parse(content: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::document()];
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(format!("at byte {}: {e}", reader.buffer_position())),
        };
        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(&mut stack, element)?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err("unexpected closing tag".to_string());
                }
                if let Some(element) = stack.pop() {
                    attach(&mut stack, element)?;
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(format!("unclosed element <{open}>"));
    }
    let document = stack.pop().map(|e| e.fields).unwrap_or_default();
    if document.is_empty() {
        return Err("no root element".to_string());
    }
    Ok(Value::Object(document))
}

fn attach(stack: &mut [Element], element: Element) -> Result<(), String> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| "element outside of document".to_string())?;
    let (key, value) = element.into_entry();
    match parent.fields.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.fields.insert(key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements_and_attributes() {
        let value = parse(
            r#"<?xml version="1.0"?>
            <server port="80">
                <name>web</name>
                <alias>a</alias>
                <alias>b</alias>
                <tls enabled="true"/>
            </server>"#,
        )
        .unwrap();
        assert_eq!(value["server"]["-port"], "80");
        assert_eq!(value["server"]["name"], "web");
        assert_eq!(value["server"]["alias"][1], "b");
        assert_eq!(value["server"]["tls"]["-enabled"], "true");
    }

    #[test]
    fn test_text_with_attributes() {
        let value = parse(r#"<cfg><db driver="pg">main</db></cfg>"#).unwrap();
        assert_eq!(value["cfg"]["db"]["-driver"], "pg");
        assert_eq!(value["cfg"]["db"]["#text"], "main");
    }

    #[test]
    fn test_cdata_and_entities() {
        let value = parse("<cfg><a><![CDATA[x < y]]></a><b>1 &amp; 2</b></cfg>").unwrap();
        assert_eq!(value["cfg"]["a"], "x < y");
        assert_eq!(value["cfg"]["b"], "1 & 2");
    }

    #[test]
    fn test_rejects_unclosed_and_mismatched() {
        assert!(parse("<cfg><a>1</a>").is_err());
        assert!(parse("<cfg><a>1</b></cfg>").is_err());
        assert!(parse("").is_err());
    }
}
