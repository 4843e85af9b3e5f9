//! Markup to JSON conversion.

use std::collections::BTreeMap;
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use schemagate_core::{JsonSchemaValidator, Schema, SchemaValidator, first_violation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ParseError;

/// Controls how elements map onto JSON values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Key holding an element's attributes.
    pub attr_key: String,
    /// Key holding an element's text when it also has attributes or children.
    pub char_key: String,
    /// Wrap the result as `{ root_name: value }`.
    pub explicit_root: bool,
    /// Always collect child elements into arrays.
    pub explicit_array: bool,
    pub trim: bool,
    /// Collapse whitespace runs into a single space.
    pub normalize: bool,
    /// Value of an element with no attributes, children or text.
    pub empty_tag: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            attr_key: "@".to_string(),
            char_key: "#".to_string(),
            explicit_root: false,
            explicit_array: false,
            trim: true,
            normalize: true,
            empty_tag: String::new(),
        }
    }
}

/// Schema check applied to the parsed document.
#[derive(Clone)]
pub struct InlineValidator {
    schema: Schema,
    validator: Arc<dyn SchemaValidator>,
}

impl InlineValidator {
    pub fn new(schema: Schema) -> Self {
        Self::with_validator(schema, Arc::new(JsonSchemaValidator))
    }

    pub fn with_validator(schema: Schema, validator: Arc<dyn SchemaValidator>) -> Self {
        Self { schema, validator }
    }

    fn check(&self, document: &Value) -> Result<(), ParseError> {
        match first_violation(self.validator.as_ref(), document, &self.schema) {
            Some(violation) => Err(ParseError::Invalid(violation.render())),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for InlineValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// XML parser producing JSON values.
#[derive(Debug, Clone, Default)]
pub struct XmlParser {
    options: ParserOptions,
    validator: Option<InlineValidator>,
}

struct Element {
    name: String,
    attributes: Map<String, Value>,
    text: String,
    children: Vec<(String, Value)>,
}

impl XmlParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            validator: None,
        }
    }

    pub fn with_validator(mut self, validator: InlineValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse `raw` into a JSON value. Exactly one outcome is produced: the
    /// converted (and, with a validator, validated) document or an error.
    pub fn parse(&self, raw: &str) -> Result<Value, ParseError> {
        let document = self.convert(raw)?;
        if let Some(validator) = &self.validator {
            validator.check(&document)?;
        }
        Ok(document)
    }

    fn convert(&self, raw: &str) -> Result<Value, ParseError> {
        let mut reader = Reader::from_str(raw);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<(String, Value)> = None;

        loop {
            let event = reader.read_event().map_err(|err| malformed(&reader, err))?;

            match event {
                Event::Start(start) => {
                    ensure_single_root(&stack, &root)?;
                    stack.push(open_element(&start, &reader)?);
                }
                Event::Empty(start) => {
                    ensure_single_root(&stack, &root)?;
                    let element = open_element(&start, &reader)?;
                    self.close_element(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(ParseError::TrailingContent)?;
                    self.close_element(element, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|err| malformed(&reader, err))?;
                    match stack.last_mut() {
                        Some(element) => element.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(ParseError::TrailingContent),
                    }
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    match stack.last_mut() {
                        Some(element) => element.text.push_str(&String::from_utf8_lossy(&bytes)),
                        None => return Err(ParseError::TrailingContent),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = stack.pop() {
            return Err(ParseError::Unclosed(element.name));
        }

        let (name, value) = root.ok_or(ParseError::NoRoot)?;
        if self.options.explicit_root {
            let mut wrapped = Map::new();
            wrapped.insert(name, value);
            Ok(Value::Object(wrapped))
        } else {
            Ok(value)
        }
    }

    fn close_element(
        &self,
        element: Element,
        stack: &mut [Element],
        root: &mut Option<(String, Value)>,
    ) {
        let name = element.name.clone();
        let value = self.element_value(element);
        match stack.last_mut() {
            Some(parent) => parent.children.push((name, value)),
            None => *root = Some((name, value)),
        }
    }

    fn element_value(&self, element: Element) -> Value {
        let text = self.clean_text(&element.text);

        if element.attributes.is_empty() && element.children.is_empty() {
            return if text.is_empty() {
                Value::String(self.options.empty_tag.clone())
            } else {
                Value::String(text)
            };
        }

        let mut object = Map::new();
        if !element.attributes.is_empty() {
            object.insert(
                self.options.attr_key.clone(),
                Value::Object(element.attributes),
            );
        }
        if !text.is_empty() {
            object.insert(self.options.char_key.clone(), Value::String(text));
        }

        let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for (name, value) in element.children {
            grouped.entry(name).or_default().push(value);
        }
        for (name, mut values) in grouped {
            let value = if self.options.explicit_array || values.len() > 1 {
                Value::Array(values)
            } else {
                values.pop().unwrap_or(Value::Null)
            };
            object.insert(name, value);
        }

        Value::Object(object)
    }

    fn clean_text(&self, raw: &str) -> String {
        let text = if self.options.normalize {
            collapse_whitespace(raw)
        } else {
            raw.to_string()
        };
        if self.options.trim {
            text.trim().to_string()
        } else {
            text
        }
    }
}

fn ensure_single_root(stack: &[Element], root: &Option<(String, Value)>) -> Result<(), ParseError> {
    if stack.is_empty() && root.is_some() {
        return Err(ParseError::TrailingContent);
    }
    Ok(())
}

fn open_element(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, ParseError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Map::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| malformed(reader, err))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| malformed(reader, err))?;
        attributes.insert(key, Value::String(value.into_owned()));
    }
    Ok(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn malformed(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> ParseError {
    ParseError::Malformed {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

fn collapse_whitespace(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                collapsed.push(' ');
            }
            in_whitespace = true;
        } else {
            collapsed.push(ch);
            in_whitespace = false;
        }
    }
    collapsed
}
