//! Payload — the set of fields submitted in one request.
//!
//! A payload is an ordered list of named fields. It can be rendered either as
//! a JSON object or as a list of multipart form parts; which one is used is
//! decided by the client at submission time.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ClientError;

/// Raw file content sent as a multipart file part.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content: Bytes,
    pub mime: String,
}

impl Attachment {
    /// Builds an attachment, inferring the MIME type from the filename.
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let mime = mime_for_filename(&filename).to_string();
        Self {
            filename,
            content: content.into(),
            mime,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Reads a file from disk. The attachment keeps only the file name, not the directory.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Attachment {
                path: path.display().to_string(),
                source,
            })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(filename, content))
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// MIME type for the extensions the profile API knows how to read.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<String>),
    File(Attachment),
}

impl FieldValue {
    pub fn is_file(&self) -> bool {
        matches!(self, FieldValue::File(_))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Attachment> for FieldValue {
    fn from(a: Attachment) -> Self {
        FieldValue::File(a)
    }
}

/// One multipart form part, before it is handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, attachment: Attachment },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Vec<(String, FieldValue)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Payload::insert`].
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field. Re-inserting a name replaces the value but keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True if any field carries byte content. Such payloads can only go out as multipart.
    pub fn has_bytes(&self) -> bool {
        self.fields.iter().any(|(_, v)| v.is_file())
    }

    /// Builds a payload from any serializable struct.
    ///
    /// The value must serialize to a flat JSON object: scalars and arrays of
    /// strings only. `null` fields are dropped.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, ClientError> {
        let Value::Object(map) = serde_json::to_value(value)? else {
            return Err(ClientError::invalid_field(
                "<root>",
                "payload must serialize to a JSON object",
            ));
        };

        let mut payload = Payload::new();
        for (name, value) in map {
            let field = match value {
                Value::Null => continue,
                Value::Bool(b) => FieldValue::Bool(b),
                Value::Number(n) => FieldValue::Number(
                    n.as_f64()
                        .ok_or_else(|| ClientError::invalid_field(&name, "number out of range"))?,
                ),
                Value::String(s) => FieldValue::Text(s),
                Value::Array(items) => FieldValue::List(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(s) => Ok(s),
                            _ => Err(ClientError::invalid_field(
                                &name,
                                "lists may only contain strings",
                            )),
                        })
                        .collect::<Result<_, _>>()?,
                ),
                Value::Object(_) => {
                    return Err(ClientError::invalid_field(
                        &name,
                        "nested objects are not supported",
                    ))
                }
            };
            payload.fields.push((name, field));
        }
        Ok(payload)
    }

    /// Renders the payload as a JSON object.
    pub fn to_json(&self) -> Result<Value, ClientError> {
        let mut map = Map::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            let json = match value {
                FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .ok_or_else(|| ClientError::invalid_field(name, "number must be finite"))?,
                FieldValue::Text(s) => Value::String(s.clone()),
                FieldValue::Bool(b) => Value::Bool(*b),
                FieldValue::List(items) => {
                    Value::Array(items.iter().cloned().map(Value::String).collect())
                }
                FieldValue::File(_) => {
                    return Err(ClientError::invalid_field(
                        name,
                        "byte content cannot be sent as JSON",
                    ))
                }
            };
            map.insert(name.clone(), json);
        }
        Ok(Value::Object(map))
    }

    /// Renders the payload as multipart parts, in field order.
    ///
    /// Lists expand to one text part per element under the same name, which
    /// is how form-encoded list fields are read server side. An empty list
    /// produces no part at all. Non-finite numbers are rejected as in
    /// [`Payload::to_json`].
    pub fn form_parts(&self) -> Result<Vec<FormPart>, ClientError> {
        let mut parts = Vec::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            match value {
                FieldValue::Number(n) if !n.is_finite() => {
                    return Err(ClientError::invalid_field(name, "number must be finite"))
                }
                FieldValue::Number(n) => parts.push(text_part(name, n.to_string())),
                FieldValue::Text(s) => parts.push(text_part(name, s.clone())),
                FieldValue::Bool(b) => parts.push(text_part(name, b.to_string())),
                FieldValue::List(items) => {
                    parts.extend(items.iter().map(|item| text_part(name, item.clone())))
                }
                FieldValue::File(attachment) => parts.push(FormPart::File {
                    name: name.clone(),
                    attachment: attachment.clone(),
                }),
            }
        }
        Ok(parts)
    }
}

fn text_part(name: &str, value: String) -> FormPart {
    FormPart::Text {
        name: name.to_string(),
        value,
    }
}
