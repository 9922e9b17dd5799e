//! One protocol message as an ordered list of typed fields.
//!
//! Records have no self-describing schema: the writer and the reader must
//! agree on field order and count, keyed by the leading tag atom. The wire
//! form is a single comma-separated line with `\` escaping.

use std::collections::VecDeque;
use std::fmt;

use crate::ProtocolError;
use crate::tags;

/// Write side of the record codec.
///
/// Fields are emitted in call order. [`RecordWriter::line`] escapes and
/// joins them into a newline-terminated wire line and resets the writer.
#[derive(Debug, Default)]
pub struct RecordWriter {
    fields: Vec<String>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(&mut self, v: i64) {
        self.fields.push(v.to_string());
    }

    pub fn bool(&mut self, v: bool) {
        self.fields.push(v.to_string());
    }

    pub fn str(&mut self, v: &str) {
        self.fields.push(v.to_string());
    }

    /// An atom: a short interned string used as a message or field
    /// discriminator. Same wire form as `str`.
    pub fn sym(&mut self, v: &str) {
        self.fields.push(v.to_string());
    }

    /// Absent optionals are encoded as an empty field.
    pub fn opt_int(&mut self, v: Option<i64>) {
        match v {
            Some(v) => self.int(v),
            None => self.fields.push(String::new()),
        }
    }

    pub fn opt_bool(&mut self, v: Option<bool>) {
        match v {
            Some(v) => self.bool(v),
            None => self.fields.push(String::new()),
        }
    }

    pub fn opt_str(&mut self, v: Option<&str>) {
        match v {
            Some(v) => self.str(v),
            None => self.fields.push(String::new()),
        }
    }

    pub fn opt_sym(&mut self, v: Option<&str>) {
        match v {
            Some(v) => self.sym(v),
            None => self.fields.push(String::new()),
        }
    }

    /// Produce the newline-terminated wire line and reset the writer.
    pub fn line(&mut self) -> String {
        let mut line = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            for ch in field.chars() {
                if ch == '\\' || ch == ',' {
                    line.push('\\');
                }
                line.push(ch);
            }
        }
        line.push('\n');
        self.fields.clear();
        line
    }
}

/// Read side of the record codec: a FIFO queue of decoded fields.
///
/// A handler must consume every field in the order they were written;
/// the connection layer rejects records with leftover fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: VecDeque<String>,
}

impl Record {
    /// Decode one unterminated line. A backslash escapes the following
    /// character unconditionally; an unescaped comma splits fields.
    pub fn parse(line: &str) -> Self {
        let mut fields = VecDeque::new();
        let mut field = String::new();
        let mut escape = false;
        for ch in line.chars() {
            if ch == ',' && !escape {
                fields.push_back(std::mem::take(&mut field));
            } else if ch == '\\' && !escape {
                escape = true;
            } else {
                field.push(ch);
                escape = false;
            }
        }
        fields.push_back(field);
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// If the next field is the reserved disconnect tag, strip it and
    /// reclassify this record as a disconnect notice, returning the
    /// peer's reason (best effort).
    pub fn take_disconnect(&mut self) -> Option<String> {
        if self.fields.front().map(String::as_str) == Some(tags::DISCONNECT) {
            self.fields.pop_front();
            let reason = self
                .fields
                .pop_front()
                .unwrap_or_else(|| "unknown error".to_string());
            Some(reason)
        } else {
            None
        }
    }

    fn next_field(&mut self, expected: &'static str) -> Result<String, ProtocolError> {
        self.fields
            .pop_front()
            .ok_or(ProtocolError::EndOfRecord { expected })
    }

    pub fn int(&mut self) -> Result<i64, ProtocolError> {
        let field = self.next_field("int")?;
        field.parse().map_err(|_| ProtocolError::FieldType {
            expected: "int",
            found: field,
        })
    }

    pub fn bool(&mut self) -> Result<bool, ProtocolError> {
        let field = self.next_field("bool")?;
        match field.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ProtocolError::FieldType {
                expected: "bool",
                found: field,
            }),
        }
    }

    pub fn str(&mut self) -> Result<String, ProtocolError> {
        self.next_field("str")
    }

    pub fn sym(&mut self) -> Result<String, ProtocolError> {
        self.next_field("sym")
    }

    /// An optional field must be checked for emptiness before decoding
    /// the underlying type; an empty field is `None`.
    pub fn opt_int(&mut self) -> Result<Option<i64>, ProtocolError> {
        if self.peek_empty("int or empty")? {
            self.fields.pop_front();
            return Ok(None);
        }
        self.int().map(Some)
    }

    pub fn opt_bool(&mut self) -> Result<Option<bool>, ProtocolError> {
        if self.peek_empty("bool or empty")? {
            self.fields.pop_front();
            return Ok(None);
        }
        self.bool().map(Some)
    }

    pub fn opt_str(&mut self) -> Result<Option<String>, ProtocolError> {
        if self.peek_empty("str or empty")? {
            self.fields.pop_front();
            return Ok(None);
        }
        self.str().map(Some)
    }

    pub fn opt_sym(&mut self) -> Result<Option<String>, ProtocolError> {
        if self.peek_empty("sym or empty")? {
            self.fields.pop_front();
            return Ok(None);
        }
        self.sym().map(Some)
    }

    fn peek_empty(&self, expected: &'static str) -> Result<bool, ProtocolError> {
        match self.fields.front() {
            Some(field) => Ok(field.is_empty()),
            None => Err(ProtocolError::EndOfRecord { expected }),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}
