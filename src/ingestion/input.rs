//! Raw upload buffers and text decoding.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{IntakeError, IntakeResult};

/// An uploaded file as received by the caller: bytes plus the declared text encoding.
#[derive(Clone)]
pub struct RawUpload {
    /// Original file name, used for format inference.
    pub file_name: Option<String>,
    /// Declared MIME type, used for format inference.
    pub mime_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
    /// Encoding used when the bytes are read as text. Defaults to UTF-8.
    pub encoding: &'static Encoding,
}

impl RawUpload {
    /// Wrap a buffer, assuming UTF-8 text.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            mime_type: None,
            bytes: bytes.into(),
            encoding: UTF_8,
        }
    }

    /// Set the original file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the declared MIME type.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Set the text encoding from a WHATWG label such as `"utf-8"` or `"windows-1252"`.
    pub fn with_encoding_label(mut self, label: &str) -> IntakeResult<Self> {
        self.encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            IntakeError::UnsupportedEncoding {
                label: label.to_string(),
            }
        })?;
        Ok(self)
    }

    /// Decode the buffer as text. A leading byte-order mark overrides the declared encoding;
    /// malformed sequences are replaced.
    pub fn decode_text(&self) -> Cow<'_, str> {
        let (text, _, _) = self.encoding.decode(&self.bytes);
        text
    }
}

impl fmt::Debug for RawUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

/// Input accepted by the delimited-text parsers: an upload or already-decoded text.
#[derive(Debug, Clone, Copy)]
pub enum UploadInput<'a> {
    /// Raw upload, decoded with its declared encoding.
    Raw(&'a RawUpload),
    /// Pre-decoded text (e.g. the output of a spreadsheet conversion).
    Text(&'a str),
}

impl<'a> UploadInput<'a> {
    /// Text view of the input.
    pub fn text(&self) -> Cow<'a, str> {
        match *self {
            UploadInput::Raw(upload) => upload.decode_text(),
            UploadInput::Text(text) => Cow::Borrowed(text),
        }
    }
}

impl<'a> From<&'a RawUpload> for UploadInput<'a> {
    fn from(upload: &'a RawUpload) -> Self {
        UploadInput::Raw(upload)
    }
}

impl<'a> From<&'a str> for UploadInput<'a> {
    fn from(text: &'a str) -> Self {
        UploadInput::Text(text)
    }
}

impl<'a> From<&'a String> for UploadInput<'a> {
    fn from(text: &'a String) -> Self {
        UploadInput::Text(text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_declared_single_byte_encoding() {
        let upload = RawUpload::new(vec![b'c', b'a', b'f', 0xE9])
            .with_encoding_label("windows-1252")
            .unwrap();
        assert_eq!(upload.decode_text(), "café");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let upload = RawUpload::new(b"\xEF\xBB\xBFname,age\n".to_vec());
        assert_eq!(upload.decode_text(), "name,age\n");
    }

    #[test]
    fn unknown_encoding_label_is_rejected() {
        let err = RawUpload::new(Vec::new())
            .with_encoding_label("klingon")
            .unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }
}
