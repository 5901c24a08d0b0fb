use bytes::Bytes;
use encoding_rs::Encoding;
use std::collections::HashMap;

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_TYPE: &str = "Content-Type";

/// The raw header block and body of a single part, as found by the splitter.
#[derive(Debug, Clone)]
pub struct RawPart {
    index: usize,
    headers_data: Bytes,
    body_data: Bytes,
}

impl RawPart {
    pub(crate) fn new(index: usize, headers_data: Bytes, body_data: Bytes) -> Self {
        Self {
            index,
            headers_data,
            body_data,
        }
    }

    /// Zero based position of the part in the body.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.headers_data
    }

    pub fn body(&self) -> &[u8] {
        &self.body_data
    }

    /// The header block decoded as text in the given charset.
    pub fn header_text(&self, charset: &'static Encoding) -> String {
        let (text, _, malformed) = charset.decode(&self.headers_data);
        if malformed {
            log::debug!(
                "Headers of part {} are not valid {}, replacement characters used",
                self.index,
                charset.name()
            );
        }
        text.into_owned()
    }
}

/// Header name to value, one value per name. Names are kept as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    inner: HashMap<String, String>,
}

impl PartHeaders {
    /// Parses a header block. Lines without a colon are ignored, which also
    /// drops folded continuation lines. A repeated name keeps its last value.
    pub fn parse(block: &str) -> Self {
        let inner = block.lines().filter_map(parse_header_line).collect();
        PartHeaders { inner }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Exact lookup by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(|s| s.as_str())
    }

    /// Lookup by name, falling back to an ASCII case-insensitive match when
    /// no header carries the exact spelling.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| {
            self.inner
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.find(CONTENT_DISPOSITION)
    }

    /// The declared Content-Type, `None` when absent or empty.
    pub fn content_type(&self) -> Option<&str> {
        self.find(CONTENT_TYPE).filter(|v| !v.is_empty())
    }
}

fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    Some((name.trim().to_owned(), value.trim().to_owned()))
}

/// Drops everything up to and including the first occurrence of the boundary
/// token in a header block.
///
/// Producers that leave part of the delimiter line in front of the first
/// header are handled by this. A block without the token is reported and
/// returned whole.
pub fn strip_boundary_remnant<'a>(block: &'a str, token: &str) -> &'a str {
    match block.find(token) {
        Some(i) => block[i + token.len()..].trim(),
        None => {
            log::error!("Boundary not found. Original String: {}", block);
            block
        }
    }
}
