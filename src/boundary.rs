use crate::Error;

/// The token separating the parts of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    token: String,
}

impl Boundary {
    /// Builds a boundary from the `boundary` parameter of a content type.
    ///
    /// One surrounding pair of double quotes is stripped, the rest of the
    /// token is used verbatim.
    pub fn from_param(param: Option<&str>) -> Result<Self, Error> {
        let raw = param.ok_or(Error::MissingBoundary)?;

        let token = match raw.len() {
            n if n >= 2 && raw.starts_with('"') && raw.ends_with('"') => &raw[1..n - 1],
            _ => raw,
        };

        if token.is_empty() {
            return Err(Error::MissingBoundary);
        }

        log::debug!("Using boundary: {:?}", token);

        Ok(Boundary {
            token: token.to_owned(),
        })
    }

    /// Reads the boundary parameter of a parsed media type.
    pub fn from_mime(mime: &mime::Mime) -> Result<Self, Error> {
        Self::from_param(mime.get_param(mime::BOUNDARY).map(|n| n.as_str()))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The bytes opening a delimiter line: `--` followed by the token.
    pub fn delimiter(&self) -> Vec<u8> {
        let mut delimiter = Vec::with_capacity(self.token.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(self.token.as_bytes());
        delimiter
    }
}
