use std::{error::Error as StdError, fmt, io};

#[derive(Debug)]
pub enum Error {
    /// The declared content type carries no usable boundary parameter.
    MissingBoundary,
    /// The inbound Content-Type header could not be parsed.
    InvalidContentType(mime::FromStrError),
    MalformedMultipart(String),
    MissingContentDisposition,
    /// A part declared a Content-Type that could not be parsed.
    InvalidMimeType(mime::FromStrError),
    InvalidBase64(base64::DecodeError),
    Io(io::Error),
    InnerStream(String),
    /// The body exceeded the configured maximum size (contained).
    PayloadTooLarge(usize),
    Unsupported(&'static str),
}

impl Error {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedMultipart(msg.into())
    }

    pub(crate) fn inner<E: fmt::Display>(e: E) -> Self {
        Error::InnerStream(format!("{}", e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::MissingBoundary => write!(f, "missing boundary parameter"),
            Error::InvalidContentType(ref e) => write!(f, "Content-Type value invalid: {}", e),
            Error::MalformedMultipart(ref msg) => write!(f, "Malformed Multipart: {}", msg),
            Error::MissingContentDisposition => {
                write!(f, "Part headers don't contain Content-Disposition")
            }
            Error::InvalidMimeType(ref e) => write!(f, "Part Content-Type value invalid: {}", e),
            Error::InvalidBase64(ref e) => write!(f, "Part body is not valid base64: {}", e),
            Error::Io(ref e) => write!(f, "Reading body failed: {}", e),
            Error::InnerStream(ref e) => write!(f, "InnerStream: {}", e),
            Error::PayloadTooLarge(max) => {
                write!(f, "Body too large. Maximum allowed size: {} bytes", max)
            }
            Error::Unsupported(what) => write!(f, "Unsupported operation: {}", what),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::InvalidContentType(ref e) => Some(e),
            Error::InvalidMimeType(ref e) => Some(e),
            Error::InvalidBase64(ref e) => Some(e),
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(inner: io::Error) -> Self {
        Error::Io(inner)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(inner: base64::DecodeError) -> Self {
        Error::InvalidBase64(inner)
    }
}
