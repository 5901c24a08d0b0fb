mod error;
pub use error::Error;

mod config;
pub use config::{DecoderConfig, FailurePolicy, DEFAULT_BUFFER_CAP};

mod artifact;
pub use artifact::{Artifact, Artifacts, Resource};

pub mod boundary;
pub mod decoder;
pub mod parser;
pub mod part;

mod multipart;
pub use multipart::{charset, content_type, MultipartMessage, MultipartMixed};

mod header_map;
pub use header_map::HeaderMap;

use futures::Stream;

/// Buffers a chunk stream and decodes it with the default configuration,
/// the Content-Type is taken from `headers`.
pub async fn from_headers<S, I, E>(headers: &impl HeaderMap, s: S) -> Result<Artifacts, Error>
where
    S: Stream<Item = Result<I, E>>,
    I: AsRef<[u8]>,
    E: std::fmt::Display,
{
    MultipartMixed::default().read_stream(headers, s).await
}
