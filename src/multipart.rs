use bytes::{Bytes, BytesMut};
use encoding_rs::Encoding;
use futures::{Stream, StreamExt};
use std::{
    fmt,
    io::{Read, Write},
    ops::ControlFlow,
};

use crate::{
    artifact::Artifacts,
    boundary::Boundary,
    config::DecoderConfig,
    decoder,
    header_map::HeaderMap,
    parser::Splitter,
    part::{self, PartHeaders, RawPart},
    Error,
};

/// Decoder for `multipart/mixed` bodies carrying base64 encoded files.
///
/// Every part declared as `application/octet-stream` with a filename in its
/// Content-Disposition becomes an [`Artifact`](crate::Artifact) keyed by that
/// filename. Other parts are dropped.
///
/// Malformed input never fails a decode: it yields whatever could be decoded,
/// with the reason logged. Only a content type without a boundary, or a
/// failure to obtain the body, is reported as an error.
///
/// Encoding is not supported.
#[derive(Debug, Clone, Default)]
pub struct MultipartMixed {
    config: DecoderConfig,
}

impl MultipartMixed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Whether a body of the given media type can be decoded: only
    /// `multipart/mixed`, in any letter case.
    pub fn can_read(&self, media_type: Option<&mime::Mime>) -> bool {
        media_type.map_or(false, |mt| {
            mt.type_().as_str().eq_ignore_ascii_case(mime::MULTIPART.as_str())
                && mt.subtype().as_str().eq_ignore_ascii_case("mixed")
        })
    }

    pub fn can_write(&self, _media_type: Option<&mime::Mime>) -> bool {
        false
    }

    pub fn supported_media_types(&self) -> &'static [mime::Mime] {
        &[]
    }

    /// Encoding multipart bodies is not supported, this always fails.
    pub fn write<W: Write>(
        &self,
        _artifacts: &Artifacts,
        _content_type: Option<&mime::Mime>,
        _out: W,
    ) -> Result<(), Error> {
        Err(Error::Unsupported("writing multipart/mixed bodies"))
    }

    /// Reads a body to its end and decodes it.
    pub fn read<R: Read>(
        &self,
        content_type: Option<&mime::Mime>,
        mut body: R,
    ) -> Result<Artifacts, Error> {
        let content_type = match content_type {
            Some(ct) => ct,
            None => return Ok(Artifacts::new()),
        };

        let mut buffer = Vec::with_capacity(self.config.initial_capacity());
        match self.config.max_body_size {
            Some(max) => {
                body.take((max as u64).saturating_add(1)).read_to_end(&mut buffer)?;
                self.config.check_size(buffer.len())?;
            }
            None => {
                body.read_to_end(&mut buffer)?;
            }
        }

        self.decode(Some(content_type), buffer)
    }

    /// Decodes a body using the Content-Type found in `headers`.
    pub fn read_headers<H: HeaderMap, R: Read>(
        &self,
        headers: &H,
        body: R,
    ) -> Result<Artifacts, Error> {
        let content_type = content_type(headers)?;
        self.read(content_type.as_ref(), body)
    }

    /// Buffers a stream of body chunks, then decodes it.
    pub async fn read_stream<H, S, I, E>(&self, headers: &H, stream: S) -> Result<Artifacts, Error>
    where
        H: HeaderMap,
        S: Stream<Item = Result<I, E>>,
        I: AsRef<[u8]>,
        E: fmt::Display,
    {
        let content_type = match content_type(headers)? {
            Some(ct) => ct,
            None => return Ok(Artifacts::new()),
        };

        let mut buffer = BytesMut::with_capacity(self.config.initial_capacity());

        futures::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Error::inner)?;
            let chunk = chunk.as_ref();

            self.config.check_size(buffer.len() + chunk.len())?;
            buffer.extend_from_slice(chunk);
        }

        self.decode(Some(&content_type), buffer.freeze())
    }

    /// Decodes a buffered body.
    ///
    /// Without a content type there is nothing to decode and the result is
    /// empty. A content type without a boundary is an `Error::MissingBoundary`.
    pub fn decode<B: Into<Bytes>>(
        &self,
        content_type: Option<&mime::Mime>,
        body: B,
    ) -> Result<Artifacts, Error> {
        let content_type = match content_type {
            Some(ct) => ct,
            None => {
                log::debug!("No content type declared, nothing to decode");
                return Ok(Artifacts::new());
            }
        };

        let boundary = Boundary::from_mime(content_type)?;
        let charset = charset(content_type);

        Ok(self.decode_parts(&boundary, charset, body.into()))
    }

    fn decode_parts(
        &self,
        boundary: &Boundary,
        charset: &'static Encoding,
        body: Bytes,
    ) -> Artifacts {
        let mut artifacts = Artifacts::new();

        // The splitter yields exactly one item per part, failed or not.
        for (index, part) in Splitter::new(body, boundary).enumerate() {
            let res = part.and_then(|part| self.decode_part(&part, boundary, charset));

            match res {
                Ok(Some(artifact)) => artifacts.add(artifact),
                Ok(None) => {}
                Err(e) => {
                    if let ControlFlow::Break(()) = self.config.failure_policy.on_failure(index, &e)
                    {
                        break;
                    }
                }
            }
        }

        log::debug!("Decoded {} artifacts", artifacts.len());
        artifacts
    }

    fn decode_part(
        &self,
        part: &RawPart,
        boundary: &Boundary,
        charset: &'static Encoding,
    ) -> Result<Option<crate::Artifact>, Error> {
        let text = part.header_text(charset);
        let block = if self.config.strip_boundary_remnant {
            part::strip_boundary_remnant(&text, boundary.token())
        } else {
            text.as_str()
        };
        let headers = PartHeaders::parse(block);

        match decoder::decode_part(&headers, part.body()) {
            Err(Error::MissingContentDisposition) => {
                log::error!("Header doesn't contain Content-Disposition! {}", block);
                Ok(None)
            }
            res => res,
        }
    }
}

/// The Content-Type of a message, `None` if it declares none.
pub fn content_type<H: HeaderMap>(headers: &H) -> Result<Option<mime::Mime>, Error> {
    headers
        .get_value(http::header::CONTENT_TYPE.as_str())
        .map(|v| v.parse::<mime::Mime>().map_err(Error::InvalidContentType))
        .transpose()
}

/// The charset declared by a media type, UTF-8 when it declares none or
/// one that is unknown.
pub fn charset(media_type: &mime::Mime) -> &'static Encoding {
    match media_type.get_param(mime::CHARSET) {
        Some(label) => {
            let label = label.as_str();
            Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
                log::debug!("Unknown charset {:?}, using UTF-8", label);
                encoding_rs::UTF_8
            })
        }
        None => encoding_rs::UTF_8,
    }
}

/// Decoding of whole http messages.
pub trait MultipartMessage
where
    Self: Sized,
{
    fn into_artifacts_with(self, decoder: &MultipartMixed) -> Result<Artifacts, Error>;

    fn into_artifacts(self) -> Result<Artifacts, Error> {
        self.into_artifacts_with(&MultipartMixed::default())
    }
}

impl<B: AsRef<[u8]>> MultipartMessage for http::Response<B> {
    fn into_artifacts_with(self, decoder: &MultipartMixed) -> Result<Artifacts, Error> {
        let (parts, body) = self.into_parts();
        decoder.read_headers(&parts.headers, body.as_ref())
    }
}

impl<B: AsRef<[u8]>> MultipartMessage for http::Request<B> {
    fn into_artifacts_with(self, decoder: &MultipartMixed) -> Result<Artifacts, Error> {
        let (parts, body) = self.into_parts();
        decoder.read_headers(&parts.headers, body.as_ref())
    }
}
