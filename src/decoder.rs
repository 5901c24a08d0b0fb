use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose},
    Engine,
};
use encoding_rs::Encoding;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

use crate::{artifact::Artifact, part::PartHeaders, Error};

/// Standard alphabet, padding optional.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The parsed value of a Content-Disposition header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDisposition {
    /// The disposition type, lowercased (e.g. "attachment", "form-data")
    pub disposition_type: String,
    pub name: Option<String>,
    pub filename: Option<String>,
    /// Remaining parameters, keyed by lowercased name
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    pub fn parse(value: &str) -> Self {
        let mut params = split_params(value).into_iter();

        let disposition_type = params
            .next()
            .map(|t| t.trim().to_lowercase())
            .unwrap_or_default();

        let mut cd = ContentDisposition {
            disposition_type,
            ..Default::default()
        };

        let mut extended_filename = None;

        for param in params {
            let (key, val) = match param.split_once('=') {
                Some((key, val)) => (key.trim().to_lowercase(), unquote(val.trim())),
                None => {
                    log::debug!("Ignoring Content-Disposition parameter without value: {:?}", param);
                    continue;
                }
            };

            match key.as_str() {
                "name" => cd.name = Some(val),
                "filename" => cd.filename = Some(val),
                "filename*" => match decode_ext_value(&val) {
                    Some(filename) => extended_filename = Some(filename),
                    None => {
                        log::debug!("Ignoring undecodable filename*: {:?}", val);
                        cd.parameters.insert(key, val);
                    }
                },
                _ => {
                    cd.parameters.insert(key, val);
                }
            }
        }

        if extended_filename.is_some() {
            cd.filename = extended_filename;
        }

        cd
    }

    /// The filename, if one is declared and non-empty.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.is_empty())
    }
}

/// Splits a header value on `;`, leaving semicolons in quoted strings alone.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);

    params.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn unquote(val: &str) -> String {
    if val.len() < 2 || !val.starts_with('"') || !val.ends_with('"') {
        return val.to_owned();
    }

    let mut out = String::with_capacity(val.len() - 2);
    let mut chars = val[1..val.len() - 1].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

/// Decodes an RFC 5987 extended value: `charset'language'percent-encoded`.
fn decode_ext_value(val: &str) -> Option<String> {
    let mut fields = val.splitn(3, '\'');
    let (label, _language, encoded) = (fields.next()?, fields.next()?, fields.next()?);

    let encoding = Encoding::for_label(label.trim().as_bytes())?;
    let bytes: Vec<u8> = percent_decode_str(encoded).collect();

    let (text, _, malformed) = encoding.decode(&bytes);
    if malformed {
        return None;
    }
    Some(text.into_owned())
}

/// The media type declared by a part, `None` if it declares none.
pub fn media_type(headers: &PartHeaders) -> Result<Option<mime::Mime>, Error> {
    headers
        .content_type()
        .map(|v| v.parse::<mime::Mime>().map_err(Error::InvalidMimeType))
        .transpose()
}

/// Parts are only taken as files when they are declared as exactly
/// `application/octet-stream`, without parameters.
fn is_octet_stream(mime: &mime::Mime) -> bool {
    mime.type_() == mime::APPLICATION
        && mime.subtype() == mime::OCTET_STREAM
        && mime.params().next().is_none()
}

/// Decodes a base64 payload. Whitespace and line breaks are skipped.
pub fn decode_base64(body: &[u8]) -> Result<Vec<u8>, Error> {
    let text: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    Ok(BASE64.decode(text)?)
}

/// Turns one part into an artifact.
///
/// Returns `Ok(None)` for parts that are not files: any media type other than
/// `application/octet-stream`, or no filename. A part without a
/// Content-Disposition header is an `Error::MissingContentDisposition`.
pub fn decode_part(headers: &PartHeaders, body: &[u8]) -> Result<Option<Artifact>, Error> {
    let disposition = headers
        .content_disposition()
        .map(ContentDisposition::parse)
        .ok_or(Error::MissingContentDisposition)?;

    let media_type = media_type(headers)?;

    let filename = match (media_type.as_ref(), disposition.filename()) {
        (Some(mt), Some(filename)) if is_octet_stream(mt) => filename,
        (mt, filename) => {
            log::debug!(
                "Dropping part, media type: {:?}, filename: {:?}",
                mt.map(|m| m.essence_str()),
                filename
            );
            return Ok(None);
        }
    };

    let data = decode_base64(body)?;
    log::debug!("Decoded {} ({} bytes)", filename, data.len());

    Ok(Some(Artifact::new(filename, data)))
}
