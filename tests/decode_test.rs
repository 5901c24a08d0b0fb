use base64::{engine::general_purpose::STANDARD, Engine};
use multipart_mixed::{
    DecoderConfig, Error, FailurePolicy, MultipartMixed, Resource,
};
use std::{collections::HashMap, io::Read};

fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

fn mime(s: &str) -> mime::Mime {
    s.parse().expect("Parse mime")
}

struct Body {
    boundary: &'static str,
    data: Vec<u8>,
}

impl Body {
    fn new(boundary: &'static str) -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(b"This is the preamble.\r\n");
        Body { boundary, data }
    }

    fn part(mut self, headers: &[&str], payload: &[u8]) -> Self {
        self.data
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        for h in headers {
            self.data.extend_from_slice(h.as_bytes());
            self.data.extend_from_slice(b"\r\n");
        }
        self.data.extend_from_slice(b"\r\n");
        self.data.extend_from_slice(payload);
        self.data.extend_from_slice(b"\r\n");
        self
    }

    fn file(self, filename: &str, content: &[u8]) -> Self {
        let cd = format!("Content-Disposition: attachment; filename=\"{}\"", filename);
        let encoded = STANDARD.encode(content);
        self.part(
            &[cd.as_str(), "Content-Type: application/octet-stream"],
            encoded.as_bytes(),
        )
    }

    fn close(mut self) -> Vec<u8> {
        self.data
            .extend_from_slice(format!("--{}--\r\nThe epilogue.\r\n", self.boundary).as_bytes());
        self.data
    }

    fn content_type(&self) -> mime::Mime {
        mime(&format!("multipart/mixed; boundary=\"{}\"", self.boundary))
    }
}

fn binary(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[test]
fn decodes_every_octet_stream_file() {
    init_logger();

    let files: Vec<(String, Vec<u8>)> = (0..5u8)
        .map(|i| (format!("file-{}.bin", i), binary(i, 100 * i as usize + 1)))
        .collect();

    let body = files
        .iter()
        .fold(Body::new("----=_Part_0_1"), |b, (name, data)| b.file(name, data));
    let ct = body.content_type();
    let data = body.close();

    let artifacts = MultipartMixed::new()
        .decode(Some(&ct), data)
        .expect("Decode");

    assert_eq!(files.len(), artifacts.len());
    for (name, content) in &files {
        let artifact = artifacts.get_first(name).expect("Decoded file");
        assert_eq!(&content[..], artifact.data());
    }
}

#[test]
fn single_octet_stream_part() {
    init_logger();

    let body = "--abc123\r
Content-Disposition: form-data; filename=\"x.bin\"\r
Content-Type: application/octet-stream\r
\r
AQID\r
--abc123--\r
";

    let artifacts = MultipartMixed::new()
        .decode(Some(&mime("multipart/mixed; boundary=abc123")), body)
        .expect("Decode");

    assert_eq!(1, artifacts.len());
    assert_eq!(vec!["x.bin"], artifacts.names().collect::<Vec<_>>());
    assert_eq!(&[1, 2, 3], artifacts.get_first("x.bin").expect("x.bin").data());
}

#[test]
fn only_named_octet_streams_are_kept() {
    init_logger();

    let body = Body::new("sep")
        .part(
            &["Content-Disposition: form-data; name=\"comment\"", "Content-Type: text/plain"],
            b"just text",
        )
        .part(
            &[
                "Content-Disposition: attachment; filename=\"photo.jpg\"",
                "Content-Type: image/jpeg",
            ],
            STANDARD.encode([0xffu8, 0xd8]).as_bytes(),
        )
        .part(
            &["Content-Disposition: attachment", "Content-Type: application/octet-stream"],
            b"AQID",
        )
        .part(
            &[
                "Content-Disposition: attachment; filename=\"\"",
                "Content-Type: application/octet-stream",
            ],
            b"AQID",
        )
        .file("kept.bin", b"kept");
    let ct = body.content_type();

    let artifacts = MultipartMixed::new()
        .decode(Some(&ct), body.close())
        .expect("Decode");

    assert_eq!(vec!["kept.bin"], artifacts.names().collect::<Vec<_>>());
    assert_eq!(b"kept", artifacts.get_first("kept.bin").expect("kept.bin").data());
}

#[test]
fn repeated_filenames() {
    init_logger();

    let body = Body::new("sep").file("same.bin", b"one").file("same.bin", b"two");
    let ct = body.content_type();

    let artifacts = MultipartMixed::new()
        .decode(Some(&ct), body.close())
        .expect("Decode");

    let all: Vec<&[u8]> = artifacts.get("same.bin").iter().map(|a| a.data()).collect();
    assert_eq!(vec![&b"one"[..], &b"two"[..]], all);
}

#[test]
fn no_content_type_is_empty() {
    init_logger();

    let artifacts = MultipartMixed::new()
        .read(None, &b"--abc\r\n\r\nAQID\r\n--abc--"[..])
        .expect("Read");

    assert!(artifacts.is_empty());
}

#[test]
fn missing_boundary_is_an_error() {
    init_logger();

    let res = MultipartMixed::new().read(Some(&mime("multipart/mixed")), &b"whatever"[..]);

    match res {
        Err(Error::MissingBoundary) => {}
        other => panic!("Expected missing boundary, got {:?}", other.map(|a| a.len())),
    }
}

#[test]
fn truncation_keeps_earlier_parts() {
    init_logger();

    let full = Body::new("sep")
        .file("1.bin", b"first")
        .file("2.bin", b"second")
        .file("3.bin", b"third")
        .close();

    // Cut right after the header block of the third part.
    let marker = b"filename=\"3.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n";
    let cut = find(&full, marker).expect("Third part headers") + marker.len();
    let truncated = full[..cut].to_vec();

    let artifacts = MultipartMixed::new()
        .decode(Some(&mime("multipart/mixed; boundary=sep")), truncated)
        .expect("Decode");

    assert_eq!(vec!["1.bin", "2.bin"], artifacts.names().collect::<Vec<_>>());
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[test]
fn bad_part_aborts_or_is_skipped() {
    init_logger();

    let body = Body::new("sep")
        .file("1.bin", b"first")
        .part(
            &[
                "Content-Disposition: attachment; filename=\"2.bin\"",
                "Content-Type: application/octet-stream",
            ],
            b"@@ not base64 @@",
        )
        .file("3.bin", b"third");
    let ct = body.content_type();
    let data = body.close();

    let artifacts = MultipartMixed::new()
        .decode(Some(&ct), data.clone())
        .expect("Decode");
    assert_eq!(vec!["1.bin"], artifacts.names().collect::<Vec<_>>());

    let skipping =
        MultipartMixed::with_config(DecoderConfig::default().failure_policy(FailurePolicy::SkipPart));
    let artifacts = skipping.decode(Some(&ct), data).expect("Decode");
    assert_eq!(vec!["1.bin", "3.bin"], artifacts.names().collect::<Vec<_>>());
}

#[test]
fn wrapped_base64_and_binary_payloads() {
    init_logger();

    let content = binary(7, 300);
    let encoded = STANDARD.encode(&content);
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect::<Vec<_>>()
        .join("\r\n");

    let body = Body::new("sep").part(
        &[
            "content-disposition: attachment; filename=big.bin",
            "content-type: application/octet-stream",
        ],
        wrapped.as_bytes(),
    );
    let ct = body.content_type();

    let artifacts = MultipartMixed::new()
        .decode(Some(&ct), body.close())
        .expect("Decode");

    let artifact = artifacts.get_first("big.bin").expect("big.bin");
    assert_eq!(content.len() as u64, artifact.content_length());

    let mut read_back = Vec::new();
    artifact
        .open()
        .read_to_end(&mut read_back)
        .expect("Read artifact");
    assert_eq!(content, read_back);
}

#[test]
fn negotiation() {
    let d = MultipartMixed::new();

    assert!(d.can_read(Some(&mime("multipart/mixed"))));
    assert!(d.can_read(Some(&mime("Multipart/MIXED; boundary=x"))));
    assert!(!d.can_read(Some(&mime("multipart/form-data; boundary=x"))));
    assert!(!d.can_read(Some(&mime("multipart/related"))));
    assert!(!d.can_read(None));
}

#[test]
fn encoding_is_refused() {
    let d = MultipartMixed::new();
    let artifacts = MultipartMixed::new()
        .decode(
            Some(&mime("multipart/mixed; boundary=abc123")),
            "--abc123\r\nContent-Disposition: attachment; filename=x.bin\r\nContent-Type: application/octet-stream\r\n\r\nAQID\r\n--abc123--",
        )
        .expect("Decode");

    let mut out = Vec::new();
    assert!(!d.can_write(Some(&mime("multipart/mixed"))));
    assert!(matches!(
        d.write(&artifacts, Some(&mime("multipart/mixed; boundary=abc123")), &mut out),
        Err(Error::Unsupported(_))
    ));
    assert!(out.is_empty());
}

#[test]
fn header_source() {
    init_logger();

    let body = Body::new("sep").file("x.bin", b"x");

    let mut headers = HashMap::new();
    headers.insert(
        "Content-Type".to_string(),
        "multipart/mixed; boundary=sep".to_string(),
    );

    let artifacts = MultipartMixed::new()
        .read_headers(&headers, &body.close()[..])
        .expect("Read");

    assert!(artifacts.contains("x.bin"));
}
