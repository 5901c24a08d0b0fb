use bytes::Bytes;
use std::{iter::FusedIterator, ops::Range};

use crate::{boundary::Boundary, part::RawPart, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Preamble,
    Headers,
    Body,
    Terminated,
}

/// A delimiter line found in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Delimiter {
    /// Index of the leading `--`.
    start: usize,
    /// End of the content preceding the delimiter, its line break excluded.
    content_end: usize,
    /// Index of the first byte after the delimiter line.
    next: usize,
    /// The closing delimiter, `--boundary--`.
    close: bool,
}

/// Splits a buffered multipart body into its parts in a single forward pass.
///
/// The splitter follows RFC 2046 delimiter lines: `--boundary` at the start of
/// a line, followed by optional transport padding and a line break, or by
/// `--` for the closing delimiter. Both CRLF and bare LF line breaks are
/// accepted. Anything before the first delimiter (the preamble) and after
/// the closing one (the epilogue) is discarded.
///
/// Example:
///  This is the preamble.  It is to be ignored.
///  --simple boundary
///
///  This is implicitly typed plain ASCII text.
///  --simple boundary
///  Content-type: text/plain; charset=us-ascii
///
///  This is explicitly typed plain ASCII text.
///
///  --simple boundary--
///
/// A part without a blank line after its headers yields an error and the
/// splitter resumes at the next delimiter. Any other malformed input yields
/// a single error after which the splitter is done.
#[derive(Debug)]
pub struct Splitter {
    body: Bytes,
    delimiter: Vec<u8>,
    state: State,
    pos: usize,
    index: usize,
    headers: Range<usize>,
    next: Option<Delimiter>,
}

impl Splitter {
    pub fn new(body: Bytes, boundary: &Boundary) -> Self {
        let delimiter = boundary.delimiter();

        log::debug!(
            "Creating splitter for {} bytes with delimiter: {:?}",
            body.len(),
            String::from_utf8_lossy(&delimiter)
        );

        Self {
            body,
            delimiter,
            state: State::Preamble,
            pos: 0,
            index: 0,
            headers: 0..0,
            next: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> State {
        self.state
    }

    fn fail<S: Into<String>>(&mut self, msg: S) -> Option<Result<RawPart, Error>> {
        self.state = State::Terminated;
        Some(Err(Error::malformed(msg)))
    }

    fn enter(&mut self, delimiter: Delimiter) {
        if delimiter.close {
            log::debug!("Found closing delimiter at index: {}", delimiter.start);
            self.state = State::Terminated;
        } else {
            self.pos = delimiter.next;
            self.state = State::Headers;
        }
    }

    /// Finds the first delimiter line starting at or after `from`.
    fn find_delimiter(&self, from: usize) -> Option<Delimiter> {
        let body = &self.body[..];
        let mut search = from;

        while let Some(i) = twoway::find_bytes(&body[search..], &self.delimiter) {
            let start = search + i;
            search = start + 1;

            if start > 0 && body[start - 1] != b'\n' {
                continue;
            }

            let after = start + self.delimiter.len();
            let rest = &body[after..];

            if rest.starts_with(b"--") {
                return Some(Delimiter {
                    start,
                    content_end: content_end(body, start),
                    next: after + 2,
                    close: true,
                });
            }

            let padding = rest
                .iter()
                .take_while(|b| **b == b' ' || **b == b'\t')
                .count();

            let line_break = match &rest[padding..] {
                r if r.starts_with(b"\r\n") => 2,
                r if r.starts_with(b"\n") => 1,
                r if r.is_empty() => 0,
                // The boundary is only a prefix of this line, e.g. `--boundary123` for `boundary1`.
                _ => continue,
            };

            return Some(Delimiter {
                start,
                content_end: content_end(body, start),
                next: after + padding + line_break,
                close: false,
            });
        }

        None
    }
}

/// Strips the line break that belongs to the delimiter starting at `start`.
fn content_end(body: &[u8], start: usize) -> usize {
    if start >= 2 && &body[start - 2..start] == b"\r\n" {
        start - 2
    } else if start >= 1 && body[start - 1] == b'\n' {
        start - 1
    } else {
        start
    }
}

/// Position and length of the blank line ending a header block.
fn find_blank_line(block: &[u8]) -> Option<(usize, usize)> {
    if block.starts_with(b"\r\n") {
        return Some((0, 2));
    }
    if block.starts_with(b"\n") {
        return Some((0, 1));
    }

    let crlf = twoway::find_bytes(block, b"\r\n\r\n").map(|i| (i, 4));
    let lf = twoway::find_bytes(block, b"\n\n").map(|i| (i, 2));

    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

impl Iterator for Splitter {
    type Item = Result<RawPart, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Preamble => match self.find_delimiter(self.pos) {
                    Some(delimiter) => {
                        log::debug!("Skipping preamble of {} bytes", delimiter.start);
                        self.enter(delimiter);
                    }
                    None => return self.fail("no boundary delimiter found in body"),
                },

                State::Headers => {
                    let next = self.find_delimiter(self.pos);
                    let limit = next.map_or(self.body.len(), |d| d.start);

                    match find_blank_line(&self.body[self.pos..limit]) {
                        Some((at, len)) => {
                            self.headers = self.pos..self.pos + at;
                            self.pos += at + len;
                            self.next = next;
                            self.state = State::Body;
                        }
                        None => {
                            let msg = format!("part {} has no blank line after its headers", self.index);
                            match next {
                                // The following delimiter is known, resume there.
                                Some(delimiter) => {
                                    self.index += 1;
                                    self.enter(delimiter);
                                    return Some(Err(Error::malformed(msg)));
                                }
                                None => return self.fail(msg),
                            }
                        }
                    }
                }

                State::Body => {
                    let delimiter = match self.next.take() {
                        Some(delimiter) => delimiter,
                        None => {
                            let msg = format!("part {} is not followed by a boundary delimiter", self.index);
                            return self.fail(msg);
                        }
                    };

                    let body_end = delimiter.content_end.max(self.pos);
                    let part = RawPart::new(
                        self.index,
                        self.body.slice(self.headers.clone()),
                        self.body.slice(self.pos..body_end),
                    );

                    self.index += 1;
                    self.enter(delimiter);

                    return Some(Ok(part));
                }

                State::Terminated => return None,
            }
        }
    }
}

impl FusedIterator for Splitter {}
