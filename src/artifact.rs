use bytes::{buf::Reader, Buf, Bytes};
use std::{collections::HashMap, io};

/// A named byte source that downstream I/O code can read, as often as it likes.
pub trait Resource {
    type Reader: io::Read;

    fn filename(&self) -> &str;

    fn content_length(&self) -> u64;

    /// A fresh reader positioned at the start of the content.
    fn open(&self) -> Self::Reader;
}

/// The decoded payload of one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    filename: String,
    data: Bytes,
}

impl Artifact {
    pub fn new<S: Into<String>, B: Into<Bytes>>(filename: S, data: B) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl Resource for Artifact {
    type Reader = Reader<Bytes>;

    fn filename(&self) -> &str {
        &self.filename
    }

    fn content_length(&self) -> u64 {
        self.data.len() as u64
    }

    fn open(&self) -> Self::Reader {
        self.data.clone().reader()
    }
}

/// Decoded artifacts keyed by filename. A filename may map to several
/// artifacts when several parts declare it. Filenames iterate in the order
/// they were first seen.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    names: Vec<String>,
    by_name: HashMap<String, Vec<Artifact>>,
}

impl Artifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, artifact: Artifact) {
        match self.by_name.get_mut(artifact.filename()) {
            Some(list) => list.push(artifact),
            None => {
                self.names.push(artifact.filename().to_owned());
                self.by_name
                    .insert(artifact.filename().to_owned(), vec![artifact]);
            }
        }
    }

    /// All artifacts stored under `filename`, in decode order.
    pub fn get(&self, filename: &str) -> &[Artifact] {
        self.by_name
            .get(filename)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_first(&self, filename: &str) -> Option<&Artifact> {
        self.get(filename).first()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.by_name.contains_key(filename)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }

    /// Every artifact, grouped by filename.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.names.iter().flat_map(move |n| self.get(n))
    }

    /// Number of artifacts, counting repeated filenames.
    pub fn len(&self) -> usize {
        self.by_name.values().map(|list| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl IntoIterator for Artifacts {
    type Item = Artifact;
    type IntoIter = std::vec::IntoIter<Artifact>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut all = Vec::with_capacity(self.len());
        for name in &self.names {
            if let Some(list) = self.by_name.remove(name) {
                all.extend(list);
            }
        }
        all.into_iter()
    }
}
