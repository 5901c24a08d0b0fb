use std::collections::HashMap;

/// A header source the inbound Content-Type is read from.
/// Implemented for http::HeaderMap, other http libraries only need
/// to implement this to use the decoder.
pub trait HeaderMap {
    fn get_value<K>(&self, header_key: K) -> Option<&str>
    where
        K: AsRef<str>;
}

impl HeaderMap for http::header::HeaderMap {
    fn get_value<K>(&self, header_key: K) -> Option<&str>
    where
        K: AsRef<str>,
    {
        self.get(header_key.as_ref())
            .and_then(|hv| hv.to_str().ok())
    }
}

/// Plain string maps, looked up case-insensitively.
impl HeaderMap for HashMap<String, String> {
    fn get_value<K>(&self, header_key: K) -> Option<&str>
    where
        K: AsRef<str>,
    {
        let key = header_key.as_ref();
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
