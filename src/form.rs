use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::Error;

/// Characters escaped in keys and values: everything except the RFC 3986
/// unreserved set, `?` and `/` (RFC 3986 §3.4 allows both in a query, and
/// leaving them alone keeps embedded URLs such as `redirect_uri` readable).
/// The general delimiters `:#[]@` and sub-delimiters `!$&'()*+,;=` are escaped.
const QUERY_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'?')
    .remove(b'/');

/// Percent-encode a single key or value. A space becomes `%20`, never `+`.
pub fn escape(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ESCAPE_SET).to_string()
}

/// Reverse [`escape`]. A `+` is read as a space, as in HTML form submissions.
///
/// Fails on a `%` that is not followed by two hex digits, or when the
/// decoded bytes are not UTF-8.
pub fn unescape(input: &str) -> Result<String, Error> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(Error::MalformedEncoding {
                    reason: format!("invalid percent escape at byte {i}"),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::MalformedEncoding {
            reason: e.to_string(),
        })
}

/// A set of `application/x-www-form-urlencoded` parameters.
///
/// Keys are unique. Pairs are emitted in key order, so encoding the same
/// mapping always yields the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormUrlEncoded {
    params: BTreeMap<String, String>,
}

impl FormUrlEncoded {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, returning the previous value for `key` if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.params.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.params
    }

    /// `key=value` pairs joined with `&`, both sides escaped.
    pub fn to_encoded_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_encoded_string().into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let input = std::str::from_utf8(bytes).map_err(|e| Error::MalformedEncoding {
            reason: e.to_string(),
        })?;
        Self::decode_str(input)
    }

    /// Parse an encoded string. Empty input is an empty set; otherwise every
    /// `&`-separated component must contain exactly one `=`, and a key may
    /// appear only once (RFC 6749 §3.1). Any failure rejects the whole input.
    pub fn decode_str(input: &str) -> Result<Self, Error> {
        let mut params = BTreeMap::new();
        if input.is_empty() {
            return Ok(Self { params });
        }

        for component in input.split('&') {
            let mut parts = component.split('=');
            let (Some(raw_key), Some(raw_value), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(Error::MalformedEncoding {
                    reason: format!("component {component:?} must contain exactly one '='"),
                });
            };

            let key = unescape(raw_key)?;
            if params.contains_key(&key) {
                return Err(Error::MalformedEncoding {
                    reason: format!("parameter {key:?} appears more than once"),
                });
            }
            params.insert(key, unescape(raw_value)?);
        }

        Ok(Self { params })
    }
}

impl From<BTreeMap<String, String>> for FormUrlEncoded {
    fn from(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormUrlEncoded {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
