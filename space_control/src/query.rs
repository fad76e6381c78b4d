// Query-string parsing for control endpoints.
//
// `key=value` pairs separated by `&`, form-URL-decoded (`+` is a space,
// `%XX` is a byte). Pairs without `=` or with an empty key are skipped; a
// repeated key keeps its last value. Malformed percent-encoding is a
// `MalformedQuery` fault.
//
// Numeric accessors treat a value that does not parse as if the key were
// absent, so `?dt=abc` behaves like `?`.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::ControlError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    params: BTreeMap<String, String>,
}

impl Query {
    pub fn parse(raw: Option<&str>) -> Result<Self, ControlError> {
        let mut params = BTreeMap::new();
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(Self { params });
        };
        for pair in raw.split('&') {
            let Some(idx) = pair.find('=') else { continue };
            if idx == 0 {
                continue;
            }
            let key = decode(&pair[..idx])?;
            let value = decode(&pair[idx + 1..])?;
            params.insert(key, value);
        }
        Ok(Self { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The value parsed as `T`, or `None` if absent or unparseable.
    pub fn number<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode(s: &str) -> Result<String, ControlError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_digit);
                let lo = bytes.get(i + 2).copied().and_then(hex_digit);
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(ControlError::MalformedQuery(format!(
                        "incomplete escape in `{s}`"
                    )));
                };
                out.push((hi << 4) | lo);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out)
        .map_err(|_| ControlError::MalformedQuery(format!("`{s}` does not decode to UTF-8")))
}
