use crate::DomainError;
use smallvec::SmallVec;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

pub const MAX_LABEL_LENGTH: usize = 63;
pub const MAX_NAME_LENGTH: usize = 255;

/// A fully qualified domain name held as raw label octets.
///
/// The root name has no labels. Names are immutable once built; clones share
/// the label storage. Equality is byte-exact (case-sensitive), matching the
/// canonical text form produced by `Display`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DomainName {
    labels: Arc<[Box<[u8]>]>,
}

impl DomainName {
    pub fn root() -> Self {
        Self {
            labels: Arc::from(Vec::<Box<[u8]>>::new()),
        }
    }

    /// Builds a name from label octets, most specific label first.
    pub fn from_labels<I, L>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut collected: Vec<Box<[u8]>> = Vec::new();
        let mut encoded = 1usize;

        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(DomainError::InvalidDomainName(
                    "empty label inside a name".to_string(),
                ));
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Err(DomainError::LabelTooLong(label.len()));
            }
            encoded += label.len() + 1;
            if encoded > MAX_NAME_LENGTH {
                return Err(DomainError::NameTooLong(encoded));
            }
            collected.push(label.into());
        }

        Ok(Self {
            labels: Arc::from(collected),
        })
    }

    /// PTR owner name for an address, under `in-addr.arpa.` or `ip6.arpa.`.
    pub fn reverse(ip: IpAddr) -> Self {
        let mut labels: Vec<String> = Vec::with_capacity(34);
        match ip {
            IpAddr::V4(v4) => {
                labels.extend(v4.octets().iter().rev().map(|octet| octet.to_string()));
                labels.push("in-addr".to_string());
            }
            IpAddr::V6(v6) => {
                for octet in v6.octets().iter().rev() {
                    labels.push(format!("{:x}", octet & 0x0F));
                    labels.push(format!("{:x}", octet >> 4));
                }
                labels.push("ip6".to_string());
            }
        }
        labels.push("arpa".to_string());

        // At most 34 labels of one to seven octets: always within limits.
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.into_bytes().into_boxed_slice())
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator {
        self.labels.iter().map(|l| l.as_ref())
    }

    /// Length of the uncompressed wire form, length octets and root included.
    pub fn encoded_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// ASCII case-insensitive comparison, used when matching answers to questions.
    pub fn eq_ignore_ascii_case(&self, other: &DomainName) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// The name with its first label removed; the root stays the root.
    pub fn parent(&self) -> DomainName {
        if self.labels.is_empty() {
            return self.clone();
        }
        Self {
            labels: self.labels[1..].iter().cloned().collect(),
        }
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Default for DomainName {
    fn default() -> Self {
        Self::root()
    }
}

fn needs_escape(byte: u8) -> bool {
    !(0x21..=0x7E).contains(&byte) || matches!(byte, b'.' | b'"' | b'\\')
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for label in self.labels.iter() {
            for &byte in label.iter() {
                if needs_escape(byte) {
                    write!(f, "\\{:03}", byte)?;
                } else {
                    write!(f, "{}", byte as char)?;
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainName(\"{}\")", self)
    }
}

impl FromStr for DomainName {
    type Err = DomainError;

    /// Parses presentation format. A trailing dot is optional; `\DDD`
    /// decimal escapes and `\X` literal escapes are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::InvalidDomainName(
                "name must not be empty".to_string(),
            ));
        }
        if s == "." {
            return Ok(Self::root());
        }

        let bytes = s.as_bytes();
        let mut labels: Vec<SmallVec<[u8; 64]>> = Vec::new();
        let mut current: SmallVec<[u8; 64]> = SmallVec::new();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    let escaped = parse_escape(&bytes[i + 1..]).ok_or_else(|| {
                        DomainError::InvalidDomainName(format!("bad escape sequence in '{}'", s))
                    })?;
                    current.push(escaped.value);
                    i += 1 + escaped.consumed;
                }
                b'.' => {
                    if current.is_empty() {
                        return Err(DomainError::InvalidDomainName(format!(
                            "empty label in '{}'",
                            s
                        )));
                    }
                    labels.push(std::mem::take(&mut current));
                    i += 1;
                }
                byte => {
                    current.push(byte);
                    i += 1;
                }
            }
        }
        if !current.is_empty() {
            labels.push(current);
        }

        Self::from_labels(labels)
    }
}

struct Escape {
    value: u8,
    consumed: usize,
}

fn parse_escape(rest: &[u8]) -> Option<Escape> {
    let first = *rest.first()?;
    if first.is_ascii_digit() {
        let digits = rest.get(..3)?;
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let value = digits
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        let value = u8::try_from(value).ok()?;
        return Some(Escape { value, consumed: 3 });
    }
    Some(Escape {
        value: first,
        consumed: 1,
    })
}
