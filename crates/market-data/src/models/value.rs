use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use super::table::{Series, Table};

/// A provider wrapper around a value that may or may not be extractable.
///
/// Providers box scalars and arrays in their own envelope types (Yahoo's
/// `{"raw": .., "fmt": ..}` objects, for instance). Extraction is not
/// guaranteed to work for every instance, so the wrapper keeps the display
/// form around as a fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct Wrapped<T> {
    inner: Option<T>,
    repr: String,
}

impl<T> Wrapped<T> {
    /// A wrapper whose inner value was extracted.
    pub fn extracted(inner: T, repr: impl Into<String>) -> Self {
        Self {
            inner: Some(inner),
            repr: repr.into(),
        }
    }

    /// A wrapper whose inner value cannot be extracted.
    pub fn opaque(repr: impl Into<String>) -> Self {
        Self {
            inner: None,
            repr: repr.into(),
        }
    }

    pub fn extract(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    pub fn repr(&self) -> &str {
        &self.repr
    }
}

/// Any value handed back by a market data provider.
///
/// This is the closed model the normalizer walks: every provider response is
/// converted into a `ProviderValue` at the provider boundary, so nothing
/// downstream has to guess at a value's shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Str(String),
    Date(NaiveDate),
    /// Date-time without zone information.
    DateTime(NaiveDateTime),
    /// Date-time pinned to a UTC offset.
    ZonedDateTime(DateTime<FixedOffset>),
    /// Boxed single scalar.
    Scalar(Wrapped<Box<ProviderValue>>),
    /// Boxed array that flattens to a sequence.
    Array(Wrapped<Vec<ProviderValue>>),
    /// Ordered mapping; keys may be any value and are stringified on output.
    Map(Vec<(ProviderValue, ProviderValue)>),
    Sequence(Vec<ProviderValue>),
    Table(Table),
    Series(Series),
    /// Anything else, carried as its display form.
    Unknown(String),
}

impl ProviderValue {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Build a map from string keys.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ProviderValue)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Self::Str(k.into()), v))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a string key in a map value.
    pub fn get(&self, key: &str) -> Option<&ProviderValue> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::Str(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Falsy in the way a metadata payload is: null or an empty container.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Map(entries) => entries.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for ProviderValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ProviderValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ProviderValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<NaiveDate> for ProviderValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<ProviderValue>> From<Option<T>> for ProviderValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Display form, used for map keys and as the final fallback of the normalizer.
impl fmt::Display for ProviderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write_float(f, *v),
            Self::Complex { re, im } => {
                f.write_str("(")?;
                write_float(f, *re)?;
                if *im >= 0.0 || im.is_nan() {
                    f.write_str("+")?;
                }
                write_float(f, *im)?;
                f.write_str("j)")
            }
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::ZonedDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%:z")),
            Self::Scalar(w) => f.write_str(w.repr()),
            Self::Array(w) => f.write_str(w.repr()),
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Table(t) => write!(f, "<table {} rows x {} columns>", t.len(), t.width()),
            Self::Series(s) => write!(f, "<series {} points>", s.len()),
            Self::Unknown(repr) => f.write_str(repr),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("nan")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "inf" } else { "-inf" })
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}
