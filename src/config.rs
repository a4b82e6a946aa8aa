//! Extraction options.

use url::Url;

use crate::error::{Error, Result};

/// Options for [`extract`](crate::extract).
///
/// The only option is the base URL used to absolutize `href`, `src` and
/// `data` values. Without one those attributes are returned verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    base: Option<String>,
}

impl Config {
    /// A configuration with no base URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve URL-bearing attributes against `base`.
    ///
    /// The base is not validated here; an unparsable base makes every
    /// resolved URL value the empty string. Use [`Config::try_with_base`] to
    /// reject it up front.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Like [`Config::with_base`], but fails if `base` is not an absolute URL.
    pub fn try_with_base(self, base: impl Into<String>) -> Result<Self> {
        let base = base.into();
        match Url::parse(&base) {
            Ok(_) => Ok(self.with_base(base)),
            Err(source) => Err(Error::InvalidBase { base, source }),
        }
    }

    /// The configured base URL, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }
}
