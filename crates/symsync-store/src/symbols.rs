//! Symbol identity for embedding records.
//!
//! A symbol has two representations:
//! - the dotted path (`pkg.module.Class.method`), stable across revisions and
//!   used as the storage key
//! - the uri, which also carries the symbol kind and a revision marker
//!
//! Two identities with the same dotted path but different revisions are
//! different symbols. That difference is what makes a stored embedding stale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scheme prefix of every symbol uri.
pub const URI_SCHEME: &str = "symsync";

/// The kind of a code symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// A logical grouping (Python module, Rust mod)
    Module,
    /// An OOP class definition
    Class,
    /// A data structure (Rust struct, C struct)
    Struct,
    /// An abstract interface (Rust trait, Python ABC)
    Interface,
    /// An enumeration type
    Enum,
    /// A standalone function
    Function,
    /// A method attached to a type
    Method,
    /// A module-level variable or constant
    Variable,
    /// A type alias or typedef
    Type,
    /// A macro definition
    Macro,
}

impl SymbolKind {
    /// Returns the string representation used in uris.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Type => "type",
            SymbolKind::Macro => "macro",
        }
    }

    /// Returns true for class definitions.
    pub fn is_class(&self) -> bool {
        matches!(self, SymbolKind::Class)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "module" => SymbolKind::Module,
            "class" => SymbolKind::Class,
            "struct" => SymbolKind::Struct,
            "interface" => SymbolKind::Interface,
            "enum" => SymbolKind::Enum,
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "variable" => SymbolKind::Variable,
            "type" => SymbolKind::Type,
            "macro" => SymbolKind::Macro,
            other => return Err(SymbolParseError::UnknownKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// Error returned when a symbol uri cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolParseError {
    #[error("Invalid uri scheme in '{0}'")]
    InvalidScheme(String),
    #[error("Missing {part} in uri '{uri}'")]
    MissingPart { part: &'static str, uri: String },
    #[error("Unknown symbol kind: {0}")]
    UnknownKind(String),
    #[error("Invalid {part} '{value}': must not contain spaces")]
    InvalidPart { part: &'static str, value: String },
}

/// Identity of a code symbol.
///
/// Equality compares dotted path, kind and revision. Serialized as its uri.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolIdentity {
    dotted_path: String,
    kind: SymbolKind,
    revision: String,
}

impl SymbolIdentity {
    /// Create a new symbol identity.
    pub fn new(
        dotted_path: impl Into<String>,
        kind: SymbolKind,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            dotted_path: dotted_path.into(),
            kind,
            revision: revision.into(),
        }
    }

    /// Create a symbol identity, rejecting values its uri cannot carry.
    pub fn try_new(
        dotted_path: impl Into<String>,
        kind: SymbolKind,
        revision: impl Into<String>,
    ) -> Result<Self, SymbolParseError> {
        let identity = Self::new(dotted_path, kind, revision);
        identity.check()?;
        Ok(identity)
    }

    /// Check that [`uri`](Self::uri) parses back to this identity.
    ///
    /// The revision must be non-empty and free of spaces, and the dotted
    /// path must be non-empty.
    pub fn check(&self) -> Result<(), SymbolParseError> {
        if self.revision.is_empty() {
            return Err(SymbolParseError::MissingPart {
                part: "revision",
                uri: self.uri(),
            });
        }
        if self.revision.contains(' ') {
            return Err(SymbolParseError::InvalidPart {
                part: "revision",
                value: self.revision.clone(),
            });
        }
        if self.dotted_path.is_empty() {
            return Err(SymbolParseError::MissingPart {
                part: "dotted path",
                uri: self.uri(),
            });
        }
        Ok(())
    }

    /// Parse an identity from its uri form: `symsync <revision> <kind> <dotted.path>`.
    pub fn parse_uri(uri: &str) -> Result<Self, SymbolParseError> {
        let mut parts = uri.splitn(4, ' ');

        if parts.next() != Some(URI_SCHEME) {
            return Err(SymbolParseError::InvalidScheme(uri.to_string()));
        }

        let missing = |part| SymbolParseError::MissingPart {
            part,
            uri: uri.to_string(),
        };

        let revision = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("revision"))?;
        let kind = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("kind"))?
            .parse()?;
        let dotted_path = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("dotted path"))?;

        Ok(Self::new(dotted_path, kind, revision))
    }

    /// The stable storage key.
    pub fn dotted_path(&self) -> &str {
        &self.dotted_path
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Revision marker, typically a commit hash.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// The long-form identifier including kind and revision.
    pub fn uri(&self) -> String {
        format!(
            "{} {} {} {}",
            URI_SCHEME,
            self.revision,
            self.kind.as_str(),
            self.dotted_path
        )
    }

    /// Same symbol at a different revision.
    pub fn at_revision(&self, revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ..self.clone()
        }
    }

    /// Returns the last component of the dotted path.
    pub fn name(&self) -> &str {
        self.dotted_path
            .rsplit('.')
            .next()
            .unwrap_or(&self.dotted_path)
    }
}

impl fmt::Display for SymbolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl FromStr for SymbolIdentity {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_uri(s)
    }
}

impl TryFrom<String> for SymbolIdentity {
    type Error = SymbolParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_uri(&value)
    }
}

impl From<SymbolIdentity> for String {
    fn from(symbol: SymbolIdentity) -> Self {
        symbol.uri()
    }
}
