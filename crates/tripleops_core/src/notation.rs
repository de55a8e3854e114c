use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Exchange-format dialect to parse or emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    NTriples,
    NQuads,
    Turtle,
    N3,
    RdfXml,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notation: {0}")]
pub struct NotationError(pub String);

impl Notation {
    pub fn tag(self) -> &'static str {
        match self {
            Notation::NTriples => "ntriples",
            Notation::NQuads => "nquads",
            Notation::Turtle => "turtle",
            Notation::N3 => "n3",
            Notation::RdfXml => "rdfxml",
            Notation::Json => "json",
        }
    }

    /// Guess the notation from a file extension, looking through one
    /// compression suffix (`data.nt.gz` is N-Triples).
    pub fn from_path(path: &Path) -> Option<Notation> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bz2"))
            .or_else(|| name.strip_suffix(".xz"))
            .unwrap_or(name.as_str());
        let ext = name.rsplit_once('.')?.1;
        match ext {
            "nt" => Some(Notation::NTriples),
            "nq" => Some(Notation::NQuads),
            "ttl" => Some(Notation::Turtle),
            "n3" => Some(Notation::N3),
            "rdf" | "xml" | "owl" => Some(Notation::RdfXml),
            "json" | "jsonld" => Some(Notation::Json),
            _ => None,
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Notation {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ntriples" | "n-triples" | "nt" => Ok(Notation::NTriples),
            "nquads" | "n-quads" | "nq" => Ok(Notation::NQuads),
            "turtle" | "ttl" => Ok(Notation::Turtle),
            "n3" => Ok(Notation::N3),
            "rdfxml" | "rdf/xml" | "xml" => Ok(Notation::RdfXml),
            "json" | "jsonld" => Ok(Notation::Json),
            _ => Err(NotationError(s.to_string())),
        }
    }
}

/// How the collaborator should bring a container into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadStrategy {
    /// Map the file and decode from the mapping.
    #[default]
    Mapped,
    /// Read the whole file into memory first.
    Materialized,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatSpecError {
    #[error("entry {0:?} is not of the form key=value")]
    MissingSeparator(String),
    #[error("empty key in entry {0:?}")]
    EmptyKey(String),
}

/// Free-form `key=value` options handed to the collaborator on import.
///
/// Written as `key=value;key=value`. Unknown keys are kept and ignored by
/// collaborators that do not understand them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatSpec {
    entries: BTreeMap<String, String>,
}

impl FormatSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Boolean lookup; anything other than `true`/`1`/`yes` counts as false.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|value| {
            matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            )
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl FromStr for FormatSpec {
    type Err = FormatSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = FormatSpec::new();
        for entry in s.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| FormatSpecError::MissingSeparator(entry.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(FormatSpecError::EmptyKey(entry.to_string()));
            }
            spec.set(key, value.trim());
        }
        Ok(spec)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notation_guessed_through_compression_suffix() {
        assert_eq!(
            Notation::from_path(Path::new("dump/data.nt.gz")),
            Some(Notation::NTriples)
        );
        assert_eq!(
            Notation::from_path(Path::new("onto.OWL")),
            Some(Notation::RdfXml)
        );
        assert_eq!(Notation::from_path(Path::new("README")), None);
    }

    #[test]
    fn format_spec_parses_and_prints() {
        let spec: FormatSpec = " parser.strict = false ; order=SPO;".parse().unwrap();
        assert_eq!(spec.get("parser.strict"), Some("false"));
        assert_eq!(spec.get_bool("parser.strict"), Some(false));
        assert_eq!(spec.to_string(), "order=SPO;parser.strict=false");
    }

    #[test]
    fn format_spec_rejects_bare_words() {
        assert_eq!(
            "strict".parse::<FormatSpec>(),
            Err(FormatSpecError::MissingSeparator("strict".to_string()))
        );
        assert_eq!(
            "=x".parse::<FormatSpec>(),
            Err(FormatSpecError::EmptyKey("=x".to_string()))
        );
    }
}
