//! Source-code location carried by spans and log records.

use super::attribute::Attributes;
use serde::{Deserialize, Serialize};

const FILEPATH_KEYS: [&str; 2] = ["code.filepath", "code.file.path"];
const FUNCTION_KEYS: [&str; 2] = ["code.function", "code.function.name"];
const LINENO_KEYS: [&str; 2] = ["code.lineno", "code.line.number"];
const NAMESPACE_KEY: &str = "code.namespace";

/// Where in the source an operation or log statement originated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CodeLocation {
    /// Source file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    /// Function or method name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Line number within the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<i64>,
    /// Namespace, class or module owning the function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Grouping key for code-location aggregation: `(filepath, function, line)`.
pub type CodeLocationKey = (Option<String>, Option<String>, Option<i64>);

impl CodeLocation {
    /// Extracts a code location from semantic-convention attributes.
    ///
    /// Both the legacy (`code.filepath`, `code.lineno`) and the current
    /// (`code.file.path`, `code.line.number`) keys are recognised. Returns
    /// `None` when neither a file path nor a function name is present.
    #[must_use]
    pub fn from_attributes(attributes: &Attributes) -> Option<Self> {
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| attributes.get(*k))
                .map(ToString::to_string)
                .filter(|s| !s.is_empty())
        };

        let filepath = text(&FILEPATH_KEYS);
        let function = text(&FUNCTION_KEYS);
        if filepath.is_none() && function.is_none() {
            return None;
        }

        Some(Self {
            filepath,
            function,
            lineno: LINENO_KEYS
                .iter()
                .find_map(|k| attributes.get(*k))
                .and_then(super::AttributeValue::as_i64),
            namespace: text(&[NAMESPACE_KEY]),
        })
    }

    /// Returns true if this location satisfies the given substring filters.
    ///
    /// An absent filter always matches; a present filter requires the
    /// corresponding field to exist and contain the filter text.
    #[must_use]
    pub fn matches(&self, filepath: Option<&str>, function: Option<&str>) -> bool {
        let contains = |field: &Option<String>, needle: Option<&str>| match needle {
            None => true,
            Some(n) => field.as_deref().is_some_and(|f| f.contains(n)),
        };
        contains(&self.filepath, filepath) && contains(&self.function, function)
    }

    /// Returns the aggregation key for this location.
    #[must_use]
    pub fn key(&self) -> CodeLocationKey {
        (self.filepath.clone(), self.function.clone(), self.lineno)
    }
}

impl std::fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filepath.as_deref().unwrap_or("<unknown file>"))?;
        if let Some(line) = self.lineno {
            write!(f, ":{line}")?;
        }
        if let Some(ref function) = self.function {
            write!(f, " in {function}")?;
        }
        Ok(())
    }
}
