//! Packaging metadata manifests (`META-INF/MANIFEST.MF`).
//!
//! Manifests use the jar text format: a main section followed by per-entry
//! sections, each a block of `Name: Value` lines separated by blank lines.
//! Lines starting with a single space continue the previous value.

use thiserror::Error;

/// Resource path of a manifest inside a resource location.
pub const MANIFEST_RESOURCE: &str = "META-INF/MANIFEST.MF";

/// Per-entry section that carries the loader's own metadata.
pub const LOADER_ENTRY: &str = "unoloader/Loader";

/// Attribute naming the application's entry module.
pub const APPLICATION_CLASS: &str = "Application-Class";

/// Errors produced while parsing a manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// A line is neither `Name: Value` nor a continuation.
    #[error("invalid manifest line {line}: {content:?}")]
    InvalidLine { line: usize, content: String },

    /// A continuation line appeared before any attribute.
    #[error("continuation without attribute at line {0}")]
    DanglingContinuation(usize),

    /// A per-entry section did not start with a `Name` attribute.
    #[error("entry section at line {0} has no Name attribute")]
    MissingEntryName(usize),
}

/// Ordered attributes of one manifest section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Look up an attribute. Names compare case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
    sections: Vec<(String, Attributes)>,
}

impl Manifest {
    /// Parse manifest text. Accepts LF and CRLF line endings.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();
        let mut current = Attributes::default();
        let mut in_main = true;
        let mut section_start = 1;

        for (index, raw) in text.split('\n').enumerate() {
            let line_no = index + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if line.is_empty() {
                if !current.is_empty() || in_main {
                    manifest.close_section(&mut current, &mut in_main, section_start)?;
                }
                section_start = line_no + 1;
                continue;
            }

            if let Some(rest) = line.strip_prefix(' ') {
                let (_, value) = current
                    .entries
                    .last_mut()
                    .ok_or(ManifestError::DanglingContinuation(line_no))?;
                value.push_str(rest);
                continue;
            }

            let (key, value) =
                line.split_once(": ")
                    .ok_or_else(|| ManifestError::InvalidLine {
                        line: line_no,
                        content: line.to_string(),
                    })?;
            current.entries.push((key.to_string(), value.to_string()));
        }

        if !current.is_empty() || in_main {
            manifest.close_section(&mut current, &mut in_main, section_start)?;
        }
        Ok(manifest)
    }

    fn close_section(
        &mut self,
        current: &mut Attributes,
        in_main: &mut bool,
        start: usize,
    ) -> Result<(), ManifestError> {
        let attrs = std::mem::take(current);
        if *in_main {
            self.main = attrs;
            *in_main = false;
            return Ok(());
        }
        let name = attrs
            .entries
            .first()
            .filter(|(key, _)| key.eq_ignore_ascii_case("Name"))
            .map(|(_, value)| value.clone())
            .ok_or(ManifestError::MissingEntryName(start))?;
        self.sections.push((name, attrs));
        Ok(())
    }

    /// Attributes of the main section.
    pub const fn main_attributes(&self) -> &Attributes {
        &self.main
    }

    /// Attributes of the per-entry section called `entry`, if present.
    pub fn entry_attributes(&self, entry: &str) -> Option<&Attributes> {
        self.sections
            .iter()
            .find(|(name, _)| name == entry)
            .map(|(_, attrs)| attrs)
    }

    /// The non-empty `Application-Class` of the loader's entry section.
    pub fn application_class(&self) -> Option<&str> {
        self.entry_attributes(LOADER_ENTRY)?
            .get(APPLICATION_CLASS)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
