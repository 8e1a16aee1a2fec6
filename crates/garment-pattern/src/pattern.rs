use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PatternError;
use crate::spec::{Panel, PatternSpec};

/// File stems that say nothing about the pattern; the parent directory
/// names the pattern instead.
pub const STANDARD_FILENAMES: [&str; 3] = ["specification", "template", "prediction"];

/// In-memory pattern specification plus its naming/file context.
///
/// A `Pattern` is owned by one caller at a time; every operation mutates it
/// in place and serially.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub name: String,
    spec_file: Option<PathBuf>,
    pub(crate) spec: PatternSpec,
}

/// Deep copy of a pattern's specification, used for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(PatternSpec);

impl Pattern {
    /// Empty template skeleton.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec_file: None,
            spec: PatternSpec::default(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let path = path.as_ref();
        let spec = read_spec(path)?;
        let mut pattern = Self {
            name: name_from_path(path),
            spec_file: Some(path.to_path_buf()),
            spec,
        };
        pattern.prepare()?;
        debug!(name = %pattern.name, file = %path.display(), "loaded pattern");
        Ok(pattern)
    }

    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self, PatternError> {
        let mut pattern = Self {
            name: name.into(),
            spec_file: None,
            spec: serde_json::from_str(json)?,
        };
        pattern.prepare()?;
        Ok(pattern)
    }

    pub fn from_spec(name: impl Into<String>, spec: PatternSpec) -> Result<Self, PatternError> {
        let mut pattern = Self {
            name: name.into(),
            spec_file: None,
            spec,
        };
        pattern.prepare()?;
        Ok(pattern)
    }

    /// Re-read the specification from the file this pattern was loaded from.
    pub fn reload(&mut self) -> Result<(), PatternError> {
        let path = self.spec_file.clone().ok_or(PatternError::NoSourceFile)?;
        self.spec = read_spec(&path)?;
        self.prepare()
    }

    fn prepare(&mut self) -> Result<(), PatternError> {
        self.spec.validate()?;
        self.normalize_template()
    }

    pub fn spec(&self) -> &PatternSpec {
        &self.spec
    }

    pub fn into_spec(self) -> PatternSpec {
        self.spec
    }

    pub fn spec_file(&self) -> Option<&Path> {
        self.spec_file.as_deref()
    }

    pub fn panel(&self, name: &str) -> Result<&Panel, PatternError> {
        self.spec.panel(name)
    }

    pub fn panel_names(&self) -> impl Iterator<Item = &str> {
        self.spec.pattern.panels.keys().map(String::as_str)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.spec.clone())
    }

    /// Replace the whole specification with a copy of `snapshot`.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.spec = snapshot.0.clone();
    }

    /// Write the specification as pretty JSON.
    ///
    /// With `to_subfolder` the file is `<dir>/<name>/<tag>specification.json`,
    /// otherwise `<dir>/<name><tag>_specification.json`. Returns the
    /// directory that received the file.
    pub fn serialize(
        &self,
        dir: impl AsRef<Path>,
        to_subfolder: bool,
        tag: &str,
    ) -> Result<PathBuf, PatternError> {
        let dir = dir.as_ref();
        let (log_dir, spec_file) = if to_subfolder {
            let log_dir = dir.join(&self.name);
            let file = log_dir.join(format!("{tag}specification.json"));
            (log_dir, file)
        } else {
            let file = dir.join(format!("{}{tag}_specification.json", self.name));
            (dir.to_path_buf(), file)
        };
        std::fs::create_dir_all(&log_dir).map_err(|e| PatternError::io(&log_dir, e))?;

        let file = File::create(&spec_file).map_err(|e| PatternError::io(&spec_file, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.spec)?;
        writer.flush().map_err(|e| PatternError::io(&spec_file, e))?;

        debug!(name = %self.name, file = %spec_file.display(), "serialized pattern");
        Ok(log_dir)
    }
}

fn read_spec(path: &Path) -> Result<PatternSpec, PatternError> {
    let file = File::open(path).map_err(|e| PatternError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Pattern name implied by a specification file path.
pub fn name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if STANDARD_FILENAMES.contains(&stem.as_str()) {
        if let Some(dir) = path.parent().and_then(Path::file_name) {
            return dir.to_string_lossy().into_owned();
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_file_names_defer_to_directory() {
        assert_eq!(
            name_from_path(Path::new("data/tee_0042/specification.json")),
            "tee_0042"
        );
        assert_eq!(
            name_from_path(Path::new("templates/skirt/template.json")),
            "skirt"
        );
        assert_eq!(
            name_from_path(Path::new("templates/skirt_4_panels.json")),
            "skirt_4_panels"
        );
    }

    #[test]
    fn restore_replaces_whole_spec() {
        let mut pattern = Pattern::new("p");
        let snap = pattern.snapshot();
        pattern
            .spec
            .pattern
            .panels
            .insert("extra".to_string(), Panel::default());
        pattern.restore(&snap);
        assert_eq!(pattern.panel_names().count(), 0);
    }

    #[test]
    fn missing_properties_is_malformed() {
        let err = Pattern::from_json_str("p", r#"{"pattern": {"panels": {}}}"#).unwrap_err();
        assert!(matches!(err, PatternError::Json(_)));
    }

    #[test]
    fn reload_without_file_is_refused() {
        let mut pattern = Pattern::new("p");
        assert!(matches!(pattern.reload(), Err(PatternError::NoSourceFile)));
    }
}
