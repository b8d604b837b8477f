use crate::error::InferenceError;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Class names indexed by model output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Arc<[String]>,
}

impl LabelTable {
    /// Reads a label file where every line is `<index> <label>`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InferenceError::LabelsUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses `<index> <label>` lines. The index is dropped and everything
    /// after the first space becomes the label. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self, InferenceError> {
        let mut labels = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let (index, label) = line
                .split_once(' ')
                .ok_or_else(|| InferenceError::MalformedLabel {
                    line: line_no + 1,
                    content: raw.to_string(),
                })?;

            if index.parse::<usize>().ok() != Some(labels.len()) {
                warn!(
                    line = line_no + 1,
                    index,
                    position = labels.len(),
                    "label index does not match its position"
                );
            }

            labels.push(label.to_string());
        }

        if labels.is_empty() {
            return Err(InferenceError::NoLabels);
        }

        Ok(Self {
            labels: labels.into(),
        })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_discards_index() {
        let table = LabelTable::parse("0 cat\n1 dog\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), Some("cat"));
        assert_eq!(table.get(1), Some("dog"));
        assert_eq!(table.get(2), None);
    }

    #[test]
    fn test_parse_keeps_inner_spaces() {
        let table = LabelTable::parse("0 No Tumor\n1 Glioma Tumor\r\n").unwrap();
        assert_eq!(table.iter().collect::<Vec<_>>(), vec!["No Tumor", "Glioma Tumor"]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let table = LabelTable::parse("\n0 cat\n\n1 dog\n\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1), Some("dog"));
    }

    #[test]
    fn test_parse_accepts_mismatched_index() {
        let table = LabelTable::parse("5 cat\nx dog").unwrap();
        assert_eq!(table.get(0), Some("cat"));
        assert_eq!(table.get(1), Some("dog"));
    }

    #[test]
    fn test_parse_rejects_line_without_label() {
        match LabelTable::parse("0 cat\ndog\n") {
            Err(InferenceError::MalformedLabel { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "dog");
            }
            other => panic!("Expected MalformedLabel, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_empty_file() {
        assert!(matches!(LabelTable::parse(" \n\n"), Err(InferenceError::NoLabels)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "0 benign\n1 malignant\n").unwrap();

        let table = LabelTable::load(file.path()).unwrap();
        assert_eq!(table.get(1), Some("malignant"));
    }

    #[test]
    fn test_load_missing_file() {
        match LabelTable::load("no/such/labels.txt") {
            Err(InferenceError::LabelsUnreadable { path, .. }) => {
                assert_eq!(path, "no/such/labels.txt");
            }
            other => panic!("Expected LabelsUnreadable, got {other:?}"),
        }
    }

    #[test]
    fn test_from_iterator() {
        let table: LabelTable = ["cat", "dog"].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
    }
}
