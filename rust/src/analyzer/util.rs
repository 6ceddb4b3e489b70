use proc_macro2::LineColumn;
use std::path::Path;

/// Byte offsets of line starts, for turning span locations into text offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// Byte offset of a 1-based line and 0-based char column, as reported by
    /// `proc_macro2` with `span-locations`.
    pub fn offset(&self, text: &str, at: LineColumn) -> Option<usize> {
        let start = *self.starts.get(at.line.checked_sub(1)?)?;
        let line = self.line(text, at.line)?;
        if at.column == line.chars().count() {
            return Some(start + line.len());
        }
        line.char_indices().nth(at.column).map(|(i, _)| start + i)
    }

    /// Text of a 1-based line, without its newline.
    pub fn line<'t>(&self, text: &'t str, line: usize) -> Option<&'t str> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(text.len());
        text.get(start..end)
    }
}

pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Strips `indent` from every line after the first.
pub fn dedent(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        out.push_str(line.strip_prefix(indent).unwrap_or(line));
    }
    out
}

pub fn rel_path(root: &Path, file: &Path) -> String {
    pathdiff::diff_paths(file, root)
        .unwrap_or_else(|| file.to_path_buf())
        .to_string_lossy()
        .to_string()
}
