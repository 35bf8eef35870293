//! Fixed-width text rendering of the author table.

use crate::domain::AuthorRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

const NAME_HEADER: &str = "Author";
const AGE_WIDTH: usize = 4;

/// Layout of the pasted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `Author|Age |In/Out` columns.
    #[default]
    Table,
    /// One `Name: .., Age: .., In/Out: ..` line per author.
    Lines,
}

/// Rendered report, kept line by line so rows can be logged individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub header: Option<String>,
    pub rows: Vec<String>,
}

impl Report {
    pub fn build(table: &[AuthorRecord], format: ReportFormat) -> Self {
        match format {
            ReportFormat::Table => {
                let width = table
                    .iter()
                    .map(|record| record.name.width())
                    .chain(std::iter::once(NAME_HEADER.width()))
                    .max()
                    .unwrap_or(0);
                let header = format!("{}|{:<AGE_WIDTH$}|In/Out", pad(NAME_HEADER, width), "Age");
                let rows = table
                    .iter()
                    .map(|r| {
                        format!(
                            "{}|{:<AGE_WIDTH$}|{}/{}",
                            pad(&r.name, width),
                            r.age_days,
                            r.in_count,
                            r.out_count
                        )
                    })
                    .collect();
                Self { header: Some(header), rows }
            }
            ReportFormat::Lines => {
                let rows = table
                    .iter()
                    .map(|r| {
                        format!(
                            "Name: {}, Age: {}, In/Out: {}/{}",
                            r.name, r.age_days, r.in_count, r.out_count
                        )
                    })
                    .collect();
                Self { header: None, rows }
            }
        }
    }

    /// Newline-terminated text, header first.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in self.header.iter().chain(self.rows.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Left-align `text` in a column of `width` display cells.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn sample() -> Vec<AuthorRecord> {
        vec![
            AuthorRecord::new("short", 10, 5, 95),
            AuthorRecord::new("much_longer_name", 2048, 50, 50),
        ]
    }

    #[test]
    fn table_aligns_columns_to_longest_name() {
        let text = Report::build(&sample(), ReportFormat::Table).to_text();
        assert_eq!(
            text,
            "Author          |Age |In/Out\n\
             short           |10  |5/95\n\
             much_longer_name|2048|50/50\n"
        );
    }

    #[test]
    fn header_width_applies_when_names_are_short() {
        let table = vec![AuthorRecord::new("ab", 1, 0, 0)];
        let text = Report::build(&table, ReportFormat::Table).to_text();
        assert_eq!(text, "Author|Age |In/Out\nab    |1   |0/0\n");
    }

    #[test]
    fn empty_table_renders_header_only() {
        let text = Report::build(&[], ReportFormat::Table).to_text();
        assert_eq!(text, "Author|Age |In/Out\n");
    }

    #[test]
    fn lines_format_has_no_header() {
        let report = Report::build(&sample(), ReportFormat::Lines);
        assert!(report.header.is_none());
        assert_eq!(
            report.to_text(),
            "Name: short, Age: 10, In/Out: 5/95\n\
             Name: much_longer_name, Age: 2048, In/Out: 50/50\n"
        );
    }

    #[test]
    fn wide_characters_pad_by_display_width() {
        assert_eq!(pad("日本", 6), "日本  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }
}
