//! Machine-readable batch reports in JSON or JSONL.
//!
//! JSON writes one document holding every result and the summary. JSONL writes
//! one line per result followed by a single summary line, so a report can be
//! tailed or streamed into other tools.

use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::batch::BatchReport;
use crate::types::{BatchSummary, ConversionResult};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Serializable view of one [`ConversionResult`].
#[derive(Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub file_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl From<&ConversionResult> for ResultRecord {
    fn from(result: &ConversionResult) -> Self {
        let image = result.outcome.as_ref().ok();
        Self {
            file_name: result.file_name.clone(),
            input_path: result.input_path.clone(),
            output_path: result.output_path.clone(),
            succeeded: result.succeeded(),
            source_width: image.map(|i| i.source_width),
            source_height: image.map(|i| i.source_height),
            width: image.map(|i| i.width),
            height: image.map(|i| i.height),
            bytes: image.map(|i| i.bytes),
            error: result.error().map(ToString::to_string),
            elapsed_ms: result.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    summary: &'a BatchSummary,
    results: Vec<ResultRecord>,
}

/// A JSONL line.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReportLine<'a> {
    Result(ResultRecord),
    Summary(&'a BatchSummary),
}

/// Writes a [`BatchReport`] to any writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    pub fn write_report(&mut self, report: &BatchReport) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                let document = ReportDocument {
                    summary: &report.summary,
                    results: report.results.iter().map(ResultRecord::from).collect(),
                };
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, &document)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, &document)
                        .map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            ReportFormat::JsonLines => {
                for result in &report.results {
                    let line = ReportLine::Result(ResultRecord::from(result));
                    serde_json::to_writer(&mut self.writer, &line).map_err(io::Error::other)?;
                    writeln!(self.writer)?;
                }
                let line = ReportLine::Summary(&report.summary);
                serde_json::to_writer(&mut self.writer, &line).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscodeError;
    use crate::types::{ConversionTask, ConvertedImage, InputFile};
    use std::time::Duration;

    fn report() -> BatchReport {
        let task = |name: &str| ConversionTask {
            input: InputFile {
                path: PathBuf::from("/in").join(name),
                size: 1,
            },
            output_path: PathBuf::from("/out").join(name.replace(".heic", ".jpg")),
        };
        let a = task("a.heic");
        let b = task("b.heic");
        let results = vec![
            ConversionResult::new(
                &a,
                Ok(ConvertedImage {
                    source_width: 800,
                    source_height: 600,
                    width: 400,
                    height: 300,
                    bytes: 1234,
                }),
                Duration::from_millis(12),
            ),
            ConversionResult::new(
                &b,
                Err(TranscodeError::UnrecognizedFormat {
                    path: b.input.path.clone(),
                }),
                Duration::from_millis(1),
            ),
        ];
        let mut summary = BatchSummary::new(2);
        for r in &results {
            summary.record(r);
        }
        BatchReport { summary, results }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ReportFormat::parse("JSON"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::parse("ndjson"), Some(ReportFormat::JsonLines));
        assert_eq!(ReportFormat::parse("xml"), None);
    }

    #[test]
    fn test_json_document() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Json, false);
        writer.write_report(&report()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        assert_eq!(value["summary"]["processed"], 2);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["results"][0]["width"], 400);
        assert_eq!(value["results"][0]["elapsed_ms"], 12);
        assert!(value["results"][0].get("error").is_none());
        assert_eq!(value["results"][1]["succeeded"], false);
        assert!(value["results"][1]["error"]
            .as_str()
            .unwrap()
            .contains("Unrecognized"));
    }

    #[test]
    fn test_jsonl_lines() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::JsonLines, true);
        writer.write_report(&report()).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "result");
        assert_eq!(lines[0]["file_name"], "a.heic");
        assert_eq!(lines[2]["type"], "summary");
        assert_eq!(lines[2]["total"], 2);
    }
}
