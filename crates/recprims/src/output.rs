use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use recprims_frame::Record;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordOutput<'a> {
    kind: &'static str,
    file: &'a str,
    index: u64,
    offset: u64,
    size: usize,
    payload: String,
}

/// Print one record. `index` counts records from the start of the file.
pub fn print_record(record: &Record, index: u64, file: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RecordOutput {
                kind: "record",
                file,
                index,
                offset: record.offset,
                size: record.payload.len(),
                payload: payload_preview(record.payload.as_ref()),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "OFFSET", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    record.offset.to_string(),
                    record.payload.len().to_string(),
                    payload_preview(record.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} offset={} size={} payload={}",
                index,
                record.offset,
                record.payload.len(),
                payload_preview(record.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(record.payload.as_ref());
        }
    }
}

/// Outcome of scanning a whole record file.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub kind: &'static str,
    pub file: String,
    pub status: VerifyStatus,
    pub records: u64,
    pub valid_bytes: u64,
    pub file_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    Ok,
    Corrupt,
    Truncated,
}

impl VerifyStatus {
    fn as_str(self) -> &'static str {
        match self {
            VerifyStatus::Ok => "ok",
            VerifyStatus::Corrupt => "corrupt",
            VerifyStatus::Truncated => "truncated",
        }
    }
}

pub fn print_verify_report(report: &VerifyReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FILE", "STATUS", "RECORDS", "VALID BYTES", "FILE BYTES"])
                .add_row(vec![
                    report.file.clone(),
                    report.status.as_str().to_string(),
                    report.records.to_string(),
                    report.valid_bytes.to_string(),
                    report.file_bytes.to_string(),
                ]);
            println!("{table}");
            if let Some(error) = &report.error {
                println!("{error}");
            }
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            print!(
                "{}: {} records={} valid_bytes={} file_bytes={}",
                report.file,
                report.status.as_str(),
                report.records,
                report.valid_bytes,
                report.file_bytes
            );
            match &report.error {
                Some(error) => println!(" error=\"{error}\""),
                None => println!(),
            }
        }
    }
}

#[derive(Serialize)]
struct WriteSummary<'a> {
    kind: &'static str,
    file: &'a str,
    records: u64,
    bytes: u64,
}

pub fn print_write_summary(file: &str, records: u64, bytes: u64, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&WriteSummary {
            kind: "write-summary",
            file,
            records,
            bytes,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("wrote {records} records ({bytes} bytes) to {file}");
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
