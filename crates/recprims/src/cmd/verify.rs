use std::fs::File;
use std::io::BufReader;

use recprims_frame::{FrameError, ReadOutcome, RecordReader};
use recprims_io::{ByteSource, Finished};
use tracing::warn;

use crate::cmd::VerifyArgs;
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_verify_report, OutputFormat, VerifyReport, VerifyStatus};

pub fn run(args: VerifyArgs, format: OutputFormat) -> CliResult<i32> {
    let open_context = format!("failed opening {}", args.path.display());
    let file = File::open(&args.path).map_err(|err| io_error(&open_context, err))?;
    let file_bytes = file
        .metadata()
        .map_err(|err| io_error(&open_context, err))?
        .len();

    let reader = RecordReader::new(Finished(BufReader::new(file)));
    let report = scan(reader, args.path.display().to_string(), file_bytes)?;
    print_verify_report(&report, format);

    Ok(match report.status {
        VerifyStatus::Ok => SUCCESS,
        VerifyStatus::Corrupt | VerifyStatus::Truncated => DATA_INVALID,
    })
}

/// Read every record, stopping at the first data-loss error.
///
/// I/O failures abort the scan; damaged data is reported, not raised.
pub(crate) fn scan<S: ByteSource>(
    mut reader: RecordReader<S>,
    file: String,
    file_bytes: u64,
) -> CliResult<VerifyReport> {
    let mut report = VerifyReport {
        kind: "verify-report",
        file,
        status: VerifyStatus::Ok,
        records: 0,
        valid_bytes: 0,
        file_bytes,
        failure_offset: None,
        error: None,
    };

    loop {
        match reader.next_record() {
            Ok(ReadOutcome::Record(_)) => {}
            Ok(ReadOutcome::EndOfStream) | Ok(ReadOutcome::Pending) => break,
            Err(err) if err.is_data_loss() => {
                report.status = match &err {
                    FrameError::Truncated { .. } => VerifyStatus::Truncated,
                    _ => VerifyStatus::Corrupt,
                };
                report.failure_offset = Some(reader.offset());
                warn!(file = %report.file, offset = reader.offset(), error = %err, "verification failed");
                report.error = Some(err.to_string());
                break;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }

    report.records = reader.records_read();
    report.valid_bytes = reader.offset();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use recprims_frame::RecordWriter;

    use super::*;

    fn file_with(payloads: &[&[u8]]) -> Vec<u8> {
        let mut writer = RecordWriter::new(Vec::new());
        for payload in payloads {
            writer.append(payload).unwrap();
        }
        writer.finish().unwrap()
    }

    fn scan_bytes(bytes: Vec<u8>) -> VerifyReport {
        let len = bytes.len() as u64;
        scan(RecordReader::new(Cursor::new(bytes)), "mem".to_string(), len).unwrap()
    }

    #[test]
    fn clean_file_reports_ok() {
        let report = scan_bytes(file_with(&[b"a", b"bb", b""]));
        assert_eq!(report.status, VerifyStatus::Ok);
        assert_eq!(report.records, 3);
        assert_eq!(report.valid_bytes, report.file_bytes);
        assert!(report.error.is_none());
    }

    #[test]
    fn corrupt_payload_reports_offset() {
        let mut bytes = file_with(&[b"good", b"bad!"]);
        let last = bytes.len() - 6;
        bytes[last] ^= 0x20;

        let report = scan_bytes(bytes);
        assert_eq!(report.status, VerifyStatus::Corrupt);
        assert_eq!(report.records, 1);
        assert_eq!(report.failure_offset, Some(20));
        assert_eq!(report.valid_bytes, 20);
    }

    #[test]
    fn truncated_tail_reports_truncated() {
        let mut bytes = file_with(&[b"whole", b"cut short"]);
        bytes.truncate(bytes.len() - 2);

        let report = scan_bytes(bytes);
        assert_eq!(report.status, VerifyStatus::Truncated);
        assert_eq!(report.records, 1);
        assert_eq!(report.failure_offset, Some(21));
    }
}
