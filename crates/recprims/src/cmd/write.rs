use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufWriter};

use recprims_frame::RecordWriter;
use tracing::info;

use crate::cmd::WriteArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_write_summary, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    if args.data.is_empty() && args.file.is_none() && !args.stdin {
        return Err(CliError::new(
            USAGE,
            "nothing to write: pass --data, --file or --stdin",
        ));
    }

    let file = open_sink(&args)?;
    let mut writer = RecordWriter::new(BufWriter::new(file));
    let path = args.path.display().to_string();

    if let Some(source) = &args.file {
        let payload = fs::read(source).map_err(|err| {
            io_error(&format!("failed reading {}", source.display()), err)
        })?;
        writer
            .append(&payload)
            .map_err(|err| frame_error("write failed", err))?;
    }

    for data in &args.data {
        writer
            .append(data.as_bytes())
            .map_err(|err| frame_error("write failed", err))?;
    }

    if args.stdin {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.map_err(|err| io_error("failed reading stdin", err))?;
            writer
                .append(line.as_bytes())
                .map_err(|err| frame_error("write failed", err))?;
            // Make each line visible to tailing readers as it arrives.
            writer
                .flush()
                .map_err(|err| frame_error("flush failed", err))?;
        }
    }

    let records = writer.records_written();
    let bytes = writer.bytes_written();
    writer
        .close()
        .map_err(|err| frame_error("close failed", err))?;

    info!(file = %path, records, bytes, "records written");
    print_write_summary(&path, records, bytes, format);
    Ok(SUCCESS)
}

fn open_sink(args: &WriteArgs) -> CliResult<File> {
    let mut options = OpenOptions::new();
    if args.append {
        options.append(true).create(true);
    } else {
        options.write(true).create(true).truncate(true);
    }
    options
        .open(&args.path)
        .map_err(|err| io_error(&format!("failed opening {}", args.path.display()), err))
}
