use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use recprims_frame::{FrameConfig, ReadOutcome, RecordReader};
use recprims_io::{ByteSource, Finished, Growing};
use tracing::{debug, info};

use crate::cmd::{parse_duration, CatArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_record, OutputFormat};

pub fn run(args: CatArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.path)
        .map_err(|err| io_error(&format!("failed opening {}", args.path.display()), err))?;
    let config = FrameConfig {
        max_payload_size: args.max_payload,
        ..FrameConfig::default()
    };

    if !args.follow {
        let mut reader = RecordReader::with_config(Finished(file), config);
        return print_records(&mut reader, &args, format, &Follow::Off);
    }

    let follow = Follow::On {
        poll_interval: parse_duration(&args.poll_interval)?,
        idle_timeout: args
            .idle_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?,
        running: install_ctrlc_handler()?,
    };
    let mut reader = RecordReader::with_config(Growing(file), config);
    print_records(&mut reader, &args, format, &follow)
}

enum Follow {
    Off,
    On {
        poll_interval: Duration,
        idle_timeout: Option<Duration>,
        running: Arc<AtomicBool>,
    },
}

fn print_records<S: ByteSource>(
    reader: &mut RecordReader<S>,
    args: &CatArgs,
    format: OutputFormat,
    follow: &Follow,
) -> CliResult<i32> {
    let file = args.path.display().to_string();
    let mut printed = 0u64;
    let mut last_record = Instant::now();

    loop {
        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }

        let outcome = reader
            .next_record()
            .map_err(|err| frame_error("read failed", err))?;

        match outcome {
            ReadOutcome::Record(record) => {
                print_record(&record, printed, &file, format);
                printed = printed.saturating_add(1);
                last_record = Instant::now();
            }
            ReadOutcome::EndOfStream => {
                debug!(file = %file, records = printed, "end of records");
                return Ok(SUCCESS);
            }
            ReadOutcome::Pending => match follow {
                // A static file that ends mid-frame reports truncation, so
                // pending only happens while following.
                Follow::Off => return Ok(SUCCESS),
                Follow::On {
                    poll_interval,
                    idle_timeout,
                    running,
                } => {
                    if !running.load(Ordering::SeqCst) {
                        info!(records = printed, "interrupted");
                        return Ok(SUCCESS);
                    }
                    if let Some(limit) = idle_timeout {
                        if last_record.elapsed() >= *limit {
                            info!(records = printed, "idle timeout reached");
                            return Ok(if args.count.is_some() { TIMEOUT } else { SUCCESS });
                        }
                    }
                    std::thread::sleep(*poll_interval);
                }
            },
        }
    }
}

fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}
