use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crater_fsw::FlightExec;

use crate::cmd::step::TickSummary;
use crate::cmd::{load_config, RunArgs};
use crate::exit::{fsw_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_summary, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(args.config.as_deref())?;
    let mut exec = FlightExec::from_config(config).map_err(|err| fsw_error("startup failed", err))?;

    let mut input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?,
        ),
        None => Box::new(io::empty()),
    };
    let mut output = File::create(&args.output)
        .map_err(|err| io_error(&format!("failed creating {}", args.output.display()), err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let period = args
        .realtime
        .then(|| Duration::from_micros(exec.config().tick_period_us));

    let summary = run_loop(
        &mut exec,
        &mut input,
        &mut output,
        args.ticks,
        period,
        &running,
    )?;
    tracing::info!(ticks = summary.ticks, "run stopped");
    print_summary(&summary, format);
    Ok(SUCCESS)
}

/// Tick until `limit` ticks have run or `running` is cleared.
fn run_loop<R: Read, W: Write>(
    exec: &mut FlightExec,
    input: &mut R,
    output: &mut W,
    limit: Option<u64>,
    period: Option<Duration>,
    running: &AtomicBool,
) -> CliResult<TickSummary> {
    let mut summary = TickSummary::default();
    let mut deadline = Instant::now();

    while running.load(Ordering::SeqCst) {
        if limit.is_some_and(|limit| summary.ticks >= limit) {
            break;
        }

        let report = exec
            .step_io(input, output)
            .map_err(|err| fsw_error("tick failed", err))?;
        summary.record(&report);

        if let Some(period) = period {
            deadline += period;
            if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
        }
    }

    Ok(summary.finish(exec))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
