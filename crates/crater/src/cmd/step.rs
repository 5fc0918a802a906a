use std::fs;

use crater_fsw::{FlightExec, StepReport};
use serde::Serialize;

use crate::cmd::{load_config, StepArgs};
use crate::exit::{fsw_error, io_error, CliResult, SUCCESS};
use crate::output::{print_summary, OutputFormat};

/// What the executive did over one or more ticks.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub ticks: u64,
    pub now_us: i64,
    pub delivered: u64,
    pub written: u64,
    pub unrouted: u64,
    pub parse_errors: u64,
}

impl TickSummary {
    pub fn record(&mut self, report: &StepReport) {
        self.ticks = report.tick;
        self.delivered += report.delivered as u64;
        self.written += report.written as u64;
    }

    pub fn finish(mut self, exec: &FlightExec) -> Self {
        let stats = exec.demux_stats();
        self.now_us = exec.now().num_us();
        self.unrouted = stats.unrouted;
        self.parse_errors = stats.parse_errors;
        self
    }
}

pub fn run(args: StepArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(args.config.as_deref())?;
    let mut exec = FlightExec::from_config(config).map_err(|err| fsw_error("startup failed", err))?;

    let input = fs::read(&args.input)
        .map_err(|err| io_error(&format!("failed reading {}", args.input.display()), err))?;

    let mut output = Vec::new();
    let report = exec
        .step(&input, &mut output)
        .map_err(|err| fsw_error("tick failed", err))?;

    fs::write(&args.output, &output)
        .map_err(|err| io_error(&format!("failed writing {}", args.output.display()), err))?;

    tracing::info!(
        input_bytes = input.len(),
        output_bytes = output.len(),
        "tick complete"
    );

    let mut summary = TickSummary::default();
    summary.record(&report);
    print_summary(&summary.finish(&exec), format);
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use crater_fsw::FswConfig;

    use super::*;

    #[test]
    fn summary_accumulates_reports() {
        let exec = FlightExec::from_config(FswConfig::default()).unwrap();
        let mut summary = TickSummary::default();
        summary.record(&StepReport { tick: 1, delivered: 2, written: 3 });
        summary.record(&StepReport { tick: 2, delivered: 1, written: 0 });

        let summary = summary.finish(&exec);
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.delivered, 3);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.now_us, 0);
    }
}
