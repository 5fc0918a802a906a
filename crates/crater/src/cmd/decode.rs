use std::fs;
use std::io::{self, Read};

use crater_link::{FrameParser, ParseStats, Parsed};

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frames, FrameOutput, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = if args.input.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|err| io_error("failed reading stdin", err))?;
        buf
    } else {
        fs::read(&args.input)
            .map_err(|err| io_error(&format!("failed reading {}", args.input.display()), err))?
    };

    let (frames, stats) = scan(&bytes);
    tracing::info!(
        bytes = stats.bytes,
        frames = stats.frames,
        malformed = stats.malformed,
        "scan complete"
    );

    if frames.is_empty() && !bytes.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no valid frames in {} bytes", bytes.len()),
        ));
    }

    print_frames(&frames, format);
    Ok(SUCCESS)
}

fn scan(bytes: &[u8]) -> (Vec<FrameOutput>, ParseStats) {
    let mut parser = FrameParser::new();
    let mut frames = Vec::new();
    for &byte in bytes {
        match parser.push(byte) {
            Parsed::Frame(frame) => frames.push(FrameOutput::new(&frame)),
            Parsed::Malformed(err) => tracing::debug!(error = %err, "skipping malformed frame"),
            Parsed::Pending => {}
        }
    }
    (frames, parser.stats())
}

#[cfg(test)]
mod tests {
    use crater_link::messages::{FswHeartbeat, ServoTarget};
    use crater_link::RawFrame;

    use super::*;

    #[test]
    fn scan_skips_noise_and_corruption() {
        let mut bytes = vec![0x01, 0x02];
        bytes.extend(RawFrame::from_message(&FswHeartbeat::default(), 0, 1, 2).to_bytes());
        let mut bad = RawFrame::from_message(&ServoTarget::default(), 1, 1, 2).to_bytes();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        bytes.extend(bad);
        bytes.extend(RawFrame::from_message(&ServoTarget::default(), 2, 1, 2).to_bytes());

        let (frames, stats) = scan(&bytes);
        let seqs: Vec<u8> = frames.iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![0, 2]);
        assert_eq!(frames[1].name, "SERVO_TARGET");
        assert_eq!(stats.malformed, 1);
    }
}
