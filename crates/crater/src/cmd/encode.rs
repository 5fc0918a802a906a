use std::fs;
use std::io::Write;

use crater_link::AnyMessage;
use serde::Deserialize;

use crate::cmd::EncodeArgs;
use crate::exit::{io_error, json_error, CliError, CliResult, SUCCESS, USAGE};

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<AnyMessage>),
    One(AnyMessage),
}

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let text = match (&args.json, &args.file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => return Err(CliError::new(USAGE, "one of --json or --file is required")),
    };

    let messages = parse_messages(&text)?;
    let bytes = encode_all(&messages, args.seq, args.sys_id, args.comp_id);
    tracing::info!(frames = messages.len(), bytes = bytes.len(), "encoded");

    match &args.output {
        Some(path) => fs::write(path, &bytes)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?,
        None => {
            let mut out = std::io::stdout();
            out.write_all(&bytes)
                .and_then(|()| out.flush())
                .map_err(|err| io_error("failed writing stdout", err))?;
        }
    }
    Ok(SUCCESS)
}

fn parse_messages(text: &str) -> CliResult<Vec<AnyMessage>> {
    let document: Document =
        serde_json::from_str(text).map_err(|err| json_error("invalid message JSON", err))?;
    Ok(match document {
        Document::Many(messages) => messages,
        Document::One(message) => vec![message],
    })
}

/// Frame each message in order, numbering them from `seq` with wraparound.
fn encode_all(messages: &[AnyMessage], seq: u8, sys_id: u8, comp_id: u8) -> Vec<u8> {
    messages
        .iter()
        .enumerate()
        .flat_map(|(idx, message)| {
            message
                .to_frame(seq.wrapping_add(idx as u8), sys_id, comp_id)
                .to_bytes()
        })
        .collect()
}
