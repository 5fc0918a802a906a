use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use crater_link::{AnyMessage, RawFrame};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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
pub struct FrameOutput {
    pub seq: u8,
    pub sys_id: u8,
    pub comp_id: u8,
    pub msg_id: u32,
    pub name: &'static str,
    pub len: usize,
    pub message: Option<AnyMessage>,
}

impl FrameOutput {
    pub fn new(frame: &RawFrame) -> Self {
        let message = AnyMessage::decode(frame);
        Self {
            seq: frame.seq(),
            sys_id: frame.sys_id(),
            comp_id: frame.comp_id(),
            msg_id: frame.msg_id(),
            name: message.as_ref().map_or("UNKNOWN", |m| m.meta().name),
            len: frame.payload().len(),
            message,
        }
    }

    fn fields(&self) -> String {
        match &self.message {
            Some(message) => serde_json::to_value(message)
                .ok()
                .and_then(|mut value| {
                    value.as_object_mut()?.remove("type");
                    serde_json::to_string(&value).ok()
                })
                .unwrap_or_default(),
            None => String::from("<undecoded>"),
        }
    }
}

pub fn print_frames(frames: &[FrameOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                println!(
                    "{}",
                    serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "SYS", "COMP", "MSG", "NAME", "LEN", "FIELDS"]);
            for frame in frames {
                table.add_row(vec![
                    frame.seq.to_string(),
                    frame.sys_id.to_string(),
                    frame.comp_id.to_string(),
                    frame.msg_id.to_string(),
                    frame.name.to_string(),
                    frame.len.to_string(),
                    frame.fields(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "seq={} sys={} comp={} msg={} ({}) len={} {}",
                    frame.seq,
                    frame.sys_id,
                    frame.comp_id,
                    frame.msg_id,
                    frame.name,
                    frame.len,
                    frame.fields()
                );
            }
        }
    }
}

/// Print a single summary record: one JSON object, a two-column table, or
/// `key=value` pairs.
pub fn print_summary<T: Serialize>(summary: &T, format: OutputFormat) {
    let value = serde_json::to_value(summary).unwrap_or_default();
    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            if let Some(object) = value.as_object() {
                for (key, val) in object {
                    table.add_row(vec![key.clone(), val.to_string()]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let pairs: Vec<String> = value
                .as_object()
                .map(|object| object.iter().map(|(k, v)| format!("{k}={v}")).collect())
                .unwrap_or_default();
            println!("{}", pairs.join(" "));
        }
    }
}
