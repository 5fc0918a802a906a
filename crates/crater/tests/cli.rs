#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "crater-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn crater(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crater"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("crater should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8(output.stdout.clone())
        .expect("stdout should be UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect()
}

#[test]
fn encode_then_decode() {
    let dir = unique_temp_dir("codec");
    let frames = dir.join("frames.bin");
    let frames_arg = frames.to_str().unwrap();

    let output = crater(&[
        "encode",
        "--json",
        r#"[{"type": "TestMessage", "field1": 513, "field2": 2.5},
            {"type": "SensorStaticPressure", "pressure_pa": 101325.0}]"#,
        "--seq",
        "7",
        "-o",
        frames_arg,
    ]);
    assert!(output.status.success(), "encode failed: {output:?}");

    let output = crater(&["--format", "json", "decode", frames_arg]);
    assert!(output.status.success(), "decode failed: {output:?}");

    let records = json_lines(&output);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["seq"], 7);
    assert_eq!(records[0]["msg_id"], 42000);
    assert_eq!(records[0]["message"]["field1"], 513);
    assert_eq!(records[1]["seq"], 8);
    assert_eq!(records[1]["name"], "SENSOR_STATIC_PRESSURE");
    assert_eq!(records[1]["message"]["pressure_pa"], 101325.0);
}

#[test]
fn step_turns_imu_into_servo() {
    let dir = unique_temp_dir("step");
    let input = dir.join("in.bin");
    let output_path = dir.join("out.bin");
    let config = dir.join("fsw.json");
    std::fs::write(&config, r#"{"heartbeat_every_ticks": 0}"#).unwrap();

    let imu = serde_json::json!({
        "type": "Sensor6DofImu",
        "timestamp_us": 99,
        "acc_x_body_m_s2": 1.5,
        "gyro_y_body_rad_s": -0.5,
    })
    .to_string();
    let output = crater(&[
        "encode",
        "--json",
        imu.as_str(),
        "-o",
        input.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "encode failed: {output:?}");

    let output = crater(&[
        "--format",
        "json",
        "step",
        "--config",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "step failed: {output:?}");
    let summary = &json_lines(&output)[0];
    assert_eq!(summary["ticks"], 1);
    assert_eq!(summary["delivered"], 1);
    assert_eq!(summary["written"], 1);
    assert_eq!(summary["now_us"], 10_000);

    let output = crater(&["--format", "json", "decode", output_path.to_str().unwrap()]);
    let records = json_lines(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["comp_id"], 2);
    assert_eq!(records[0]["message"]["type"], "ServoTarget");
    assert_eq!(records[0]["message"]["timestamp_us"], 99);
    assert_eq!(records[0]["message"]["s1_target_deg"], 1.5);
    assert_eq!(records[0]["message"]["s4_target_deg"], -0.5);
}

#[test]
fn run_with_tick_limit_emits_heartbeats() {
    let dir = unique_temp_dir("run");
    let out = dir.join("out.bin");
    let config = dir.join("fsw.json");
    std::fs::write(&config, r#"{"heartbeat_every_ticks": 3}"#).unwrap();

    let output = crater(&[
        "--format",
        "json",
        "run",
        "--config",
        config.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--ticks",
        "7",
    ]);
    assert!(output.status.success(), "run failed: {output:?}");
    assert_eq!(json_lines(&output)[0]["ticks"], 7);

    let output = crater(&["--format", "json", "decode", out.to_str().unwrap()]);
    let ticks: Vec<u64> = json_lines(&output)
        .iter()
        .map(|r| r["message"]["tick"].as_u64().unwrap())
        .collect();
    assert_eq!(ticks, vec![0, 3, 6]);
}

#[test]
fn invalid_config_exits_with_config_code() {
    let dir = unique_temp_dir("config");
    let config = dir.join("fsw.json");
    let input = dir.join("in.bin");
    std::fs::write(&config, r#"{"queue_capacity": 0}"#).unwrap();
    std::fs::write(&input, b"").unwrap();

    let output = crater(&[
        "step",
        "--config",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        dir.join("out.bin").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(78));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("queue_capacity"), "stderr: {stderr}");
}

#[test]
fn decode_of_garbage_is_data_invalid() {
    let dir = unique_temp_dir("garbage");
    let path = dir.join("noise.bin");
    std::fs::write(&path, [0x00, 0x11, 0x22, 0x33]).unwrap();

    let output = crater(&["decode", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn missing_input_is_no_input() {
    let output = crater(&["decode", "/nonexistent/crater/frames.bin"]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn version_prints_package_version() {
    let output = crater(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("crater {}", env!("CARGO_PKG_VERSION")));
}
