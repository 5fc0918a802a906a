use std::io::{Read, Write};
use std::sync::Arc;

use crater_core::{AnyError, Bus, Clock, Context, Executor, NodeInfo, Timestamp, VirtualClock};
use crater_link::messages::{FswHeartbeat, Sensor6DofImu, SensorStaticPressure, ServoTarget};
use crater_link::{DemuxStats, StreamDemux, StreamMux};

use crate::config::{FswConfig, ValidatedConfig};
use crate::error::Result;
use crate::nodes::{Heartbeat, ImuServoMixer, PressureBias};

/// What one [`FlightExec::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Tick number just completed, starting at 1.
    pub tick: u64,
    /// Input frames delivered to a bus.
    pub delivered: usize,
    /// Output frames written.
    pub written: usize,
}

/// The flight executive: input demux, scheduled nodes, output mux, and the
/// simulated clock they share.
///
/// One call to [`step`](Self::step) is one tick: route every frame in the
/// input, advance the clock by the tick period, run each node once, then
/// write every pending output sample.
pub struct FlightExec {
    config: FswConfig,
    clock: Arc<VirtualClock>,
    demux: StreamDemux,
    executor: Executor,
    mux: StreamMux,
    tick_period_ns: i64,
}

impl FlightExec {
    /// Validate `config` and build an executive from it.
    pub fn from_config(config: FswConfig) -> Result<Self> {
        let validated = config.validate().map_err(AnyError::from)?;
        Self::new(validated)
    }

    pub fn new(config: ValidatedConfig) -> Result<Self> {
        let link = config.link_config();
        let cfg = config.get().clone();
        let cap = cfg.queue_capacity;

        let clock = Arc::new(VirtualClock::new(Timestamp::default()));
        let ctx = Context::new(Arc::clone(&clock) as Arc<dyn Clock>);

        let raw_pressure = Bus::<SensorStaticPressure>::new();
        let biased_pressure = Bus::<SensorStaticPressure>::new();
        let imu = Bus::<Sensor6DofImu>::new();
        let servo = Bus::<ServoTarget>::new();
        let heartbeat = Bus::<FswHeartbeat>::new();

        let mut demux = StreamDemux::with_config(link);
        demux.add_route(
            raw_pressure.sender(),
            cfg.input_system_id,
            cfg.input_component_id,
        )?;
        demux.add_route(imu.sender(), cfg.input_system_id, cfg.input_component_id)?;

        let mut executor = Executor::new();
        executor.add_node(Box::new(PressureBias::new(
            NodeInfo::new("pressure_bias", 0, ctx.clone()),
            raw_pressure.receiver(cap),
            biased_pressure.sender(),
            cfg.pressure_bias_pa,
        )));
        executor.add_node(Box::new(ImuServoMixer::new(
            NodeInfo::new("imu_servo_mixer", 1, ctx.clone()),
            imu.receiver(cap),
            servo.sender(),
        )));
        executor.add_node(Box::new(Heartbeat::new(
            NodeInfo::new("heartbeat", 2, ctx),
            heartbeat.sender(),
            cfg.heartbeat_every_ticks,
        )));

        let mut mux = StreamMux::new();
        let (sys, comp) = (cfg.output_system_id, cfg.output_component_id);
        mux.add_channel(biased_pressure.receiver(cap), sys, comp);
        mux.add_channel(servo.receiver(cap), sys, comp);
        mux.add_channel(heartbeat.receiver(cap), sys, comp);

        tracing::debug!(
            nodes = executor.len(),
            routes = demux.route_count(),
            channels = mux.channel_count(),
            queue_capacity = cap,
            tick_period_us = cfg.tick_period_us,
            "flight executive wired"
        );

        // validate() caps the period well inside the nanosecond range.
        let tick_period_ns = cfg.tick_period_us as i64 * 1_000;

        Ok(Self {
            config: cfg,
            clock,
            demux,
            executor,
            mux,
            tick_period_ns,
        })
    }

    /// Run one tick over an input buffer. `output` is cleared, then filled
    /// with every frame produced during the tick.
    pub fn step(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<StepReport> {
        output.clear();
        let mut input = input;
        self.step_io(&mut input, output)
    }

    /// Run one tick reading from `input` until it is drained and writing to
    /// `output`.
    pub fn step_io<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<StepReport> {
        let delivered = self.demux.process(input)?;
        let now = self.clock.advance(self.tick_period_ns);
        self.executor.step();
        let written = self.mux.process(output)?;

        let report = StepReport {
            tick: self.executor.ticks(),
            delivered,
            written,
        };
        tracing::trace!(
            tick = report.tick,
            now_us = now.num_us(),
            delivered,
            written,
            "tick"
        );
        Ok(report)
    }

    pub fn config(&self) -> &FswConfig {
        &self.config
    }

    /// Simulated time of the last tick.
    pub fn now(&self) -> Timestamp {
        self.clock.timestamp()
    }

    pub fn ticks(&self) -> u64 {
        self.executor.ticks()
    }

    pub fn demux_stats(&self) -> DemuxStats {
        self.demux.stats()
    }

    pub fn frames_written(&self) -> u64 {
        self.mux.frames_written()
    }
}

impl std::fmt::Debug for FlightExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightExec")
            .field("executor", &self.executor)
            .field("demux", &self.demux)
            .field("mux", &self.mux)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crater_core::{ErrorCode, ErrorValue};
    use crater_link::{AnyMessage, FrameParser, Parsed, RawFrame};

    use super::*;
    use crate::config::{ConfigIssue, MAX_TICK_PERIOD_US};
    use crate::error::FswError;

    fn quiet() -> FswConfig {
        FswConfig {
            heartbeat_every_ticks: 0,
            ..FswConfig::default()
        }
    }

    fn decode_all(bytes: &[u8]) -> Vec<(RawFrame, AnyMessage)> {
        let mut parser = FrameParser::new();
        bytes
            .iter()
            .filter_map(|&b| match parser.push(b) {
                Parsed::Frame(f) => {
                    let msg = AnyMessage::decode(&f).unwrap();
                    Some((f, msg))
                }
                _ => None,
            })
            .collect()
    }

    fn imu(ts: i64) -> Sensor6DofImu {
        Sensor6DofImu {
            timestamp_us: ts,
            acc_x_body_m_s2: 1.0,
            acc_y_body_m_s2: 2.0,
            acc_z_body_m_s2: 3.0,
            gyro_x_body_rad_s: 4.0,
            gyro_y_body_rad_s: 5.0,
            gyro_z_body_rad_s: 6.0,
            imu_id: 1,
        }
    }

    #[test]
    fn imu_in_servo_out() {
        let mut exec = FlightExec::from_config(quiet()).unwrap();
        let input = RawFrame::from_message(&imu(123), 0, 1, 1).to_bytes();

        let mut out = Vec::new();
        let report = exec.step(&input, &mut out).unwrap();
        assert_eq!(report, StepReport { tick: 1, delivered: 1, written: 1 });

        let frames = decode_all(&out);
        assert_eq!(frames.len(), 1);
        let (frame, msg) = &frames[0];
        assert_eq!(frame.sys_id(), 1);
        assert_eq!(frame.comp_id(), 2);
        assert_eq!(
            msg,
            &AnyMessage::ServoTarget(ServoTarget {
                timestamp_us: 123,
                s1_target_deg: 1.0,
                s2_target_deg: 2.0,
                s3_target_deg: 4.0,
                s4_target_deg: 5.0,
            })
        );
    }

    #[test]
    fn pressure_is_biased() {
        let mut exec = FlightExec::from_config(quiet()).unwrap();
        let sample = SensorStaticPressure {
            timestamp_us: 9,
            pressure_pa: 1000.0,
            press_sensor_id: 2,
        };
        let input = RawFrame::from_message(&sample, 0, 1, 1).to_bytes();

        let mut out = Vec::new();
        exec.step(&input, &mut out).unwrap();

        let frames = decode_all(&out);
        assert_eq!(
            frames[0].1,
            AnyMessage::SensorStaticPressure(SensorStaticPressure {
                pressure_pa: 1001.0,
                ..sample
            })
        );
    }

    #[test]
    fn frames_from_other_components_are_ignored() {
        let mut exec = FlightExec::from_config(quiet()).unwrap();
        let input = RawFrame::from_message(&imu(1), 0, 1, 3).to_bytes();

        let mut out = Vec::new();
        let report = exec.step(&input, &mut out).unwrap();
        assert_eq!(report.delivered, 0);
        assert!(out.is_empty());
        assert_eq!(exec.demux_stats().unrouted, 1);
    }

    #[test]
    fn empty_input_advances_clock() {
        let mut exec = FlightExec::from_config(quiet()).unwrap();
        let mut out = vec![0xAA];

        exec.step(&[], &mut out).unwrap();
        exec.step(&[], &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(exec.ticks(), 2);
        assert_eq!(exec.now().num_us(), 20_000);
    }

    #[test]
    fn longest_tick_period_runs_many_ticks() {
        let mut exec = FlightExec::from_config(FswConfig {
            tick_period_us: MAX_TICK_PERIOD_US,
            ..quiet()
        })
        .unwrap();
        let mut out = Vec::new();

        for _ in 0..1_000 {
            exec.step(&[], &mut out).unwrap();
        }
        assert_eq!(exec.now().num_us(), 1_000 * MAX_TICK_PERIOD_US as i64);
    }

    #[test]
    fn overlong_tick_period_is_refused() {
        let err = FlightExec::from_config(FswConfig {
            tick_period_us: 9_223_372_036_854_775,
            ..quiet()
        })
        .unwrap_err();
        assert!(matches!(err, FswError::Config(_)));
    }

    #[test]
    fn heartbeat_carries_clock() {
        let cfg = FswConfig {
            heartbeat_every_ticks: 2,
            ..FswConfig::default()
        };
        let mut exec = FlightExec::from_config(cfg).unwrap();
        let mut beats = Vec::new();
        let mut out = Vec::new();
        for _ in 0..4 {
            exec.step(&[], &mut out).unwrap();
            beats.extend(decode_all(&out).into_iter().map(|(_, m)| m));
        }

        assert_eq!(
            beats,
            vec![
                AnyMessage::FswHeartbeat(FswHeartbeat {
                    uptime_us: 10_000,
                    tick: 0,
                    mode: 0,
                }),
                AnyMessage::FswHeartbeat(FswHeartbeat {
                    uptime_us: 30_000,
                    tick: 2,
                    mode: 0,
                }),
            ]
        );
    }

    #[test]
    fn split_frame_across_steps() {
        let mut exec = FlightExec::from_config(quiet()).unwrap();
        let input = RawFrame::from_message(&imu(5), 0, 1, 1).to_bytes();
        let (head, tail) = input.split_at(11);

        let mut out = Vec::new();
        assert_eq!(exec.step(head, &mut out).unwrap().delivered, 0);
        assert_eq!(exec.step(tail, &mut out).unwrap().delivered, 1);
        assert_eq!(decode_all(&out).len(), 1);
    }

    #[test]
    fn output_order_follows_channel_registration() {
        let mut exec = FlightExec::from_config(FswConfig::default()).unwrap();
        let mut input = RawFrame::from_message(&imu(1), 0, 1, 1).to_bytes();
        input.extend(
            RawFrame::from_message(&SensorStaticPressure::default(), 1, 1, 1).to_bytes(),
        );

        let mut out = Vec::new();
        exec.step(&input, &mut out).unwrap();

        let ids: Vec<u32> = decode_all(&out).iter().map(|(f, _)| f.msg_id()).collect();
        assert_eq!(ids, vec![100, 200, 1]);
        let seqs: Vec<u8> = decode_all(&out).iter().map(|(f, _)| f.seq()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn invalid_config_downcasts_to_issue() {
        let err = FlightExec::from_config(FswConfig {
            queue_capacity: 0,
            ..FswConfig::default()
        })
        .unwrap_err();

        let any = match err {
            FswError::Config(any) => any,
            other => panic!("expected config error, got {other:?}"),
        };
        assert_eq!(any.code(), ErrorCode::InvalidConfig);
        let issue = any
            .downcast_ref::<ErrorValue<ConfigIssue>>()
            .expect("config issue");
        assert_eq!(issue.data().field, "queue_capacity");
    }
}
