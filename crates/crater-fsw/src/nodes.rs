//! Step units run by the flight executive.

use crater_core::{Node, NodeInfo, Receiver, Sender};
use crater_link::messages::{FswHeartbeat, Sensor6DofImu, SensorStaticPressure, ServoTarget};

/// Adds a fixed offset to every static pressure sample.
pub struct PressureBias {
    info: NodeInfo,
    input: Receiver<SensorStaticPressure>,
    output: Sender<SensorStaticPressure>,
    bias_pa: f32,
}

impl PressureBias {
    pub fn new(
        info: NodeInfo,
        input: Receiver<SensorStaticPressure>,
        output: Sender<SensorStaticPressure>,
        bias_pa: f32,
    ) -> Self {
        Self {
            info,
            input,
            output,
            bias_pa,
        }
    }
}

impl Node for PressureBias {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn step(&mut self) {
        while let Some(sample) = self.input.try_receive() {
            self.output.send(SensorStaticPressure {
                pressure_pa: sample.pressure_pa + self.bias_pa,
                ..sample
            });
        }
    }
}

/// Turns IMU samples into servo commands.
///
/// s1/s2 follow body x/y acceleration and s3/s4 follow body x/y rate, with the
/// sample timestamp carried over.
pub struct ImuServoMixer {
    info: NodeInfo,
    input: Receiver<Sensor6DofImu>,
    output: Sender<ServoTarget>,
}

impl ImuServoMixer {
    pub fn new(
        info: NodeInfo,
        input: Receiver<Sensor6DofImu>,
        output: Sender<ServoTarget>,
    ) -> Self {
        Self {
            info,
            input,
            output,
        }
    }

    pub fn mix(imu: &Sensor6DofImu) -> ServoTarget {
        ServoTarget {
            timestamp_us: imu.timestamp_us,
            s1_target_deg: imu.acc_x_body_m_s2,
            s2_target_deg: imu.acc_y_body_m_s2,
            s3_target_deg: imu.gyro_x_body_rad_s,
            s4_target_deg: imu.gyro_y_body_rad_s,
        }
    }
}

impl Node for ImuServoMixer {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn step(&mut self) {
        while let Some(imu) = self.input.try_receive() {
            self.output.send(Self::mix(&imu));
        }
    }
}

/// Emits an [`FswHeartbeat`] on the first tick and every `every` ticks after.
pub struct Heartbeat {
    info: NodeInfo,
    output: Sender<FswHeartbeat>,
    every: u32,
    ticks: u32,
}

impl Heartbeat {
    /// `every == 0` disables the heartbeat.
    pub fn new(info: NodeInfo, output: Sender<FswHeartbeat>, every: u32) -> Self {
        Self {
            info,
            output,
            every,
            ticks: 0,
        }
    }
}

impl Node for Heartbeat {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn step(&mut self) {
        let tick = self.ticks;
        self.ticks = self.ticks.wrapping_add(1);

        if self.every == 0 || tick % self.every != 0 {
            return;
        }

        self.output.send(FswHeartbeat {
            uptime_us: self.info.context().now().num_us(),
            tick,
            mode: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crater_core::{Bus, Context, Timestamp, VirtualClock};

    use super::*;

    fn ctx() -> (Arc<VirtualClock>, Context) {
        let clock = Arc::new(VirtualClock::new(Timestamp::from_ms(5)));
        (Arc::clone(&clock), Context::new(clock))
    }

    #[test]
    fn pressure_bias_offsets_every_sample() {
        let (_, ctx) = ctx();
        let input = Bus::new();
        let output = Bus::new();
        let tx = input.sender();
        let rx = output.receiver(4);
        let mut node = PressureBias::new(
            NodeInfo::new("pressure_bias", 1, ctx),
            input.receiver(4),
            output.sender(),
            1.0,
        );

        tx.send(SensorStaticPressure {
            timestamp_us: 10,
            pressure_pa: 100.0,
            press_sensor_id: 3,
        });
        tx.send(SensorStaticPressure {
            timestamp_us: 20,
            pressure_pa: 200.0,
            press_sensor_id: 3,
        });
        node.step();

        let first = rx.try_receive().unwrap();
        assert_eq!(first.pressure_pa, 101.0);
        assert_eq!(first.timestamp_us, 10);
        assert_eq!(first.press_sensor_id, 3);
        assert_eq!(rx.try_receive().unwrap().pressure_pa, 201.0);
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn mixer_maps_axes() {
        let imu = Sensor6DofImu {
            timestamp_us: 77,
            acc_x_body_m_s2: 1.0,
            acc_y_body_m_s2: 2.0,
            acc_z_body_m_s2: 3.0,
            gyro_x_body_rad_s: 4.0,
            gyro_y_body_rad_s: 5.0,
            gyro_z_body_rad_s: 6.0,
            imu_id: 0,
        };
        assert_eq!(
            ImuServoMixer::mix(&imu),
            ServoTarget {
                timestamp_us: 77,
                s1_target_deg: 1.0,
                s2_target_deg: 2.0,
                s3_target_deg: 4.0,
                s4_target_deg: 5.0,
            }
        );
    }

    #[test]
    fn heartbeat_period() {
        let (clock, ctx) = ctx();
        let bus = Bus::new();
        let rx = bus.receiver(8);
        let mut node = Heartbeat::new(NodeInfo::new("heartbeat", 3, ctx), bus.sender(), 3);

        for _ in 0..7 {
            node.step();
            clock.advance(1_000);
        }

        let beats: Vec<FswHeartbeat> = std::iter::from_fn(|| rx.try_receive()).collect();
        let ticks: Vec<u32> = beats.iter().map(|b| b.tick).collect();
        assert_eq!(ticks, vec![0, 3, 6]);
        assert_eq!(beats[0].uptime_us, 5_000);
        assert_eq!(beats[1].uptime_us, 5_003);
    }

    #[test]
    fn heartbeat_disabled() {
        let (_, ctx) = ctx();
        let bus = Bus::new();
        let rx = bus.receiver(1);
        let mut node = Heartbeat::new(NodeInfo::new("heartbeat", 3, ctx), bus.sender(), 0);
        node.step();
        node.step();
        assert!(rx.is_empty());
    }
}
