//! The crater message dialect.
//!
//! Payload fields are listed in wire order (largest primitive first), which
//! is also the order `serialize`/`deserialize` walk them.
//!
//! The `crc_extra` seeds are fixed per message and assigned by hand; they are
//! not computed from the field lists the way mavgen derives them. Peers must
//! use this table, not values generated from an XML definition.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::codec::RawFrame;
use crate::message::{Message, MessageMeta};

/// System id used by the vehicle.
pub const SYSTEM_ID: u8 = 1;

/// System id used by ground tooling.
pub const GROUND_SYSTEM_ID: u8 = 255;

/// Component ids on the crater link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComponentId {
    Rocket = 1,
    Fsw = 2,
    Ground = 3,
}

impl From<ComponentId> for u8 {
    fn from(id: ComponentId) -> Self {
        id as u8
    }
}

/// Periodic liveness report from the flight executive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FswHeartbeat {
    pub uptime_us: i64,
    pub tick: u32,
    pub mode: u8,
}

impl Message for FswHeartbeat {
    const META: MessageMeta = MessageMeta {
        id: 1,
        name: "FSW_HEARTBEAT",
        min_length: 13,
        length: 13,
        crc_extra: 62,
    };

    fn serialize(&self, mut payload: &mut [u8]) {
        payload.put_i64_le(self.uptime_us);
        payload.put_u32_le(self.tick);
        payload.put_u8(self.mode);
    }

    fn deserialize(mut payload: &[u8]) -> Self {
        Self {
            uptime_us: payload.get_i64_le(),
            tick: payload.get_u32_le(),
            mode: payload.get_u8(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorStaticPressure {
    pub timestamp_us: i64,
    pub pressure_pa: f32,
    pub press_sensor_id: u8,
}

impl Message for SensorStaticPressure {
    const META: MessageMeta = MessageMeta {
        id: 100,
        name: "SENSOR_STATIC_PRESSURE",
        min_length: 13,
        length: 13,
        crc_extra: 17,
    };

    fn serialize(&self, mut payload: &mut [u8]) {
        payload.put_i64_le(self.timestamp_us);
        payload.put_f32_le(self.pressure_pa);
        payload.put_u8(self.press_sensor_id);
    }

    fn deserialize(mut payload: &[u8]) -> Self {
        Self {
            timestamp_us: payload.get_i64_le(),
            pressure_pa: payload.get_f32_le(),
            press_sensor_id: payload.get_u8(),
        }
    }
}

/// Body-frame accelerometer and gyroscope sample. NaN marks an axis as
/// unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sensor6DofImu {
    pub timestamp_us: i64,
    pub acc_x_body_m_s2: f32,
    pub acc_y_body_m_s2: f32,
    pub acc_z_body_m_s2: f32,
    pub gyro_x_body_rad_s: f32,
    pub gyro_y_body_rad_s: f32,
    pub gyro_z_body_rad_s: f32,
    pub imu_id: u8,
}

impl Message for Sensor6DofImu {
    const META: MessageMeta = MessageMeta {
        id: 101,
        name: "SENSOR_6DOF_IMU",
        min_length: 33,
        length: 33,
        crc_extra: 208,
    };

    fn serialize(&self, mut payload: &mut [u8]) {
        payload.put_i64_le(self.timestamp_us);
        payload.put_f32_le(self.acc_x_body_m_s2);
        payload.put_f32_le(self.acc_y_body_m_s2);
        payload.put_f32_le(self.acc_z_body_m_s2);
        payload.put_f32_le(self.gyro_x_body_rad_s);
        payload.put_f32_le(self.gyro_y_body_rad_s);
        payload.put_f32_le(self.gyro_z_body_rad_s);
        payload.put_u8(self.imu_id);
    }

    fn deserialize(mut payload: &[u8]) -> Self {
        Self {
            timestamp_us: payload.get_i64_le(),
            acc_x_body_m_s2: payload.get_f32_le(),
            acc_y_body_m_s2: payload.get_f32_le(),
            acc_z_body_m_s2: payload.get_f32_le(),
            gyro_x_body_rad_s: payload.get_f32_le(),
            gyro_y_body_rad_s: payload.get_f32_le(),
            gyro_z_body_rad_s: payload.get_f32_le(),
            imu_id: payload.get_u8(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorMagnetometer {
    pub timestamp_us: i64,
    pub field_body_gauss: [f32; 3],
    pub mag_sensor_id: u8,
}

impl Message for SensorMagnetometer {
    const META: MessageMeta = MessageMeta {
        id: 102,
        name: "SENSOR_MAGNETOMETER",
        min_length: 21,
        length: 21,
        crc_extra: 154,
    };

    fn serialize(&self, mut payload: &mut [u8]) {
        payload.put_i64_le(self.timestamp_us);
        for axis in self.field_body_gauss {
            payload.put_f32_le(axis);
        }
        payload.put_u8(self.mag_sensor_id);
    }

    fn deserialize(mut payload: &[u8]) -> Self {
        let timestamp_us = payload.get_i64_le();
        let mut field_body_gauss = [0.0f32; 3];
        for axis in &mut field_body_gauss {
            *axis = payload.get_f32_le();
        }
        Self {
            timestamp_us,
            field_body_gauss,
            mag_sensor_id: payload.get_u8(),
        }
    }
}

/// Commanded fin deflections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoTarget {
    pub timestamp_us: i64,
    pub s1_target_deg: f32,
    pub s2_target_deg: f32,
    pub s3_target_deg: f32,
    pub s4_target_deg: f32,
}

impl Message for ServoTarget {
    const META: MessageMeta = MessageMeta {
        id: 200,
        name: "SERVO_TARGET",
        min_length: 24,
        length: 24,
        crc_extra: 101,
    };

    fn serialize(&self, mut payload: &mut [u8]) {
        payload.put_i64_le(self.timestamp_us);
        payload.put_f32_le(self.s1_target_deg);
        payload.put_f32_le(self.s2_target_deg);
        payload.put_f32_le(self.s3_target_deg);
        payload.put_f32_le(self.s4_target_deg);
    }

    fn deserialize(mut payload: &[u8]) -> Self {
        Self {
            timestamp_us: payload.get_i64_le(),
            s1_target_deg: payload.get_f32_le(),
            s2_target_deg: payload.get_f32_le(),
            s3_target_deg: payload.get_f32_le(),
            s4_target_deg: payload.get_f32_le(),
        }
    }
}

/// Link self-test message; its id needs all three msgid bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestMessage {
    pub field2: f32,
    pub field1: u16,
}

impl Message for TestMessage {
    const META: MessageMeta = MessageMeta {
        id: 42000,
        name: "TEST_MESSAGE",
        min_length: 6,
        length: 6,
        crc_extra: 81,
    };

    fn serialize(&self, mut payload: &mut [u8]) {
        payload.put_f32_le(self.field2);
        payload.put_u16_le(self.field1);
    }

    fn deserialize(mut payload: &[u8]) -> Self {
        Self {
            field2: payload.get_f32_le(),
            field1: payload.get_u16_le(),
        }
    }
}

/// Every message of the dialect, sorted by id.
pub static MESSAGES: &[MessageMeta] = &[
    FswHeartbeat::META,
    SensorStaticPressure::META,
    Sensor6DofImu::META,
    SensorMagnetometer::META,
    ServoTarget::META,
    TestMessage::META,
];

/// Find the metadata for `id`.
pub fn lookup(id: u32) -> Option<&'static MessageMeta> {
    MESSAGES
        .binary_search_by_key(&id, |meta| meta.id)
        .ok()
        .map(|idx| &MESSAGES[idx])
}

/// Any message of the dialect, for tools that handle arbitrary frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnyMessage {
    FswHeartbeat(FswHeartbeat),
    SensorStaticPressure(SensorStaticPressure),
    Sensor6DofImu(Sensor6DofImu),
    SensorMagnetometer(SensorMagnetometer),
    ServoTarget(ServoTarget),
    TestMessage(TestMessage),
}

impl AnyMessage {
    /// Decode a validated frame into whichever message its id names.
    pub fn decode(frame: &RawFrame) -> Option<Self> {
        frame
            .decode()
            .map(Self::FswHeartbeat)
            .or_else(|| frame.decode().map(Self::SensorStaticPressure))
            .or_else(|| frame.decode().map(Self::Sensor6DofImu))
            .or_else(|| frame.decode().map(Self::SensorMagnetometer))
            .or_else(|| frame.decode().map(Self::ServoTarget))
            .or_else(|| frame.decode().map(Self::TestMessage))
    }

    pub fn meta(&self) -> &'static MessageMeta {
        match self {
            Self::FswHeartbeat(_) => &FswHeartbeat::META,
            Self::SensorStaticPressure(_) => &SensorStaticPressure::META,
            Self::Sensor6DofImu(_) => &Sensor6DofImu::META,
            Self::SensorMagnetometer(_) => &SensorMagnetometer::META,
            Self::ServoTarget(_) => &ServoTarget::META,
            Self::TestMessage(_) => &TestMessage::META,
        }
    }

    pub fn to_frame(&self, seq: u8, sys_id: u8, comp_id: u8) -> RawFrame {
        match self {
            Self::FswHeartbeat(m) => RawFrame::from_message(m, seq, sys_id, comp_id),
            Self::SensorStaticPressure(m) => RawFrame::from_message(m, seq, sys_id, comp_id),
            Self::Sensor6DofImu(m) => RawFrame::from_message(m, seq, sys_id, comp_id),
            Self::SensorMagnetometer(m) => RawFrame::from_message(m, seq, sys_id, comp_id),
            Self::ServoTarget(m) => RawFrame::from_message(m, seq, sys_id, comp_id),
            Self::TestMessage(m) => RawFrame::from_message(m, seq, sys_id, comp_id),
        }
    }
}
