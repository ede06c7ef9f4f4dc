// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Joint selection and UDP packaging.
//!
//! Each frame with a detected person becomes one datagram. Delivery is fire
//! and forget: there are no acknowledgements, retries or sequence numbers, and
//! the next frame supersedes a lost one.

use std::fmt;
use std::fmt::Write as _;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{PoseError, Result};
use crate::landmark::{LandmarkSet, PoseLandmark};

/// Default destination for joint datagrams.
pub const DEFAULT_DESTINATION: &str = "127.0.0.1:5055";

/// Joints forwarded to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedJoint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
}

impl TrackedJoint {
    /// All tracked joints in wire order.
    pub const ALL: [Self; 8] = [
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
    ];

    /// The pose landmark this joint reads from.
    #[must_use]
    pub const fn landmark(self) -> PoseLandmark {
        match self {
            Self::LeftShoulder => PoseLandmark::LeftShoulder,
            Self::RightShoulder => PoseLandmark::RightShoulder,
            Self::LeftElbow => PoseLandmark::LeftElbow,
            Self::RightElbow => PoseLandmark::RightElbow,
            Self::LeftWrist => PoseLandmark::LeftWrist,
            Self::RightWrist => PoseLandmark::RightWrist,
            Self::LeftHip => PoseLandmark::LeftHip,
            Self::RightHip => PoseLandmark::RightHip,
        }
    }

    /// Key used in the JSON payload.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.landmark().name()
    }
}

/// Coordinate system of the transmitted positions.
///
/// Landmarks are normalized image coordinates: origin at the top-left corner,
/// x to the right, y downward, as seen by the camera (not mirrored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateConvention {
    /// Send image coordinates unchanged.
    #[default]
    Image,
    /// Send `1 - y` so the origin is bottom-left and y points up.
    FlipY,
}

impl CoordinateConvention {
    /// Map a normalized image position into this convention.
    #[must_use]
    pub fn apply(self, x: f32, y: f32) -> [f32; 2] {
        match self {
            Self::Image => [x, y],
            Self::FlipY => [x, 1.0 - y],
        }
    }
}

/// Text encoding of a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// JSON object mapping the 8 tracked joint names to `[x, y]`.
    #[default]
    Json,
    /// All 33 landmarks as `index:x,y,z` entries separated by `|`.
    Indexed,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Indexed => write!(f, "indexed"),
        }
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "indexed" | "pipe" => Ok(Self::Indexed),
            other => Err(format!("Unknown wire format: {other}")),
        }
    }
}

/// Positions of the tracked joints for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPacket {
    joints: [(TrackedJoint, [f32; 2]); 8],
}

impl JointPacket {
    /// Select the tracked joints from a landmark set.
    #[must_use]
    pub fn from_landmarks(landmarks: &LandmarkSet, convention: CoordinateConvention) -> Self {
        let joints = TrackedJoint::ALL.map(|joint| {
            let lm = &landmarks[joint.landmark()];
            (joint, convention.apply(lm.x, lm.y))
        });
        Self { joints }
    }

    /// Position of one joint.
    #[must_use]
    pub fn get(&self, joint: TrackedJoint) -> [f32; 2] {
        self.joints
            .iter()
            .find(|(j, _)| *j == joint)
            .map_or([0.0, 0.0], |(_, xy)| *xy)
    }

    /// Iterate over `(joint, [x, y])` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &(TrackedJoint, [f32; 2])> {
        self.joints.iter()
    }

    /// Serialize to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is NaN or infinite, since JSON has
    /// no number for it.
    pub fn to_json(&self) -> Result<String> {
        let invalid = self
            .joints
            .iter()
            .find(|(_, xy)| !xy.iter().all(|v| v.is_finite()));
        if let Some((joint, xy)) = invalid {
            return Err(PoseError::SerializationError(format!(
                "Non-finite coordinate for {}: {xy:?}",
                joint.name()
            )));
        }
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for JointPacket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.joints.len()))?;
        for (joint, xy) in &self.joints {
            map.serialize_entry(joint.name(), xy)?;
        }
        map.end()
    }
}

/// Encode every landmark as `index:x,y,z` joined by `|`.
#[must_use]
pub fn encode_indexed(landmarks: &LandmarkSet, convention: CoordinateConvention) -> String {
    let mut out = String::with_capacity(landmarks.len() * 24);
    for (i, lm) in landmarks.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        let [x, y] = convention.apply(lm.x, lm.y);
        let _ = write!(out, "{i}:{x},{y},{}", lm.z);
    }
    out
}

/// Sends one datagram per detected frame to a fixed destination.
#[derive(Debug)]
pub struct UdpEmitter {
    socket: UdpSocket,
    destination: SocketAddr,
    format: WireFormat,
    convention: CoordinateConvention,
}

impl UdpEmitter {
    /// Bind an ephemeral local socket for sending to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(destination: SocketAddr) -> Result<Self> {
        let bind_addr: SocketAddr = if destination.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        Ok(Self {
            socket,
            destination,
            format: WireFormat::default(),
            convention: CoordinateConvention::default(),
        })
    }

    /// Set the payload encoding.
    #[must_use]
    pub const fn with_format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the coordinate convention.
    #[must_use]
    pub const fn with_convention(mut self, convention: CoordinateConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Destination address.
    #[must_use]
    pub const fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Encode a landmark set into the configured wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON coordinate is not finite.
    pub fn encode(&self, landmarks: &LandmarkSet) -> Result<String> {
        match self.format {
            WireFormat::Json => JointPacket::from_landmarks(landmarks, self.convention).to_json(),
            WireFormat::Indexed => Ok(encode_indexed(landmarks, self.convention)),
        }
    }

    /// Encode and send one datagram. Returns the payload that was sent.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the send call fails.
    pub fn send(&self, landmarks: &LandmarkSet) -> Result<String> {
        let payload = self.encode(landmarks)?;
        let sent = self.socket.send_to(payload.as_bytes(), self.destination)?;
        if sent != payload.len() {
            return Err(PoseError::Io(std::io::Error::other(format!(
                "Datagram truncated: sent {sent} of {} bytes",
                payload.len()
            ))));
        }
        Ok(payload)
    }
}
