//! # OSC Control Module
//!
//! Fire-and-forget control messages to an external visual-effects tool
//! (TouchDesigner's OSC In CHOP) over UDP.
//!
//! ## Wire format
//! OSC 1.0 messages: the address pattern and the type tag string are
//! null-terminated and padded to a multiple of four bytes, followed by the
//! big-endian arguments (`f` float32, `i` int32, `s` padded string).

use std::net::{ToSocketAddrs, UdpSocket};

use tracing::debug;

use crate::error::{LabError, Result};

/// OSC address receiving the tuning error level.
pub const ERROR_ADDRESS: &str = "/simulation/error";
/// OSC address receiving the strike force.
pub const FORCE_ADDRESS: &str = "/simulation/force";

/// Documented range of the tuning error level (0 = perfect, 1 = badly off).
pub const ERROR_LEVEL_RANGE: (f32, f32) = (0.0, 1.0);
/// Documented range of the strike force.
pub const FORCE_RANGE: (f32, f32) = (0.0, 5.0);

/// A single OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Float(f32),
    Int(i32),
    Str(String),
}

impl OscArg {
    fn type_tag(&self) -> char {
        match self {
            Self::Float(_) => 'f',
            Self::Int(_) => 'i',
            Self::Str(_) => 's',
        }
    }
}

/// An OSC message: an address pattern plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    pub fn float(address: impl Into<String>, value: f32) -> Self {
        Self::new(address, vec![OscArg::Float(value)])
    }

    /// Encodes the message into its binary packet.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if !self.address.starts_with('/') {
            return Err(LabError::InvalidParameter {
                name: "address",
                message: format!("OSC address '{}' must start with '/'", self.address),
            });
        }

        let mut packet = Vec::with_capacity(32);
        write_padded_str(&mut packet, &self.address);

        let tags: String = std::iter::once(',')
            .chain(self.args.iter().map(OscArg::type_tag))
            .collect();
        write_padded_str(&mut packet, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Float(v) => packet.extend_from_slice(&v.to_be_bytes()),
                OscArg::Int(v) => packet.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(s) => write_padded_str(&mut packet, s),
            }
        }
        Ok(packet)
    }

    /// Decodes a packet holding a single message.
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut cursor = 0;
        let address = read_padded_str(packet, &mut cursor)?;
        let tags = read_padded_str(packet, &mut cursor)?;
        let Some(tags) = tags.strip_prefix(',') else {
            return Err(malformed("type tag string must start with ','"));
        };

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let arg = match tag {
                'f' => OscArg::Float(f32::from_be_bytes(read_word(packet, &mut cursor)?)),
                'i' => OscArg::Int(i32::from_be_bytes(read_word(packet, &mut cursor)?)),
                's' => OscArg::Str(read_padded_str(packet, &mut cursor)?),
                other => return Err(malformed(&format!("unsupported type tag '{other}'"))),
            };
            args.push(arg);
        }
        Ok(Self { address, args })
    }
}

fn malformed(message: &str) -> LabError {
    LabError::InvalidParameter {
        name: "packet",
        message: message.to_string(),
    }
}

fn write_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    // At least one null terminator, then pad to a 4-byte boundary.
    let padding = 4 - (s.len() % 4);
    buf.extend(std::iter::repeat_n(0u8, padding));
}

fn read_padded_str(packet: &[u8], cursor: &mut usize) -> Result<String> {
    let rest = packet.get(*cursor..).unwrap_or_default();
    let len = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("unterminated string"))?;
    let text = std::str::from_utf8(&rest[..len])
        .map_err(|_| malformed("string is not UTF-8"))?
        .to_string();
    *cursor += len + (4 - len % 4);
    Ok(text)
}

fn read_word(packet: &[u8], cursor: &mut usize) -> Result<[u8; 4]> {
    let bytes = packet
        .get(*cursor..*cursor + 4)
        .ok_or_else(|| malformed("truncated argument"))?;
    *cursor += 4;
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    Ok(word)
}

/// UDP sender bound to one OSC receiver.
#[derive(Debug)]
pub struct OscClient {
    socket: UdpSocket,
    target: String,
}

impl OscClient {
    /// Binds an ephemeral local port and connects it to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let target = format!("{host}:{port}");
        let addr = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| LabError::InvalidParameter {
                name: "host",
                message: format!("could not resolve {target}"),
            })?;
        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(addr)?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn send(&self, message: &OscMessage) -> Result<()> {
        let packet = message.encode()?;
        self.socket.send(&packet)?;
        debug!("sent {} {:?} to {}", message.address, message.args, self.target);
        Ok(())
    }

    pub fn send_float(&self, address: &str, value: f32) -> Result<()> {
        self.send(&OscMessage::float(address, value))
    }
}

/// Tuning simulation remote control for the visual-effects tool.
#[derive(Debug)]
pub struct SimulationControl {
    client: OscClient,
}

impl SimulationControl {
    pub fn new(client: OscClient) -> Self {
        Self { client }
    }

    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Ok(Self::new(OscClient::connect(host, port)?))
    }

    pub fn client(&self) -> &OscClient {
        &self.client
    }

    /// Sends the error level and the strike force, in that order.
    ///
    /// Values outside the documented ranges are forwarded as-is; only
    /// non-finite values are rejected.
    pub fn set_tuning_simulation(&self, error_level: f32, force_intensity: f32) -> Result<String> {
        check_finite("error_level", error_level)?;
        check_finite("force_intensity", force_intensity)?;

        self.client.send_float(ERROR_ADDRESS, error_level)?;
        self.client.send_float(FORCE_ADDRESS, force_intensity)?;
        Ok(format!(
            "TouchDesigner update sent: error={error_level}, force={force_intensity}"
        ))
    }

    /// Sends zero error and zero force.
    pub fn reset_simulation(&self) -> Result<String> {
        self.client.send_float(ERROR_ADDRESS, 0.0)?;
        self.client.send_float(FORCE_ADDRESS, 0.0)?;
        Ok("Simulation reset complete.".to_string())
    }
}

fn check_finite(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LabError::InvalidParameter {
            name,
            message: format!("expected a finite number, got {value}"),
        })
    }
}
