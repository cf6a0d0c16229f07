//! Packet framing.
//!
//! A packet is a 16-bit message id plus an ordered list of [`Value`]s. Its
//! frame is:
//!
//! ```text
//! u16 frame length   LE, byte count of the whole frame including this prefix
//! u16 packet id      LE
//! value...           see the value module for the per-value layout
//! ```
//!
//! Frames are built once and cached. A packet that has a frame (because it
//! was built, or because it was loaded from the network) is sealed: its
//! values can no longer change, so the cached bytes never go stale.

use std::sync::OnceLock;

use crate::{DecodeError, EncodeError, PacketError, Reader, Value};

/// Size of the frame length prefix.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Length prefix plus packet id: the size of an empty packet's frame.
pub const HEADER_LEN: usize = 4;

/// Largest frame the `u16` length prefix can describe.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// One application-level message.
#[derive(Debug, Clone, Default)]
pub struct Packet {
    id: u16,
    values: Vec<Value>,
    frame: OnceLock<Vec<u8>>,
}

impl Packet {
    /// Creates an empty outbound packet.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            values: Vec::new(),
            frame: OnceLock::new(),
        }
    }

    /// Creates an outbound packet from values already in order.
    pub fn with_values(id: u16, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            id,
            values: values.into_iter().collect(),
            frame: OnceLock::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `true` once the packet has a frame and can no longer be changed.
    pub fn is_sealed(&self) -> bool {
        self.frame.get().is_some()
    }

    /// Appends a value. Booleans arrive here as `u8` through
    /// `From<bool> for Value`.
    ///
    /// # Errors
    /// [`PacketError::Sealed`] if the packet was already built or loaded.
    pub fn add(&mut self, value: impl Into<Value>) -> Result<&mut Self, PacketError> {
        if self.is_sealed() {
            return Err(PacketError::Sealed { id: self.id });
        }
        self.values.push(value.into());
        Ok(self)
    }

    /// Appends an integer using the narrowest wire type that holds it.
    pub fn add_int(&mut self, n: i64) -> Result<&mut Self, PacketError> {
        let value = Value::narrow(n)?;
        self.add(value)
    }

    /// Positional access into the value list.
    pub fn get(&self, index: usize) -> Result<&Value, PacketError> {
        self.values.get(index).ok_or(PacketError::Index {
            index,
            len: self.values.len(),
        })
    }

    /// Returns the frame, serializing it on first use.
    ///
    /// Safe to call from several tasks through a shared reference; the
    /// frame is computed at most once per successful build.
    pub fn build(&self) -> Result<&[u8], PacketError> {
        if let Some(frame) = self.frame.get() {
            return Ok(frame);
        }
        let encoded = self.encode_frame()?;
        Ok(self.frame.get_or_init(|| encoded))
    }

    fn encode_frame(&self) -> Result<Vec<u8>, EncodeError> {
        let body: usize = self.values.iter().map(Value::encoded_len).sum();
        let mut frame = Vec::with_capacity(HEADER_LEN + body);
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(&self.id.to_le_bytes());
        for value in &self.values {
            value.encode(&mut frame)?;
        }

        let total =
            u16::try_from(frame.len()).map_err(|_| EncodeError::FrameTooLarge(frame.len()))?;
        frame[..LENGTH_PREFIX_LEN].copy_from_slice(&total.to_le_bytes());
        Ok(frame)
    }

    /// Reconstructs a packet from one received frame.
    ///
    /// The returned packet is sealed and keeps `bytes` as its frame.
    ///
    /// # Errors
    /// - [`DecodeError::Truncated`] if there is no complete length prefix.
    /// - [`DecodeError::LengthMismatch`] if the prefix disagrees with the
    ///   buffer length.
    /// - [`DecodeError::FrameCorrupt`] if the frame has no room for an id or
    ///   ends inside a value.
    /// - [`DecodeError::UnknownType`], [`DecodeError::UnsupportedType`] or
    ///   [`DecodeError::InvalidUtf8`] for a bad value.
    pub fn load(bytes: impl Into<Vec<u8>>) -> Result<Self, PacketError> {
        let bytes = bytes.into();
        let (id, values) = parse_frame(&bytes)?;
        Ok(Self {
            id,
            values,
            frame: OnceLock::from(bytes),
        })
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Packets compare by id and values; whether a frame is cached does not
/// matter.
impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.values == other.values
    }
}

fn parse_frame(bytes: &[u8]) -> Result<(u16, Vec<Value>), DecodeError> {
    let mut reader = Reader::new(bytes);
    let declared = usize::from(reader.read_u16_le()?);
    let actual = bytes.len();

    // Peers built against the legacy layout count only what follows the
    // prefix; both forms describe the same buffer.
    if declared != actual && declared != actual - LENGTH_PREFIX_LEN {
        return Err(DecodeError::LengthMismatch { declared, actual });
    }
    if reader.remaining() < 2 {
        return Err(DecodeError::FrameCorrupt {
            offset: LENGTH_PREFIX_LEN,
            reason: "no room for the packet id",
        });
    }
    let id = reader.read_u16_le()?;

    let mut values = Vec::new();
    while !reader.is_empty() {
        let offset = reader.position();
        match Value::decode(&mut reader) {
            Ok((value, _)) => values.push(value),
            Err(DecodeError::Truncated { .. }) => {
                return Err(DecodeError::FrameCorrupt {
                    offset,
                    reason: "value runs past the end of the frame",
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok((id, values))
}
