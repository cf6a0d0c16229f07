//! Wire protocol for gamenet.
//!
//! This crate defines the bytes that peers exchange:
//!
//! - **Values** ([`Value`], [`ValueType`]): self-describing typed values,
//!   each a one-byte tag followed by a fixed-size or length-prefixed
//!   payload.
//! - **Packets** ([`Packet`]): a 16-bit message id plus an ordered list of
//!   values, framed with a `u16` length prefix.
//! - **Errors** ([`EncodeError`], [`DecodeError`], [`PacketError`]).
//!
//! The protocol layer does not know about connections or servers; it only
//! turns packets into frames and frames back into packets.
//!
//! ```rust
//! use gamenet_protocol::{Packet, Value};
//!
//! let mut move_cmd = Packet::new(7);
//! move_cmd.add_int(300)?.add(-1.5f32)?.add("north")?;
//!
//! let frame = move_cmd.build()?.to_vec();
//! let received = Packet::load(frame)?;
//! assert_eq!(received.id(), 7);
//! assert_eq!(received.get(0)?, &Value::U16(300));
//! assert_eq!(received.get(2)?.as_str(), Some("north"));
//! # Ok::<(), gamenet_protocol::PacketError>(())
//! ```

mod error;
mod packet;
mod reader;
mod value;

pub use error::{DecodeError, EncodeError, PacketError};
pub use packet::{HEADER_LEN, LENGTH_PREFIX_LEN, MAX_FRAME_LEN, Packet};
pub use reader::Reader;
pub use value::{MAX_VARIABLE_LEN, Value, ValueType};
