//! `ActionMessage`: the uniform frame exchanged on every link of the broker tree
//! (spec.md §4.1, §6). This is the *only* inter-component vocabulary — transports,
//! brokers, and cores never pass any other shape of data between themselves.

use bytes::{Buf, BufMut, BytesMut};
use tinymap::Key;

use crate::{ids::InterfaceHandle, FederateId, MessageId, Time};

/// Magic number `"HELC"`, little-endian, at offset 0 of every frame.
pub const MAGIC: u32 = 0x4845_4C43;

/// Size in bytes of the fixed frame header, not including the payload.
pub const HEADER_LEN: usize = 48;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short: need at least {need} bytes, have {have}")]
    TooShort { need: usize, have: usize },
    #[error("bad magic number: {0:#x}")]
    BadMagic(u32),
    #[error("unknown action code: {0}")]
    UnknownAction(u32),
    #[error("payload length {declared} exceeds available bytes {available}")]
    TruncatedPayload { declared: usize, available: usize },
}

/// The action codes carried in an [`ActionMessage`] (spec.md §6 "Action codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Action {
    RegisterCore = 0,
    RegisterBroker = 1,
    RegisterFederate = 2,
    RegisterPublication = 3,
    RegisterInput = 4,
    RegisterEndpoint = 5,
    AddTarget = 6,
    AddAlias = 7,
    Data = 8,
    Message = 9,
    FilterClone = 10,
    TimeRequest = 11,
    TimeGrant = 12,
    ExecRequest = 13,
    ExecGrant = 14,
    Query = 15,
    QueryReply = 16,
    Command = 17,
    Disconnect = 18,
    ErrorMsg = 19,
    Terminate = 20,
}

impl Action {
    fn from_u32(v: u32) -> Result<Self, FrameError> {
        use Action::*;
        Ok(match v {
            0 => RegisterCore,
            1 => RegisterBroker,
            2 => RegisterFederate,
            3 => RegisterPublication,
            4 => RegisterInput,
            5 => RegisterEndpoint,
            6 => AddTarget,
            7 => AddAlias,
            8 => Data,
            9 => Message,
            10 => FilterClone,
            11 => TimeRequest,
            12 => TimeGrant,
            13 => ExecRequest,
            14 => ExecGrant,
            15 => Query,
            16 => QueryReply,
            17 => Command,
            18 => Disconnect,
            19 => ErrorMsg,
            20 => Terminate,
            other => return Err(FrameError::UnknownAction(other)),
        })
    }
}

bitflags::bitflags! {
    /// Flag bits of the `flags` header field (spec.md §6 "Flag bits"), LSB first.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u32 {
        const ITERATION_REQUESTED  = 1 << 0;
        const REQUIRED             = 1 << 1;
        const OPTIONAL             = 1 << 2;
        const GLOBAL_INTERFACE     = 1 << 3;
        const INITIALIZATION_MODE  = 1 << 4;
        const ERROR_FLAG           = 1 << 5;
        const EVENT_TRIGGERED      = 1 << 6;
        const CALLBACK_FEDERATE    = 1 << 7;
        const CONNECTIONS_REQUIRED = 1 << 8;
        const ONLY_UPDATE_ON_CHANGE = 1 << 9;
    }
}

/// The wire frame itself (spec.md §6). All multi-byte integers are little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMessage {
    pub action: Action,
    pub source_id: FederateId,
    pub dest_id: FederateId,
    pub source_handle: InterfaceHandle,
    pub dest_handle: InterfaceHandle,
    pub message_id: MessageId,
    pub action_time: Time,
    pub flags: Flags,
    pub payload: Vec<u8>,
}

impl ActionMessage {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            source_id: FederateId::from(0usize),
            dest_id: FederateId::from(0usize),
            source_handle: InterfaceHandle::from(0usize),
            dest_handle: InterfaceHandle::from(0usize),
            message_id: MessageId::from(0usize),
            action_time: Time::ZERO,
            flags: Flags::empty(),
            payload: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Encode this frame onto the end of `buf` per the fixed 48-byte header layout.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(HEADER_LEN + self.payload.len());
        buf.put_u32_le(MAGIC);
        buf.put_u32_le(self.action as u32);
        buf.put_u32_le(self.source_id.index() as u32);
        buf.put_u32_le(self.dest_id.index() as u32);
        buf.put_u32_le(self.source_handle.index() as u32);
        buf.put_u32_le(self.dest_handle.index() as u32);
        buf.put_u64_le(self.message_id.index() as u64);
        buf.put_i64_le(self.action_time.ticks());
        buf.put_u32_le(self.flags.bits());
        buf.put_u32_le(self.payload.len() as u32);
        buf.put_slice(&self.payload);
    }

    /// Decode one frame from the front of `buf`, advancing it past the consumed bytes.
    /// Returns `Ok(None)` if `buf` does not yet contain a complete frame (the caller
    /// should wait for more bytes from the transport).
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, FrameError> {
        if buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = &buf[..HEADER_LEN];
        let magic = header.get_u32_le();
        if magic != MAGIC {
            return Err(FrameError::BadMagic(magic));
        }
        let action = Action::from_u32(header.get_u32_le())?;
        let source_id = header.get_u32_le() as usize;
        let dest_id = header.get_u32_le() as usize;
        let source_handle = header.get_u32_le() as usize;
        let dest_handle = header.get_u32_le() as usize;
        let message_id = header.get_u64_le() as usize;
        let action_time = header.get_i64_le();
        let flags = Flags::from_bits_truncate(header.get_u32_le());
        let payload_length = header.get_u32_le() as usize;

        if buf.len() < HEADER_LEN + payload_length {
            return Ok(None);
        }

        buf.advance(HEADER_LEN);
        let payload = buf.split_to(payload_length).to_vec();

        Ok(Some(ActionMessage {
            action,
            source_id: FederateId::from(source_id),
            dest_id: FederateId::from(dest_id),
            source_handle: InterfaceHandle::from(source_handle),
            dest_handle: InterfaceHandle::from(dest_handle),
            message_id: MessageId::from(message_id),
            action_time: Time::from_ticks(action_time),
            flags,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinymap::Key;

    #[test]
    fn round_trip() {
        let msg = ActionMessage {
            action: Action::Data,
            source_id: FederateId::from(1usize),
            dest_id: FederateId::from(2usize),
            source_handle: InterfaceHandle::from(3usize),
            dest_handle: InterfaceHandle::from(4usize),
            message_id: MessageId::from(5usize),
            action_time: Time::from_ticks(42),
            flags: Flags::REQUIRED | Flags::GLOBAL_INTERFACE,
            payload: vec![1, 2, 3, 4, 5],
        };

        let mut buf = BytesMut::new();
        msg.encode(&mut buf);

        let decoded = ActionMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
        assert!(buf.is_empty());
    }

    #[test]
    fn incomplete_frame_returns_none() {
        let msg = ActionMessage::new(Action::Disconnect).with_payload(vec![9; 16]);
        let mut buf = BytesMut::new();
        msg.encode(&mut buf);

        let mut truncated = BytesMut::from(&buf[..HEADER_LEN + 4]);
        assert!(ActionMessage::decode(&mut truncated).unwrap().is_none());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(0xDEAD_BEEF);
        buf.put_bytes(0, HEADER_LEN - 4);
        assert!(matches!(
            ActionMessage::decode(&mut buf),
            Err(FrameError::BadMagic(_))
        ));
    }

    #[test]
    fn handle_index_round_trips() {
        let h = InterfaceHandle::from(7usize);
        assert_eq!(h.index(), 7);
    }
}
