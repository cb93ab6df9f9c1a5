//! `tokio_util::codec` adapter for [`ActionMessage`], used by the stream-oriented
//! transports (TCP, TCP_SS) to frame the wire protocol of spec.md §6 over a byte stream.

use bytes::BytesMut;
use fedrt_core::frame::ActionMessage;
use tokio_util::codec::{Decoder, Encoder};

use crate::NetError;

/// Frames [`ActionMessage`]s directly per the fixed 48-byte header layout — no
/// intermediate serialization format, since the header is externally specified
/// byte-for-byte (spec.md §6).
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionCodec;

impl Decoder for ActionCodec {
    type Item = ActionMessage;
    type Error = NetError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(ActionMessage::decode(buf)?)
    }
}

impl Encoder<ActionMessage> for ActionCodec {
    type Error = NetError;

    fn encode(&mut self, item: ActionMessage, buf: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedrt_core::frame::Action;

    #[test]
    fn round_trips_through_the_codec() {
        let mut codec = ActionCodec;
        let mut buf = BytesMut::new();
        let msg = ActionMessage::new(Action::Disconnect).with_payload(vec![1, 2, 3]);
        codec.encode(msg.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }
}
