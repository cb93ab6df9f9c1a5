//! Bincode-based helpers for the structured payloads carried inside
//! [`fedrt_core::frame::ActionMessage::payload`] (registration, query, and filter
//! payloads — spec.md §4.4, §4.10). Vendored from fantasyzhjk/tokio-bincodec and
//! LucioFranco/tokio-bincode; extended here with plain serialize/deserialize helpers
//! since the outer length is already known from the frame header.

use std::marker::PhantomData;

use bincode::{DefaultOptions, Options};
use bytes::{Buf, BufMut, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{self, Read};
use tokio_util::codec::{Decoder, Encoder};

/// Create a bincode based codec for framing a typed message directly over a byte stream.
#[inline]
pub fn create<T: DeserializeOwned>() -> BinCodec<T, DefaultOptions> {
    BinCodec::<T, DefaultOptions>::with_config(bincode::options())
}

/// Serialize `value` with the shared bincode options, for embedding as an
/// [`fedrt_core::frame::ActionMessage`] payload.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    bincode::options().serialize(value)
}

/// Deserialize a payload previously produced by [`serialize`].
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    bincode::options().deserialize(bytes)
}

/// Bincode based codec for use with `tokio-codec`.
pub struct BinCodec<T, O> {
    options: O,
    _pd: PhantomData<T>,
}

impl<T: DeserializeOwned, O: Options + Copy> BinCodec<T, O> {
    #[inline]
    pub fn with_config(config: O) -> Self {
        BinCodec { options: config, _pd: PhantomData }
    }
}

impl<T: DeserializeOwned, O: Options + Copy> Decoder for BinCodec<T, O> {
    type Item = T;
    type Error = bincode::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !buf.is_empty() {
            let mut reader = Reader::new(&buf[..]);
            let message = self.options.deserialize_from(&mut reader)?;
            buf.advance(reader.amount());
            Ok(Some(message))
        } else {
            Ok(None)
        }
    }
}

impl<T: Serialize, O: Options + Copy> Encoder<T> for BinCodec<T, O> {
    type Error = bincode::Error;

    fn encode(&mut self, item: T, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let size = self.options.serialized_size(&item)?;
        buf.reserve(size as usize);
        let message = self.options.serialize(&item)?;
        buf.put(&message[..]);
        Ok(())
    }
}

impl<T, O> std::fmt::Debug for BinCodec<T, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BinCodec").finish()
    }
}

#[derive(Debug)]
struct Reader<'buf> {
    buf: &'buf [u8],
    amount: usize,
}

impl<'buf> Reader<'buf> {
    pub fn new(buf: &'buf [u8]) -> Self {
        Reader { buf, amount: 0 }
    }

    pub fn amount(&self) -> usize {
        self.amount
    }
}

impl<'buf, 'a> Read for &'a mut Reader<'buf> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes_read = self.buf.read(buf)?;
        self.amount += bytes_read;
        Ok(bytes_read)
    }
}
