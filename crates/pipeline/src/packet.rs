//! Packet and Batch
//!
//! A [`Packet`] wraps one payload on the egress side. The egress runner
//! collects packets into a reusable [`Batch`] between flushes.

use std::borrow::Cow;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// One immutable payload
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    data: Bytes,
}

impl Packet {
    /// Wrap a payload
    #[inline]
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Raw payload
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload as a byte slice
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload as text, replacing invalid UTF-8
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Unwrap the payload
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl From<Bytes> for Packet {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<&'static str> for Packet {
    fn from(data: &'static str) -> Self {
        Self::new(Bytes::from_static(data.as_bytes()))
    }
}

/// Serialized as `{"data": "<payload as text>"}`
impl Serialize for Packet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Packet", 1)?;
        state.serialize_field("data", &self.as_str_lossy())?;
        state.end()
    }
}

/// Ordered group of packets flushed in one `Output::write`
///
/// `clear` keeps the allocation, so one batch serves the whole lifetime
/// of the egress runner.
#[derive(Debug, Default)]
pub struct Batch {
    packets: Vec<Packet>,
    total_bytes: usize,
}

impl Batch {
    /// Create a batch with room for `capacity` packets
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packets: Vec::with_capacity(capacity),
            total_bytes: 0,
        }
    }

    /// Append a packet
    #[inline]
    pub fn push(&mut self, packet: Packet) {
        self.total_bytes += packet.len();
        self.packets.push(packet);
    }

    /// Packets in arrival order
    #[inline]
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Number of packets
    #[inline]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if the batch holds no packets
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Sum of payload lengths
    #[inline]
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Allocated packet slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.packets.capacity()
    }

    /// Reset length to zero, keeping capacity
    #[inline]
    pub fn clear(&mut self) {
        self.packets.clear();
        self.total_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_accessors() {
        let packet = Packet::from("hello");
        assert_eq!(packet.len(), 5);
        assert!(!packet.is_empty());
        assert_eq!(packet.as_bytes(), b"hello");
        assert_eq!(packet.as_str_lossy(), "hello");
        assert_eq!(packet.into_bytes(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_packet_lossy_text() {
        let packet = Packet::new(Bytes::from_static(&[b'o', b'k', 0xff]));
        assert_eq!(packet.as_str_lossy(), "ok\u{fffd}");
    }

    #[test]
    fn test_packet_serialize() {
        let json = serde_json::to_string(&Packet::from("a \"quoted\" line")).unwrap();
        assert_eq!(json, r#"{"data":"a \"quoted\" line"}"#);
    }

    #[test]
    fn test_batch_clear_keeps_capacity() {
        let mut batch = Batch::with_capacity(4);
        let capacity = batch.capacity();
        for item in ["a", "bb", "ccc", "dddd", "eeeee"] {
            batch.push(Packet::from(item));
        }
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.total_bytes(), 15);

        let grown = batch.capacity();
        assert!(grown >= capacity);

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.total_bytes(), 0);
        assert_eq!(batch.capacity(), grown);
    }
}
