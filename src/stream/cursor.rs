//! Packet cursor with a replayable lookahead window.
//!
//! Roster population needs to read ahead of the main stream to collect driver
//! names, without losing those packets for the timing pass. Packets pulled
//! through [`PacketCursor::lookahead`] are buffered and handed back by the
//! cursor's own iterator in their original order.

use std::collections::VecDeque;

use crate::packet::{Packet, PacketHash};
use crate::{RaceDataError, Result};

/// Packet source that can be peeked ahead of without losing records.
pub struct PacketCursor<S> {
    source: S,
    buffered: VecDeque<Packet>,
}

impl<S> PacketCursor<S>
where
    S: Iterator<Item = Result<Packet>>,
{
    pub fn new(source: S) -> Self {
        Self { source, buffered: VecDeque::new() }
    }

    /// Iterate ahead without consuming. Every packet yielded here is still
    /// returned later by [`Iterator::next`].
    pub fn lookahead(&mut self) -> Lookahead<'_, S> {
        Lookahead { cursor: self, index: 0 }
    }

    /// Consume packets up to and including the one with `hash`.
    pub fn seek_to(&mut self, hash: PacketHash, checkpoint: &'static str) -> Result<Packet> {
        for packet in self.by_ref() {
            let packet = packet?;
            if packet.hash() == hash {
                return Ok(packet);
            }
        }
        Err(RaceDataError::CheckpointNotFound { checkpoint, hash })
    }

    pub fn buffered(&self) -> usize {
        self.buffered.len()
    }
}

impl<S> Iterator for PacketCursor<S>
where
    S: Iterator<Item = Result<Packet>>,
{
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.buffered.pop_front() {
            Some(packet) => Some(Ok(packet)),
            None => self.source.next(),
        }
    }
}

/// Borrowing iterator over the packets ahead of a [`PacketCursor`].
pub struct Lookahead<'a, S> {
    cursor: &'a mut PacketCursor<S>,
    index: usize,
}

impl<S> Iterator for Lookahead<'_, S>
where
    S: Iterator<Item = Result<Packet>>,
{
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(packet) = self.cursor.buffered.get(self.index) {
            self.index += 1;
            return Some(Ok(packet.clone()));
        }

        match self.cursor.source.next()? {
            Ok(packet) => {
                self.cursor.buffered.push_back(packet.clone());
                self.index += 1;
                Some(Ok(packet))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
