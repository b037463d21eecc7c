// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Event stream reader contract for subtree bulk insert/replace. A stream
//! yields a flat sequence of start/end/content events;
//! the shredder or diff engine producing that sequence is out of scope.

use crate::qname::QName;

/// One event in an XDM event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XdmEvent {
    StartElement { name: QName },
    EndElement,
    Text { value: String },
    Comment { value: String },
    ProcessingInstruction { target: String, content: String },
    Attribute { name: QName, value: String },
    Namespace { name: QName },
}

/// A source of `XdmEvent`s for bulk subtree construction.
pub trait EventStreamReader {
    /// Returns the next event, or `None` at end of stream.
    fn next_event(&mut self) -> Option<XdmEvent>;
}

/// An `EventStreamReader` over an in-memory `Vec<XdmEvent>`, for tests and
/// for callers that already materialized the event sequence.
pub struct VecEventStream {
    events: std::vec::IntoIter<XdmEvent>,
}

impl VecEventStream {
    pub fn new(events: Vec<XdmEvent>) -> Self {
        VecEventStream {
            events: events.into_iter(),
        }
    }
}

impl EventStreamReader for VecEventStream {
    fn next_event(&mut self) -> Option<XdmEvent> {
        self.events.next()
    }
}
