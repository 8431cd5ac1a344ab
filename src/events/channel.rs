//! crossbeam-channel plumbing for run events.

use super::Event;
use crossbeam_channel::{Receiver, Sender};

/// Producer half, handed to the scanner, record builder, engine and finder.
///
/// Clones feed the same receiver, so rayon workers each hold one.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Publish an event. With nobody listening it is dropped; a run never
    /// fails because its observer went away.
    pub fn send(&self, event: Event) {
        if self.inner.send(event).is_err() {
            tracing::trace!("event dropped, receiver gone");
        }
    }
}

/// Consumer half, held by whatever front end follows the run.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Next event if one is queued
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Drain events until the run drops its senders
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair: senders never block.
    pub fn new() -> (EventSender, EventReceiver) {
        pair(crossbeam_channel::unbounded())
    }

    /// Pair holding at most `capacity` queued events. Senders block when it is
    /// full, which slows the run down to the consumer's pace.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        pair(crossbeam_channel::bounded(capacity))
    }
}

fn pair((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
    (EventSender { inner: sender }, EventReceiver { inner: receiver })
}

/// Sender for callers that do not watch progress.
pub fn null_sender() -> EventSender {
    EventChannel::new().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MatchEvent, RunEvent};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn worker_thread_events_reach_receiver() {
        let (sender, receiver) = EventChannel::new();

        let worker = sender.clone();
        thread::spawn(move || {
            worker.send(Event::Match(MatchEvent::Exhausted {
                target: PathBuf::from("/exports/a.jpg"),
            }));
        })
        .join()
        .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::Match(MatchEvent::Exhausted { target }) if target == &PathBuf::from("/exports/a.jpg")
        ));
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn sending_without_receiver_is_harmless() {
        null_sender().send(Event::Run(RunEvent::Started));
    }

    #[test]
    fn bounded_channel_queues_up_to_capacity() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.send(Event::Run(RunEvent::Started));
        sender.send(Event::Run(RunEvent::Started));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }
}
