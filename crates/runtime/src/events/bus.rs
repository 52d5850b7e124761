//! Ordered publish/subscribe bus for one battle session.
//!
//! Handlers run synchronously in registration order. Events a handler emits
//! go to the back of a FIFO queue, so one publish call drains a whole causal
//! cascade before returning. A failing handler never stops delivery to the
//! handlers after it: its error is captured in the [`PublishReport`].
//!
//! Every delivered envelope is also mirrored to a tokio broadcast channel for
//! presentation layers. Mirror subscribers cannot affect battle state.

use std::collections::VecDeque;

use tokio::sync::broadcast;
use tracing::{debug, error, trace};

use super::{Envelope, Event, Topic};
use crate::error::{PublishError, RuntimeError};

/// A pipeline stage subscribed to one or more topics.
pub trait EventHandler<S>: Send {
    /// Returns a human-readable name for this handler (used in logging and
    /// failure reports).
    fn name(&self) -> &'static str;

    fn topics(&self) -> &[Topic];

    /// Reacts to one event. Follow-up events go into `outbox`; they are
    /// dropped if the handler returns an error.
    fn handle(
        &mut self,
        envelope: &Envelope,
        state: &mut S,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError>;
}

/// Follow-up events emitted by a handler.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<Event>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

/// One handler error, attached to the publish call it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler: &'static str,
    pub topic: Topic,
    pub sequence: u64,
    pub error: RuntimeError,
}

/// Everything one publish call delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Delivered envelopes in delivery order.
    pub events: Vec<Envelope>,
    pub failures: Vec<HandlerFailure>,
    /// Events left undelivered because the cascade limit was hit.
    pub truncated: usize,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.truncated == 0
    }

    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.events.iter().map(|e| e.topic)
    }

    pub fn find(&self, topic: Topic) -> Option<&Event> {
        self.events.iter().find(|e| e.topic == topic).map(|e| &e.event)
    }

    pub fn all(&self, topic: Topic) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter(move |e| e.topic == topic)
            .map(|e| &e.event)
    }

    pub fn contains(&self, topic: Topic) -> bool {
        self.find(topic).is_some()
    }

    /// Appends another report, keeping delivery order.
    pub fn merge(&mut self, other: PublishReport) {
        self.events.extend(other.events);
        self.failures.extend(other.failures);
        self.truncated += other.truncated;
    }
}

/// Event bus owned by one battle session.
pub struct EventBus<S> {
    handlers: Vec<Box<dyn EventHandler<S>>>,
    mirror: broadcast::Sender<Envelope>,
    next_sequence: u64,
    max_cascade: usize,
}

impl<S> EventBus<S> {
    pub const DEFAULT_CAPACITY: usize = 256;
    pub const DEFAULT_MAX_CASCADE: usize = 1024;

    pub fn new() -> Self {
        Self::with_limits(Self::DEFAULT_CAPACITY, Self::DEFAULT_MAX_CASCADE)
    }

    /// Creates a bus with the given mirror capacity and cascade bound.
    pub fn with_limits(capacity: usize, max_cascade: usize) -> Self {
        Self {
            handlers: Vec::new(),
            mirror: broadcast::channel(capacity.max(1)).0,
            next_sequence: 0,
            max_cascade: max_cascade.max(1),
        }
    }

    /// Appends a handler. Registration order is delivery order.
    pub fn register(&mut self, handler: Box<dyn EventHandler<S>>) {
        debug!(
            target: "runtime::bus",
            handler = handler.name(),
            topics = ?handler.topics(),
            "handler registered"
        );
        self.handlers.push(handler);
    }

    /// Handler names in delivery order.
    pub fn handlers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|h| h.name())
    }

    /// Receiver for every envelope delivered from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.mirror.subscribe()
    }

    /// Sequence number the next delivered envelope will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn publish(&mut self, event: Event, state: &mut S) -> Result<PublishReport, PublishError> {
        self.publish_all(vec![event], state)
    }

    /// Publishes several root events as one call.
    ///
    /// Root events are schema-checked up front and the call fails without
    /// delivering anything if one is malformed. Malformed follow-ups become
    /// failures of the handler that emitted them.
    pub fn publish_all(
        &mut self,
        events: Vec<Event>,
        state: &mut S,
    ) -> Result<PublishReport, PublishError> {
        for event in &events {
            event.validate()?;
        }

        let mut queue: VecDeque<Event> = events.into();
        let mut report = PublishReport::default();

        while let Some(event) = queue.pop_front() {
            if report.events.len() >= self.max_cascade {
                report.truncated = queue.len() + 1;
                error!(
                    target: "runtime::bus",
                    max_cascade = self.max_cascade,
                    dropped = report.truncated,
                    "cascade limit reached; remaining events dropped"
                );
                break;
            }

            let envelope = Envelope {
                sequence: self.next_sequence,
                topic: event.topic(),
                event,
            };
            self.next_sequence += 1;
            trace!(
                target: "runtime::bus",
                sequence = envelope.sequence,
                topic = %envelope.topic,
                "deliver"
            );

            for handler in self.handlers.iter_mut() {
                if !handler.topics().contains(&envelope.topic) {
                    continue;
                }
                let mut outbox = Outbox::new();
                match handler.handle(&envelope, state, &mut outbox) {
                    Ok(()) => {
                        for follow_up in outbox.into_events() {
                            match follow_up.validate() {
                                Ok(()) => queue.push_back(follow_up),
                                Err(err) => report.failures.push(Self::failure(
                                    handler.name(),
                                    &envelope,
                                    RuntimeError::Publish(err),
                                )),
                            }
                        }
                    }
                    Err(err) => report.failures.push(Self::failure(handler.name(), &envelope, err)),
                }
            }

            // No mirror subscribers is normal.
            if self.mirror.send(envelope.clone()).is_err() {
                trace!(
                    target: "runtime::bus",
                    sequence = envelope.sequence,
                    "no mirror subscribers"
                );
            }
            report.events.push(envelope);
        }

        Ok(report)
    }

    fn failure(handler: &'static str, envelope: &Envelope, error: RuntimeError) -> HandlerFailure {
        error!(
            target: "runtime::bus",
            handler,
            topic = %envelope.topic,
            sequence = envelope.sequence,
            code = combat_core::CombatError::error_code(&error),
            %error,
            "handler failed"
        );
        HandlerFailure {
            handler,
            topic: envelope.topic,
            sequence: envelope.sequence,
            error,
        }
    }
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Drop for EventBus<S> {
    fn drop(&mut self) {
        if !self.handlers.is_empty() {
            debug!(
                target: "runtime::bus",
                delivered = self.next_sequence,
                "event bus torn down"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use combat_core::EntityId;
    use combat_core::engine::WindowId;

    use super::*;

    type Log = Vec<(&'static str, u64)>;

    /// Records `(handler, sequence)` pairs and optionally fails or echoes.
    struct Stage {
        name: &'static str,
        topics: Vec<Topic>,
        fail: bool,
        echo: Option<Event>,
    }

    impl Stage {
        fn new(name: &'static str, topics: &[Topic]) -> Self {
            Self {
                name,
                topics: topics.to_vec(),
                fail: false,
                echo: None,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn echoing(mut self, event: Event) -> Self {
            self.echo = Some(event);
            self
        }
    }

    impl EventHandler<Log> for Stage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn topics(&self) -> &[Topic] {
            &self.topics
        }

        fn handle(
            &mut self,
            envelope: &Envelope,
            log: &mut Log,
            outbox: &mut Outbox,
        ) -> Result<(), RuntimeError> {
            log.push((self.name, envelope.sequence));
            if let Some(event) = &self.echo {
                outbox.push(event.clone());
            }
            if self.fail {
                return Err(RuntimeError::NotStarted);
            }
            Ok(())
        }
    }

    fn end_turn(actor: u32) -> Event {
        Event::EndTurn { actor: EntityId(actor) }
    }

    #[test]
    fn delivers_in_registration_order() {
        let mut bus = EventBus::<Log>::new();
        bus.register(Box::new(Stage::new("first", &[Topic::EndTurn])));
        bus.register(Box::new(Stage::new("second", &[Topic::EndTurn])));
        bus.register(Box::new(Stage::new("other", &[Topic::BeginTurn])));

        let mut log = Log::new();
        let report = bus.publish(end_turn(1), &mut log).unwrap();

        assert_eq!(log, vec![("first", 0), ("second", 0)]);
        assert!(report.is_clean());
        assert_eq!(report.events.len(), 1);
    }

    #[test]
    fn failure_does_not_stop_later_handlers() {
        let mut bus = EventBus::<Log>::new();
        bus.register(Box::new(Stage::new("broken", &[Topic::EndTurn]).failing()));
        bus.register(Box::new(Stage::new("after", &[Topic::EndTurn])));
        bus.register(Box::new(Stage::new("also_broken", &[Topic::EndTurn]).failing()));

        let mut log = Log::new();
        let report = bus.publish(end_turn(1), &mut log).unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].handler, "broken");
        assert_eq!(report.failures[1].handler, "also_broken");
        assert_eq!(report.failures[0].topic, Topic::EndTurn);
        assert_eq!(report.failures[0].sequence, 0);
    }

    #[test]
    fn failed_handler_follow_ups_are_dropped() {
        let mut bus = EventBus::<Log>::new();
        bus.register(Box::new(
            Stage::new("broken", &[Topic::EndTurn])
                .failing()
                .echoing(Event::ReactionTimeout { window: WindowId(1) }),
        ));

        let mut log = Log::new();
        let report = bus.publish(end_turn(1), &mut log).unwrap();
        assert_eq!(report.events.len(), 1);
        assert!(!report.contains(Topic::ReactionTimeout));
    }

    #[test]
    fn follow_ups_run_after_current_event() {
        let mut bus = EventBus::<Log>::new();
        bus.register(Box::new(
            Stage::new("relay", &[Topic::EndTurn])
                .echoing(Event::ReactionTimeout { window: WindowId(1) }),
        ));
        bus.register(Box::new(Stage::new("late", &[Topic::EndTurn, Topic::ReactionTimeout])));

        let mut log = Log::new();
        let report = bus.publish(end_turn(1), &mut log).unwrap();

        assert_eq!(log, vec![("relay", 0), ("late", 0), ("late", 1)]);
        assert_eq!(
            report.topics().collect::<Vec<_>>(),
            vec![Topic::EndTurn, Topic::ReactionTimeout]
        );
    }

    #[test]
    fn malformed_root_event_is_rejected_before_delivery() {
        let mut bus = EventBus::<Log>::new();
        bus.register(Box::new(Stage::new("any", &[Topic::EndTurn])));

        let mut log = Log::new();
        let err = bus.publish(end_turn(EntityId::SYSTEM.0), &mut log).unwrap_err();
        assert!(matches!(err, PublishError::InvalidPayload { topic: Topic::EndTurn, .. }));
        assert!(log.is_empty());
        assert_eq!(bus.next_sequence(), 0);
    }

    #[test]
    fn malformed_follow_up_is_a_handler_failure() {
        let mut bus = EventBus::<Log>::new();
        bus.register(Box::new(
            Stage::new("sloppy", &[Topic::EndTurn]).echoing(end_turn(EntityId::SYSTEM.0)),
        ));

        let mut log = Log::new();
        let report = bus.publish(end_turn(1), &mut log).unwrap();
        assert_eq!(report.events.len(), 1);
        assert!(matches!(report.failures[0].error, RuntimeError::Publish(_)));
    }

    #[test]
    fn cascade_limit_truncates_loops() {
        let mut bus = EventBus::<Log>::with_limits(8, 5);
        bus.register(Box::new(Stage::new("loop", &[Topic::EndTurn]).echoing(end_turn(1))));

        let mut log = Log::new();
        let report = bus.publish(end_turn(1), &mut log).unwrap();
        assert_eq!(report.events.len(), 5);
        assert_eq!(report.truncated, 1);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn mirror_receives_envelopes() {
        let mut bus = EventBus::<Log>::new();
        let mut rx = bus.subscribe();

        let mut log = Log::new();
        bus.publish(end_turn(4), &mut log).unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.sequence, 0);
        assert_eq!(envelope.event, end_turn(4));
    }
}
