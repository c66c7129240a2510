//! Lesson events and their broadcast channel.
//!
//! Events are serialized as `{"event": <name>, "payload": {...}}`. The
//! `sectionEnd` payload is exactly the [`CompletionSignal`] published on the
//! signal bus, so the wire format of the bus is stable for every client.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::notice::Notice;
use crate::phase::Phase;
use crate::section::Section;
use crate::session::SessionSnapshot;
use crate::signal::CompletionSignal;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// The session as it stood when the client connected.
    pub session: SessionSnapshot,
}

/// Payload for the `sectionChanged` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionChangedPayload {
    /// The section now active.
    pub section: Section,
    /// The section that was active before.
    pub previous: Section,
}

/// Payload for the `phaseChanged` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChangedPayload {
    /// The phase now active.
    pub phase: Phase,
    /// The phase that was active before.
    pub previous: Phase,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Events streamed to observers of a lesson session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum LessonEvent {
    /// Sent when a client connects.
    Connected(Box<ConnectedPayload>),
    /// A completion signal was published on the signal bus.
    SectionEnd(CompletionSignal),
    /// The active section changed.
    SectionChanged(SectionChangedPayload),
    /// The activity phase changed.
    PhaseChanged(PhaseChangedPayload),
    /// A notice was raised.
    Notice(Notice),
}

impl LessonEvent {
    /// Creates a `Connected` event.
    #[must_use]
    pub fn connected(session: SessionSnapshot) -> Self {
        Self::Connected(Box::new(ConnectedPayload { session }))
    }

    /// Creates a `SectionChanged` event.
    #[must_use]
    pub const fn section_changed(previous: Section, section: Section) -> Self {
        Self::SectionChanged(SectionChangedPayload { section, previous })
    }

    /// Creates a `PhaseChanged` event.
    #[must_use]
    pub const fn phase_changed(previous: Phase, phase: Phase) -> Self {
        Self::PhaseChanged(PhaseChangedPayload { phase, previous })
    }

    /// Returns the event name as sent on the wire.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::SectionEnd(_) => crate::signal::SECTION_END_EVENT,
            Self::SectionChanged(_) => "sectionChanged",
            Self::PhaseChanged(_) => "phaseChanged",
            Self::Notice(_) => "notice",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Fans lesson events out to every connected observer.
///
/// Events are not persisted for disconnected clients.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<LessonEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new subscriber.
    ///
    /// A subscriber that falls behind receives `Lagged` and misses events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LessonEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event. Returns the number of receivers it reached.
    pub fn send(&self, event: LessonEvent) -> usize {
        // Err only means nobody is listening.
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_section_end_wire_format() {
        let event = LessonEvent::SectionEnd(CompletionSignal::for_section(Section::Activity));
        insta::assert_json_snapshot!(event, @r#"
        {
          "event": "sectionEnd",
          "payload": {
            "isAtEnd": true,
            "sectionId": "activity"
          }
        }
        "#);
    }

    #[test]
    fn test_change_events_serialization() {
        let json =
            serde_json::to_string(&LessonEvent::section_changed(Section::Tutorial, Section::Activity))
                .unwrap();
        assert_eq!(
            json,
            r#"{"event":"sectionChanged","payload":{"section":"activity","previous":"tutorial"}}"#
        );

        let json =
            serde_json::to_string(&LessonEvent::phase_changed(Phase::Basic, Phase::Feedback)).unwrap();
        assert!(json.contains(r#""event":"phaseChanged""#));
        assert!(json.contains(r#""phase":"feedback""#));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"event":"sectionEnd","payload":{"isAtEnd":true}}"#;
        let event: LessonEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            LessonEvent::SectionEnd(CompletionSignal { is_at_end: true, section_id: None })
        ));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            LessonEvent::SectionEnd(CompletionSignal::at_end()).event_name(),
            "sectionEnd"
        );
        assert_eq!(
            LessonEvent::section_changed(Section::Code, Section::Code).event_name(),
            "sectionChanged"
        );
        assert_eq!(
            LessonEvent::phase_changed(Phase::Quiz, Phase::Quiz).event_name(),
            "phaseChanged"
        );
    }

    #[tokio::test]
    async fn test_broadcaster_send_receive() {
        let broadcaster = EventBroadcaster::new(10);
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        let count = broadcaster.send(LessonEvent::SectionEnd(CompletionSignal::at_end()));
        assert_eq!(count, 2);

        assert!(matches!(first.recv().await.unwrap(), LessonEvent::SectionEnd(_)));
        assert!(matches!(second.recv().await.unwrap(), LessonEvent::SectionEnd(_)));
    }

    #[test]
    fn test_broadcaster_without_subscribers() {
        let broadcaster = EventBroadcaster::default();
        assert_eq!(broadcaster.receiver_count(), 0);
        assert_eq!(
            broadcaster.send(LessonEvent::SectionEnd(CompletionSignal::at_end())),
            0
        );
    }
}
