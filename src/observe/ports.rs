//! Discovery of the engine's audio and MIDI ports.
//!
//! When liquidsfz runs under an audio-connection server it registers one
//! MIDI input and two audio outputs. The connection server's client library
//! reports port registrations; feeding those events into [`EnginePorts`]
//! picks out the engine's ports so they can be wired up. No binding to a
//! particular audio server is included here.

use serde::{Deserialize, Serialize};

/// Client name the engine registers its ports under.
pub const ENGINE_CLIENT_NAME: &str = "liquidsfz";

/// Kind of port reported by the audio-connection server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Midi,
    Audio,
}

/// A port being added or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEvent {
    /// Full port name, e.g. `liquidsfz:audio_out_1`.
    pub name: String,
    pub kind: PortKind,
    /// `true` when the port was added, `false` when removed.
    pub registered: bool,
}

impl PortEvent {
    /// A port was added.
    pub fn registered(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
            registered: true,
        }
    }

    /// A port was removed.
    pub fn unregistered(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
            registered: false,
        }
    }
}

/// The engine's ports, filled in as registration events arrive.
///
/// Each slot keeps the first matching port. Removals are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePorts {
    client_name: String,
    midi_in: Option<String>,
    audio_out_1: Option<String>,
    audio_out_2: Option<String>,
}

impl Default for EnginePorts {
    fn default() -> Self {
        Self::with_client_name(ENGINE_CLIENT_NAME)
    }
}

impl EnginePorts {
    /// Track ports registered under the default engine client name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track ports whose name contains `client_name`.
    pub fn with_client_name(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            midi_in: None,
            audio_out_1: None,
            audio_out_2: None,
        }
    }

    /// Apply one event. Returns `true` if it filled a slot.
    pub fn observe(&mut self, event: &PortEvent) -> bool {
        if !event.registered || !event.name.contains(&self.client_name) {
            return false;
        }

        let slot = if event.kind == PortKind::Midi && self.midi_in.is_none() {
            &mut self.midi_in
        } else if event.name.contains("audio_out_1") && self.audio_out_1.is_none() {
            &mut self.audio_out_1
        } else if event.name.contains("audio_out_2") && self.audio_out_2.is_none() {
            &mut self.audio_out_2
        } else {
            return false;
        };

        tracing::debug!(port = %event.name, "engine port registered");
        *slot = Some(event.name.clone());
        true
    }

    pub fn midi_in(&self) -> Option<&str> {
        self.midi_in.as_deref()
    }

    pub fn audio_out_1(&self) -> Option<&str> {
        self.audio_out_1.as_deref()
    }

    pub fn audio_out_2(&self) -> Option<&str> {
        self.audio_out_2.as_deref()
    }

    /// Whether all three ports have been seen.
    pub fn is_complete(&self) -> bool {
        self.midi_in.is_some() && self.audio_out_1.is_some() && self.audio_out_2.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_all_slots() {
        let mut ports = EnginePorts::new();
        assert!(!ports.is_complete());

        assert!(ports.observe(&PortEvent::registered("liquidsfz:midi_in", PortKind::Midi)));
        assert!(ports.observe(&PortEvent::registered(
            "liquidsfz:audio_out_1",
            PortKind::Audio
        )));
        assert!(ports.observe(&PortEvent::registered(
            "liquidsfz:audio_out_2",
            PortKind::Audio
        )));

        assert_eq!(ports.midi_in(), Some("liquidsfz:midi_in"));
        assert_eq!(ports.audio_out_1(), Some("liquidsfz:audio_out_1"));
        assert_eq!(ports.audio_out_2(), Some("liquidsfz:audio_out_2"));
        assert!(ports.is_complete());
    }

    #[test]
    fn foreign_ports_are_ignored() {
        let mut ports = EnginePorts::new();
        assert!(!ports.observe(&PortEvent::registered("system:midi_capture_1", PortKind::Midi)));
        assert!(!ports.observe(&PortEvent::registered("system:playback_1", PortKind::Audio)));
        assert_eq!(ports, EnginePorts::new());
    }

    #[test]
    fn first_port_wins() {
        let mut ports = EnginePorts::new();
        ports.observe(&PortEvent::registered("liquidsfz:midi_in", PortKind::Midi));
        assert!(!ports.observe(&PortEvent::registered("liquidsfz-2:midi_in", PortKind::Midi)));
        assert_eq!(ports.midi_in(), Some("liquidsfz:midi_in"));
    }

    #[test]
    fn removals_are_ignored() {
        let mut ports = EnginePorts::new();
        ports.observe(&PortEvent::registered("liquidsfz:audio_out_1", PortKind::Audio));
        assert!(!ports.observe(&PortEvent::unregistered(
            "liquidsfz:audio_out_1",
            PortKind::Audio
        )));
        assert_eq!(ports.audio_out_1(), Some("liquidsfz:audio_out_1"));
    }

    #[test]
    fn custom_client_name() {
        let mut ports = EnginePorts::with_client_name("piano");
        assert!(!ports.observe(&PortEvent::registered("liquidsfz:midi_in", PortKind::Midi)));
        assert!(ports.observe(&PortEvent::registered("piano:midi_in", PortKind::Midi)));
    }

    #[test]
    fn event_serde() {
        let event = PortEvent::registered("liquidsfz:midi_in", PortKind::Midi);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "midi");
        assert_eq!(json["registered"], true);
    }
}
