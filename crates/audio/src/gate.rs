//! Sende-Freigabe des Mikrofons
//!
//! Ein einziger Mikrofon-Stream wird an alle Peers verteilt; hier wird nur
//! global entschieden ob er gerade freigegeben ist. Push-to-Talk, Mute und
//! Deafen kommen von Hotkeys.

/// Zustand von Push-to-Talk, Mute und Deafen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransmitGate {
    push_to_talk: bool,
    /// Push-to-Talk-Taste aktuell gedrueckt?
    key_held: bool,
    muted: bool,
    /// Deafen: nichts hoeren und nichts senden
    deafened: bool,
}

impl TransmitGate {
    pub fn new(push_to_talk: bool) -> Self {
        Self {
            push_to_talk,
            ..Self::default()
        }
    }

    /// Modus wechseln (aus den Einstellungen); eine gehaltene Taste verfaellt
    pub fn set_push_to_talk(&mut self, push_to_talk: bool) {
        if self.push_to_talk != push_to_talk {
            self.push_to_talk = push_to_talk;
            self.key_held = false;
        }
    }

    /// Push-to-Talk-Taste; ohne Push-to-Talk-Modus ohne Wirkung
    pub fn push_to_talk(&mut self, pressed: bool) {
        if self.push_to_talk {
            self.key_held = pressed;
        }
    }

    pub fn toggle_mute(&mut self) {
        if self.deafened {
            // Aus dem Deafen heraus wird alles aufgehoben
            self.deafened = false;
            self.muted = false;
        } else {
            self.muted = !self.muted;
        }
    }

    pub fn toggle_deafen(&mut self) {
        self.deafened = !self.deafened;
    }

    /// Wird das Mikrofon gerade an die Peers gesendet?
    pub fn is_transmitting(&self) -> bool {
        if self.muted || self.deafened {
            return false;
        }
        !self.push_to_talk || self.key_held
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_deafened(&self) -> bool {
        self.deafened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohne_ptt_sendet_standardmaessig() {
        let gate = TransmitGate::new(false);
        assert!(gate.is_transmitting());
    }

    #[test]
    fn ptt_sendet_nur_waehrend_taste_gedrueckt() {
        let mut gate = TransmitGate::new(true);
        assert!(!gate.is_transmitting());
        gate.push_to_talk(true);
        assert!(gate.is_transmitting());
        gate.push_to_talk(false);
        assert!(!gate.is_transmitting());
    }

    #[test]
    fn ptt_taste_ohne_ptt_modus_wirkungslos() {
        let mut gate = TransmitGate::new(false);
        gate.push_to_talk(true);
        gate.set_push_to_talk(true);
        assert!(!gate.is_transmitting());
    }

    #[test]
    fn mute_verhindert_sendung() {
        let mut gate = TransmitGate::new(true);
        gate.push_to_talk(true);
        gate.toggle_mute();
        assert!(!gate.is_transmitting());
        gate.toggle_mute();
        assert!(gate.is_transmitting());
    }

    #[test]
    fn deafen_verhindert_sendung() {
        let mut gate = TransmitGate::new(false);
        gate.toggle_deafen();
        assert!(gate.is_deafened());
        assert!(!gate.is_transmitting());
    }

    #[test]
    fn mute_waehrend_deafen_hebt_beides_auf() {
        let mut gate = TransmitGate::new(false);
        gate.toggle_mute();
        gate.toggle_deafen();
        gate.toggle_mute();
        assert!(!gate.is_muted());
        assert!(!gate.is_deafened());
        assert!(gate.is_transmitting());
    }

    #[test]
    fn moduswechsel_laesst_taste_los() {
        let mut gate = TransmitGate::new(true);
        gate.push_to_talk(true);
        gate.set_push_to_talk(false);
        gate.set_push_to_talk(true);
        assert!(!gate.is_transmitting());
    }
}
