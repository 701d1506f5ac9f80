//! Peer-Verbindungsverwaltung
//!
//! Haelt pro Peer die Verbindung, die Zuordnung Peer -> Spieler und den
//! Audio-Kanal. Ein Close baut immer vollstaendig ab (Graph loesen,
//! Kanal entfernen) bevor eine Neuverbindung gestartet wird; es gibt nie
//! zwei Kanaele fuer dieselbe Peer-ID. Jede neue Verbindung bekommt eine
//! eigene Generation, auch wenn sie dieselbe Peer-ID ersetzt.

use std::collections::{BTreeMap, HashMap};

use crewtalk_audio::{AudioChannelHandle, PeerAudioGraph, PeerGraphConfig, TalkingCallback};
use crewtalk_core::{PeerId, PlayerId};
use crewtalk_protocol::{IceConfig, SignalData};
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult, PeerErrorCode};
use crate::peer::{Generation, PeerConnection, ReconnectDecision};
use crate::transport::{AudioOutput, PeerTransport};

/// Ergebnis eines verarbeiteten Close
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    pub player_id: Option<PlayerId>,
    /// Es stand ein Audio-Kanal, der jetzt geloest ist
    pub hatte_kanal: bool,
    /// Neuer Zaehlerstand falls sofort neu verbunden wurde
    pub neuverbindung: Option<u8>,
}

#[derive(Default)]
pub struct PeerManager {
    peers: HashMap<PeerId, PeerConnection>,
    player_ids: HashMap<PeerId, PlayerId>,
    kanaele: HashMap<PeerId, AudioChannelHandle>,
    ice: IceConfig,
    /// Zuletzt vergebene Generation
    generation: Generation,
}

impl PeerManager {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Traversal-Konfiguration
    // -----------------------------------------------------------------------

    pub fn ice(&self) -> &IceConfig {
        &self.ice
    }

    /// Gilt fuer alle ab jetzt erzeugten Verbindungen
    pub fn set_ice(&mut self, ice: IceConfig) {
        self.ice = ice;
    }

    // -----------------------------------------------------------------------
    // Erzeugung
    // -----------------------------------------------------------------------

    /// Initiator-Pfad: das Relay meldet einen neuen Peer
    ///
    /// Eine bereits bestehende Verbindung zu diesem Peer wird vorher
    /// vollstaendig abgebaut. Gibt zurueck ob dabei ein Audio-Kanal
    /// geloest wurde.
    pub fn join_empfangen<T, A>(
        &mut self,
        transport: &mut T,
        output: &mut A,
        peer_id: PeerId,
        player_id: PlayerId,
    ) -> MeshResult<bool>
    where
        T: PeerTransport + ?Sized,
        A: AudioOutput + ?Sized,
    {
        let hatte_kanal = if self.peers.contains_key(&peer_id) {
            debug!(peer = %peer_id, "Bestehende Verbindung wird ersetzt");
            self.abbauen(transport, output, &peer_id)
        } else {
            false
        };

        self.player_ids.insert(peer_id.clone(), player_id);
        self.initiator_starten(transport, peer_id, Some(player_id), 0)?;
        Ok(hatte_kanal)
    }

    /// Responder-Pfad bzw. Weiterleitung an eine bestehende Verbindung
    pub fn signal_empfangen<T>(
        &mut self,
        transport: &mut T,
        peer_id: PeerId,
        data: SignalData,
    ) -> MeshResult<()>
    where
        T: PeerTransport + ?Sized,
    {
        if !self.peers.contains_key(&peer_id) {
            let player_id = self.player_ids.get(&peer_id).copied();
            self.generation = self.generation.naechste();
            let generation = self.generation;
            transport.verbinden(&peer_id, generation, false, &self.ice)?;
            info!(peer = %peer_id, %generation, "Peer-Verbindung als Responder erstellt");
            self.peers.insert(
                peer_id.clone(),
                PeerConnection::responder(peer_id.clone(), player_id).mit_generation(generation),
            );
        }
        transport.signal(&peer_id, data)
    }

    fn initiator_starten<T>(
        &mut self,
        transport: &mut T,
        peer_id: PeerId,
        player_id: Option<PlayerId>,
        retries: u8,
    ) -> MeshResult<()>
    where
        T: PeerTransport + ?Sized,
    {
        self.generation = self.generation.naechste();
        let generation = self.generation;
        transport.verbinden(&peer_id, generation, true, &self.ice)?;
        info!(peer = %peer_id, %generation, retries, "Peer-Verbindung als Initiator erstellt");
        self.peers.insert(
            peer_id.clone(),
            PeerConnection::initiator(peer_id, player_id, retries).mit_generation(generation),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Stream steht: Audiograph bauen, Kanal verbunden markieren
    pub fn stream_etabliert<A>(
        &mut self,
        output: &mut A,
        peer_id: &PeerId,
        config: &PeerGraphConfig,
        on_talking: Option<TalkingCallback>,
    ) -> MeshResult<AudioChannelHandle>
    where
        A: AudioOutput + ?Sized,
    {
        let conn = self
            .peers
            .get_mut(peer_id)
            .ok_or_else(|| MeshError::UnbekannterPeer(peer_id.clone()))?;
        conn.stream_established();

        if let Some(alt) = self.kanaele.remove(peer_id) {
            output.trennen(peer_id);
            alt.set_connected(false);
        }

        let handle = AudioChannelHandle::new(peer_id.clone());
        let mut graph = PeerAudioGraph::bauen(handle.clone(), config);
        if let Some(cb) = on_talking {
            graph = graph.mit_talking_callback(cb);
        }
        output.anschliessen(graph);
        self.kanaele.insert(peer_id.clone(), handle.clone());
        info!(peer = %peer_id, "Peer verbunden");
        Ok(handle)
    }

    /// Letzten Fehler merken; `false` fuer unbekannte Peers
    pub fn fehler(&mut self, peer_id: &PeerId, code: PeerErrorCode) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(conn) => {
                conn.fehler_merken(code);
                true
            }
            None => false,
        }
    }

    /// Close verarbeiten: vollstaendig abbauen, dann ggf. neu verbinden
    ///
    /// `None` fuer Peers die bereits entfernt wurden (z.B. nach
    /// `alle_trennen`).
    pub fn geschlossen<T, A>(
        &mut self,
        transport: &mut T,
        output: &mut A,
        peer_id: &PeerId,
    ) -> MeshResult<Option<CloseOutcome>>
    where
        T: PeerTransport + ?Sized,
        A: AudioOutput + ?Sized,
    {
        let Some(mut conn) = self.peers.get(peer_id).cloned() else {
            debug!(peer = %peer_id, "Close fuer unbekannten Peer ignoriert");
            return Ok(None);
        };
        conn.schliessen();
        let hatte_kanal = self.abbauen(transport, output, peer_id);
        let player_id = self.player_ids.get(peer_id).copied().or(conn.player_id());

        let neuverbindung = match conn.reconnect_decision() {
            ReconnectDecision::Erneut { retries } => {
                info!(
                    peer = %peer_id,
                    retries,
                    fehler = ?conn.last_error(),
                    "Automatische Neuverbindung"
                );
                self.initiator_starten(transport, peer_id.clone(), player_id, retries)?;
                Some(retries)
            }
            ReconnectDecision::Endgueltig => {
                if conn.is_initiator() && conn.last_error().is_some_and(|e| e.is_transient()) {
                    warn!(peer = %peer_id, retries = conn.retries(), "Neuverbindungen erschoepft");
                } else {
                    info!(peer = %peer_id, "Peer getrennt");
                }
                None
            }
        };

        Ok(Some(CloseOutcome {
            player_id,
            hatte_kanal,
            neuverbindung,
        }))
    }

    /// Entfernt Verbindung und Kanal eines Peers (Zuordnung bleibt)
    fn abbauen<T, A>(&mut self, transport: &mut T, output: &mut A, peer_id: &PeerId) -> bool
    where
        T: PeerTransport + ?Sized,
        A: AudioOutput + ?Sized,
    {
        transport.trennen(peer_id);
        self.peers.remove(peer_id);
        match self.kanaele.remove(peer_id) {
            Some(handle) => {
                output.trennen(peer_id);
                handle.set_connected(false);
                true
            }
            None => false,
        }
    }

    /// Zerstoert alle Verbindungen und verwirft die Zuordnung
    ///
    /// Gibt die Peers zurueck, deren Audio-Kanal dabei geloest wurde.
    pub fn alle_trennen<T, A>(&mut self, transport: &mut T, output: &mut A) -> Vec<PeerId>
    where
        T: PeerTransport + ?Sized,
        A: AudioOutput + ?Sized,
    {
        let ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        let mut mit_kanal = Vec::new();
        for peer_id in &ids {
            if self.abbauen(transport, output, peer_id) {
                mit_kanal.push(peer_id.clone());
            }
        }
        // Kanaele ohne Verbindung kann es nicht geben, trotzdem aufraeumen
        for (peer_id, handle) in self.kanaele.drain() {
            output.trennen(&peer_id);
            handle.set_connected(false);
            mit_kanal.push(peer_id);
        }
        self.player_ids.clear();
        if !ids.is_empty() {
            info!(anzahl = ids.len(), "Alle Peer-Verbindungen getrennt");
        }
        mit_kanal.sort();
        mit_kanal
    }

    // -----------------------------------------------------------------------
    // Zuordnung Peer -> Spieler
    // -----------------------------------------------------------------------

    /// Einzelne Zuordnung (`setId`); `true` wenn sich etwas geaendert hat
    pub fn zuordnen(&mut self, peer_id: PeerId, player_id: PlayerId) -> bool {
        if let Some(conn) = self.peers.get_mut(&peer_id) {
            conn.set_player_id(Some(player_id));
        }
        self.player_ids.insert(peer_id, player_id) != Some(player_id)
    }

    /// Ersetzt die gesamte Zuordnung (`setIds`)
    pub fn zuordnungen_setzen(&mut self, ids: HashMap<PeerId, PlayerId>) -> bool {
        for (peer_id, conn) in self.peers.iter_mut() {
            conn.set_player_id(ids.get(peer_id).copied());
        }
        let geaendert = self.player_ids != ids;
        self.player_ids = ids;
        geaendert
    }

    pub fn spieler_von(&self, peer_id: &PeerId) -> Option<PlayerId> {
        self.player_ids.get(peer_id).copied()
    }

    /// Sortierte Kopie fuer das Overlay
    pub fn zuordnung(&self) -> BTreeMap<PeerId, PlayerId> {
        self.player_ids
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn peer(&self, peer_id: &PeerId) -> Option<&PeerConnection> {
        self.peers.get(peer_id)
    }

    /// Gehoert ein Transport-Ereignis zur aktuell bestehenden Verbindung?
    pub fn ist_aktuell(&self, peer_id: &PeerId, generation: Generation) -> bool {
        self.peers
            .get(peer_id)
            .is_some_and(|c| c.generation() == generation)
    }

    pub fn kanal(&self, peer_id: &PeerId) -> Option<&AudioChannelHandle> {
        self.kanaele.get(peer_id)
    }

    pub fn kanaele(&self) -> impl Iterator<Item = (&PeerId, &AudioChannelHandle)> {
        self.kanaele.iter()
    }

    pub fn anzahl_peers(&self) -> usize {
        self.peers.len()
    }

    pub fn anzahl_kanaele(&self) -> usize {
        self.kanaele.len()
    }
}
