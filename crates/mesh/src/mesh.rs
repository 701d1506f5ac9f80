//! VoiceMesh – zentrale Dispatch aller Mesh-Ereignisse
//!
//! Besitzt die Zustandsmaschinen (Lobby-Mitgliedschaft, Peer-Verwaltung,
//! Todes-Sichtbarkeit, Sende-Freigabe) und die injizierten Kollaborateure.
//! Jede Zustandsaenderung laeuft ueber [`VoiceMesh::handle`]; es gibt keine
//! weiteren Einstiegspunkte die Zustand veraendern.
//!
//! ## Reihenfolge bei einem Spielzustand-Push
//! 1. Todes-Sichtbarkeit (nur bei Phasenwechsel)
//! 2. Lobby-Mitgliedschaft (neuer Code oder Lobby nach Meeting/Tasks)
//! 3. Erzwungenes Verlassen (Phase -> Menue)
//! 4. `id` ans Relay wenn sich die lokale Spieler-ID geaendert hat
//! 5. Raumklang-Parameter fuer jeden Peer mit Audio-Kanal neu berechnen

use std::collections::{BTreeMap, HashSet};

use crewtalk_audio::{compute_audio_params, PeerGraphConfig, TalkingCallback, TransmitGate};
use crewtalk_core::{
    GamePhase, GameState, OverlayEvent, OverlaySink, OverlayStatus, PeerId, PlayerId, Settings,
    MENU_CODE,
};
use crewtalk_observability::MeshMetrics;
use crewtalk_protocol::{ClientMessage, IceConfig, PeerConfig, ServerMessage};
use tracing::{debug, info, trace, warn};

use crate::death::DeathVisibility;
use crate::error::MeshResult;
use crate::event::{Hotkey, MeshEvent, PeerEvent};
use crate::lobby::{LobbyAktion, LobbyMembership};
use crate::manager::PeerManager;
use crate::peer::Generation;
use crate::transport::{AudioOutput, PeerTransport, SignalSink, TalkingNotifier};

/// Anzeige-Text fuer einen verborgenen Lobby-Code
const VERBORGENE_LOBBY: &str = "LOBBY";

pub struct VoiceMesh<T, S, A, O> {
    transport: T,
    signal: S,
    audio: A,
    overlay: O,

    peers: PeerManager,
    lobby: LobbyMembership,
    tote: DeathVisibility,
    gate: TransmitGate,

    settings: Settings,
    spielzustand: GameState,
    /// Zuletzt angewendeter Lobby-Code
    gemeldeter_code: Option<String>,
    /// Zuletzt ans Relay gemeldete lokale Spieler-ID
    lokale_id: Option<PlayerId>,
    sprechende: HashSet<PeerId>,
    letzte_zuordnung: BTreeMap<PeerId, PlayerId>,

    graph_config: PeerGraphConfig,
    metrics: Option<MeshMetrics>,
    talking: Option<TalkingNotifier>,
}

impl<T, S, A, O> VoiceMesh<T, S, A, O>
where
    T: PeerTransport,
    S: SignalSink,
    A: AudioOutput,
    O: OverlaySink,
{
    pub fn new(transport: T, signal: S, audio: A, overlay: O, settings: Settings) -> Self {
        let graph_config = PeerGraphConfig {
            haunting: settings.haunting,
            ..PeerGraphConfig::default()
        };
        Self {
            transport,
            signal,
            audio,
            overlay,
            peers: PeerManager::new(),
            lobby: LobbyMembership::new(),
            tote: DeathVisibility::new(),
            gate: TransmitGate::new(settings.push_to_talk),
            settings,
            spielzustand: GameState::default(),
            gemeldeter_code: None,
            lokale_id: None,
            sprechende: HashSet::new(),
            letzte_zuordnung: BTreeMap::new(),
            graph_config,
            metrics: None,
            talking: None,
        }
    }

    pub fn mit_metrics(mut self, metrics: MeshMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Empfaenger fuer Sprech-Wechsel aus den Peer-Graphen
    pub fn mit_talking_notifier(mut self, notifier: TalkingNotifier) -> Self {
        self.talking = Some(notifier);
        self
    }

    pub fn mit_sample_rate(mut self, sample_rate: u32) -> Self {
        self.graph_config.sample_rate = sample_rate;
        self
    }

    // -----------------------------------------------------------------------
    // Zugriff
    // -----------------------------------------------------------------------

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn signal(&self) -> &S {
        &self.signal
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn peers(&self) -> &PeerManager {
        &self.peers
    }

    pub fn lobby(&self) -> &LobbyMembership {
        &self.lobby
    }

    pub fn tote(&self) -> &DeathVisibility {
        &self.tote
    }

    pub fn gate(&self) -> &TransmitGate {
        &self.gate
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn spielzustand(&self) -> &GameState {
        &self.spielzustand
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Verarbeitet genau ein Ereignis
    pub fn handle(&mut self, event: MeshEvent) -> MeshResult<()> {
        trace!(art = event.art(), "Mesh-Ereignis");
        let ergebnis = match event {
            MeshEvent::Spielzustand(state) => self.spielzustand_anwenden(state),
            MeshEvent::Einstellungen(settings) => {
                self.einstellungen_anwenden(settings);
                Ok(())
            }
            MeshEvent::Relay(msg) => self.relay_nachricht(msg),
            MeshEvent::RelayVerbunden(verbunden) => self.relay_verbunden(verbunden),
            MeshEvent::Peer {
                peer_id,
                generation,
                event,
            } => self.peer_ereignis(peer_id, generation, event),
            MeshEvent::LokaleSprache(aktiv) => {
                let spricht = aktiv && self.gate.is_transmitting();
                self.overlay.senden(OverlayEvent::SelbstSpricht(spricht));
                Ok(())
            }
            MeshEvent::Hotkey(hotkey) => {
                self.hotkey(hotkey);
                Ok(())
            }
        };
        self.bestand_melden();
        ergebnis
    }

    // -----------------------------------------------------------------------
    // Spielzustand
    // -----------------------------------------------------------------------

    fn spielzustand_anwenden(&mut self, state: GameState) -> MeshResult<()> {
        let alte_phase = self.spielzustand.phase;
        let neue_phase = state.phase;
        let phase_gewechselt = alte_phase != neue_phase;
        self.spielzustand = state;

        let tote_vorher = self.tote.snapshot();
        if phase_gewechselt {
            debug!(von = ?alte_phase, nach = ?neue_phase, "Phasenwechsel");
            self.tote.phase_wechsel(neue_phase, &self.spielzustand.players);
        }

        let code = self.spielzustand.lobby_code.clone();
        let code_geaendert = self.gemeldeter_code.as_deref() != Some(code.as_str());
        let nach_meeting = phase_gewechselt
            && neue_phase == GamePhase::Lobby
            && matches!(alte_phase, GamePhase::Discussion | GamePhase::Tasks);
        if code_geaendert || nach_meeting {
            self.mitgliedschaft(&code)?;
        }

        if phase_gewechselt && alte_phase != GamePhase::Unknown && neue_phase == GamePhase::Menu {
            self.erzwungen_verlassen()?;
        }

        if self.tote.snapshot() != tote_vorher {
            self.overlay
                .senden(OverlayEvent::TotSichtbar(self.tote.snapshot()));
        }

        self.lokale_id_melden()?;
        self.neu_berechnen();
        Ok(())
    }

    /// Lobby-Code anwenden; ein Join ohne lokalen Spieler wird beim
    /// naechsten Push erneut versucht
    fn mitgliedschaft(&mut self, code: &str) -> MeshResult<()> {
        if code.is_empty() {
            return Ok(());
        }
        // Menue-Phase mit veraltetem Code: das Spiel hat uns getrennt
        if self.spielzustand.phase == GamePhase::Menu && code != MENU_CODE {
            return Ok(());
        }
        let lokal = self.spielzustand.lokaler_spieler().map(|p| p.id);
        let aktion = match lokal {
            Some(player_id) => self.lobby.verbinden(code, player_id),
            None if code == MENU_CODE => self.lobby.menu(),
            None => {
                debug!(lobby = %code, "Join zurueckgestellt, kein lokaler Spieler");
                return Ok(());
            }
        };
        self.gemeldeter_code = Some(code.to_string());

        let status = if code == MENU_CODE {
            OverlayStatus::Menu
        } else {
            OverlayStatus::Voice
        };
        self.overlay.senden(OverlayEvent::Status(status));
        self.lobby_anzeige_melden();

        match aktion {
            LobbyAktion::AllesTrennen => self.alles_abbauen(),
            LobbyAktion::Join {
                lobby_code,
                player_id,
            } => {
                self.signal.senden(ClientMessage::Join {
                    lobby_code,
                    player_id,
                })?;
                if let Some(m) = &self.metrics {
                    m.lobby_joins_total.inc();
                }
            }
            LobbyAktion::Keine => {
                trace!(lobby = %code, "Bereits in der Lobby");
            }
        }
        Ok(())
    }

    /// Phase -> Menue ohne Codewechsel (Spiel hat den Spieler getrennt)
    fn erzwungen_verlassen(&mut self) -> MeshResult<()> {
        info!("Erzwungenes Verlassen der Lobby");
        let gesendet = self.signal.senden(ClientMessage::Leave);
        self.alles_abbauen();
        self.tote.leeren();
        self.lobby.verlassen();
        self.gemeldeter_code = None;
        gesendet
    }

    fn alles_abbauen(&mut self) {
        let geloest = self.peers.alle_trennen(&mut self.transport, &mut self.audio);
        for peer_id in geloest {
            self.overlay.senden(OverlayEvent::PeerVerbunden {
                peer_id,
                verbunden: false,
            });
        }
        self.sprechende.clear();
        self.zuordnung_melden();
    }

    fn lokale_id_melden(&mut self) -> MeshResult<()> {
        let Some(player_id) = self.spielzustand.lokaler_spieler().map(|p| p.id) else {
            return Ok(());
        };
        if self.lokale_id != Some(player_id) {
            self.signal.senden(ClientMessage::Id { player_id })?;
            self.lokale_id = Some(player_id);
        }
        Ok(())
    }

    fn lobby_anzeige_melden(&mut self) {
        let Some(code) = self.gemeldeter_code.as_deref() else {
            return;
        };
        let lobby = if self.settings.hide_lobby_code && code != MENU_CODE {
            VERBORGENE_LOBBY.to_string()
        } else {
            code.to_string()
        };
        let server = if self.settings.hide_server_address {
            String::new()
        } else {
            self.settings.server_url.clone()
        };
        self.overlay
            .senden(OverlayEvent::LobbyAnzeige { lobby, server });
    }

    fn zuordnung_melden(&mut self) {
        let aktuell = self.peers.zuordnung();
        if aktuell != self.letzte_zuordnung {
            self.letzte_zuordnung = aktuell.clone();
            self.overlay.senden(OverlayEvent::PeerZuordnung(aktuell));
        }
    }

    /// Raumklang-Parameter fuer alle Peers mit Audio-Kanal
    fn neu_berechnen(&self) {
        let state = &self.spielzustand;
        let Some(me) = state.lokaler_spieler() else {
            return;
        };
        let taub = self.gate.is_deafened();

        for (peer_id, handle) in self.peers.kanaele() {
            let Some(player_id) = self.peers.spieler_von(peer_id) else {
                continue;
            };
            let Some(other) = state.players.iter().find(|p| p.id == player_id) else {
                continue;
            };
            let mut params = compute_audio_params(state.phase, &self.settings, me, other);
            if taub {
                params.gain = 0.0;
            }
            trace!(
                peer = %peer_id,
                player_id = %player_id,
                gain = params.gain,
                x = params.position.x,
                y = params.position.y,
                "Audio-Parameter berechnet"
            );
            handle.setzen(params);
        }
    }

    // -----------------------------------------------------------------------
    // Relay
    // -----------------------------------------------------------------------

    fn relay_nachricht(&mut self, msg: ServerMessage) -> MeshResult<()> {
        debug!(art = msg.art(), "Relay-Nachricht");
        match msg {
            ServerMessage::Join { peer_id, player_id } => {
                let ersetzt = self.peers.join_empfangen(
                    &mut self.transport,
                    &mut self.audio,
                    peer_id.clone(),
                    player_id,
                )?;
                if ersetzt {
                    self.sprechende.remove(&peer_id);
                    self.overlay.senden(OverlayEvent::PeerVerbunden {
                        peer_id,
                        verbunden: false,
                    });
                }
                self.zuordnung_melden();
            }
            ServerMessage::Signal { data, from } => {
                self.peers.signal_empfangen(&mut self.transport, from, data)?;
            }
            ServerMessage::SetId { peer_id, player_id } => {
                self.peers.zuordnen(peer_id, player_id);
                self.zuordnung_melden();
                self.neu_berechnen();
            }
            ServerMessage::SetIds { ids } => {
                self.peers.zuordnungen_setzen(ids);
                self.zuordnung_melden();
                self.neu_berechnen();
            }
            ServerMessage::PeerConfig { config } => {
                let ice = match PeerConfig::validieren(&config) {
                    Ok(ice) => {
                        info!(
                            server = ice.servers.len(),
                            policy = ?ice.transport_policy,
                            "Traversal-Konfiguration vom Relay uebernommen"
                        );
                        ice
                    }
                    Err(e) => {
                        warn!(fehler = %e, "Ungueltige Traversal-Konfiguration, verwende Standard");
                        self.overlay.senden(OverlayEvent::Warnung(e.to_string()));
                        IceConfig::default()
                    }
                };
                self.peers.set_ice(ice);
            }
        }
        Ok(())
    }

    fn relay_verbunden(&mut self, verbunden: bool) -> MeshResult<()> {
        self.overlay.senden(OverlayEvent::RelayVerbunden(verbunden));
        if verbunden {
            info!("Relay verbunden");
            let code = self.spielzustand.lobby_code.clone();
            self.mitgliedschaft(&code)?;
            self.lokale_id_melden()
        } else {
            // Relay kennt uns nach dem Wiederverbinden nicht mehr
            warn!("Relay-Verbindung verloren");
            self.lobby.verlassen();
            self.gemeldeter_code = None;
            self.lokale_id = None;
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Peer-Ereignisse
    // -----------------------------------------------------------------------

    fn peer_ereignis(
        &mut self,
        peer_id: PeerId,
        generation: Generation,
        event: PeerEvent,
    ) -> MeshResult<()> {
        // Abgebaute oder ersetzte Verbindung
        if !self.peers.ist_aktuell(&peer_id, generation) {
            debug!(peer = %peer_id, %generation, art = event.art(), "Veraltetes Peer-Ereignis verworfen");
            return Ok(());
        }
        match event {
            PeerEvent::Signal(data) => {
                trace!(peer = %peer_id, "Signal an Relay");
                self.signal.senden(ClientMessage::Signal { data, to: peer_id })?;
            }
            PeerEvent::StreamEtabliert => {
                let callback = self.talking_callback(&peer_id, generation);
                self.peers
                    .stream_etabliert(&mut self.audio, &peer_id, &self.graph_config, callback)?;
                self.overlay.senden(OverlayEvent::PeerVerbunden {
                    peer_id,
                    verbunden: true,
                });
                self.neu_berechnen();
            }
            PeerEvent::Fehler(code) => {
                if self.peers.fehler(&peer_id, code) {
                    warn!(
                        peer = %peer_id,
                        code = %code,
                        transient = code.is_transient(),
                        "Peer-Fehler"
                    );
                    if let Some(m) = &self.metrics {
                        m.peer_fehler(code.code());
                    }
                }
            }
            PeerEvent::Geschlossen => {
                let Some(outcome) =
                    self.peers
                        .geschlossen(&mut self.transport, &mut self.audio, &peer_id)?
                else {
                    return Ok(());
                };
                if self.sprechende.remove(&peer_id) {
                    if let Some(player_id) = outcome.player_id {
                        self.overlay.senden(OverlayEvent::Spricht {
                            player_id,
                            spricht: false,
                        });
                    }
                }
                if outcome.hatte_kanal {
                    self.overlay.senden(OverlayEvent::PeerVerbunden {
                        peer_id,
                        verbunden: false,
                    });
                }
                if outcome.neuverbindung.is_some() {
                    if let Some(m) = &self.metrics {
                        m.peer_reconnects_total.inc();
                    }
                }
            }
            PeerEvent::Spricht(aktiv) => {
                let Some(handle) = self.peers.kanal(&peer_id) else {
                    return Ok(());
                };
                let spricht = aktiv && handle.params().ist_hoerbar();
                let geaendert = if spricht {
                    self.sprechende.insert(peer_id.clone())
                } else {
                    self.sprechende.remove(&peer_id)
                };
                if let (true, Some(player_id)) = (geaendert, self.peers.spieler_von(&peer_id)) {
                    self.overlay
                        .senden(OverlayEvent::Spricht { player_id, spricht });
                }
            }
        }
        Ok(())
    }

    fn talking_callback(&self, peer_id: &PeerId, generation: Generation) -> Option<TalkingCallback> {
        let notifier = self.talking.clone()?;
        let peer_id = peer_id.clone();
        Some(Box::new(move |spricht| {
            notifier(peer_id.clone(), generation, spricht)
        }))
    }

    // -----------------------------------------------------------------------
    // Einstellungen und Hotkeys
    // -----------------------------------------------------------------------

    fn einstellungen_anwenden(&mut self, settings: Settings) {
        debug!(
            push_to_talk = settings.push_to_talk,
            spatial_audio = settings.spatial_audio,
            haunting = settings.haunting,
            "Einstellungen aktualisiert"
        );
        self.gate.set_push_to_talk(settings.push_to_talk);
        self.graph_config.haunting = settings.haunting;
        self.settings = settings;
        self.transport.mikrofon_freigeben(self.gate.is_transmitting());
        self.lobby_anzeige_melden();
        self.neu_berechnen();
    }

    fn hotkey(&mut self, hotkey: Hotkey) {
        match hotkey {
            Hotkey::MuteUmschalten => self.gate.toggle_mute(),
            Hotkey::DeafenUmschalten => self.gate.toggle_deafen(),
            Hotkey::PushToTalk(gedrueckt) => self.gate.push_to_talk(gedrueckt),
        }
        self.transport.mikrofon_freigeben(self.gate.is_transmitting());
        if !matches!(hotkey, Hotkey::PushToTalk(_)) {
            self.overlay.senden(OverlayEvent::Mikrofon {
                muted: self.gate.is_muted(),
                deafened: self.gate.is_deafened(),
            });
            self.neu_berechnen();
        }
    }

    fn bestand_melden(&self) {
        if let Some(m) = &self.metrics {
            m.bestand_setzen(self.peers.anzahl_peers(), self.peers.anzahl_kanaele());
        }
    }
}
