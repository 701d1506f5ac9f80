//! Aufzeichnende Test-Kollaborateure fuer das Voice-Mesh

#![allow(dead_code)]

use std::collections::HashMap;

use crewtalk_audio::PeerAudioGraph;
use crewtalk_core::{GamePhase, GameState, OverlayEvent, PeerId, Player, PlayerId, Settings};
use crewtalk_mesh::{
    AudioOutput, Generation, MeshEvent, MeshResult, PeerEvent, PeerTransport, SignalSink, VoiceMesh,
};
use crewtalk_protocol::{ClientMessage, IceConfig, ServerMessage, SignalData};

#[derive(Default)]
pub struct Transport {
    /// (Peer, Initiator) je `verbinden`
    pub verbunden: Vec<(PeerId, bool)>,
    pub generationen: Vec<Generation>,
    pub ice: Vec<IceConfig>,
    pub signale: Vec<(PeerId, SignalData)>,
    pub getrennt: Vec<PeerId>,
    pub mikrofon: Vec<bool>,
}

impl Transport {
    pub fn verbindungen_zu(&self, peer_id: &PeerId) -> usize {
        self.verbunden.iter().filter(|(p, _)| p == peer_id).count()
    }
}

impl PeerTransport for Transport {
    fn verbinden(
        &mut self,
        peer_id: &PeerId,
        generation: Generation,
        initiator: bool,
        ice: &IceConfig,
    ) -> MeshResult<()> {
        self.verbunden.push((peer_id.clone(), initiator));
        self.generationen.push(generation);
        self.ice.push(ice.clone());
        Ok(())
    }

    fn signal(&mut self, peer_id: &PeerId, data: SignalData) -> MeshResult<()> {
        self.signale.push((peer_id.clone(), data));
        Ok(())
    }

    fn trennen(&mut self, peer_id: &PeerId) {
        self.getrennt.push(peer_id.clone());
    }

    fn mikrofon_freigeben(&mut self, freigegeben: bool) {
        self.mikrofon.push(freigegeben);
    }
}

#[derive(Default)]
pub struct Relay {
    pub gesendet: Vec<ClientMessage>,
}

impl Relay {
    pub fn joins(&self) -> usize {
        self.gesendet
            .iter()
            .filter(|m| matches!(m, ClientMessage::Join { .. }))
            .count()
    }

    pub fn leaves(&self) -> usize {
        self.gesendet
            .iter()
            .filter(|m| matches!(m, ClientMessage::Leave))
            .count()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.gesendet
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Id { player_id } => Some(*player_id),
                _ => None,
            })
            .collect()
    }
}

impl SignalSink for Relay {
    fn senden(&mut self, message: ClientMessage) -> MeshResult<()> {
        self.gesendet.push(message);
        Ok(())
    }
}

#[derive(Default)]
pub struct Ausgabe {
    pub graphen: HashMap<PeerId, PeerAudioGraph>,
}

impl AudioOutput for Ausgabe {
    fn anschliessen(&mut self, graph: PeerAudioGraph) {
        self.graphen.insert(graph.peer_id().clone(), graph);
    }

    fn trennen(&mut self, peer_id: &PeerId) {
        if let Some(mut graph) = self.graphen.remove(peer_id) {
            graph.trennen();
        }
    }
}

pub type Mesh = VoiceMesh<Transport, Relay, Ausgabe, Vec<OverlayEvent>>;

pub fn mesh(settings: Settings) -> Mesh {
    VoiceMesh::new(
        Transport::default(),
        Relay::default(),
        Ausgabe::default(),
        Vec::new(),
        settings,
    )
}

pub fn ich(id: u32, x: f32, y: f32) -> Player {
    Player {
        is_local: true,
        ..Player::neu(id, x, y)
    }
}

pub fn zustand(phase: GamePhase, code: &str, players: Vec<Player>) -> GameState {
    GameState {
        phase,
        lobby_code: code.to_string(),
        players,
    }
}

pub fn push(mesh: &mut Mesh, phase: GamePhase, code: &str, players: Vec<Player>) {
    mesh.handle(MeshEvent::Spielzustand(zustand(phase, code, players)))
        .unwrap();
}

/// Relay meldet den Peer und der Stream steht
pub fn peer_verbinden(mesh: &mut Mesh, peer: &str, player: u32) -> PeerId {
    let peer_id = PeerId::neu(peer);
    mesh.handle(MeshEvent::Relay(ServerMessage::Join {
        peer_id: peer_id.clone(),
        player_id: PlayerId(player),
    }))
    .unwrap();
    peer_event(mesh, &peer_id, PeerEvent::StreamEtabliert);
    peer_id
}

/// Ereignis der aktuell bestehenden Verbindung des Peers
pub fn peer_event(mesh: &mut Mesh, peer_id: &PeerId, event: PeerEvent) {
    let generation = generation(mesh, peer_id);
    peer_event_von(mesh, peer_id, generation, event);
}

/// Ereignis einer bestimmten Verbindung, auch einer laengst ersetzten
pub fn peer_event_von(mesh: &mut Mesh, peer_id: &PeerId, generation: Generation, event: PeerEvent) {
    mesh.handle(MeshEvent::Peer {
        peer_id: peer_id.clone(),
        generation,
        event,
    })
    .unwrap();
}

/// Generation der bestehenden Verbindung, sonst die zuletzt vergebene
pub fn generation(mesh: &Mesh, peer_id: &PeerId) -> Generation {
    mesh.peers()
        .peer(peer_id)
        .map(|c| c.generation())
        .or_else(|| mesh.transport().generationen.last().copied())
        .unwrap_or_default()
}

pub fn gain(mesh: &Mesh, peer_id: &PeerId) -> f32 {
    mesh.peers()
        .kanal(peer_id)
        .map(|k| k.gain())
        .unwrap_or(f32::NAN)
}
