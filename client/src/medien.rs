//! Medien-Transport ueber WebRTC
//!
//! Jede Peer-Verbindung laeuft als eigener Task, der die
//! `RTCPeerConnection` besitzt und entfernte Signal-Daten der Reihe nach
//! anwendet. Lokale SDP und ICE-Kandidaten, Stream, Fehler und Close gehen
//! als `PeerEvent` mit der Generation der Verbindung in die Event-Schleife.
//!
//! Audio:
//! - Empfang: Opus-Pakete des entfernten Tracks werden zu Mono dekodiert
//!   und in den Mischer eingespeist.
//! - Senden: [`MedienSender`] kodiert die freigegebenen Mikrofon-Frames
//!   einmal und schreibt sie auf den lokalen Track jeder Verbindung.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crewtalk_audio::{AudioResult, OpusDecoder, OpusEncoder, SharedMixer, OPUS_SAMPLE_RATE};
use crewtalk_core::PeerId;
use crewtalk_mesh::{Generation, MeshError, MeshEvent, MeshResult, PeerErrorCode, PeerEvent, PeerTransport};
use crewtalk_protocol::{IceConfig, IceTransportPolicy, SignalData};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS};
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::runtime::EventSender;

/// Dauer eines Opus-Frames auf dem Track
const FRAME_DAUER: Duration = Duration::from_millis(20);

/// Lokale Sende-Tracks aller bestehenden Verbindungen
type Spuren = Arc<Mutex<HashMap<PeerId, (Generation, Arc<TrackLocalStaticSample>)>>>;

// ---------------------------------------------------------------------------
// Signal-Daten
// ---------------------------------------------------------------------------

/// Entfernte Signal-Daten im Format `{type, sdp}` bzw. `{type, candidate}`
#[derive(Debug, Clone)]
pub enum Signal {
    Angebot(String),
    Antwort(String),
    Kandidat(RTCIceCandidateInit),
    /// Wird nicht ausgewertet (z.B. Neuverhandlungs-Anfragen)
    Sonstiges,
}

impl Signal {
    pub fn lesen(data: &SignalData) -> Result<Self, PeerErrorCode> {
        if let Some(kandidat) = data.get("candidate") {
            let candidate = kandidat
                .get("candidate")
                .and_then(Value::as_str)
                .ok_or(PeerErrorCode::AddIceCandidate)?;
            return Ok(Self::Kandidat(RTCIceCandidateInit {
                candidate: candidate.to_string(),
                sdp_mid: kandidat
                    .get("sdpMid")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                sdp_mline_index: kandidat
                    .get("sdpMLineIndex")
                    .and_then(Value::as_u64)
                    .and_then(|i| u16::try_from(i).ok()),
                username_fragment: kandidat
                    .get("usernameFragment")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }));
        }
        let Some(sdp) = data.get("sdp").and_then(Value::as_str) else {
            return Ok(Self::Sonstiges);
        };
        match data.get("type").and_then(Value::as_str) {
            Some("offer") => Ok(Self::Angebot(sdp.to_string())),
            Some("answer") => Ok(Self::Antwort(sdp.to_string())),
            _ => Err(PeerErrorCode::SetRemoteDescription),
        }
    }
}

/// Lokale Beschreibung als Signal-Daten
pub fn beschreibung_signal(desc: &RTCSessionDescription) -> SignalData {
    json!({ "type": desc.sdp_type.to_string(), "sdp": desc.sdp })
}

/// Lokaler Kandidat als Signal-Daten
pub fn kandidat_signal(init: &RTCIceCandidateInit) -> SignalData {
    json!({
        "type": "candidate",
        "candidate": {
            "candidate": init.candidate,
            "sdpMid": init.sdp_mid,
            "sdpMLineIndex": init.sdp_mline_index,
        }
    })
}

/// Traversal-Konfiguration des Relays fuer eine neue Verbindung
pub fn rtc_konfiguration(ice: &IceConfig) -> RTCConfiguration {
    let ice_servers = ice
        .servers
        .iter()
        .map(|s| RTCIceServer {
            urls: vec![s.url.clone()],
            username: s.username.clone().unwrap_or_default(),
            credential: s.credential.clone().unwrap_or_default(),
            ..Default::default()
        })
        .collect();
    let ice_transport_policy = match ice.transport_policy {
        IceTransportPolicy::All => RTCIceTransportPolicy::All,
        IceTransportPolicy::Relay => RTCIceTransportPolicy::Relay,
    };
    RTCConfiguration {
        ice_servers,
        ice_transport_policy,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Rueckmeldungen einer Verbindung
// ---------------------------------------------------------------------------

/// Meldet Ereignisse genau einer Verbindung (Peer + Generation)
struct Ziel {
    peer_id: PeerId,
    generation: Generation,
    events: EventSender,
    geschlossen: AtomicBool,
}

impl Ziel {
    fn melden(&self, event: PeerEvent) {
        let _ = self.events.send(MeshEvent::Peer {
            peer_id: self.peer_id.clone(),
            generation: self.generation,
            event,
        });
    }

    /// Close hoechstens einmal pro Verbindung
    fn schliessen(&self) {
        if !self.geschlossen.swap(true, Ordering::AcqRel) {
            self.melden(PeerEvent::Geschlossen);
        }
    }

    /// Fehler und Close; nur der erste Abbruch zaehlt
    fn abbrechen(&self, code: PeerErrorCode) {
        if self.geschlossen.swap(true, Ordering::AcqRel) {
            return;
        }
        warn!(peer = %self.peer_id, generation = %self.generation, code = %code, "Peer-Verbindung abgebrochen");
        self.melden(PeerEvent::Fehler(code));
        self.melden(PeerEvent::Geschlossen);
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Laufende Verbindung aus Sicht des Transports
struct Verbindung {
    generation: Generation,
    /// Entfernte Signal-Daten an den Verbindungs-Task
    signale: mpsc::UnboundedSender<SignalData>,
}

pub struct WebRtcTransport {
    api: Arc<API>,
    laufzeit: Handle,
    events: EventSender,
    mixer: SharedMixer,
    verbindungen: HashMap<PeerId, Verbindung>,
    spuren: Spuren,
}

impl WebRtcTransport {
    /// Muss innerhalb der Tokio-Runtime erzeugt werden
    pub fn neu(events: EventSender, mixer: SharedMixer) -> Result<Self, webrtc::Error> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;
        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self {
            api: Arc::new(api),
            laufzeit: Handle::current(),
            events,
            mixer,
            verbindungen: HashMap::new(),
            spuren: Arc::default(),
        })
    }

    /// Sendepfad fuer die freigegebenen Mikrofon-Frames
    ///
    /// `channels` muss zur Aufnahme passen (1 oder 2).
    pub fn sender(&self, channels: u16) -> AudioResult<MedienSender> {
        let encoder = OpusEncoder::new(channels)?;
        let (pakete, rx) = mpsc::unbounded_channel();
        self.laufzeit.spawn(pakete_verteilen(rx, self.spuren.clone()));
        Ok(MedienSender { encoder, pakete })
    }

    pub fn anzahl_verbindungen(&self) -> usize {
        self.verbindungen.len()
    }
}

impl PeerTransport for WebRtcTransport {
    fn verbinden(
        &mut self,
        peer_id: &PeerId,
        generation: Generation,
        initiator: bool,
        ice: &IceConfig,
    ) -> MeshResult<()> {
        let (signale, rx) = mpsc::unbounded_channel();
        let ziel = Arc::new(Ziel {
            peer_id: peer_id.clone(),
            generation,
            events: self.events.clone(),
            geschlossen: AtomicBool::new(false),
        });
        debug!(peer = %peer_id, %generation, initiator, server = ice.servers.len(), "WebRTC-Verbindung wird aufgebaut");
        self.laufzeit.spawn(verbindung_bedienen(
            self.api.clone(),
            ziel,
            initiator,
            rtc_konfiguration(ice),
            rx,
            self.spuren.clone(),
            self.mixer.clone(),
        ));
        // Eine alte Verbindung endet mit dem Drop ihres Senders
        self.verbindungen
            .insert(peer_id.clone(), Verbindung { generation, signale });
        Ok(())
    }

    fn signal(&mut self, peer_id: &PeerId, data: SignalData) -> MeshResult<()> {
        let verbindung = self
            .verbindungen
            .get(peer_id)
            .ok_or_else(|| MeshError::UnbekannterPeer(peer_id.clone()))?;
        verbindung
            .signale
            .send(data)
            .map_err(|_| MeshError::Transport {
                peer: peer_id.clone(),
                code: PeerErrorCode::Signaling,
            })
    }

    fn trennen(&mut self, peer_id: &PeerId) {
        if let Some(verbindung) = self.verbindungen.remove(peer_id) {
            debug!(peer = %peer_id, generation = %verbindung.generation, "WebRTC-Verbindung wird getrennt");
        }
    }

    fn mikrofon_freigeben(&mut self, freigegeben: bool) {
        trace!(freigegeben, "Mikrofon-Freigabe");
    }
}

// ---------------------------------------------------------------------------
// Verbindungs-Task
// ---------------------------------------------------------------------------

async fn verbindung_bedienen(
    api: Arc<API>,
    ziel: Arc<Ziel>,
    initiator: bool,
    config: RTCConfiguration,
    mut signale: mpsc::UnboundedReceiver<SignalData>,
    spuren: Spuren,
    mixer: SharedMixer,
) {
    let pc = match api.new_peer_connection(config).await {
        Ok(pc) => Arc::new(pc),
        Err(e) => {
            warn!(peer = %ziel.peer_id, fehler = %e, "Peer-Verbindung konnte nicht erzeugt werden");
            ziel.abbrechen(PeerErrorCode::WebrtcSupport);
            return;
        }
    };

    let ergebnis = match einrichten(&pc, &ziel, &spuren, mixer).await {
        Ok(()) if initiator => angebot_senden(&pc, &ziel).await,
        andere => andere,
    };
    let ergebnis = match ergebnis {
        Ok(()) => signale_anwenden(&pc, &ziel, &mut signale).await,
        Err(code) => Err(code),
    };
    if let Err(code) = ergebnis {
        ziel.abbrechen(code);
    }

    {
        let mut spuren = spuren.lock();
        if spuren.get(&ziel.peer_id).is_some_and(|(g, _)| *g == ziel.generation) {
            spuren.remove(&ziel.peer_id);
        }
    }
    if let Err(e) = pc.close().await {
        debug!(peer = %ziel.peer_id, fehler = %e, "Schliessen fehlgeschlagen");
    }
    debug!(peer = %ziel.peer_id, generation = %ziel.generation, "Verbindungs-Task beendet");
}

/// Track und Callbacks anlegen
async fn einrichten(
    pc: &Arc<RTCPeerConnection>,
    ziel: &Arc<Ziel>,
    spuren: &Spuren,
    mixer: SharedMixer,
) -> Result<(), PeerErrorCode> {
    let spur = Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: OPUS_SAMPLE_RATE,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
            rtcp_feedback: vec![],
        },
        "audio".to_owned(),
        "crewtalk".to_owned(),
    ));
    pc.add_track(spur.clone() as Arc<dyn TrackLocal + Send + Sync>)
        .await
        .map_err(|e| {
            warn!(peer = %ziel.peer_id, fehler = %e, "Audio-Track abgelehnt");
            PeerErrorCode::WebrtcSupport
        })?;
    spuren
        .lock()
        .insert(ziel.peer_id.clone(), (ziel.generation, spur));

    let z = ziel.clone();
    pc.on_ice_candidate(Box::new(move |kandidat| {
        if let Some(init) = kandidat.and_then(|k| k.to_json().ok()) {
            z.melden(PeerEvent::Signal(kandidat_signal(&init)));
        }
        Box::pin(async {})
    }));

    let z = ziel.clone();
    pc.on_ice_connection_state_change(Box::new(move |zustand: RTCIceConnectionState| {
        trace!(peer = %z.peer_id, ?zustand, "ICE-Zustand");
        if zustand == RTCIceConnectionState::Failed {
            z.abbrechen(PeerErrorCode::IceConnectionFailure);
        }
        Box::pin(async {})
    }));

    let z = ziel.clone();
    pc.on_peer_connection_state_change(Box::new(move |zustand: RTCPeerConnectionState| {
        match zustand {
            RTCPeerConnectionState::Connected => {
                info!(peer = %z.peer_id, generation = %z.generation, "WebRTC verbunden")
            }
            RTCPeerConnectionState::Failed => z.abbrechen(PeerErrorCode::ConnectionFailure),
            RTCPeerConnectionState::Closed => z.schliessen(),
            _ => trace!(peer = %z.peer_id, ?zustand, "Verbindungszustand"),
        }
        Box::pin(async {})
    }));

    let z = ziel.clone();
    pc.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
        if track.kind() == RTPCodecType::Audio {
            z.melden(PeerEvent::StreamEtabliert);
            // Lese-Schleife in eigenem Task, sonst blockiert der Handler
            tokio::spawn(empfangen(track, z.peer_id.clone(), mixer.clone()));
        }
        Box::pin(async {})
    }));

    Ok(())
}

async fn angebot_senden(pc: &RTCPeerConnection, ziel: &Ziel) -> Result<(), PeerErrorCode> {
    let angebot = pc
        .create_offer(None)
        .await
        .map_err(|_| PeerErrorCode::CreateOffer)?;
    pc.set_local_description(angebot.clone())
        .await
        .map_err(|_| PeerErrorCode::SetLocalDescription)?;
    ziel.melden(PeerEvent::Signal(beschreibung_signal(&angebot)));
    Ok(())
}

/// Wendet entfernte Signal-Daten an bis die Verbindung getrennt wird
async fn signale_anwenden(
    pc: &RTCPeerConnection,
    ziel: &Ziel,
    signale: &mut mpsc::UnboundedReceiver<SignalData>,
) -> Result<(), PeerErrorCode> {
    while let Some(data) = signale.recv().await {
        match Signal::lesen(&data)? {
            Signal::Angebot(sdp) => {
                let desc = RTCSessionDescription::offer(sdp)
                    .map_err(|_| PeerErrorCode::SetRemoteDescription)?;
                pc.set_remote_description(desc)
                    .await
                    .map_err(|_| PeerErrorCode::SetRemoteDescription)?;
                let antwort = pc
                    .create_answer(None)
                    .await
                    .map_err(|_| PeerErrorCode::CreateAnswer)?;
                pc.set_local_description(antwort.clone())
                    .await
                    .map_err(|_| PeerErrorCode::SetLocalDescription)?;
                ziel.melden(PeerEvent::Signal(beschreibung_signal(&antwort)));
            }
            Signal::Antwort(sdp) => {
                let desc = RTCSessionDescription::answer(sdp)
                    .map_err(|_| PeerErrorCode::SetRemoteDescription)?;
                pc.set_remote_description(desc)
                    .await
                    .map_err(|_| PeerErrorCode::SetRemoteDescription)?;
            }
            Signal::Kandidat(init) => {
                pc.add_ice_candidate(init)
                    .await
                    .map_err(|_| PeerErrorCode::AddIceCandidate)?;
            }
            Signal::Sonstiges => trace!(peer = %ziel.peer_id, "Signal ignoriert"),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Dekodiert ein Paket und speist es in den Mischer; Anzahl uebernommener Samples
pub fn paket_einspeisen(
    decoder: &mut OpusDecoder,
    mixer: &SharedMixer,
    peer_id: &PeerId,
    paket: &[u8],
) -> usize {
    match decoder.decode(paket) {
        Ok(pcm) => mixer.lock().einspeisen(peer_id, &pcm),
        Err(e) => {
            trace!(peer = %peer_id, fehler = %e, "Paket verworfen");
            0
        }
    }
}

async fn empfangen(track: Arc<TrackRemote>, peer_id: PeerId, mixer: SharedMixer) {
    let mut decoder = match OpusDecoder::new() {
        Ok(d) => d,
        Err(e) => {
            warn!(peer = %peer_id, fehler = %e, "Opus-Decoder nicht verfuegbar");
            return;
        }
    };
    debug!(peer = %peer_id, ssrc = track.ssrc(), "Empfang gestartet");
    loop {
        match track.read_rtp().await {
            Ok((paket, _)) if paket.payload.is_empty() => continue,
            Ok((paket, _)) => {
                paket_einspeisen(&mut decoder, &mixer, &peer_id, &paket.payload);
            }
            Err(e) => {
                debug!(peer = %peer_id, fehler = %e, "Empfang beendet");
                break;
            }
        }
    }
}

/// Kodiert freigegebene Mikrofon-Frames fuer alle Verbindungen
pub struct MedienSender {
    encoder: OpusEncoder,
    pakete: mpsc::UnboundedSender<Vec<u8>>,
}

impl MedienSender {
    pub fn senden(&mut self, frame: &[f32]) {
        match self.encoder.encode(frame) {
            Ok(paket) => {
                let _ = self.pakete.send(paket);
            }
            Err(e) => warn!(fehler = %e, "Mikrofon-Frame nicht kodiert"),
        }
    }
}

async fn pakete_verteilen(mut pakete: mpsc::UnboundedReceiver<Vec<u8>>, spuren: Spuren) {
    while let Some(paket) = pakete.recv().await {
        let ziele: Vec<_> = spuren.lock().values().map(|(_, s)| s.clone()).collect();
        if ziele.is_empty() {
            continue;
        }
        let sample = Sample {
            data: paket.into(),
            duration: FRAME_DAUER,
            ..Default::default()
        };
        for spur in ziele {
            if let Err(e) = spur.write_sample(&sample).await {
                trace!(fehler = %e, "Sample nicht geschrieben");
            }
        }
    }
    debug!("Sendepfad beendet");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{event_kanal, EventReceiver};
    use crewtalk_audio::{
        AudioChannelHandle, PeerAudioGraph, PeerGraphConfig, PeerMixer, OPUS_FRAME_SAMPLES,
    };
    use crewtalk_protocol::IceServer;

    fn ohne_server() -> IceConfig {
        IceConfig {
            transport_policy: IceTransportPolicy::All,
            servers: Vec::new(),
        }
    }

    /// Naechste lokale Beschreibung (Kandidaten werden uebersprungen)
    async fn naechste_beschreibung(rx: &mut EventReceiver) -> (PeerId, Generation, SignalData) {
        let warten = async {
            while let Some(event) = rx.recv().await {
                match event {
                    MeshEvent::Peer {
                        peer_id,
                        generation,
                        event: PeerEvent::Signal(data),
                    } if data.get("sdp").is_some() => return Some((peer_id, generation, data)),
                    MeshEvent::Peer {
                        event: PeerEvent::Fehler(code),
                        ..
                    } => panic!("unerwarteter Fehler {code}"),
                    _ => {}
                }
            }
            None
        };
        tokio::time::timeout(Duration::from_secs(10), warten)
            .await
            .expect("keine Beschreibung")
            .expect("Kanal geschlossen")
    }

    #[test]
    fn ice_konfiguration_wird_uebernommen() {
        let ice = IceConfig {
            transport_policy: IceTransportPolicy::Relay,
            servers: vec![
                IceServer::stun("stun:stun.example.org:3478"),
                IceServer {
                    url: "turn:turn.example.org:3478".into(),
                    username: Some("crew".into()),
                    credential: Some("geheim".into()),
                },
            ],
        };
        let config = rtc_konfiguration(&ice);
        assert_eq!(config.ice_transport_policy, RTCIceTransportPolicy::Relay);
        assert_eq!(config.ice_servers.len(), 2);
        assert_eq!(config.ice_servers[0].urls, vec!["stun:stun.example.org:3478"]);
        assert!(config.ice_servers[0].username.is_empty());
        assert_eq!(config.ice_servers[1].username, "crew");
        assert_eq!(config.ice_servers[1].credential, "geheim");

        let standard = rtc_konfiguration(&IceConfig::default());
        assert_eq!(standard.ice_transport_policy, RTCIceTransportPolicy::All);
    }

    #[test]
    fn signal_formate_lesen() {
        let angebot = json!({"type": "offer", "sdp": "v=0"});
        assert!(matches!(Signal::lesen(&angebot), Ok(Signal::Angebot(sdp)) if sdp == "v=0"));

        let antwort = json!({"type": "answer", "sdp": "v=0"});
        assert!(matches!(Signal::lesen(&antwort), Ok(Signal::Antwort(sdp)) if sdp == "v=0"));

        let kandidat = json!({
            "type": "candidate",
            "candidate": {"candidate": "candidate:1 1 udp 1 10.0.0.1 5000 typ host", "sdpMid": "0", "sdpMLineIndex": 0}
        });
        let Ok(Signal::Kandidat(init)) = Signal::lesen(&kandidat) else {
            panic!("kein Kandidat");
        };
        assert_eq!(init.sdp_mid.as_deref(), Some("0"));
        assert_eq!(init.sdp_mline_index, Some(0));
        let zurueck = kandidat_signal(&init);
        assert_eq!(zurueck["type"], "candidate");
        assert!(matches!(
            Signal::lesen(&zurueck),
            Ok(Signal::Kandidat(k)) if k.candidate == init.candidate && k.sdp_mid == init.sdp_mid
        ));

        assert!(matches!(
            Signal::lesen(&json!({"renegotiate": true})),
            Ok(Signal::Sonstiges)
        ));
    }

    #[test]
    fn kaputte_signale_sind_fehler() {
        assert!(matches!(
            Signal::lesen(&json!({"type": "rollback", "sdp": "v=0"})),
            Err(PeerErrorCode::SetRemoteDescription)
        ));
        assert!(matches!(
            Signal::lesen(&json!({"candidate": {"sdpMid": "0"}})),
            Err(PeerErrorCode::AddIceCandidate)
        ));
    }

    #[test]
    fn empfangenes_paket_landet_im_mischer() {
        let mixer = PeerMixer::geteilt();
        let b = PeerId::neu("b");
        mixer.lock().anschliessen(PeerAudioGraph::bauen(
            AudioChannelHandle::new(b.clone()),
            &PeerGraphConfig::default(),
        ));
        let mut encoder = OpusEncoder::new(1).unwrap();
        let paket = encoder.encode(&vec![0.2f32; OPUS_FRAME_SAMPLES]).unwrap();

        let mut decoder = OpusDecoder::new().unwrap();
        assert_eq!(paket_einspeisen(&mut decoder, &mixer, &b, &paket), OPUS_FRAME_SAMPLES);
        // Unbekannter Peer und kaputtes Paket werden verworfen
        assert_eq!(paket_einspeisen(&mut decoder, &mixer, &PeerId::neu("x"), &paket), 0);
        assert_eq!(paket_einspeisen(&mut decoder, &mixer, &b, &[0x03, 0x00]), 0);
    }

    #[tokio::test]
    async fn initiator_schickt_angebot_mit_generation() {
        let (tx, mut rx) = event_kanal();
        let mut transport = WebRtcTransport::neu(tx, PeerMixer::geteilt()).unwrap();
        let b = PeerId::neu("b");
        transport.verbinden(&b, Generation(3), true, &ohne_server()).unwrap();

        let (peer_id, generation, data) = naechste_beschreibung(&mut rx).await;
        assert_eq!(peer_id, b);
        assert_eq!(generation, Generation(3));
        assert_eq!(data["type"], "offer");
        assert!(data["sdp"].as_str().unwrap().contains("opus"));
        assert_eq!(transport.anzahl_verbindungen(), 1);
    }

    #[tokio::test]
    async fn responder_beantwortet_angebot() {
        let (a_tx, mut a_rx) = event_kanal();
        let (b_tx, mut b_rx) = event_kanal();
        let mut a = WebRtcTransport::neu(a_tx, PeerMixer::geteilt()).unwrap();
        let mut b = WebRtcTransport::neu(b_tx, PeerMixer::geteilt()).unwrap();
        let (peer_a, peer_b) = (PeerId::neu("a"), PeerId::neu("b"));

        a.verbinden(&peer_b, Generation(1), true, &ohne_server()).unwrap();
        let (_, _, angebot) = naechste_beschreibung(&mut a_rx).await;

        b.verbinden(&peer_a, Generation(1), false, &ohne_server()).unwrap();
        b.signal(&peer_a, angebot).unwrap();
        let (_, _, antwort) = naechste_beschreibung(&mut b_rx).await;
        assert_eq!(antwort["type"], "answer");

        a.signal(&peer_b, antwort).unwrap();
    }

    #[tokio::test]
    async fn signal_nach_trennen_ist_fehler() {
        let (tx, _rx) = event_kanal();
        let mut transport = WebRtcTransport::neu(tx, PeerMixer::geteilt()).unwrap();
        let b = PeerId::neu("b");
        transport.verbinden(&b, Generation(1), false, &ohne_server()).unwrap();
        transport.trennen(&b);

        assert_eq!(transport.anzahl_verbindungen(), 0);
        let err = transport.signal(&b, json!({"sdp": "x"})).unwrap_err();
        assert!(matches!(err, MeshError::UnbekannterPeer(_)));
    }

    #[tokio::test]
    async fn signal_an_beendeten_task_ist_transportfehler() {
        let (tx, mut rx) = event_kanal();
        let mut transport = WebRtcTransport::neu(tx, PeerMixer::geteilt()).unwrap();
        let b = PeerId::neu("b");
        transport.verbinden(&b, Generation(1), false, &ohne_server()).unwrap();

        // Kaputtes Signal beendet den Verbindungs-Task
        transport
            .signal(&b, json!({"type": "rollback", "sdp": "v=0"}))
            .unwrap();
        let geschlossen = async {
            while let Some(event) = rx.recv().await {
                if let MeshEvent::Peer {
                    event: PeerEvent::Geschlossen,
                    ..
                } = event
                {
                    return;
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(10), geschlossen)
            .await
            .expect("kein Geschlossen");

        let ergebnis = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match transport.signal(&b, json!({"type": "answer", "sdp": "v=0"})) {
                    Err(err) => return err,
                    Ok(()) => tokio::time::sleep(Duration::from_millis(10)).await,
                }
            }
        })
        .await
        .expect("Signal blieb zustellbar");
        assert!(matches!(
            ergebnis,
            MeshError::Transport {
                code: PeerErrorCode::Signaling,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn sender_kodiert_mikrofon_frames() {
        let (tx, _rx) = event_kanal();
        let transport = WebRtcTransport::neu(tx, PeerMixer::geteilt()).unwrap();
        let mut sender = transport.sender(2).unwrap();
        // Ohne Verbindungen wird nur kodiert und verworfen
        sender.senden(&vec![0.1f32; OPUS_FRAME_SAMPLES * 2]);
        sender.senden(&[0.0; 10]);
        assert!(transport.sender(3).is_err());
    }
}
