//! Integration-Tests fuer Lobby-Mitgliedschaft und Todes-Sichtbarkeit

mod common;

use common::*;
use crewtalk_core::{
    GamePhase, OverlayEvent, OverlayStatus, PeerId, Player, PlayerId, Settings, MENU_CODE,
};
use crewtalk_mesh::{MeshEvent, Membership};

fn lebend(id: u32) -> Player {
    Player::neu(id, 1.0, 0.0)
}

fn tot(id: u32) -> Player {
    Player {
        is_dead: true,
        ..Player::neu(id, 1.0, 0.0)
    }
}

#[test]
fn gleicher_code_sendet_nur_einen_join() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    assert_eq!(m.signal().joins(), 1);
    assert_eq!(m.lobby().zustand(), &Membership::Joined("ABCDE".into()));
}

#[test]
fn lobby_nach_meeting_bestaetigt_ohne_neuen_join() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    let peer = peer_verbinden(&mut m, "b", 2);
    push(&mut m, GamePhase::Tasks, "ABCDE", vec![ich(1, 0.0, 0.0), lebend(2)]);
    push(&mut m, GamePhase::Discussion, "ABCDE", vec![ich(1, 0.0, 0.0), lebend(2)]);
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0), lebend(2)]);

    assert_eq!(m.signal().joins(), 1);
    let status = m
        .overlay()
        .iter()
        .filter(|e| matches!(e, OverlayEvent::Status(OverlayStatus::Voice)))
        .count();
    assert_eq!(status, 2);
    // Bestehende Verbindung bleibt unangetastet
    assert!(m.transport().getrennt.is_empty());
    assert!(m.peers().kanal(&peer).is_some());
}

#[test]
fn neuer_code_tritt_bei_ohne_verbindungen_abzubauen() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    peer_verbinden(&mut m, "b", 2);
    push(&mut m, GamePhase::Lobby, "FGHIJ", vec![ich(1, 0.0, 0.0)]);
    assert_eq!(m.signal().joins(), 2);
    assert_eq!(m.peers().anzahl_peers(), 1);
}

#[test]
fn menu_code_trennt_alle_peers() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    let b = peer_verbinden(&mut m, "b", 2);
    let c = peer_verbinden(&mut m, "c", 3);

    push(&mut m, GamePhase::Lobby, MENU_CODE, vec![ich(1, 0.0, 0.0)]);

    assert_eq!(m.signal().joins(), 1);
    assert_eq!(m.lobby().zustand(), &Membership::NotJoined);
    assert_eq!(m.peers().anzahl_peers(), 0);
    assert_eq!(m.peers().anzahl_kanaele(), 0);
    assert!(m.peers().zuordnung().is_empty());
    assert!(m.transport().getrennt.contains(&b));
    assert!(m.transport().getrennt.contains(&c));
    assert!(m.audio().graphen.is_empty());
    assert!(matches!(
        m.overlay().last(),
        Some(OverlayEvent::PeerZuordnung(ids)) if ids.is_empty()
    ));
}

#[test]
fn menu_ohne_lokalen_spieler_trennt_trotzdem() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    peer_verbinden(&mut m, "b", 2);
    push(&mut m, GamePhase::Lobby, MENU_CODE, vec![]);
    assert_eq!(m.peers().anzahl_peers(), 0);
    assert!(m
        .overlay()
        .contains(&OverlayEvent::Status(OverlayStatus::Menu)));
}

#[test]
fn phase_menue_erzwingt_leave() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    peer_verbinden(&mut m, "b", 2);
    push(&mut m, GamePhase::Discussion, "ABCDE", vec![ich(1, 0.0, 0.0), tot(2)]);
    assert!(m.tote().wirkt_tot(PlayerId(2)));

    push(&mut m, GamePhase::Menu, "ABCDE", vec![ich(1, 0.0, 0.0)]);

    assert_eq!(m.signal().leaves(), 1);
    assert_eq!(m.peers().anzahl_peers(), 0);
    assert!(m.tote().ist_leer());
    assert_eq!(m.lobby().zustand(), &Membership::NotJoined);

    // Veralteter Code im Menue fuehrt zu keinem Join
    push(&mut m, GamePhase::Menu, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    assert_eq!(m.signal().joins(), 1);

    // Zurueck in der Lobby wird wieder beigetreten
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    assert_eq!(m.signal().joins(), 2);
}

#[test]
fn erster_push_im_menue_sendet_kein_leave() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Menu, MENU_CODE, vec![]);
    assert_eq!(m.signal().leaves(), 0);
    assert_eq!(m.signal().joins(), 0);
}

#[test]
fn join_wartet_auf_lokalen_spieler() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![lebend(2)]);
    assert_eq!(m.signal().joins(), 0);
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0), lebend(2)]);
    assert_eq!(m.signal().joins(), 1);
}

#[test]
fn leerer_code_wird_ignoriert() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "", vec![ich(1, 0.0, 0.0)]);
    assert_eq!(m.signal().joins(), 0);
    assert_eq!(m.lobby().zustand(), &Membership::NotJoined);
}

#[test]
fn id_bei_wechsel_der_spieler_id() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(4, 0.0, 0.0)]);
    assert_eq!(m.signal().ids(), vec![PlayerId(1), PlayerId(4)]);
}

#[test]
fn lobby_anzeige_verborgen() {
    let settings = Settings {
        hide_lobby_code: true,
        hide_server_address: true,
        ..Settings::default()
    };
    let mut m = mesh(settings);
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    assert!(m.overlay().contains(&OverlayEvent::LobbyAnzeige {
        lobby: "LOBBY".into(),
        server: String::new(),
    }));
}

#[test]
fn lobby_anzeige_sichtbar() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    assert!(m.overlay().contains(&OverlayEvent::LobbyAnzeige {
        lobby: "ABCDE".into(),
        server: Settings::default().server_url,
    }));
}

#[test]
fn relay_verlust_fuehrt_zu_neuem_join() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    m.handle(MeshEvent::RelayVerbunden(false)).unwrap();
    assert!(!m.lobby().ist_beigetreten());
    m.handle(MeshEvent::RelayVerbunden(true)).unwrap();

    assert_eq!(m.signal().joins(), 2);
    assert_eq!(m.signal().ids(), vec![PlayerId(1), PlayerId(1)]);
    assert!(m.overlay().contains(&OverlayEvent::RelayVerbunden(false)));
}

#[test]
fn todes_sichtbarkeit_waehrend_tasks_eingefroren() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0), lebend(2)]);
    push(&mut m, GamePhase::Discussion, "ABCDE", vec![ich(1, 0.0, 0.0), lebend(2)]);
    assert_eq!(m.tote().eintrag(PlayerId(2)), Some(false));

    push(&mut m, GamePhase::Tasks, "ABCDE", vec![ich(1, 0.0, 0.0), tot(2)]);
    assert_eq!(m.tote().eintrag(PlayerId(2)), Some(false));
    push(&mut m, GamePhase::Tasks, "ABCDE", vec![ich(1, 0.0, 0.0), tot(2)]);
    assert_eq!(m.tote().eintrag(PlayerId(2)), Some(false));

    push(&mut m, GamePhase::Discussion, "ABCDE", vec![ich(1, 0.0, 0.0), tot(2)]);
    assert_eq!(m.tote().eintrag(PlayerId(2)), Some(true));
    assert!(matches!(
        m.overlay().iter().rev().find(|e| matches!(e, OverlayEvent::TotSichtbar(_))),
        Some(OverlayEvent::TotSichtbar(map)) if map.get(&PlayerId(2)) == Some(&true)
    ));

    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0), tot(2)]);
    assert!(m.tote().ist_leer());
}

#[test]
fn unbekannter_peer_nach_menu_bleibt_weg() {
    let mut m = mesh(Settings::default());
    push(&mut m, GamePhase::Lobby, "ABCDE", vec![ich(1, 0.0, 0.0)]);
    let b = peer_verbinden(&mut m, "b", 2);
    push(&mut m, GamePhase::Lobby, MENU_CODE, vec![ich(1, 0.0, 0.0)]);
    let vorher = m.transport().verbunden.len();

    // Spaetes Close des abgebauten Peers startet nichts neu
    let alt = m.transport().generationen[0];
    peer_event_von(&mut m, &b, alt, crewtalk_mesh::PeerEvent::Geschlossen);
    assert_eq!(m.transport().verbunden.len(), vorher);
    assert!(m.peers().peer(&PeerId::neu("b")).is_none());
}
