//! Anbindung an den Game-State-Provider und den Overlay-Renderer
//!
//! Beide laufen als eigene Prozesse. Der Provider liefert pro Zeile einen
//! JSON-Snapshot des Spielzustands; das Overlay bekommt pro Ereignis eine
//! JSON-Zeile.

use crewtalk_core::{GameState, OverlayEvent};
use crewtalk_mesh::MeshEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::runtime::EventSender;

/// Liest Spielzustands-Zeilen bis EOF und reicht sie an die Event-Schleife
///
/// Fehlerhafte Zeilen werden geloggt und uebersprungen. Gibt die Anzahl
/// weitergereichter Snapshots zurueck.
pub async fn spielzustand_lesen<R>(reader: R, events: &EventSender) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut zeilen = reader.lines();
    let mut anzahl = 0;
    while let Some(zeile) = zeilen.next_line().await? {
        let zeile = zeile.trim();
        if zeile.is_empty() {
            continue;
        }
        match GameState::aus_json(zeile) {
            Ok(zustand) => {
                debug!(
                    phase = ?zustand.phase,
                    lobby = %zustand.lobby_code,
                    spieler = zustand.players.len(),
                    "Spielzustand empfangen"
                );
                if events.send(MeshEvent::Spielzustand(zustand)).is_err() {
                    break;
                }
                anzahl += 1;
            }
            Err(e) => warn!(fehler = %e, "Ungueltiger Spielzustand verworfen"),
        }
    }
    Ok(anzahl)
}

/// Schreibt Overlay-Ereignisse als JSON-Zeilen bis der Kanal schliesst
pub async fn overlay_schreiben<W>(
    mut rx: mpsc::UnboundedReceiver<OverlayEvent>,
    mut writer: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = rx.recv().await {
        let mut zeile = serde_json::to_vec(&event)?;
        zeile.push(b'\n');
        writer.write_all(&zeile).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewtalk_core::{GamePhase, OverlayStatus};

    #[tokio::test]
    async fn zeilen_werden_weitergereicht() {
        let eingabe = concat!(
            r#"{"gameState":"LOBBY","lobbyCode":"ABCD","players":[{"id":1,"x":0.0,"y":0.0,"isLocal":true}]}"#,
            "\n",
            "kein json\n",
            "\n",
            r#"{"gameState":"MENU","lobbyCode":"MENU"}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let anzahl = spielzustand_lesen(eingabe.as_bytes(), &tx).await.unwrap();
        assert_eq!(anzahl, 2);

        match rx.recv().await {
            Some(MeshEvent::Spielzustand(z)) => {
                assert_eq!(z.phase, GamePhase::Lobby);
                assert_eq!(z.lobby_code, "ABCD");
                assert!(z.lokaler_spieler().is_some());
            }
            anderes => panic!("unerwartet: {anderes:?}"),
        }
        assert!(matches!(
            rx.recv().await,
            Some(MeshEvent::Spielzustand(z)) if z.phase == GamePhase::Menu
        ));
    }

    #[tokio::test]
    async fn overlay_als_json_zeilen() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(OverlayEvent::Status(OverlayStatus::Voice)).unwrap();
        tx.send(OverlayEvent::SelbstSpricht(true)).unwrap();
        drop(tx);

        let mut ausgabe = Vec::new();
        overlay_schreiben(rx, &mut ausgabe).await.unwrap();
        let text = String::from_utf8(ausgabe).unwrap();
        let zeilen: Vec<&str> = text.lines().collect();
        assert_eq!(zeilen.len(), 2);
        let erstes: OverlayEvent = serde_json::from_str(zeilen[0]).unwrap();
        assert_eq!(erstes, OverlayEvent::Status(OverlayStatus::Voice));
    }
}
