//! Hall fuer belauschte Geister
//!
//! Klassischer Schroeder-Hall: vier parallele Kammfilter mit Rueckkopplung,
//! danach zwei Allpaesse in Serie. Eingang ist die Mono-Summe, der Hall wird
//! mit dem Send-Pegel auf beide Kanaele addiert.

use super::{AudioProcessor, STEREO};

/// Kammfilter-Laengen in Samples bei 48 kHz
const KAMM_LAENGEN: [usize; 4] = [1557, 1617, 1491, 1422];
const ALLPASS_LAENGEN: [usize; 2] = [556, 441];
const KAMM_RUECKKOPPLUNG: f32 = 0.84;
const ALLPASS_RUECKKOPPLUNG: f32 = 0.5;
/// Hall-Pegel relativ zum Eingang
const WET: f32 = 0.25;

struct Verzoegerung {
    puffer: Vec<f32>,
    pos: usize,
}

impl Verzoegerung {
    fn new(laenge: usize) -> Self {
        Self {
            puffer: vec![0.0; laenge.max(1)],
            pos: 0,
        }
    }

    fn lesen(&self) -> f32 {
        self.puffer[self.pos]
    }

    fn schreiben(&mut self, wert: f32) {
        self.puffer[self.pos] = wert;
        self.pos = (self.pos + 1) % self.puffer.len();
    }

    fn leeren(&mut self) {
        self.puffer.fill(0.0);
        self.pos = 0;
    }
}

pub struct Reverb {
    kaemme: Vec<Verzoegerung>,
    allpaesse: Vec<Verzoegerung>,
    send: f32,
    enabled: bool,
}

impl Reverb {
    pub fn new(sample_rate: u32) -> Self {
        let skalieren = |n: usize| n * sample_rate as usize / 48_000;
        Self {
            kaemme: KAMM_LAENGEN
                .iter()
                .map(|&n| Verzoegerung::new(skalieren(n)))
                .collect(),
            allpaesse: ALLPASS_LAENGEN
                .iter()
                .map(|&n| Verzoegerung::new(skalieren(n)))
                .collect(),
            send: 0.0,
            enabled: true,
        }
    }

    /// Send-Pegel (0 = kein Hall)
    pub fn set_send(&mut self, send: f32) {
        self.send = send.clamp(0.0, 1.0);
    }

    pub fn send(&self) -> f32 {
        self.send
    }

    fn tick(&mut self, eingang: f32) -> f32 {
        let mut summe = 0.0;
        for kamm in self.kaemme.iter_mut() {
            let y = kamm.lesen();
            kamm.schreiben(eingang + y * KAMM_RUECKKOPPLUNG);
            summe += y;
        }
        let mut x = summe / self.kaemme.len() as f32;
        for ap in self.allpaesse.iter_mut() {
            let verzoegert = ap.lesen();
            let y = -x + verzoegert;
            ap.schreiben(x + verzoegert * ALLPASS_RUECKKOPPLUNG);
            x = y;
        }
        x
    }
}

impl AudioProcessor for Reverb {
    fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for frame in samples.chunks_exact_mut(STEREO) {
            let mono = (frame[0] + frame[1]) * 0.5;
            // Auch ohne Send weiterlaufen lassen, sonst knackt der Nachhall
            let hall = self.tick(mono) * WET * self.send;
            for s in frame.iter_mut() {
                *s += hall;
            }
        }
    }

    fn reset(&mut self) {
        self.kaemme.iter_mut().for_each(Verzoegerung::leeren);
        self.allpaesse.iter_mut().for_each(Verzoegerung::leeren);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
