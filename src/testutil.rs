//! Test fixtures: a programmatically built SoundFont bank and a fake
//! audio sink.
//!
//! The generated bank is a minimal but fully valid SoundFont 2 file with
//! one looped sine sample behind one instrument and one preset, so tests
//! never depend on an asset file. The fake sink implements `AudioSink`
//! with failure injection and lets tests drive the fill callback by hand.

use crate::audio::{AudioSink, PcmFormat, RenderPump};
use crate::error::DriverError;
use rustysynth::SoundFont;
use std::io::Cursor;
use std::sync::{Arc, Mutex, OnceLock};

/// Returns the shared test SoundFont, building it on first use.
pub fn test_soundfont() -> Arc<SoundFont> {
    static FONT: OnceLock<Arc<SoundFont>> = OnceLock::new();
    Arc::clone(FONT.get_or_init(|| {
        let bytes = build_soundfont_bytes();
        let font = SoundFont::new(&mut Cursor::new(bytes)).expect("generated bank parses");
        Arc::new(font)
    }))
}

/// One RIFF chunk: id, little-endian size, body, pad byte if odd.
fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len() + 1);
    out.extend_from_slice(id);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 != 0 {
        out.push(0);
    }
    out
}

/// A LIST chunk of the given kind wrapping already-encoded subchunks.
fn list(kind: &[u8; 4], subchunks: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + subchunks.len());
    body.extend_from_slice(kind);
    body.extend_from_slice(subchunks);
    chunk(b"LIST", &body)
}

/// Fixed 20-byte zero-padded record name.
fn name20(name: &str) -> [u8; 20] {
    let mut out = [0u8; 20];
    let bytes = name.as_bytes();
    out[..bytes.len()].copy_from_slice(bytes);
    out
}

fn u16le(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn u32le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Builds the SoundFont 2 byte image.
///
/// Layout: INFO (ifil 2.1, isng, INAM), sdta (one 2000-frame sine at
/// 441 Hz plus guard zeros), pdta (one preset -> one instrument -> one
/// looped sample, each list closed with its terminal record).
fn build_soundfont_bytes() -> Vec<u8> {
    // INFO list.
    let mut ifil = Vec::new();
    u16le(&mut ifil, 2);
    u16le(&mut ifil, 1);
    let mut info = Vec::new();
    info.extend_from_slice(&chunk(b"ifil", &ifil));
    info.extend_from_slice(&chunk(b"isng", b"EMU8000\0"));
    info.extend_from_slice(&chunk(b"INAM", b"Driver Test Bank\0\0"));

    // Sample data: 20 cycles of a 100-frame sine period, then the
    // 46-point guard the format asks for.
    const SAMPLE_FRAMES: u32 = 2000;
    let mut smpl = Vec::new();
    for i in 0..SAMPLE_FRAMES {
        let phase = (i % 100) as f32 / 100.0 * std::f32::consts::TAU;
        smpl.extend_from_slice(&((phase.sin() * 16384.0) as i16).to_le_bytes());
    }
    for _ in 0..46 {
        smpl.extend_from_slice(&0i16.to_le_bytes());
    }

    // phdr: one preset (bank 0, patch 0) plus the EOP terminal.
    let mut phdr = Vec::new();
    for (name, bag_index) in [("Test Preset", 0u16), ("EOP", 1)] {
        phdr.extend_from_slice(&name20(name));
        u16le(&mut phdr, 0); // preset number
        u16le(&mut phdr, 0); // bank
        u16le(&mut phdr, bag_index);
        u32le(&mut phdr, 0); // library
        u32le(&mut phdr, 0); // genre
        u32le(&mut phdr, 0); // morphology
    }

    // pbag: one zone holding one generator, plus terminal.
    let mut pbag = Vec::new();
    for (gen_index, mod_index) in [(0u16, 0u16), (1, 0)] {
        u16le(&mut pbag, gen_index);
        u16le(&mut pbag, mod_index);
    }

    // pgen: instrument generator (41) -> instrument 0, plus terminal.
    let mut pgen = Vec::new();
    for (oper, amount) in [(41u16, 0u16), (0, 0)] {
        u16le(&mut pgen, oper);
        u16le(&mut pgen, amount);
    }

    // inst: one instrument plus the EOI terminal.
    let mut inst = Vec::new();
    for (name, bag_index) in [("Test Inst", 0u16), ("EOI", 1)] {
        inst.extend_from_slice(&name20(name));
        u16le(&mut inst, bag_index);
    }

    // ibag: one zone holding two generators, plus terminal.
    let mut ibag = Vec::new();
    for (gen_index, mod_index) in [(0u16, 0u16), (2, 0)] {
        u16le(&mut ibag, gen_index);
        u16le(&mut ibag, mod_index);
    }

    // igen: sampleModes (54) = loop continuously, then sampleID (53)
    // last as the format requires, plus terminal.
    let mut igen = Vec::new();
    for (oper, amount) in [(54u16, 1u16), (53, 0), (0, 0)] {
        u16le(&mut igen, oper);
        u16le(&mut igen, amount);
    }

    // Terminal-only modulator lists.
    let pmod = vec![0u8; 10];
    let imod = vec![0u8; 10];

    // shdr: the sine sample plus the EOS terminal.
    let mut shdr = Vec::new();
    shdr.extend_from_slice(&name20("Test Sample"));
    u32le(&mut shdr, 0); // start
    u32le(&mut shdr, SAMPLE_FRAMES); // end
    u32le(&mut shdr, 100); // loop start
    u32le(&mut shdr, 1900); // loop end
    u32le(&mut shdr, 44100); // sample rate
    shdr.push(60); // original pitch: middle C
    shdr.push(0); // pitch correction
    u16le(&mut shdr, 0); // link
    u16le(&mut shdr, 1); // type: mono
    shdr.extend_from_slice(&name20("EOS"));
    shdr.extend_from_slice(&[0u8; 26]);

    let mut pdta = Vec::new();
    pdta.extend_from_slice(&chunk(b"phdr", &phdr));
    pdta.extend_from_slice(&chunk(b"pbag", &pbag));
    pdta.extend_from_slice(&chunk(b"pmod", &pmod));
    pdta.extend_from_slice(&chunk(b"pgen", &pgen));
    pdta.extend_from_slice(&chunk(b"inst", &inst));
    pdta.extend_from_slice(&chunk(b"ibag", &ibag));
    pdta.extend_from_slice(&chunk(b"imod", &imod));
    pdta.extend_from_slice(&chunk(b"igen", &igen));
    pdta.extend_from_slice(&chunk(b"shdr", &shdr));

    let mut sfbk = Vec::new();
    sfbk.extend_from_slice(b"sfbk");
    sfbk.extend_from_slice(&list(b"INFO", &info));
    sfbk.extend_from_slice(&list(b"sdta", &chunk(b"smpl", &smpl)));
    sfbk.extend_from_slice(&list(b"pdta", &pdta));

    chunk(b"RIFF", &sfbk)
}

/// State shared between a `FakeSink` handed to the driver and the test
/// that drives it.
#[derive(Default)]
pub struct FakeSinkState {
    pub engine_ready: bool,
    pub format: Option<PcmFormat>,
    pub pump: Option<RenderPump>,
    pub fail_engine: bool,
    pub fail_player: bool,
    pub teardowns: usize,
}

/// A sink that records lifecycle calls instead of opening a device.
pub struct FakeSink {
    state: Arc<Mutex<FakeSinkState>>,
}

/// Test-side handle to a `FakeSink`'s shared state.
#[derive(Clone)]
pub struct FakeSinkHandle {
    state: Arc<Mutex<FakeSinkState>>,
}

impl FakeSink {
    pub fn new() -> (Self, FakeSinkHandle) {
        let state = Arc::new(Mutex::new(FakeSinkState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            FakeSinkHandle { state },
        )
    }
}

impl AudioSink for FakeSink {
    fn create_engine(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock().expect("fake sink lock");
        if state.fail_engine {
            return Err(DriverError::ResourceCreation(
                "injected engine failure".into(),
            ));
        }
        state.engine_ready = true;
        Ok(())
    }

    fn create_player(&mut self, format: PcmFormat, mut pump: RenderPump) -> Result<(), DriverError> {
        let mut state = self.state.lock().expect("fake sink lock");
        if !state.engine_ready {
            return Err(DriverError::ResourceCreation(
                "player requested before engine exists".into(),
            ));
        }
        if state.fail_player {
            return Err(DriverError::ResourceCreation(
                "injected player failure".into(),
            ));
        }
        // Seed fill, as the production sink does before the device pulls.
        pump.fill();
        state.format = Some(format);
        state.pump = Some(pump);
        Ok(())
    }

    fn teardown(&mut self) {
        let mut state = self.state.lock().expect("fake sink lock");
        state.engine_ready = false;
        state.format = None;
        state.pump = None;
        state.teardowns += 1;
    }
}

impl FakeSinkHandle {
    /// Drives one fill callback and returns a copy of the staging buffer.
    pub fn render_next(&self) -> Vec<i16> {
        let mut state = self.state.lock().expect("fake sink lock");
        let pump = state.pump.as_mut().expect("player is active");
        pump.fill();
        pump.staging().to_vec()
    }

    pub fn staging_len(&self) -> usize {
        let state = self.state.lock().expect("fake sink lock");
        state.pump.as_ref().expect("player is active").staging_len()
    }

    pub fn player_active(&self) -> bool {
        self.state.lock().expect("fake sink lock").pump.is_some()
    }

    pub fn format(&self) -> Option<PcmFormat> {
        self.state.lock().expect("fake sink lock").format
    }

    pub fn teardowns(&self) -> usize {
        self.state.lock().expect("fake sink lock").teardowns
    }

    pub fn set_fail_engine(&self, fail: bool) {
        self.state.lock().expect("fake sink lock").fail_engine = fail;
    }

    pub fn set_fail_player(&self, fail: bool) {
        self.state.lock().expect("fake sink lock").fail_player = fail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_bank_parses() {
        let font = test_soundfont();
        assert!(!font.get_presets().is_empty());
    }

    #[test]
    fn test_generated_bank_has_gm_preset() {
        let font = test_soundfont();
        let preset = &font.get_presets()[0];
        assert_eq!(preset.get_bank_number(), 0);
        assert_eq!(preset.get_patch_number(), 0);
    }
}
