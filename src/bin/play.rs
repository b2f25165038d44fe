//! Demo player for the MIDI driver.
//!
//! Brings the driver up against the default audio output device, plays a
//! short riff by writing raw MIDI bytes, and shuts down.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin mididriver-play -- path/to/bank.sf2
//! ```

use anyhow::{bail, Context, Result};
use mididriver::MidiDriver;
use std::thread;
use std::time::Duration;

/// C major arpeggio, up and back down.
const RIFF: [u8; 5] = [60, 64, 67, 72, 67];

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(soundfont_path) = std::env::args().nth(1) else {
        bail!("usage: mididriver-play <soundfont.sf2>");
    };

    let mut driver =
        MidiDriver::new(&soundfont_path).context("Failed to create the MIDI driver")?;
    driver.init().context("Failed to initialize the driver")?;

    let config = driver.config().context("Driver configuration missing")?;
    println!(
        "Playing at {} Hz, {} voices, {}-frame mix periods",
        config.sample_rate, config.max_voices, config.mix_buffer_size
    );

    driver.set_volume(90).context("Failed to set volume")?;

    for note in RIFF {
        driver
            .write(&[0x90, note, 0x64])
            .context("Failed to write Note On")?;
        thread::sleep(Duration::from_millis(300));
        driver
            .write(&[0x80, note, 0x00])
            .context("Failed to write Note Off")?;
    }

    // Let the release tails ring out before tearing down.
    thread::sleep(Duration::from_millis(800));
    driver.shutdown();

    Ok(())
}
