//! Mapping from decoded live MIDI events to synthesizer messages.
//!
//! The synthesizer accepts channel messages in the classic
//! (channel, command, data1, data2) form. This module translates the
//! events produced by the byte-stream decoder into that form. System
//! common and real-time events carry no channel state the synthesizer
//! understands and are dropped.

use midly::live::LiveEvent;
use midly::MidiMessage;

/// A decoded MIDI channel message in the form the synthesizer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
    /// MIDI channel (0-15).
    pub channel: u8,
    /// Status command byte with the channel nibble stripped (0x80-0xE0).
    pub command: u8,
    /// First data byte (0-127).
    pub data1: u8,
    /// Second data byte (0-127, zero for two-byte messages).
    pub data2: u8,
}

/// Converts a live MIDI event into a channel message, if it carries one.
///
/// # Returns
///
/// `Some(ChannelMessage)` for channel voice messages, `None` for system
/// common and real-time events.
pub fn to_channel_message(event: LiveEvent<'_>) -> Option<ChannelMessage> {
    let LiveEvent::Midi { channel, message } = event else {
        return None;
    };
    let channel = channel.as_int();

    let (command, data1, data2) = match message {
        MidiMessage::NoteOff { key, vel } => (0x80, key.as_int(), vel.as_int()),
        MidiMessage::NoteOn { key, vel } => (0x90, key.as_int(), vel.as_int()),
        MidiMessage::Aftertouch { key, vel } => (0xA0, key.as_int(), vel.as_int()),
        MidiMessage::Controller { controller, value } => {
            (0xB0, controller.as_int(), value.as_int())
        }
        MidiMessage::ProgramChange { program } => (0xC0, program.as_int(), 0),
        MidiMessage::ChannelAftertouch { vel } => (0xD0, vel.as_int(), 0),
        MidiMessage::PitchBend { bend } => {
            // Split the 14-bit bend value back into its LSB/MSB data bytes.
            let raw = bend.0.as_int();
            (0xE0, (raw & 0x7F) as u8, (raw >> 7) as u8)
        }
    };

    Some(ChannelMessage {
        channel,
        command,
        data1,
        data2,
    })
}
