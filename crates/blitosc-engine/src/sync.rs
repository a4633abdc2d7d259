//! Hard sync.
//!
//! A voice keeps a second clock running at the unsynced period. Whenever
//! that clock comes due before the next edge, the edge cycle is restarted at
//! the sync time instead, so the reset edge is deposited at its exact
//! sub-sample position like any other.

use crate::voice::VoiceState;

/// Reset that replaced the voice's next regular edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncEvent {
    /// Phase at which the reset edge is deposited.
    pub phase: f32,
    /// Portion of the interrupted segment that was skipped.
    pub skipped: f32,
    /// Segment the voice was in when the reset fired.
    pub interrupted_segment: u8,
}

impl SyncEvent {
    /// True when the reset cut a held level short in its second half-cycle,
    /// which flips the correlation polarity of the next noise edge.
    pub fn inverts_polarity(&self) -> bool {
        self.interrupted_segment == 1
    }
}

/// Decides when a voice's sync clock overrides its edge clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardSyncController;

impl HardSyncController {
    /// Sync is off entirely at zero semitones.
    #[inline]
    pub fn is_active(sync_semitones: f32) -> bool {
        sync_semitones > 0.0
    }

    /// Fires a reset if the sync clock is due first.
    ///
    /// On reset the voice restarts at segment 0, its edge clock jumps to the
    /// sync time and the sync clock advances by `sync_period()`.
    pub fn check(
        voice: &mut VoiceState,
        sync_semitones: f32,
        sync_period: impl FnOnce() -> f32,
    ) -> Option<SyncEvent> {
        if !Self::is_active(sync_semitones) || voice.sync_phase >= voice.primary_phase {
            return None;
        }

        let event = SyncEvent {
            phase: voice.sync_phase,
            skipped: voice.primary_phase - voice.sync_phase,
            interrupted_segment: voice.pulse_segment,
        };
        voice.pulse_segment = 0;
        voice.primary_phase = voice.sync_phase;
        voice.sync_phase = (voice.sync_phase + sync_period()).max(0.0);
        Some(event)
    }
}
