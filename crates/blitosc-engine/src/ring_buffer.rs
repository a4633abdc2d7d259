//! Circular accumulation buffer for band-limited impulses.
//!
//! Oscillators deposit sinc-filtered impulses ahead of the cursor; the
//! integrator reads one block from the cursor and then calls
//! [`OscillatorRingBuffer::advance`]. The body is [`OB_LENGTH`] samples with a
//! [`FIR_WIDTH`] overhang, so a kernel never has to be split across the end.
//! When the cursor wraps, the overhang is moved to the head.

use crate::constants::{BLOCK_SIZE_OS, FIR_OFFSET, FIR_WIDTH, OB_LENGTH};
use crate::simd;
use crate::sinc::SincTable;

const BUFFER_LEN: usize = OB_LENGTH + FIR_WIDTH;

/// One unit of sample offset in the fixed-point position format.
pub const FIXED_ONE: f32 = (1u32 << 24) as f32;

/// Where an impulse lands relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulsePosition {
    /// Whole samples after the cursor.
    pub delay: usize,
    /// Coarse fractional bin into the sinc table.
    pub bin: usize,
    /// Sub-bin fraction, `0..65536`.
    pub lipol: f32,
}

impl ImpulsePosition {
    /// Decodes an 8.8.16 fixed-point sample offset (6 bits of delay used).
    #[inline]
    pub fn from_fixed(ipos: u32) -> Self {
        Self {
            delay: ((ipos >> 24) & 0x3f) as usize,
            bin: ((ipos >> 16) & 0xff) as usize,
            lipol: (ipos & 0xffff) as f32,
        }
    }

    /// Converts a non-negative offset in samples. Negative or NaN offsets
    /// land on the cursor.
    #[inline]
    pub fn from_samples(samples: f32) -> Self {
        Self::from_fixed((FIXED_ONE * samples) as u32)
    }

    /// Same sub-sample position at a different whole-sample delay.
    #[inline]
    pub fn with_delay(self, delay: usize) -> Self {
        Self { delay, ..self }
    }
}

/// One integrator input frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
    pub dc_left: f32,
    pub dc_right: f32,
}

/// Impulse and DC-step accumulators for one oscillator.
#[derive(Debug, Clone)]
pub struct OscillatorRingBuffer {
    left: [f32; BUFFER_LEN],
    right: [f32; BUFFER_LEN],
    dc_left: [f32; BUFFER_LEN],
    dc_right: [f32; BUFFER_LEN],
    cursor: usize,
}

impl OscillatorRingBuffer {
    pub fn new() -> Self {
        Self {
            left: [0.0; BUFFER_LEN],
            right: [0.0; BUFFER_LEN],
            dc_left: [0.0; BUFFER_LEN],
            dc_right: [0.0; BUFFER_LEN],
            cursor: 0,
        }
    }

    /// Zeroes everything and rewinds the cursor.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.dc_left.fill(0.0);
        self.dc_right.fill(0.0);
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Adds a band-limited impulse. In mono only the left channel is written.
    pub fn deposit(
        &mut self,
        table: &SincTable,
        position: ImpulsePosition,
        gain_left: f32,
        gain_right: f32,
        stereo: bool,
    ) {
        let start = self.cursor + position.delay.min(BLOCK_SIZE_OS - 1);
        let row = table.row(position.bin);
        let end = start + FIR_WIDTH;
        if stereo {
            simd::convolve_stereo(
                &mut self.left[start..end],
                &mut self.right[start..end],
                &row.kernel,
                &row.delta,
                position.lipol,
                gain_left,
                gain_right,
            );
        } else {
            simd::convolve(
                &mut self.left[start..end],
                &row.kernel,
                &row.delta,
                position.lipol,
                gain_left,
            );
        }
    }

    /// Mono convenience: an impulse `position` samples after the cursor.
    pub fn deposit_at(&mut self, table: &SincTable, position: f32, amplitude: f32) {
        self.deposit(
            table,
            ImpulsePosition::from_samples(position),
            amplitude,
            amplitude,
            false,
        );
    }

    /// Schedules a change of integrator DC rate at the impulse's centre tap.
    #[inline]
    pub fn deposit_dc(&mut self, delay: usize, step_left: f32, step_right: f32) {
        let idx = self.cursor + FIR_OFFSET + delay.min(BLOCK_SIZE_OS - 1);
        self.dc_left[idx] += step_left;
        self.dc_right[idx] += step_right;
    }

    /// Frame `offset` samples after the cursor.
    #[inline]
    pub fn read(&self, offset: usize) -> Frame {
        let idx = self.cursor + offset;
        Frame {
            left: self.left[idx],
            right: self.right[idx],
            dc_left: self.dc_left[idx],
            dc_right: self.dc_right[idx],
        }
    }

    /// Drops the `n` consumed samples and moves the cursor.
    ///
    /// `n` must divide [`OB_LENGTH`]; the engine always advances by one block.
    pub fn advance(&mut self, n: usize) {
        let n = n.clamp(1, OB_LENGTH);
        debug_assert!(OB_LENGTH % n == 0, "advance step must divide the ring length");

        let span = self.cursor..self.cursor + n;
        self.left[span.clone()].fill(0.0);
        self.right[span.clone()].fill(0.0);
        self.dc_left[span.clone()].fill(0.0);
        self.dc_right[span].fill(0.0);

        self.cursor = (self.cursor + n) & (OB_LENGTH - 1);
        if self.cursor == 0 {
            for buf in [
                &mut self.left,
                &mut self.right,
                &mut self.dc_left,
                &mut self.dc_right,
            ] {
                buf.copy_within(OB_LENGTH..BUFFER_LEN, 0);
                buf[OB_LENGTH..].fill(0.0);
            }
        }
    }
}

impl Default for OscillatorRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point_decoding() {
        let pos = ImpulsePosition::from_fixed((5 << 24) | (0x80 << 16) | 0x4000);
        assert_eq!(pos.delay, 5);
        assert_eq!(pos.bin, 0x80);
        assert_eq!(pos.lipol, 16384.0);

        let pos = ImpulsePosition::from_samples(2.5);
        assert_eq!(pos.delay, 2);
        assert_eq!(pos.bin, 128);
        assert_eq!(pos.lipol, 0.0);

        assert_eq!(ImpulsePosition::from_samples(-3.0).delay, 0);
    }

    #[test]
    fn test_deposit_spreads_kernel() {
        let table = SincTable::new();
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_at(&table, 3.0, 2.0);

        let kernel = table.row(0).kernel;
        for i in 0..FIR_WIDTH {
            assert!((ring.read(3 + i).left - 2.0 * kernel[i]).abs() < 1e-6);
        }
        assert_eq!(ring.read(2).left, 0.0);
        assert_eq!(ring.read(3 + FIR_WIDTH).left, 0.0);
        assert_eq!(ring.read(5).right, 0.0);
    }

    #[test]
    fn test_stereo_deposit_uses_both_gains() {
        let table = SincTable::new();
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit(&table, ImpulsePosition::from_samples(0.0), 1.0, -0.5, true);
        let centre = ring.read(FIR_WIDTH / 2 - 1);
        assert!((centre.right + 0.5 * centre.left).abs() < 1e-6);
    }

    #[test]
    fn test_dc_step_lands_at_offset() {
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_dc(10, 0.5, 0.25);
        let f = ring.read(10 + FIR_OFFSET);
        assert_eq!(f.dc_left, 0.5);
        assert_eq!(f.dc_right, 0.25);
    }

    #[test]
    fn test_advance_clears_consumed_block() {
        let table = SincTable::new();
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_at(&table, 0.0, 1.0);
        ring.advance(BLOCK_SIZE_OS);
        assert_eq!(ring.cursor(), BLOCK_SIZE_OS);

        ring.advance(BLOCK_SIZE_OS);
        assert_eq!(ring.cursor(), 0);
        for i in 0..OB_LENGTH {
            assert_eq!(ring.read(i).left, 0.0);
        }
    }

    #[test]
    fn test_wrap_moves_overhang_to_head() {
        let table = SincTable::new();
        let mut ring = OscillatorRingBuffer::new();
        ring.advance(BLOCK_SIZE_OS);

        // Tail of this kernel spills past the end of the body.
        let delay = BLOCK_SIZE_OS - 1;
        ring.deposit(&table, ImpulsePosition::from_samples(delay as f32), 1.0, 1.0, false);
        let expected: Vec<f32> = (0..FIR_WIDTH).map(|i| ring.read(delay + i).left).collect();

        ring.advance(BLOCK_SIZE_OS);
        assert_eq!(ring.cursor(), 0);
        for (i, &e) in expected.iter().enumerate().skip(1) {
            assert_eq!(ring.read(i - 1).left, e);
        }
        for i in FIR_WIDTH..OB_LENGTH {
            assert_eq!(ring.read(i).left, 0.0);
        }
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_dc(0, 1.0, 1.0);
        ring.advance(BLOCK_SIZE_OS);
        ring.clear();
        assert_eq!(ring.cursor(), 0);
        assert_eq!(ring.read(FIR_OFFSET), Frame::default());
    }
}
