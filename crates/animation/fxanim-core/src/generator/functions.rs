//! Generator functions and the waveform math behind them:
//! - oscillation (cos/sin, local or clock-synchronized phase)
//! - packed 24-bit color split/join
//! - rotation in degrees
//! - uniform random draws, optionally gated on the loop ping

use std::f64::consts::TAU;

use rand::Rng;

use super::GeneratorInput;
use crate::effect::EffectConfig;

/// Largest packed 24-bit color value.
pub const COLOR_SPACE: f64 = 16_777_215.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Wave {
    Cos,
    Sin,
}

impl Wave {
    #[inline]
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Wave::Cos => x.cos(),
            Wave::Sin => x.sin(),
        }
    }
}

/// Map a phase (in loops) onto `[val2, val1]`: `val1` at wave peak, `val2` at trough.
#[inline]
pub fn oscillation(phase: f64, val1: f64, val2: f64, wave: Wave) -> f64 {
    ((val1 - val2) * (wave.eval(TAU * phase) + 1.0) / 2.0) + val2
}

/// Phase from the effect's own elapsed time.
#[inline]
pub fn local_phase(elapsed: f64, loop_duration: f64, sync_shift: f64) -> f64 {
    elapsed / loop_duration + sync_shift
}

/// Phase from the shared clock; equal for every effect with the same duration and shift.
#[inline]
pub fn synchronized_phase(clock: f64, loop_duration: f64, sync_shift: f64) -> f64 {
    clock / loop_duration + sync_shift
}

/// Degrees in `[0, 360)` from the shared clock. The shift is in milliseconds here.
#[inline]
pub fn synchronized_rotation(clock: f64, loop_duration: f64, sync_shift: f64) -> f64 {
    360.0 * (clock + sync_shift).rem_euclid(loop_duration) / loop_duration
}

/// Split a packed `0xRRGGBB` value into channels.
#[inline]
pub fn unpack_rgb(value: f64) -> [f64; 3] {
    let bin = value.max(0.0) as u32;
    [
        ((bin >> 16) & 0xFF) as f64,
        ((bin >> 8) & 0xFF) as f64,
        (bin & 0xFF) as f64,
    ]
}

/// Join channels (each floored into `0..=255`) into a packed `0xRRGGBB` value.
#[inline]
pub fn pack_rgb(rgb: [f64; 3]) -> f64 {
    let [r, g, b] = rgb.map(|c| c.floor().clamp(0.0, 255.0) as u32);
    ((r << 16) | (g << 8) | b) as f64
}

#[inline]
fn oriented(config: &EffectConfig, degrees: f64) -> f64 {
    if config.clockwise {
        degrees
    } else {
        360.0 - degrees
    }
}

/// Consume the loop ping.
#[inline]
fn ringing(input: &mut GeneratorInput<'_>) -> bool {
    std::mem::take(input.ping)
}

fn local(input: &GeneratorInput<'_>, wave: Wave, extra_shift: f64) -> f64 {
    let c = input.config;
    oscillation(
        local_phase(input.elapsed, c.loop_duration, c.sync_shift + extra_shift),
        c.val1,
        c.val2,
        wave,
    )
}

fn synchronized(input: &GeneratorInput<'_>, wave: Wave, extra_shift: f64) -> f64 {
    let c = input.config;
    oscillation(
        synchronized_phase(input.clock, c.loop_duration, c.sync_shift + extra_shift),
        c.val1,
        c.val2,
        wave,
    )
}

fn chaos(input: &mut GeneratorInput<'_>) -> f64 {
    input.rng.gen::<f64>() * input.config.chaos_factor
}

/// Linear ramp, unclamped: keeps growing if elapsed time is never wrapped.
pub fn move_toward(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let c = input.config;
    Some((c.val1 - c.val2) / c.loop_duration * input.elapsed)
}

pub fn color_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let c = input.config;
    let from = unpack_rgb(c.val1);
    let to = unpack_rgb(c.val2);
    let phase = local_phase(input.elapsed, c.loop_duration, c.sync_shift);
    let mut rgb = [0.0; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = oscillation(phase, from[i], to[i], Wave::Cos).floor();
    }
    Some(pack_rgb(rgb))
}

pub fn cos_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    Some(local(input, Wave::Cos, 0.0))
}

pub fn sin_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    Some(local(input, Wave::Sin, 0.0))
}

pub fn chaotic_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let jitter = chaos(input);
    Some(local(input, Wave::Cos, jitter))
}

pub fn sync_cos_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    Some(synchronized(input, Wave::Cos, 0.0))
}

pub fn sync_sin_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    Some(synchronized(input, Wave::Sin, 0.0))
}

pub fn sync_chaotic_oscillation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let jitter = chaos(input);
    Some(synchronized(input, Wave::Cos, jitter))
}

pub fn rotation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let c = input.config;
    let degrees = 360.0 * input.elapsed / c.loop_duration;
    Some(oriented(c, degrees))
}

pub fn sync_rotation(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let c = input.config;
    let degrees = synchronized_rotation(input.clock, c.loop_duration, c.sync_shift);
    Some(oriented(c, degrees))
}

pub fn random_number(input: &mut GeneratorInput<'_>) -> Option<f64> {
    let c = input.config;
    let draw = input.rng.gen::<f64>() * (c.val2 - c.val1) + c.val1;
    Some(if c.want_integer { draw.floor() } else { draw })
}

pub fn random_number_per_loop(input: &mut GeneratorInput<'_>) -> Option<f64> {
    if ringing(input) {
        random_number(input)
    } else {
        None
    }
}

pub fn random_color(input: &mut GeneratorInput<'_>) -> Option<f64> {
    Some((input.rng.gen::<f64>() * COLOR_SPACE).floor())
}

pub fn random_color_per_loop(input: &mut GeneratorInput<'_>) -> Option<f64> {
    if ringing(input) {
        random_color(input)
    } else {
        None
    }
}

/// Unbounded drift: `current + speed * frame_time`.
pub fn move_by_speed(input: &mut GeneratorInput<'_>) -> Option<f64> {
    Some(input.current + input.config.speed * input.frame_time)
}
