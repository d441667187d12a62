//! Wave animation keyframes.

use std::f32::consts::TAU;

/// Frame count for the test animation
pub const FRAME_COUNT: usize = 30;

/// Keyframe buffers, tightly packed per parameter
pub struct AnimationData {
    pub times: Vec<f32>,
    /// FLOAT_VEC3 per frame
    pub translations: Vec<f32>,
    /// FLOAT_VEC4 axis-angle per frame
    pub rotations: Vec<f32>,
}

/// Create a 30-frame wave at 30 fps
pub fn create_animation() -> AnimationData {
    let mut times = Vec::with_capacity(FRAME_COUNT);
    let mut translations = Vec::with_capacity(FRAME_COUNT * 3);
    let mut rotations = Vec::with_capacity(FRAME_COUNT * 4);

    for frame in 0..FRAME_COUNT {
        let t = frame as f32 / 30.0;
        let phase = frame as f32 / FRAME_COUNT as f32 * TAU;
        times.push(t);
        translations.extend_from_slice(&[phase.sin() * 0.25, 1.0, phase.cos() * 0.1]);
        rotations.extend_from_slice(&[0.0, 0.0, 1.0, phase.sin() * 0.5]);
    }

    AnimationData {
        times,
        translations,
        rotations,
    }
}
