//! Reference implementation of the metaball field.
//!
//! Everything the fragment shader computes per pixel is mirrored here as
//! plain Rust over the same constants: ball trajectories, the inverse
//! distance-squared influence sum, the smoothstep visibility mask, the cosine
//! palette, and the glow/pulse shaping. The GLSL emitted by
//! [`crate::compile`] is generated from this table, so the two never drift.
//!
//! All trajectories are pure functions of the animation phase; there is no
//! hidden state beyond the time value itself.

/// Number of balls contributing to the field (five autonomous plus the
/// pointer-driven one).
pub const BALL_COUNT: usize = 6;

/// Multiplier applied to the time uniform before it drives any motion.
pub const TIME_SCALE: f32 = 0.6;

/// Offset added to the squared distance so a pixel exactly on a ball centre
/// stays finite.
pub const FIELD_EPSILON: f32 = 0.1;

/// Field value below which a pixel is fully invisible.
pub const FIELD_LOWER: f32 = 0.8;
/// Field value above which a pixel is fully lit.
pub const FIELD_UPPER: f32 = 2.5;

/// Influence radius of the pointer-driven ball, the strongest of the six.
pub const POINTER_BALL_RADIUS: f32 = 0.8;
/// Damping applied to the pointer position before it becomes a ball centre.
pub const POINTER_BALL_SCALE: f32 = 0.8;

/// Cosine palette parameters (offset, amplitude, frequency, phase).
pub const PALETTE_OFFSET: [f32; 3] = [0.5, 0.5, 0.5];
pub const PALETTE_AMPLITUDE: [f32; 3] = [0.5, 0.5, 0.5];
pub const PALETTE_FREQUENCY: [f32; 3] = [1.0, 1.0, 1.0];
pub const PALETTE_PHASE: [f32; 3] = [0.263, 0.416, 0.557];
pub const PALETTE_TWO_PI: f32 = 6.28318;
/// Offset between the two palette samples blended per pixel.
pub const PALETTE_COMPLEMENT_OFFSET: f32 = 0.5;

/// Weights mapping field value and phase into the palette index.
pub const COLOR_FIELD_WEIGHT: f32 = 0.3;
pub const COLOR_TIME_WEIGHT: f32 = 0.2;

/// Brand tints blended over the procedural palette so hue drift stays
/// on-brand.
pub const BRAND_PURPLE: [f32; 3] = [0.6, 0.3, 0.9];
pub const BRAND_PURPLE_MIX: f32 = 0.4;
pub const BRAND_PINK: [f32; 3] = [0.9, 0.4, 0.7];
pub const BRAND_PINK_MIX: f32 = 0.3;

/// Pointer-proximity glow shaping.
pub const GLOW_COLOR: [f32; 3] = [0.8, 0.2, 1.0];
pub const GLOW_FALLOFF: f32 = 2.0;
pub const GLOW_STRENGTH: f32 = 0.3;

/// Slow breathing pulse applied to the visibility mask.
pub const PULSE_RATE: f32 = 3.0;
pub const PULSE_DEPTH: f32 = 0.1;
pub const PULSE_BASE: f32 = 0.9;

/// Final opacity multiplier.
pub const ALPHA_SCALE: f32 = 0.9;

/// Which trigonometric wave drives one axis of a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wave {
    Sin,
    Cos,
}

impl Wave {
    pub fn eval(self, x: f32) -> f32 {
        match self {
            Wave::Sin => x.sin(),
            Wave::Cos => x.cos(),
        }
    }

    /// GLSL function name for shader generation.
    pub fn glsl(self) -> &'static str {
        match self {
            Wave::Sin => "sin",
            Wave::Cos => "cos",
        }
    }
}

/// One periodic axis of a ball trajectory: `wave(phase * frequency) * amplitude`.
#[derive(Clone, Copy, Debug)]
pub struct Oscillation {
    pub wave: Wave,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Oscillation {
    pub fn eval(&self, phase: f32) -> f32 {
        self.wave.eval(phase * self.frequency) * self.amplitude
    }
}

/// An autonomous ball: two oscillating axes plus a static influence radius.
#[derive(Clone, Copy, Debug)]
pub struct Trajectory {
    pub x: Oscillation,
    pub y: Oscillation,
    pub radius: f32,
}

impl Trajectory {
    /// Ball centre at the given animation phase. Bounded by the amplitude
    /// box for every phase value.
    pub fn center(&self, phase: f32) -> [f32; 2] {
        [self.x.eval(phase), self.y.eval(phase)]
    }
}

const fn osc(wave: Wave, frequency: f32, amplitude: f32) -> Oscillation {
    Oscillation {
        wave,
        frequency,
        amplitude,
    }
}

/// The five autonomous trajectories: a large elliptical orbit, a wide
/// circle, a vertical figure-eight, a fast diagonal, and a slow small
/// circle. Frequencies are deliberately incommensurate so the arrangement
/// never visibly repeats.
pub const TRAJECTORIES: [Trajectory; BALL_COUNT - 1] = [
    Trajectory {
        x: osc(Wave::Sin, 1.3, 0.8),
        y: osc(Wave::Cos, 1.2, 0.6),
        radius: 0.6,
    },
    Trajectory {
        x: osc(Wave::Cos, 0.8, 0.7),
        y: osc(Wave::Sin, 0.9, 0.8),
        radius: 0.7,
    },
    Trajectory {
        x: osc(Wave::Sin, 1.1, 0.6),
        y: osc(Wave::Sin, 1.5, 0.5),
        radius: 0.5,
    },
    Trajectory {
        x: osc(Wave::Cos, 1.7, 0.4),
        y: osc(Wave::Cos, 0.7, 0.9),
        radius: 0.4,
    },
    Trajectory {
        x: osc(Wave::Sin, 2.1, 0.5),
        y: osc(Wave::Cos, 1.8, 0.4),
        radius: 0.6,
    },
];

/// Maps a [0,1]² surface coordinate to the centred, aspect-corrected space
/// the field lives in.
pub fn centered(uv: [f32; 2], resolution: [f32; 2]) -> [f32; 2] {
    let aspect = if resolution[1] > 0.0 {
        resolution[0] / resolution[1]
    } else {
        1.0
    };
    [(uv[0] * 2.0 - 1.0) * aspect, uv[1] * 2.0 - 1.0]
}

/// Influence of a single ball: inverse distance squared with an epsilon
/// guard, so the result is finite even at the exact centre.
pub fn influence(p: [f32; 2], center: [f32; 2], radius: f32) -> f32 {
    let dx = p[0] - center[0];
    let dy = p[1] - center[1];
    radius * radius / (dx * dx + dy * dy + FIELD_EPSILON)
}

/// Sum of all six influences at a point, for the given pointer position (in
/// centred space) and animation phase.
pub fn field(p: [f32; 2], mouse: [f32; 2], phase: f32) -> f32 {
    let mut v = 0.0;
    for trajectory in &TRAJECTORIES {
        v += influence(p, trajectory.center(phase), trajectory.radius);
    }
    v += influence(
        p,
        [mouse[0] * POINTER_BALL_SCALE, mouse[1] * POINTER_BALL_SCALE],
        POINTER_BALL_RADIUS,
    );
    v
}

/// Cubic smoothstep between two edges, clamped outside them.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Visibility mask: zero below the lower field bound, one above the upper.
pub fn intensity(v: f32) -> f32 {
    smoothstep(FIELD_LOWER, FIELD_UPPER, v)
}

/// Cosine palette after Quilez: smooth cyclic colour for any index.
pub fn palette(t: f32) -> [f32; 3] {
    let mut color = [0.0; 3];
    for (i, channel) in color.iter_mut().enumerate() {
        *channel = PALETTE_OFFSET[i]
            + PALETTE_AMPLITUDE[i]
                * (PALETTE_TWO_PI * (PALETTE_FREQUENCY[i] * t + PALETTE_PHASE[i])).cos();
    }
    color
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Full per-pixel shade path, mirroring the fragment shader: field,
/// threshold, palette blend, brand tints, pointer glow, pulse, premultiplied
/// output. Returns linear RGBA.
pub fn shade(p: [f32; 2], mouse: [f32; 2], phase: f32) -> [f32; 4] {
    let v = field(p, mouse, phase);
    let mut intensity = intensity(v);

    let color_index = v * COLOR_FIELD_WEIGHT + phase * COLOR_TIME_WEIGHT;
    let color1 = palette(color_index);
    let color2 = palette(color_index + PALETTE_COMPLEMENT_OFFSET);
    let mut color = mix3(color1, color2, (phase + v).sin() * 0.5 + 0.5);

    color = mix3(color, BRAND_PURPLE, BRAND_PURPLE_MIX);
    color = mix3(color, BRAND_PINK, intensity * BRAND_PINK_MIX);

    let dx = p[0] - mouse[0];
    let dy = p[1] - mouse[1];
    let glow = (-(dx * dx + dy * dy).sqrt() * GLOW_FALLOFF).exp() * GLOW_STRENGTH;
    for (channel, tint) in color.iter_mut().zip(GLOW_COLOR) {
        *channel += tint * glow;
    }

    let pulse = (phase * PULSE_RATE).sin() * PULSE_DEPTH + PULSE_BASE;
    intensity *= pulse;

    let alpha = intensity * ALPHA_SCALE;
    [color[0] * alpha, color[1] * alpha, color[2] * alpha, alpha]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectories_stay_inside_their_amplitude_box() {
        for step in 0..10_000 {
            let phase = step as f32 * 0.05;
            for (index, trajectory) in TRAJECTORIES.iter().enumerate() {
                let [x, y] = trajectory.center(phase);
                assert!(
                    x.abs() <= trajectory.x.amplitude + 1e-6,
                    "ball {index} x={x} escaped amplitude {}",
                    trajectory.x.amplitude
                );
                assert!(
                    y.abs() <= trajectory.y.amplitude + 1e-6,
                    "ball {index} y={y} escaped amplitude {}",
                    trajectory.y.amplitude
                );
            }
        }
    }

    #[test]
    fn influence_is_finite_at_the_ball_center() {
        let v = influence([0.3, -0.2], [0.3, -0.2], 0.7);
        assert!(v.is_finite());
        assert!((v - 0.7 * 0.7 / FIELD_EPSILON).abs() < 1e-6);
    }

    #[test]
    fn field_at_center_dominates_corners_at_phase_zero() {
        // 800x600 mount, default pointer at the surface centre.
        let resolution = [800.0, 600.0];
        let mouse = centered([0.5, 0.5], resolution);
        let center = field(centered([0.5, 0.5], resolution), mouse, 0.0);
        for corner_uv in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
            let corner = field(centered(corner_uv, resolution), mouse, 0.0);
            assert!(
                center > corner,
                "corner {corner_uv:?} field {corner} >= center field {center}"
            );
        }
    }

    #[test]
    fn smoothstep_clamps_and_rises_monotonically() {
        assert_eq!(smoothstep(FIELD_LOWER, FIELD_UPPER, 0.0), 0.0);
        assert_eq!(smoothstep(FIELD_LOWER, FIELD_UPPER, 10.0), 1.0);
        let mut previous = 0.0;
        for step in 0..=100 {
            let x = FIELD_LOWER + (FIELD_UPPER - FIELD_LOWER) * step as f32 / 100.0;
            let value = smoothstep(FIELD_LOWER, FIELD_UPPER, x);
            assert!(value >= previous, "smoothstep dipped at x={x}");
            previous = value;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn palette_stays_in_unit_range() {
        for step in 0..1_000 {
            let color = palette(step as f32 * 0.013);
            for channel in color {
                assert!((0.0..=1.0).contains(&channel), "palette escaped: {color:?}");
            }
        }
    }

    #[test]
    fn shade_alpha_is_bounded_by_the_pulse_ceiling() {
        // pulse peaks at PULSE_BASE + PULSE_DEPTH = 1.0, so alpha never
        // exceeds ALPHA_SCALE.
        for step in 0..2_000 {
            let phase = step as f32 * 0.037;
            let p = [(phase * 0.11).sin(), (phase * 0.07).cos()];
            let rgba = shade(p, [0.0, 0.0], phase);
            assert!(rgba.iter().all(|c| c.is_finite()));
            assert!(rgba[3] >= 0.0 && rgba[3] <= ALPHA_SCALE + 1e-6);
        }
    }

    #[test]
    fn centered_applies_aspect_to_x_only() {
        let p = centered([1.0, 1.0], [800.0, 600.0]);
        assert!((p[0] - 800.0 / 600.0).abs() < 1e-6);
        assert!((p[1] - 1.0).abs() < 1e-6);
        let origin = centered([0.5, 0.5], [800.0, 600.0]);
        assert!(origin[0].abs() < 1e-6 && origin[1].abs() < 1e-6);
    }
}
