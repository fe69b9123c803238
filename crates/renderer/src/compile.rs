//! GLSL generation and shader-module compilation.
//!
//! The fragment shader is assembled at runtime from the constant table in
//! [`crate::field`]: a block of `const` declarations is emitted ahead of a
//! fixed body, and the six ball evaluations are generated from the
//! trajectory table. Both stages compile as Vulkan GLSL through wgpu's naga
//! front end.

use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::Result;
use wgpu::naga::ShaderStage;

use crate::field::{
    Trajectory, ALPHA_SCALE, BRAND_PINK, BRAND_PINK_MIX, BRAND_PURPLE, BRAND_PURPLE_MIX,
    COLOR_FIELD_WEIGHT, COLOR_TIME_WEIGHT, FIELD_EPSILON, FIELD_LOWER, FIELD_UPPER, GLOW_COLOR,
    GLOW_FALLOFF, GLOW_STRENGTH, PALETTE_AMPLITUDE, PALETTE_COMPLEMENT_OFFSET, PALETTE_FREQUENCY,
    PALETTE_OFFSET, PALETTE_PHASE, PALETTE_TWO_PI, POINTER_BALL_RADIUS, POINTER_BALL_SCALE,
    PULSE_BASE, PULSE_DEPTH, PULSE_RATE, TIME_SCALE, TRAJECTORIES,
};

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    }))
}

/// Generates and compiles the metaball fragment shader.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    time_scale: f32,
) -> Result<wgpu::ShaderModule> {
    let source = fragment_source(time_scale);
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("metaball fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Assembles the complete fragment shader source. Invalid time scales fall
/// back to the baseline [`field::TIME_SCALE`].
pub(crate) fn fragment_source(time_scale: f32) -> String {
    let time_scale = if time_scale.is_finite() && time_scale > 0.0 {
        time_scale
    } else {
        tracing::warn!(time_scale, fallback = TIME_SCALE, "invalid time scale");
        TIME_SCALE
    };
    format!(
        "{FRAGMENT_HEADER}\n{constants}\n{FRAGMENT_FUNCTIONS}\nvoid main() {{\n{MAIN_PROLOGUE}{balls}{MAIN_EPILOGUE}}}\n",
        constants = constant_block(time_scale),
        balls = ball_block(),
    )
}

fn glsl_float(value: f32) -> String {
    // `{:?}` keeps the shortest lossless form and always prints a decimal
    // point, which GLSL needs for float literals.
    format!("{value:?}")
}

fn glsl_vec3(value: [f32; 3]) -> String {
    format!(
        "vec3({}, {}, {})",
        glsl_float(value[0]),
        glsl_float(value[1]),
        glsl_float(value[2])
    )
}

fn constant_block(time_scale: f32) -> String {
    let scalars = [
        ("TIME_SCALE", time_scale),
        ("FIELD_EPSILON", FIELD_EPSILON),
        ("FIELD_LOWER", FIELD_LOWER),
        ("FIELD_UPPER", FIELD_UPPER),
        ("POINTER_BALL_SCALE", POINTER_BALL_SCALE),
        ("POINTER_BALL_RADIUS", POINTER_BALL_RADIUS),
        ("PALETTE_TWO_PI", PALETTE_TWO_PI),
        ("PALETTE_COMPLEMENT_OFFSET", PALETTE_COMPLEMENT_OFFSET),
        ("COLOR_FIELD_WEIGHT", COLOR_FIELD_WEIGHT),
        ("COLOR_TIME_WEIGHT", COLOR_TIME_WEIGHT),
        ("BRAND_PURPLE_MIX", BRAND_PURPLE_MIX),
        ("BRAND_PINK_MIX", BRAND_PINK_MIX),
        ("GLOW_FALLOFF", GLOW_FALLOFF),
        ("GLOW_STRENGTH", GLOW_STRENGTH),
        ("PULSE_RATE", PULSE_RATE),
        ("PULSE_DEPTH", PULSE_DEPTH),
        ("PULSE_BASE", PULSE_BASE),
        ("ALPHA_SCALE", ALPHA_SCALE),
    ];
    let vectors = [
        ("PALETTE_OFFSET", PALETTE_OFFSET),
        ("PALETTE_AMPLITUDE", PALETTE_AMPLITUDE),
        ("PALETTE_FREQUENCY", PALETTE_FREQUENCY),
        ("PALETTE_PHASE", PALETTE_PHASE),
        ("BRAND_PURPLE", BRAND_PURPLE),
        ("BRAND_PINK", BRAND_PINK),
        ("GLOW_COLOR", GLOW_COLOR),
    ];

    let mut block = String::new();
    for (name, value) in scalars {
        let _ = writeln!(block, "const float {name} = {};", glsl_float(value));
    }
    for (name, value) in vectors {
        let _ = writeln!(block, "const vec3 {name} = {};", glsl_vec3(value));
    }
    block
}

fn ball_line(index: usize, trajectory: &Trajectory) -> String {
    format!(
        "    vec2 p{index} = vec2({wx}(t * {fx}) * {ax}, {wy}(t * {fy}) * {ay});\n    v += metaball(uv, p{index}, {radius});\n",
        wx = trajectory.x.wave.glsl(),
        fx = glsl_float(trajectory.x.frequency),
        ax = glsl_float(trajectory.x.amplitude),
        wy = trajectory.y.wave.glsl(),
        fy = glsl_float(trajectory.y.frequency),
        ay = glsl_float(trajectory.y.amplitude),
        radius = glsl_float(trajectory.radius),
    )
}

fn ball_block() -> String {
    let mut block = String::new();
    for (index, trajectory) in TRAJECTORIES.iter().enumerate() {
        block.push_str(&ball_line(index, trajectory));
    }
    block.push_str(
        "    v += metaball(uv, mouse * POINTER_BALL_SCALE, POINTER_BALL_RADIUS);\n",
    );
    block
}

/// Uniform block declaration; layout must match
/// [`crate::gpu::uniforms::EffectUniforms`] under std140 rules.
const FRAGMENT_HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform EffectParams {
    vec4 _resolution;
    vec4 _pointer;
    float _time;
    float _timeDelta;
    int _frame;
    float _padding0;
} ubo;
";

const FRAGMENT_FUNCTIONS: &str = r"float metaball(vec2 p, vec2 pos, float r) {
    float d2 = dot(p - pos, p - pos);
    return r * r / (d2 + FIELD_EPSILON);
}

vec3 palette(float t) {
    return PALETTE_OFFSET
        + PALETTE_AMPLITUDE * cos(PALETTE_TWO_PI * (PALETTE_FREQUENCY * t + PALETTE_PHASE));
}
";

const MAIN_PROLOGUE: &str = r"    vec2 aspect = vec2(ubo._resolution.x / ubo._resolution.y, 1.0);
    vec2 uv = (v_uv * 2.0 - 1.0) * aspect;
    vec2 mouse = (ubo._pointer.xy * 2.0 - 1.0) * aspect;
    float t = ubo._time * TIME_SCALE;

    float v = 0.0;
";

const MAIN_EPILOGUE: &str = r"
    float intensity = smoothstep(FIELD_LOWER, FIELD_UPPER, v);

    float colorIndex = v * COLOR_FIELD_WEIGHT + t * COLOR_TIME_WEIGHT;
    vec3 color1 = palette(colorIndex);
    vec3 color2 = palette(colorIndex + PALETTE_COMPLEMENT_OFFSET);
    vec3 finalColor = mix(color1, color2, sin(t + v) * 0.5 + 0.5);

    finalColor = mix(finalColor, BRAND_PURPLE, BRAND_PURPLE_MIX);
    finalColor = mix(finalColor, BRAND_PINK, intensity * BRAND_PINK_MIX);

    float glow = exp(-length(uv - mouse) * GLOW_FALLOFF) * GLOW_STRENGTH;
    finalColor += GLOW_COLOR * glow;

    float pulse = sin(t * PULSE_RATE) * PULSE_DEPTH + PULSE_BASE;
    intensity *= pulse;

    float alpha = intensity * ALPHA_SCALE;
    outColor = vec4(finalColor * alpha, alpha);
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_source_carries_the_trajectory_constants_verbatim() {
        let source = fragment_source(TIME_SCALE);
        assert!(source.contains("vec2 p0 = vec2(sin(t * 1.3) * 0.8, cos(t * 1.2) * 0.6);"));
        assert!(source.contains("vec2 p1 = vec2(cos(t * 0.8) * 0.7, sin(t * 0.9) * 0.8);"));
        assert!(source.contains("vec2 p2 = vec2(sin(t * 1.1) * 0.6, sin(t * 1.5) * 0.5);"));
        assert!(source.contains("vec2 p3 = vec2(cos(t * 1.7) * 0.4, cos(t * 0.7) * 0.9);"));
        assert!(source.contains("vec2 p4 = vec2(sin(t * 2.1) * 0.5, cos(t * 1.8) * 0.4);"));
    }

    #[test]
    fn fragment_source_sums_six_influences() {
        let source = fragment_source(TIME_SCALE);
        assert_eq!(
            source.matches("v += metaball(uv,").count(),
            crate::field::BALL_COUNT
        );
    }

    #[test]
    fn fragment_source_declares_the_palette_and_brand_constants() {
        let source = fragment_source(TIME_SCALE);
        assert!(source.contains("const float TIME_SCALE = 0.6;"));
        assert!(source.contains("const float FIELD_EPSILON = 0.1;"));
        assert!(source.contains("const float FIELD_LOWER = 0.8;"));
        assert!(source.contains("const float FIELD_UPPER = 2.5;"));
        assert!(source.contains("const float PALETTE_TWO_PI = 6.28318;"));
        assert!(source.contains("const vec3 PALETTE_PHASE = vec3(0.263, 0.416, 0.557);"));
        assert!(source.contains("const vec3 BRAND_PURPLE = vec3(0.6, 0.3, 0.9);"));
        assert!(source.contains("const vec3 BRAND_PINK = vec3(0.9, 0.4, 0.7);"));
        assert!(source.contains("const vec3 GLOW_COLOR = vec3(0.8, 0.2, 1.0);"));
    }

    #[test]
    fn time_scale_override_lands_in_the_source() {
        let source = fragment_source(0.2);
        assert!(source.contains("const float TIME_SCALE = 0.2;"));
        assert!(!source.contains("const float TIME_SCALE = 0.6;"));
    }

    #[test]
    fn invalid_time_scale_falls_back_to_the_baseline() {
        let source = fragment_source(f32::NAN);
        assert!(source.contains("const float TIME_SCALE = 0.6;"));
    }

    #[test]
    fn shader_stages_declare_matching_varyings() {
        let fragment = fragment_source(TIME_SCALE);
        assert!(VERTEX_SHADER_GLSL.contains("layout(location = 0) out vec2 v_uv;"));
        assert!(fragment.contains("layout(location = 0) in vec2 v_uv;"));
    }
}
