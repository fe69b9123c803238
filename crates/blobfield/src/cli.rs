use clap::Parser;
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "blobfield",
    author,
    version,
    about = "Animated metaball background effect",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Window size in physical pixels, as `WIDTHxHEIGHT`.
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "1920x1080", value_parser = parse_surface_size)]
    pub size: (u32, u32),

    /// Cap the render loop at this many frames per second.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Anti-aliasing mode: `auto`, `off`, or an MSAA sample count.
    #[arg(long, value_name = "MODE", default_value = "auto", value_parser = parse_antialiasing)]
    pub antialias: Antialiasing,

    /// Pointer smoothing factor in (0, 1]; smaller trails further behind.
    #[arg(long, value_name = "FACTOR")]
    pub lerp_factor: Option<f32>,

    /// Animation speed multiplier applied to the time uniform.
    #[arg(long, value_name = "SCALE")]
    pub time_scale: Option<f32>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width `{width}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height `{height}`"))?;
    if width == 0 || height == 0 {
        return Err(format!("surface size must be non-zero, got `{value}`"));
    }
    Ok((width, height))
}

fn parse_antialiasing(value: &str) -> Result<Antialiasing, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(Antialiasing::Auto),
        "off" | "none" => Ok(Antialiasing::Off),
        other => {
            let samples: u32 = other
                .parse()
                .map_err(|_| format!("expected `auto`, `off`, or a sample count, got `{value}`"))?;
            if samples == 0 || !samples.is_power_of_two() {
                return Err(format!(
                    "MSAA sample count must be a power of two, got `{value}`"
                ));
            }
            Ok(Antialiasing::Samples(samples))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_parses_both_separators() {
        assert_eq!(parse_surface_size("1920x1080"), Ok((1920, 1080)));
        assert_eq!(parse_surface_size("800X600"), Ok((800, 600)));
    }

    #[test]
    fn surface_size_rejects_garbage() {
        assert!(parse_surface_size("1920").is_err());
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("wide x tall").is_err());
    }

    #[test]
    fn antialias_modes_parse() {
        assert_eq!(parse_antialiasing("auto"), Ok(Antialiasing::Auto));
        assert_eq!(parse_antialiasing("off"), Ok(Antialiasing::Off));
        assert_eq!(parse_antialiasing("4"), Ok(Antialiasing::Samples(4)));
        assert!(parse_antialiasing("3").is_err());
        assert!(parse_antialiasing("fancy").is_err());
    }

    #[test]
    fn defaults_round_trip_through_clap() {
        let cli = Cli::parse_from(["blobfield"]);
        assert_eq!(cli.size, (1920, 1080));
        assert_eq!(cli.antialias, Antialiasing::Auto);
        assert!(cli.fps.is_none());
        assert!(cli.lerp_factor.is_none());
        assert!(cli.time_scale.is_none());
    }

    #[test]
    fn overrides_parse_from_flags() {
        let cli = Cli::parse_from([
            "blobfield",
            "--size",
            "800x600",
            "--fps",
            "30",
            "--antialias",
            "off",
            "--lerp-factor",
            "0.05",
            "--time-scale",
            "0.2",
        ]);
        assert_eq!(cli.size, (800, 600));
        assert_eq!(cli.fps, Some(30.0));
        assert_eq!(cli.antialias, Antialiasing::Off);
        assert_eq!(cli.lerp_factor, Some(0.05));
        assert_eq!(cli.time_scale, Some(0.2));
    }
}
