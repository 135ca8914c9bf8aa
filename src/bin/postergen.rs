use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use image::Rgba;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::StdRng};
use serde_json::json;

use postergen::{
    EpisodeInfo, FfmpegFrameSource, FfmpegLogLevel, FillMode, FrameQuality, FrameSource,
    GradientDirection, GraphicSpec, HorizontalAlignment, OverlaySpec, PosterComposer,
    PosterFormat, PosterSettings, VerticalPosition,
};

const CLI_AFTER_HELP: &str = "Examples:\n  postergen poster episode.mkv --out poster.jpg --fill fit --ratio 2:3\n  postergen poster episode.mkv --out poster.png --format png --gradient-primary '#000000cc' --gradient-direction bottom-to-top\n  postergen inspect episode.mkv --samples 10 --json\n  postergen completions zsh > _postergen";

#[derive(Debug, Parser)]
#[command(
    name = "postergen",
    version,
    about = "Generate poster images from video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a spinner while the extractor probes candidate frames.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a poster from a video file.
    #[command(
        about = "Generate a poster image",
        after_help = "Examples:\n  postergen poster episode.mkv --out poster.jpg\n  postergen poster episode.mkv --out poster.webp --format webp --fill fill --ratio 16:9\n  postergen poster episode.mkv --out blank.png --no-extract --format png"
    )]
    Poster {
        /// Input video path.
        input: PathBuf,

        /// Output file path.
        #[arg(long)]
        out: PathBuf,

        /// Skip frame extraction and start from a blank transparent canvas.
        #[arg(long)]
        no_extract: bool,

        /// Start of the extraction window (% of duration).
        #[arg(long, default_value_t = 20.0)]
        window_start: f64,

        /// End of the extraction window (% of duration).
        #[arg(long, default_value_t = 80.0)]
        window_end: f64,

        /// Maximum frame decode attempts.
        #[arg(long, default_value_t = 30)]
        max_attempts: u32,

        /// Linear brightness boost percentage for HDR sources.
        #[arg(long, default_value_t = 0.0)]
        brighten: f32,

        /// Disable letterbox/pillarbox detection.
        #[arg(long)]
        no_letterbox: bool,

        /// Letterbox black luma threshold (0-255).
        #[arg(long, default_value_t = 32)]
        black_threshold: u8,

        /// Letterbox per-line confidence (50-100 %).
        #[arg(long, default_value_t = 85.0)]
        confidence: f32,

        /// Aspect fill mode: original | fit | fill.
        #[arg(long, default_value = "original")]
        fill: String,

        /// Target aspect ratio as W:H (falls back to 16:9 when malformed).
        #[arg(long, default_value = "16:9")]
        ratio: String,

        /// Safe-area inset per side (%).
        #[arg(long, default_value_t = 5.0)]
        safe_area: f32,

        /// Output format: jpeg | png | webp | gif.
        #[arg(long, default_value = "jpeg")]
        format: String,

        /// Blank-canvas width when extraction is disabled.
        #[arg(long, default_value_t = 1920)]
        fallback_width: u32,

        /// Blank-canvas height when extraction is disabled.
        #[arg(long, default_value_t = 1080)]
        fallback_height: u32,

        /// Solid overlay colour as #RRGGBB or #RRGGBBAA.
        #[arg(long)]
        overlay_color: Option<String>,

        /// Gradient primary colour as #RRGGBB or #RRGGBBAA.
        #[arg(long)]
        gradient_primary: Option<String>,

        /// Gradient secondary colour (defaults to transparent black).
        #[arg(long)]
        gradient_secondary: Option<String>,

        /// Gradient direction: left-to-right | bottom-to-top |
        /// top-left-to-bottom-right | bottom-left-to-top-right.
        #[arg(long, default_value = "bottom-to-top")]
        gradient_direction: String,

        /// Static graphic image to composite inside the safe area.
        #[arg(long)]
        graphic: Option<PathBuf>,

        /// Graphic maximum width (% of canvas).
        #[arg(long, default_value_t = 25.0)]
        graphic_width: f32,

        /// Graphic maximum height (% of canvas).
        #[arg(long, default_value_t = 25.0)]
        graphic_height: f32,

        /// Graphic vertical position: top | center | bottom.
        #[arg(long, default_value = "bottom")]
        graphic_position: String,

        /// Graphic horizontal alignment: left | center | right.
        #[arg(long, default_value = "center")]
        graphic_align: String,

        /// Seed for the random timestamp source (reproducible runs).
        #[arg(long)]
        seed: Option<u64>,

        /// Emit a machine-readable JSON report instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Score evenly spaced frames without producing a poster.
    #[command(
        about = "Score candidate frames",
        after_help = "Examples:\n  postergen inspect episode.mkv\n  postergen inspect episode.mkv --samples 20 --json"
    )]
    Inspect {
        /// Input video path.
        input: PathBuf,

        /// How many evenly spaced frames to score.
        #[arg(long, default_value_t = 10)]
        samples: u32,

        /// Start of the sampling window (% of duration).
        #[arg(long, default_value_t = 20.0)]
        window_start: f64,

        /// End of the sampling window (% of duration).
        #[arg(long, default_value_t = 80.0)]
        window_end: f64,

        /// Output scores as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// The shell to generate completions for.
        shell: Shell,
    },
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Quiet FFmpeg's own stderr output unless the user asked for detail.
    if cli.global.verbose {
        postergen::set_ffmpeg_log_level(FfmpegLogLevel::Info);
    } else {
        postergen::set_ffmpeg_log_level(FfmpegLogLevel::Fatal);
    }

    match cli.command {
        Commands::Poster {
            input,
            out,
            no_extract,
            window_start,
            window_end,
            max_attempts,
            brighten,
            no_letterbox,
            black_threshold,
            confidence,
            fill,
            ratio,
            safe_area,
            format,
            fallback_width,
            fallback_height,
            overlay_color,
            gradient_primary,
            gradient_secondary,
            gradient_direction,
            graphic,
            graphic_width,
            graphic_height,
            graphic_position,
            graphic_align,
            seed,
            json,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;

            let fill_mode = FillMode::parse(&fill).ok_or("Unsupported --fill (original|fit|fill)")?;
            let file_type =
                PosterFormat::parse(&format).ok_or("Unsupported --format (jpeg|png|webp|gif)")?;

            let overlay = resolve_overlay(
                overlay_color.as_deref(),
                gradient_primary.as_deref(),
                gradient_secondary.as_deref(),
                &gradient_direction,
            )?;

            let mut settings = PosterSettings::new()
                .with_extract_poster(!no_extract)
                .with_extract_window(window_start, window_end)
                .with_max_attempts(max_attempts)
                .with_brighten_hdr_pct(brighten)
                .with_letterbox_detection(!no_letterbox, black_threshold, confidence)
                .with_fill(fill_mode, &ratio)
                .with_safe_area_pct(safe_area)
                .with_file_type(file_type)
                .with_fallback_dimensions(fallback_width, fallback_height)
                .with_overlay(overlay);

            if let Some(path) = graphic {
                let vertical = parse_vertical_position(&graphic_position)
                    .ok_or("Unsupported --graphic-position (top|center|bottom)")?;
                let horizontal = parse_horizontal_alignment(&graphic_align)
                    .ok_or("Unsupported --graphic-align (left|center|right)")?;
                settings = settings.with_graphic(
                    GraphicSpec::new(path)
                        .with_size_pct(graphic_width, graphic_height)
                        .with_placement(vertical, horizontal),
                );
            }

            let spinner = if cli.global.progress {
                let bar = ProgressBar::new_spinner();
                bar.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
                bar.set_message("selecting poster frame...");
                bar.enable_steady_tick(Duration::from_millis(100));
                Some(bar)
            } else {
                None
            };

            let mut rng: StdRng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let composer = PosterComposer::new(settings);
            let mut source = FfmpegFrameSource::new();
            let video_path = if no_extract { None } else { Some(input.as_path()) };

            let result = composer.compose_with_report(
                &mut source,
                video_path,
                &EpisodeInfo::default(),
                &mut rng,
            );

            if let Some(bar) = spinner {
                bar.finish_and_clear();
            }

            let (encoded, report) = result?;
            std::fs::write(&out, &encoded.bytes)?;

            if json {
                let payload = json!({
                    "output": out.display().to_string(),
                    "format": encoded.mime(),
                    "bytes": encoded.bytes.len(),
                    "canvas_width": report.canvas_width,
                    "canvas_height": report.canvas_height,
                    "frame_quality": report.frame_quality.map(|quality| json!({
                        "brightness": quality.brightness,
                        "sharpness": quality.sharpness,
                        "score": quality.score,
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Wrote {} poster ({} bytes) to {}",
                        encoded.mime(),
                        encoded.bytes.len(),
                        out.display()
                    )
                    .green()
                );
            }
        }
        Commands::Inspect {
            input,
            samples,
            window_start,
            window_end,
            json,
        } => {
            let mut source = FfmpegFrameSource::new();
            let duration = source.duration(&input)?;
            if duration.is_zero() {
                return Err("Video reports zero duration".into());
            }

            let samples = samples.max(1);
            let total_seconds = duration.as_secs_f64();
            let start = total_seconds * window_start / 100.0;
            let end = total_seconds * window_end / 100.0;
            let step = (end - start) / samples as f64;

            let mut scores: Vec<(f64, FrameQuality)> = Vec::with_capacity(samples as usize);
            for index in 0..samples {
                let seconds = start + step * index as f64;
                let timestamp = Duration::from_secs_f64(seconds.max(0.0));
                match source.frame_at(&input, timestamp) {
                    Ok(frame) => {
                        let quality = FrameQuality::measure(&frame)?;
                        scores.push((seconds, quality));
                    }
                    Err(error) => {
                        if cli.global.verbose {
                            eprintln!("skipping {seconds:.1}s: {error}");
                        }
                    }
                }
            }

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "duration_seconds": total_seconds,
                    "samples": scores.iter().map(|(seconds, quality)| json!({
                        "timestamp_seconds": seconds,
                        "brightness": quality.brightness,
                        "sharpness": quality.sharpness,
                        "score": quality.score,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (seconds, quality) in &scores {
                    println!(
                        "{seconds:8.1}s  brightness={:.3}  sharpness={:8.1}  score={:.3}",
                        quality.brightness, quality.sharpness, quality.score
                    );
                }
                if let Some((seconds, quality)) = scores
                    .iter()
                    .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
                {
                    println!(
                        "{} best frame at {seconds:.1}s (score {:.3})",
                        "info:".cyan().bold(),
                        quality.score
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "postergen", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !overwrite {
        return Err(format!(
            "Output {} already exists (use --overwrite to replace it)",
            path.display()
        )
        .into());
    }
    Ok(())
}

/// Build an [`OverlaySpec`] from CLI colour flags. A solid colour wins over
/// gradient flags; gradient flags require at least a primary colour.
fn resolve_overlay(
    solid: Option<&str>,
    gradient_primary: Option<&str>,
    gradient_secondary: Option<&str>,
    direction: &str,
) -> Result<OverlaySpec, Box<dyn std::error::Error>> {
    if let Some(value) = solid {
        let color = parse_hex_color(value).ok_or("Invalid --overlay-color (expected #RRGGBB[AA])")?;
        return Ok(OverlaySpec::Solid(color));
    }

    if let Some(primary) = gradient_primary {
        let primary =
            parse_hex_color(primary).ok_or("Invalid --gradient-primary (expected #RRGGBB[AA])")?;
        let secondary = match gradient_secondary {
            Some(value) => parse_hex_color(value)
                .ok_or("Invalid --gradient-secondary (expected #RRGGBB[AA])")?,
            None => Rgba([0, 0, 0, 0]),
        };
        let direction = parse_gradient_direction(direction)
            .ok_or("Unsupported --gradient-direction")?;
        return Ok(OverlaySpec::Gradient {
            primary,
            secondary,
            direction,
        });
    }

    Ok(OverlaySpec::None)
}

fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |index: usize| u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16).ok();
    match hex.len() {
        6 => Some(Rgba([channel(0)?, channel(1)?, channel(2)?, 255])),
        8 => Some(Rgba([channel(0)?, channel(1)?, channel(2)?, channel(3)?])),
        _ => None,
    }
}

fn parse_gradient_direction(value: &str) -> Option<GradientDirection> {
    match value.to_ascii_lowercase().as_str() {
        "left-to-right" | "horizontal" => Some(GradientDirection::LeftToRight),
        "bottom-to-top" | "vertical" => Some(GradientDirection::BottomToTop),
        "top-left-to-bottom-right" => Some(GradientDirection::TopLeftToBottomRight),
        "bottom-left-to-top-right" => Some(GradientDirection::BottomLeftToTopRight),
        _ => None,
    }
}

fn parse_vertical_position(value: &str) -> Option<VerticalPosition> {
    match value.to_ascii_lowercase().as_str() {
        "top" => Some(VerticalPosition::Top),
        "center" | "middle" => Some(VerticalPosition::Center),
        "bottom" => Some(VerticalPosition::Bottom),
        _ => None,
    }
}

fn parse_horizontal_alignment(value: &str) -> Option<HorizontalAlignment> {
    match value.to_ascii_lowercase().as_str() {
        "left" => Some(HorizontalAlignment::Left),
        "center" | "middle" => Some(HorizontalAlignment::Center),
        "right" => Some(HorizontalAlignment::Right),
        _ => None,
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_gradient_direction, parse_hex_color, parse_horizontal_alignment,
        parse_vertical_position,
    };
    use image::Rgba;
    use postergen::GradientDirection;

    #[test]
    fn parse_hex_color_formats() {
        assert_eq!(parse_hex_color("#000000"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_hex_color("ff8000"), Some(Rgba([255, 128, 0, 255])));
        assert_eq!(parse_hex_color("#00000080"), Some(Rgba([0, 0, 0, 128])));
        assert_eq!(parse_hex_color("#12"), None);
        assert_eq!(parse_hex_color("nothex"), None);
    }

    #[test]
    fn parse_gradient_direction_aliases() {
        assert_eq!(
            parse_gradient_direction("left-to-right"),
            Some(GradientDirection::LeftToRight)
        );
        assert_eq!(
            parse_gradient_direction("VERTICAL"),
            Some(GradientDirection::BottomToTop)
        );
        assert_eq!(
            parse_gradient_direction("top-left-to-bottom-right"),
            Some(GradientDirection::TopLeftToBottomRight)
        );
        assert_eq!(parse_gradient_direction("radial"), None);
    }

    #[test]
    fn parse_placement_aliases() {
        assert!(parse_vertical_position("Top").is_some());
        assert!(parse_vertical_position("middle").is_some());
        assert!(parse_vertical_position("floor").is_none());
        assert!(parse_horizontal_alignment("right").is_some());
        assert!(parse_horizontal_alignment("justified").is_none());
    }
}
