use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Colour strings from the configuration
// ---------------------------------------------------------------------------

/// Parse a configured colour: an SVG/CSS name (`darkred`), hex (`#1f77b4`,
/// `1f77b4`), or `rgb(r, g, b)` / `rgba(r, g, b, a)` with `a` in 0..=1.
pub fn parse_color(text: &str) -> Option<Color32> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();

    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(args);
    }

    if let Some(named) = palette::named::from_str(&lower) {
        return Some(Color32::from_rgb(named.red, named.green, named.blue));
    }

    text.parse::<Srgb<u8>>()
        .ok()
        .map(|c| Color32::from_rgb(c.red, c.green, c.blue))
}

fn parse_rgb_args(args: &str) -> Option<Color32> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    match parts.as_slice() {
        [r, g, b] => Some(Color32::from_rgb(channel(r)?, channel(g)?, channel(b)?)),
        [r, g, b, a] => {
            let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
            Some(Color32::from_rgba_unmultiplied(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                (alpha * 255.0).round() as u8,
            ))
        }
        _ => None,
    }
}

/// Like [`parse_color`], logging and falling back to `fallback` on bad input.
pub fn color_or(text: &str, fallback: Color32) -> Color32 {
    parse_color(text).unwrap_or_else(|| {
        log::warn!("Unrecognised colour '{text}', using {fallback:?}");
        fallback
    })
}

/// Same hue with the given opacity, for fills drawn under a line.
pub fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

// Fills shared by every cumulative-change chart.
pub const ACCRETION_FILL: Color32 = Color32::from_rgba_premultiplied(43, 71, 43, 77);
pub const EROSION_FILL: Color32 = Color32::from_rgba_premultiplied(77, 55, 58, 77);
