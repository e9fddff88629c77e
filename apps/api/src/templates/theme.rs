//! Theme palettes and the color/markup helpers shared by the layouts.
//!
//! A palette is a named accent color; the muted variant is derived by
//! blending toward white rather than stored, so the two can never drift.

// ────────────────────────────────────────────────────────────────────────────
// Palettes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub name: &'static str,
    /// Accent color for headings and rules, as `#RRGGBB`.
    pub accent: &'static str,
    /// Body text color.
    pub ink: &'static str,
}

pub const DEFAULT_THEME: &str = "navy";

const THEMES: &[ThemePalette] = &[
    ThemePalette {
        name: "navy",
        accent: "#1f3a5f",
        ink: "#1a1a1a",
    },
    ThemePalette {
        name: "forest",
        accent: "#1e4d2b",
        ink: "#1a1a1a",
    },
    ThemePalette {
        name: "burgundy",
        accent: "#6d1a36",
        ink: "#1a1a1a",
    },
    ThemePalette {
        name: "slate",
        accent: "#44475a",
        ink: "#222222",
    },
    ThemePalette {
        name: "graphite",
        accent: "#2b2b2b",
        ink: "#111111",
    },
];

/// Resolves a palette by name.
pub fn palette(name: &str) -> Option<&'static ThemePalette> {
    THEMES.iter().find(|t| t.name == name)
}

pub fn theme_names() -> Vec<&'static str> {
    THEMES.iter().map(|t| t.name).collect()
}

impl ThemePalette {
    /// The derived muted variant of the accent, used for rules and
    /// secondary text.
    pub fn muted(&self) -> String {
        lighten(self.accent, 0.6)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Color math
// ────────────────────────────────────────────────────────────────────────────

/// Blends a `#RRGGBB` color toward white by `factor` (0.0 = unchanged,
/// 1.0 = white). Malformed input comes back unchanged.
pub fn lighten(hex: &str, factor: f32) -> String {
    let Some((r, g, b)) = parse_hex(hex) else {
        return hex.to_string();
    };
    let factor = factor.clamp(0.0, 1.0);
    let blend = |c: u8| -> u8 {
        let lifted = f32::from(c) + (255.0 - f32::from(c)) * factor;
        lifted.round() as u8
    };
    format!("#{:02x}{:02x}{:02x}", blend(r), blend(g), blend(b))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    // `get` instead of indexing: a multibyte character would put the
    // two-byte cut points off a char boundary.
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some((r, g, b))
}

// ────────────────────────────────────────────────────────────────────────────
// Markup helpers
// ────────────────────────────────────────────────────────────────────────────

/// Escapes text for insertion into HTML content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
