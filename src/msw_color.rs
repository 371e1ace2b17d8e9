use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Colour capability of the attached terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    TrueColor, // 24-bit RGB
    Indexed,   // 256-colour palette
    Basic,     // 16 ANSI colours
}

impl ColorDepth {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        if support.has_16m {
            ColorDepth::TrueColor
        } else if support.has_256 {
            ColorDepth::Indexed
        } else {
            ColorDepth::Basic
        }
    }
}

/// One palette entry in every depth
struct Swatch {
    rgb: (u8, u8, u8),
    indexed: u8,
    basic: Color,
}

impl Swatch {
    fn at(&self, depth: ColorDepth) -> Color {
        match depth {
            ColorDepth::TrueColor => Color::Rgb(self.rgb.0, self.rgb.1, self.rgb.2),
            ColorDepth::Indexed => Color::Indexed(self.indexed),
            ColorDepth::Basic => self.basic,
        }
    }
}

// Classic number colours, 1 through 8
const NUMBER_SWATCHES: [Swatch; 8] = [
    Swatch { rgb: (0, 0, 255), indexed: 21, basic: Color::LightBlue },
    Swatch { rgb: (0, 128, 0), indexed: 28, basic: Color::Green },
    Swatch { rgb: (255, 0, 0), indexed: 196, basic: Color::LightRed },
    Swatch { rgb: (0, 0, 128), indexed: 18, basic: Color::Blue },
    Swatch { rgb: (128, 0, 0), indexed: 88, basic: Color::Red },
    Swatch { rgb: (0, 128, 128), indexed: 30, basic: Color::Cyan },
    Swatch { rgb: (0, 0, 0), indexed: 16, basic: Color::Black },
    Swatch { rgb: (128, 128, 128), indexed: 244, basic: Color::DarkGray },
];

/// Foreground for an adjacency number; `Reset` outside 1..=8
pub fn number_color(n: u8, depth: ColorDepth) -> Color {
    match n {
        1..=8 => NUMBER_SWATCHES[usize::from(n) - 1].at(depth),
        _ => Color::Reset,
    }
}
