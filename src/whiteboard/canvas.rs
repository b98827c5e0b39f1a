//! Stroke-based drawing surface

use serde::{Deserialize, Serialize};

/// Points closer than this to the previous one are dropped while drawing
const MIN_POINT_DISTANCE: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const DARK: Rgba = Rgba([30, 30, 30, 255]);

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    rgb[i] = v * 17;
                }
                Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
            }
            6 | 8 => {
                let r = channel(hex.get(0..2)?)?;
                let g = channel(hex.get(2..4)?)?;
                let b = channel(hex.get(4..6)?)?;
                let a = if hex.len() == 8 {
                    channel(hex.get(6..8)?)?
                } else {
                    255
                };
                Some(Rgba([r, g, b, a]))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b, _] = self.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn alpha(&self) -> f32 {
        self.0[3] as f32 / 255.0
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Rgba([r, g, b, alpha])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Pen, Tool::Highlighter, Tool::Eraser];

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Highlighter => "Highlighter",
            Tool::Eraser => "Eraser",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub tool: Tool,
    pub color: Rgba,
    pub width: f32,
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(tool: Tool, color: Rgba, width: f32, start: Point) -> Self {
        let (color, width) = match tool {
            Tool::Pen => (color, width),
            Tool::Highlighter => (color.with_alpha(0x55), width * 4.0),
            Tool::Eraser => (color, width * 6.0),
        };
        Self {
            tool,
            color,
            width,
            points: vec![start],
        }
    }

    /// Append a point unless it is too close to the last one
    pub fn push(&mut self, point: Point) -> bool {
        if let Some(last) = self.points.last() {
            if last.distance(&point) < MIN_POINT_DISTANCE {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    /// Color the stroke paints with on `background`
    pub fn paint_color(&self, background: Rgba) -> Rgba {
        match self.tool {
            Tool::Eraser => background,
            _ => self.color,
        }
    }
}

/// The committed drawing: everything a snapshot needs to repaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub strokes: Vec<Stroke>,
    pub background: Rgba,
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            strokes: Vec::new(),
            background: Rgba::DARK,
            width: 1600.0,
            height: 1000.0,
        }
    }
}

impl Canvas {
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Grow the logical canvas so that `point` is inside it
    pub fn include(&mut self, point: Point) {
        self.width = self.width.max(point.x.ceil());
        self.height = self.height.max(point.y.ceil());
    }

    /// Render the drawing as a standalone SVG document
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = self.height
        );
        svg.push_str(&format!(
            "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            self.background.to_hex()
        ));

        for stroke in &self.strokes {
            let color = stroke.paint_color(self.background);
            let opacity = if color.alpha() < 1.0 {
                format!(" opacity=\"{:.2}\"", color.alpha())
            } else {
                String::new()
            };

            if let [p] = stroke.points.as_slice() {
                svg.push_str(&format!(
                    "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\"{}/>\n",
                    p.x,
                    p.y,
                    stroke.width / 2.0,
                    color.to_hex(),
                    opacity
                ));
                continue;
            }

            let path = stroke
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}{:.1} {:.1}", if i == 0 { "M" } else { "L" }, p.x, p.y))
                .collect::<Vec<_>>()
                .join(" ");
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.1}\" \
                 stroke-linecap=\"round\" stroke-linejoin=\"round\"{}/>\n",
                path,
                color.to_hex(),
                stroke.width,
                opacity
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgba::from_hex("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::from_hex("ff000080"), Some(Rgba([255, 0, 0, 128])));
        assert_eq!(Rgba::from_hex("#12345"), None);
        assert_eq!(Rgba::from_hex("#zzzzzz"), None);
        assert_eq!(Rgba([1, 2, 255, 0]).to_hex(), "#0102ff");
    }

    #[test]
    fn test_close_points_are_dropped() {
        let mut stroke = Stroke::new(Tool::Pen, Rgba::WHITE, 2.0, Point::new(0.0, 0.0));
        assert!(!stroke.push(Point::new(0.2, 0.2)));
        assert!(stroke.push(Point::new(3.0, 4.0)));
        assert_eq!(stroke.points.len(), 2);
    }

    #[test]
    fn test_tools_adjust_width_and_color() {
        let hl = Stroke::new(Tool::Highlighter, Rgba::WHITE, 2.0, Point::new(0.0, 0.0));
        assert_eq!(hl.width, 8.0);
        assert_eq!(hl.color.0[3], 0x55);

        let eraser = Stroke::new(Tool::Eraser, Rgba::WHITE, 2.0, Point::new(0.0, 0.0));
        assert_eq!(eraser.paint_color(Rgba::DARK), Rgba::DARK);
    }

    #[test]
    fn test_svg_output() {
        let mut canvas = Canvas {
            width: 100.0,
            height: 50.0,
            ..Default::default()
        };
        let mut line = Stroke::new(Tool::Pen, Rgba::WHITE, 2.0, Point::new(1.0, 2.0));
        line.push(Point::new(10.0, 20.0));
        canvas.strokes.push(line);
        canvas
            .strokes
            .push(Stroke::new(Tool::Pen, Rgba::WHITE, 4.0, Point::new(5.0, 5.0)));

        let svg = canvas.to_svg();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"50\""));
        assert!(svg.contains("d=\"M1.0 2.0 L10.0 20.0\""));
        assert!(svg.contains("<circle cx=\"5.0\" cy=\"5.0\" r=\"2.0\" fill=\"#ffffff\"/>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
