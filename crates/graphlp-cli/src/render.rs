//! SVG rendering of a plot payload
//!
//! Feasible cells are shaded, boundary lines drawn with a legend, and the
//! optimal vertex marked and annotated.

use std::fs;
use std::io;
use std::path::Path;

use graphlp_core::{OptimizationResult, PlotPayload};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Grid has no samples to draw")]
    EmptyGrid,
    #[error("Plot range [{lo}, {hi}] is empty")]
    EmptyRange { lo: f64, hi: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    pub const BLUE: Color = Color::new(31, 119, 180);
    pub const ORANGE: Color = Color::new(255, 127, 14);
    pub const GREEN: Color = Color::new(44, 160, 44);
    pub const RED: Color = Color::new(214, 39, 40);
    pub const PURPLE: Color = Color::new(148, 103, 189);
    pub const BROWN: Color = Color::new(140, 86, 75);
    pub const PINK: Color = Color::new(227, 119, 194);
    pub const GRAY: Color = Color::new(127, 127, 127);
}

/// Line colors, cycled in restriction order
pub const PALETTE: [Color; 8] = [
    Color::BLUE,
    Color::ORANGE,
    Color::GREEN,
    Color::RED,
    Color::PURPLE,
    Color::BROWN,
    Color::PINK,
    Color::GRAY,
];

const REGION_FILL: Color = Color::new(116, 196, 118);

#[derive(Debug, Clone)]
pub struct SvgConfig {
    pub width: u32,
    pub height: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
    pub show_grid: bool,
    pub show_legend: bool,
    pub line_width: f32,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 700,
            margin_left: 70,
            margin_right: 30,
            margin_top: 50,
            margin_bottom: 60,
            show_grid: true,
            show_legend: true,
            line_width: 1.5,
        }
    }
}

impl SvgConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// `(left, top, width, height)` of the drawing area
    fn plot_area(&self) -> (f64, f64, f64, f64) {
        let w = self.width.saturating_sub(self.margin_left + self.margin_right).max(1);
        let h = self.height.saturating_sub(self.margin_top + self.margin_bottom).max(1);
        (self.margin_left as f64, self.margin_top as f64, w as f64, h as f64)
    }
}

/// Maps data coordinates onto the plot area; x2 grows upwards
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    lo: f64,
    hi: f64,
}

impl Frame {
    fn px(&self, x: f64) -> f64 {
        self.left + (x - self.lo) / (self.hi - self.lo) * self.width
    }

    fn py(&self, y: f64) -> f64 {
        self.top + self.height - (y - self.lo) / (self.hi - self.lo) * self.height
    }
}

pub fn render_svg(payload: &PlotPayload, config: &SvgConfig) -> Result<String, RenderError> {
    let grid = payload.grid;
    if grid.resolution == 0 {
        return Err(RenderError::EmptyGrid);
    }
    if !(grid.hi > grid.lo) {
        return Err(RenderError::EmptyRange { lo: grid.lo, hi: grid.hi });
    }

    let (left, top, width, height) = config.plot_area();
    let frame = Frame {
        left,
        top,
        width,
        height,
        lo: grid.lo,
        hi: grid.hi,
    };

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" font-family="sans-serif">
"#,
        config.width, config.height, config.width, config.height
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        r#"<defs><clipPath id="plot-area"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>
"#,
        left, top, width, height
    ));

    draw_region(&mut svg, payload, &frame);
    draw_axes(&mut svg, payload, config, &frame);
    let legend = draw_boundaries(&mut svg, payload, config, &frame);
    draw_optimum(&mut svg, payload, &frame);
    if config.show_legend && !legend.is_empty() {
        draw_legend(&mut svg, &legend, &frame);
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

pub fn write_svg(path: &Path, payload: &PlotPayload, config: &SvgConfig) -> Result<(), RenderError> {
    let svg = render_svg(payload, config)?;
    fs::write(path, svg)?;
    Ok(())
}

/// One rectangle per horizontal run of feasible cells
fn draw_region(svg: &mut String, payload: &PlotPayload, frame: &Frame) {
    let n = payload.mask.resolution() as f64;
    let cell_w = frame.width / n;
    let cell_h = frame.height / n;

    svg.push_str(&format!(
        r#"<g fill="{}" fill-opacity="0.3" shape-rendering="crispEdges">
"#,
        REGION_FILL.to_css()
    ));
    for (row, cells) in payload.mask.rows().enumerate() {
        let y = frame.top + frame.height - (row + 1) as f64 * cell_h;
        let mut col = 0;
        while col < cells.len() {
            if !cells[col] {
                col += 1;
                continue;
            }
            let start = col;
            while col < cells.len() && cells[col] {
                col += 1;
            }
            svg.push_str(&format!(
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/>
"#,
                frame.left + start as f64 * cell_w,
                y,
                (col - start) as f64 * cell_w,
                cell_h
            ));
        }
    }
    svg.push_str("</g>\n");
}

fn draw_axes(svg: &mut String, payload: &PlotPayload, config: &SvgConfig, frame: &Frame) {
    let ticks = 10;
    let step = (frame.hi - frame.lo) / ticks as f64;

    for i in 0..=ticks {
        let v = frame.lo + step * i as f64;
        let (x, y) = (frame.px(v), frame.py(v));
        if config.show_grid {
            svg.push_str(&format!(
                r##"<line x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="#dddddd"/>
"##,
                frame.top,
                frame.top + frame.height
            ));
            svg.push_str(&format!(
                r##"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="#dddddd"/>
"##,
                frame.left,
                frame.left + frame.width
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{:.2}" font-size="11" text-anchor="middle">{}</text>
"#,
            frame.top + frame.height + 16.0,
            format_tick(v)
        ));
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="11" text-anchor="end">{}</text>
"#,
            frame.left - 6.0,
            y + 4.0,
            format_tick(v)
        ));
    }

    svg.push_str(&format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black"/>
"#,
        frame.left, frame.top, frame.width, frame.height
    ));
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" font-size="13" text-anchor="middle">x1</text>
"#,
        frame.left + frame.width / 2.0,
        frame.top + frame.height + 40.0
    ));
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" font-size="13" text-anchor="middle" transform="rotate(-90 {:.2} {:.2})">x2</text>
"#,
        frame.left - 45.0,
        frame.top + frame.height / 2.0,
        frame.left - 45.0,
        frame.top + frame.height / 2.0
    ));
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" font-size="16" font-weight="bold" text-anchor="middle">{}</text>
"#,
        config.width as f64 / 2.0,
        frame.top - 20.0,
        escape(&payload.title())
    ));
}

/// Draws sampled lines and `b == 0` verticals; returns legend entries
fn draw_boundaries(svg: &mut String, payload: &PlotPayload, config: &SvgConfig, frame: &Frame) -> Vec<(String, Color, bool)> {
    let mut legend = Vec::new();
    svg.push_str("<g clip-path=\"url(#plot-area)\" fill=\"none\">\n");

    for (i, restriction) in payload.restrictions.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let binding = payload.binding.contains(&i);
        let width = if binding { config.line_width * 2.0 } else { config.line_width };

        if let Some(line) = payload.lines.iter().find(|l| l.restriction_index == i) {
            let points: Vec<String> = line
                .xs
                .iter()
                .zip(&line.ys)
                .filter(|(_, y)| y.is_finite())
                .map(|(&x, &y)| format!("{:.2},{:.2}", frame.px(x), frame.py(clamp_far(y, frame))))
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" stroke="{}" stroke-width="{}"/>
"#,
                points.join(" "),
                color.to_css(),
                width
            ));
            legend.push((line.label.clone(), color, false));
        } else if let Some(x) = restriction.vertical_x() {
            let px = frame.px(x);
            svg.push_str(&format!(
                r#"<line x1="{px:.2}" y1="{:.2}" x2="{px:.2}" y2="{:.2}" stroke="{}" stroke-width="{}" stroke-dasharray="6 3"/>
"#,
                frame.top,
                frame.top + frame.height,
                color.to_css(),
                width
            ));
            legend.push((restriction.label(), color, true));
        }
    }

    svg.push_str("</g>\n");
    legend
}

/// Keeps far-away samples finite for SVG viewers while preserving the slope
/// inside the visible area.
fn clamp_far(y: f64, frame: &Frame) -> f64 {
    let span = frame.hi - frame.lo;
    y.clamp(frame.lo - 100.0 * span, frame.hi + 100.0 * span)
}

fn draw_optimum(svg: &mut String, payload: &PlotPayload, frame: &Frame) {
    let Some(OptimizationResult::Optimal { x1, x2, .. }) = payload.result else {
        return;
    };
    let Some(annotation) = payload.annotation() else {
        return;
    };
    let (cx, cy) = (frame.px(x1), frame.py(x2));

    svg.push_str(&format!(
        r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="6" fill="{}"/>
"#,
        Color::RED.to_css()
    ));

    let lines: Vec<&str> = annotation.lines().collect();
    let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64 * 7.0 + 12.0;
    let box_h = lines.len() as f64 * 15.0 + 8.0;
    let (bx, by) = (cx + 12.0, cy - 12.0 - box_h);
    svg.push_str(&format!(
        r##"<rect x="{bx:.2}" y="{by:.2}" width="{box_w:.2}" height="{box_h:.2}" rx="5" fill="#ffff66" fill-opacity="0.7" stroke="black"/>
"##
    ));
    for (i, line) in lines.iter().enumerate() {
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="12">{}</text>
"#,
            bx + 6.0,
            by + 16.0 + i as f64 * 15.0,
            escape(line)
        ));
    }
}

fn draw_legend(svg: &mut String, legend: &[(String, Color, bool)], frame: &Frame) {
    let row_h = 18.0;
    let width = legend.iter().map(|(l, _, _)| l.chars().count()).max().unwrap_or(0) as f64 * 7.0 + 44.0;
    let height = legend.len() as f64 * row_h + 10.0;
    let x = frame.left + frame.width - width - 10.0;
    let y = frame.top + 10.0;

    svg.push_str(&format!(
        r#"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="white" fill-opacity="0.85" stroke="gray"/>
"#
    ));
    for (i, (label, color, dashed)) in legend.iter().enumerate() {
        let ly = y + 14.0 + i as f64 * row_h;
        let dash = if *dashed { r#" stroke-dasharray="6 3""# } else { "" };
        svg.push_str(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="2"{}/>
"#,
            x + 8.0,
            ly - 4.0,
            x + 30.0,
            ly - 4.0,
            color.to_css(),
            dash
        ));
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{ly:.2}" font-size="12">{}</text>
"#,
            x + 36.0,
            escape(label)
        ));
    }
}

fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v.round())
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
