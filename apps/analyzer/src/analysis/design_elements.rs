//! Divider-line detection.
//!
//! Only horizontal lines are detected. `vertical_lines` and `shapes` are part of the result shape
//! but are always empty.

use serde::{Deserialize, Serialize};

use crate::analysis::session::LuminanceMap;
use crate::analysis::thresholds::AnalyzerThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub x: u32,
    pub y: u32,
    pub length: u32,
    pub thickness: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignElements {
    pub horizontal_lines: Vec<Line>,
    pub vertical_lines: Vec<Line>,
    pub shapes: Vec<Shape>,
}

/// Scans every `line_row_step`-th row for dark runs longer than `line_min_length × width`.
pub fn detect_design_elements(
    luma: &LuminanceMap<'_>,
    thresholds: &AnalyzerThresholds,
) -> DesignElements {
    let min_length = luma.width() as f32 * thresholds.line_min_length;
    let step = thresholds.line_row_step.max(1) as usize;
    let mut horizontal_lines = Vec::new();

    for y in (0..luma.height()).step_by(step) {
        let mut run_start: Option<u32> = None;

        for (x, &l) in (0u32..).zip(luma.row(y)) {
            match (l < thresholds.line_luminance, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(start)) => {
                    push_if_line(&mut horizontal_lines, start, x, y, min_length);
                    run_start = None;
                }
                _ => {}
            }
        }

        if let Some(start) = run_start {
            push_if_line(&mut horizontal_lines, start, luma.width(), y, min_length);
        }
    }

    DesignElements {
        horizontal_lines,
        ..Default::default()
    }
}

fn push_if_line(lines: &mut Vec<Line>, start: u32, end: u32, y: u32, min_length: f32) {
    let length = end - start;
    if length as f32 > min_length {
        lines.push(Line {
            x: start,
            y,
            length,
            thickness: 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::session::luminance_plane;
    use crate::raster::{PixelBuffer, Rgba};

    const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    fn detect(buf: &PixelBuffer) -> DesignElements {
        let plane = luminance_plane(buf);
        let luma = LuminanceMap::new(buf.width(), buf.height(), &plane);
        detect_design_elements(&luma, &AnalyzerThresholds::default())
    }

    #[test]
    fn test_single_divider_line() {
        let buf = PixelBuffer::from_fn(400, 100, |x, y| {
            if y == 50 && (20..380).contains(&x) {
                BLACK
            } else {
                WHITE
            }
        });
        let elements = detect(&buf);
        assert_eq!(
            elements.horizontal_lines,
            vec![Line {
                x: 20,
                y: 50,
                length: 360,
                thickness: 1
            }]
        );
        assert!(elements.vertical_lines.is_empty());
        assert!(elements.shapes.is_empty());
    }

    #[test]
    fn test_line_off_scan_rows_is_missed() {
        let buf = PixelBuffer::from_fn(400, 100, |_, y| if y == 52 { BLACK } else { WHITE });
        assert!(detect(&buf).horizontal_lines.is_empty());
    }

    #[test]
    fn test_short_runs_are_ignored() {
        // 40px of 400 = exactly 10%, not above it.
        let buf = PixelBuffer::from_fn(400, 20, |x, y| if y == 10 && x < 40 { BLACK } else { WHITE });
        assert!(detect(&buf).horizontal_lines.is_empty());
    }

    #[test]
    fn test_run_reaching_right_edge_is_closed() {
        let buf = PixelBuffer::from_fn(100, 10, |x, y| if y == 5 && x >= 50 { BLACK } else { WHITE });
        let lines = detect(&buf).horizontal_lines;
        assert_eq!(lines.len(), 1);
        assert_eq!((lines[0].x, lines[0].length), (50, 50));
    }

    #[test]
    fn test_mid_gray_is_not_dark() {
        let buf = PixelBuffer::from_fn(100, 10, |_, y| {
            if y == 0 {
                Rgba::opaque(210, 210, 210)
            } else {
                WHITE
            }
        });
        assert!(detect(&buf).horizontal_lines.is_empty());
    }

    #[test]
    fn test_thick_bar_reports_each_scanned_row() {
        let buf = PixelBuffer::from_fn(100, 30, |_, y| if (10..20).contains(&y) { BLACK } else { WHITE });
        let ys: Vec<u32> = detect(&buf).horizontal_lines.iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![10, 15]);
    }
}
