//! Layout segmentation
//!
//! Lists and grids in the statistics screens have an unknown number of
//! entries. Rows are found from the horizontal separators between them and
//! grid cells from the outlines of their equally sized frames.

use image::{GrayImage, Luma, RgbaImage};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use imageproc::point::Point;
use imageproc::rect::Rect;

use super::geometry::{crop, Region};
use super::preprocess::{detect_edges, EdgeThresholds};

/// Gaps between separators below this height are noise
pub const MIN_ROW_HEIGHT: u32 = 10;
/// Separators may rise or fall by this many pixels over their length
const MAX_LINE_DEVIATION: f32 = 2.0;
/// Separators span at least this share of the image width
const MIN_LINE_COVERAGE: f32 = 0.8;
/// Largest interruption of a separator, as share of the image width
const MAX_LINE_GAP: f32 = 0.15;
/// Minimum distance between two reported separators, in pixels and degrees
const LINE_SUPPRESSION_RADIUS: u32 = 2;

/// Y offsets of near-horizontal separators spanning most of the image width
///
/// `density` is the minimum share of the width a separator must cover on top
/// of the general coverage requirement.
pub fn find_horizontal_lines(image: &RgbaImage, density: f32) -> Vec<u32> {
    horizontal_lines_in(&detect_edges(image), density)
}

fn horizontal_lines_in(edges: &GrayImage, density: f32) -> Vec<u32> {
    let (width, height) = edges.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let options = LineDetectionOptions {
        vote_threshold: (width / 2).max(1),
        suppression_radius: LINE_SUPPRESSION_RADIUS,
    };
    let max_gap = (width as f32 * MAX_LINE_GAP) as u32;
    let min_length = width as f32 * MIN_LINE_COVERAGE;
    let wanted_length = width as f32 * density;

    let mut lines: Vec<u32> = detect_lines(edges, options)
        .iter()
        .filter_map(|line| horizontal_offset(line, width, height))
        .filter(|&y| {
            let length = longest_run(edges, y, max_gap) as f32;
            length > min_length && length >= wanted_length
        })
        .collect();

    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Row of a near-horizontal line at the image's horizontal center
fn horizontal_offset(line: &PolarLine, width: u32, height: u32) -> Option<u32> {
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    if sin.abs() < f32::EPSILON {
        return None;
    }

    // Vertical drift across the full width
    let drift = width as f32 * (cos / sin).abs();
    if drift > MAX_LINE_DEVIATION {
        return None;
    }

    let y = (line.r - 0.5 * width as f32 * cos) / sin;
    if y < 0.0 || y >= height as f32 {
        return None;
    }
    Some(y.round() as u32)
}

/// Longest run of edge pixels within one pixel of row `y`, bridging gaps of
/// up to `max_gap` pixels
fn longest_run(edges: &GrayImage, y: u32, max_gap: u32) -> u32 {
    let (width, height) = edges.dimensions();
    let rows = y.saturating_sub(1)..=(y + 1).min(height - 1);

    let mut longest = 0;
    let mut run: Option<(u32, u32)> = None;
    for x in 0..width {
        let on = rows.clone().any(|row| edges.get_pixel(x, row)[0] > 0);
        if !on {
            continue;
        }
        run = match run {
            Some((start, last)) if x - last - 1 <= max_gap => Some((start, x)),
            _ => Some((x, x)),
        };
        if let Some((start, last)) = run {
            longest = longest.max(last - start + 1);
        }
    }
    longest
}

/// Rows between consecutive separators as `(top, height)`
///
/// Gaps shorter than 90% of the median row height are spurious separators
/// and are merged into the following gap. A gap becomes a row when its
/// height lies within 10% of the median. The region after the last
/// separator is a row if it is nearly as tall as the rows above it.
pub fn row_spans(lines: &[u32], image_height: u32) -> Vec<(u32, u32)> {
    let mut spans = Vec::new();
    let Some(&last) = lines.last() else {
        return spans;
    };

    let mut heights = Vec::new();
    let mut prev = 0;
    for &line in lines {
        let height = line.saturating_sub(prev);
        if height > MIN_ROW_HEIGHT {
            heights.push(height);
        }
        prev = line;
    }
    if heights.is_empty() {
        return spans;
    }
    heights.sort_unstable();
    let median = heights[heights.len() / 2] as f32;
    let (lower, upper) = (0.9 * median, 1.1 * median);

    let mut prev = 0;
    let mut row_height = 0;
    let mut i = 0;
    while i < lines.len() {
        let mut height = lines[i].saturating_sub(prev);
        if height < MIN_ROW_HEIGHT {
            prev = lines[i];
            i += 1;
            continue;
        }

        let mut next = i;
        while height as f32 <= lower && next + 1 < lines.len() {
            next += 1;
            height = lines[next].saturating_sub(prev);
        }

        if height as f32 > lower && (height as f32) < upper {
            row_height = height;
            spans.push((prev, height));
        } else {
            next = i;
        }
        prev = lines[next];
        i = next + 1;
    }

    if row_height > 0 {
        let height = if last + row_height < image_height {
            row_height
        } else {
            image_height.saturating_sub(last)
        };
        if height > MIN_ROW_HEIGHT && height as f32 > 0.95 * row_height as f32 {
            spans.push((last, height));
        }
    }
    spans
}

/// Call `visit` with every row of a list of unknown length
pub fn iterate_rows(image: &RgbaImage, density: f32, mut visit: impl FnMut(&RgbaImage)) {
    let lines = find_horizontal_lines(image, density);
    for (top, height) in row_spans(&lines, image.height()) {
        let row = crop(image, Some(Region::new(0, top, image.width(), height)));
        visit(&row);
    }
}

/// Frames of about `target` size in a grid of unknown dimensions
///
/// Edges inside `ignore` are discarded. Contour fragments whose bounding
/// boxes overlap are merged into one shape before the size filter.
pub fn detect_boxes(
    image: &RgbaImage,
    target: (u32, u32),
    ignore: Option<Region>,
    tolerance: f32,
    thresholds: EdgeThresholds,
) -> Vec<Region> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut edges = canny(&image::imageops::grayscale(image), thresholds.low, thresholds.high);
    if let Some(region) = ignore.filter(|r| !r.is_empty()) {
        draw_filled_rect_mut(
            &mut edges,
            Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height),
            Luma([0]),
        );
    }

    let min = (
        (target.0 as f32 * (1.0 - tolerance)) as u32,
        (target.1 as f32 * (1.0 - tolerance)) as u32,
    );
    let max = (
        (target.0 as f32 * (1.0 + tolerance)) as u32,
        (target.1 as f32 * (1.0 + tolerance)) as u32,
    );

    let shapes = find_contours::<i32>(&edges).into_iter().map(|c| c.points);
    merge_overlapping(shapes, min)
        .into_iter()
        .filter(|b| (min.0..=max.0).contains(&b.width) && (min.1..=max.1).contains(&b.height))
        .collect()
}

struct Shape {
    bounds: Region,
    points: Vec<Point<i32>>,
}

/// Merge point sets whose bounding boxes overlap, in one pass
///
/// Shapes smaller than half of `min_size` in both directions are dropped.
/// Each shape joins the first earlier shape it overlaps, so a fragment
/// bridging two shapes that were already apart only joins one of them.
pub fn merge_overlapping(
    shapes: impl IntoIterator<Item = Vec<Point<i32>>>,
    min_size: (u32, u32),
) -> Vec<Region> {
    let mut merged: Vec<Shape> = Vec::new();

    for points in shapes {
        let Some(bounds) = Region::bounding(&points) else {
            continue;
        };
        if bounds.height as f32 <= 0.5 * min_size.1 as f32
            && bounds.width as f32 <= 0.5 * min_size.0 as f32
        {
            continue;
        }

        match merged.iter_mut().find(|shape| shape.bounds.intersects(&bounds)) {
            Some(shape) => {
                shape.points.extend(points);
                shape.bounds = Region::bounding(&shape.points).unwrap_or(shape.bounds);
            }
            None => merged.push(Shape { bounds, points }),
        }
    }

    merged.into_iter().map(|shape| shape.bounds).collect()
}

/// Sort grid cells row by row. Cells whose tops differ by at most
/// `row_tolerance` pixels belong to the same row.
pub fn reading_order(mut boxes: Vec<Region>, row_tolerance: u32) -> Vec<Region> {
    boxes.sort_by_key(|b| (b.y, b.x));

    let mut rows: Vec<Vec<Region>> = Vec::new();
    for b in boxes {
        match rows.last_mut() {
            Some(row) if b.y <= row[0].y + row_tolerance => row.push(b),
            _ => rows.push(vec![b]),
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by_key(|b| b.x);
            row
        })
        .collect()
}
