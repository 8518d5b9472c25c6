use std::fs;
use std::path::Path;

use image::RgbImage;
use log::{info, warn};

use super::DatasetError;

/// Connected regions smaller than this are treated as mask noise.
const MIN_REGION_AREA: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelmapEntry {
    pub name: String,
    pub color: [u8; 3],
    pub class: u32,
}

/// Parses a CVAT-style `labelmap.txt`: first line is a header, then
/// `name:r,g,b:...` rows. Rows without a full RGB triple are ignored, the
/// background row is excluded, and the remaining rows are numbered from zero
/// in file order.
pub fn parse_labelmap(text: &str) -> Vec<LabelmapEntry> {
    let mut entries = Vec::new();
    for line in text.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || !line.contains(':') {
            continue;
        }
        let mut parts = line.split(':');
        let name = parts.next().unwrap_or_default().trim();
        let Some(color_field) = parts.next() else {
            continue;
        };
        let color: Vec<u8> = color_field
            .split(',')
            .filter_map(|component| component.trim().parse().ok())
            .collect();
        if color.len() != 3 || name.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case("background") {
            continue;
        }
        entries.push(LabelmapEntry {
            name: name.to_string(),
            color: [color[0], color[1], color[2]],
            class: entries.len() as u32,
        });
    }
    entries
}

struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Grid {
    fn from_color(img: &RgbImage, color: [u8; 3]) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let cells = img.pixels().map(|pixel| pixel.0 == color).collect();
        Self {
            width,
            height,
            cells,
        }
    }

    fn at(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.cells[y as usize * self.width + x as usize]
    }
}

// Moore neighborhood, clockwise, starting west.
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

fn direction_index(dx: i64, dy: i64) -> usize {
    NEIGHBORS
        .iter()
        .position(|&delta| delta == (dx, dy))
        .unwrap_or(0)
}

/// From `current` with the given backtrack cell, the next boundary pixel is
/// the first filled Moore neighbor scanning clockwise after the backtrack.
/// Also reports the last background cell examined, which becomes the next
/// backtrack.
fn next_boundary_pixel(
    grid: &Grid,
    current: (i64, i64),
    backtrack: (i64, i64),
) -> Option<((i64, i64), (i64, i64))> {
    let bidx = direction_index(backtrack.0 - current.0, backtrack.1 - current.1);
    let mut last_empty = backtrack;
    for step in 1..=8 {
        let (dx, dy) = NEIGHBORS[(bidx + step) % 8];
        let candidate = (current.0 + dx, current.1 + dy);
        if grid.at(candidate.0, candidate.1) {
            return Some((candidate, last_empty));
        }
        last_empty = candidate;
    }
    None
}

/// Moore-neighbor boundary trace, clockwise. `start` must be the region's
/// top-most, left-most pixel so that its west neighbor is background. The
/// walk stops when it is about to repeat its first move.
fn trace_boundary(grid: &Grid, start: (i64, i64)) -> Vec<(i64, i64)> {
    let initial_backtrack = (start.0 - 1, start.1);
    let Some((first_next, mut backtrack)) = next_boundary_pixel(grid, start, initial_backtrack)
    else {
        return vec![start];
    };

    let mut boundary = vec![start, first_next];
    let mut current = first_next;
    // A closed boundary walk visits each pixel at most four times.
    let cap = 4 * grid.cells.len() + 8;
    while boundary.len() < cap {
        let Some((next, last_empty)) = next_boundary_pixel(grid, current, backtrack) else {
            break;
        };
        if current == start && next == first_next {
            break;
        }
        boundary.push(next);
        backtrack = last_empty;
        current = next;
    }
    if boundary.len() > 1 && boundary.last() == Some(&start) {
        boundary.pop();
    }
    boundary
}

/// Drops points that continue the previous unit step, leaving only the
/// vertices where the boundary changes direction.
fn simplify(points: &[(i64, i64)]) -> Vec<(i64, i64)> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];
        let incoming = (curr.0 - prev.0, curr.1 - prev.1);
        let outgoing = (next.0 - curr.0, next.1 - curr.1);
        if incoming != outgoing {
            out.push(curr);
        }
    }
    out
}

/// Exterior boundaries of all 8-connected regions in the grid, area-filtered
/// and reduced to direction-change vertices.
fn region_boundaries(grid: &Grid) -> Vec<Vec<(i64, i64)>> {
    let mut visited = vec![false; grid.cells.len()];
    let mut boundaries = Vec::new();

    for y in 0..grid.height as i64 {
        for x in 0..grid.width as i64 {
            let index = y as usize * grid.width + x as usize;
            if !grid.cells[index] || visited[index] {
                continue;
            }

            // Flood-fill the component to measure its area.
            let mut stack = vec![(x, y)];
            visited[index] = true;
            let mut area = 0usize;
            while let Some((cx, cy)) = stack.pop() {
                area += 1;
                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if grid.at(nx, ny) {
                        let nindex = ny as usize * grid.width + nx as usize;
                        if !visited[nindex] {
                            visited[nindex] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            if area < MIN_REGION_AREA {
                continue;
            }
            let boundary = simplify(&trace_boundary(grid, (x, y)));
            if boundary.len() >= 3 {
                boundaries.push(boundary);
            }
        }
    }
    boundaries
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MaskStats {
    pub files: usize,
    pub regions: usize,
}

/// Converts every PNG mask in `mask_dir` into a YOLO segmentation label file
/// in `output_dir`: one `class x1 y1 ... xn yn` line per traced region,
/// coordinates normalized to [0, 1]. A label file is written even when no
/// region survives filtering, mirroring the rest of the label tooling.
pub fn convert_masks(
    mask_dir: &Path,
    output_dir: &Path,
    labelmap_path: &Path,
) -> Result<MaskStats, DatasetError> {
    let labelmap_text = fs::read_to_string(labelmap_path)
        .map_err(|e| DatasetError::Io(labelmap_path.to_path_buf(), e))?;
    let labelmap = parse_labelmap(&labelmap_text);
    fs::create_dir_all(output_dir).map_err(|e| DatasetError::Io(output_dir.to_path_buf(), e))?;

    let mut stats = MaskStats::default();
    let entries =
        fs::read_dir(mask_dir).map_err(|e| DatasetError::Io(mask_dir.to_path_buf(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::Io(mask_dir.to_path_buf(), e))?;
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !path.is_file() || !is_png {
            continue;
        }

        let mask = match image::open(&path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("Failed to load mask {}: {e}", path.display());
                continue;
            }
        };
        let (width, height) = (mask.width() as f32, mask.height() as f32);

        let mut lines = String::new();
        for label in &labelmap {
            let grid = Grid::from_color(&mask, label.color);
            let boundaries = region_boundaries(&grid);
            if !boundaries.is_empty() {
                info!(
                    "{}: {} '{}' region(s)",
                    path.display(),
                    boundaries.len(),
                    label.name
                );
            }
            for boundary in boundaries {
                let mut line = label.class.to_string();
                for (px, py) in &boundary {
                    line.push_str(&format!(
                        " {:.6} {:.6}",
                        *px as f32 / width,
                        *py as f32 / height
                    ));
                }
                lines.push_str(&line);
                lines.push('\n');
                stats.regions += 1;
            }
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label_path = output_dir.join(format!("{stem}.txt"));
        fs::write(&label_path, lines).map_err(|e| DatasetError::Io(label_path.clone(), e))?;
        stats.files += 1;
    }

    Ok(stats)
}
