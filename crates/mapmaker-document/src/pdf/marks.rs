// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Registration marks — short strokes drawn around a printed tile so that
// neighbouring sheets can be trimmed and lined up.
//
// Solid ticks mark the corners of the printed image. Dashed ticks mark where
// the next sheet's image begins, i.e. the inner edge of the overlap strip.
// All coordinates are millimetres from the top-left corner of the sheet.

use serde::Serialize;

use crate::layout::{LayoutPlan, Tile};

/// Distance from the marked point to the far end of a tick, mm.
pub const TICK_LENGTH_MM: f64 = 5.0;
/// Gap left between the marked point and the near end of a tick, mm.
pub const TICK_GAP_MM: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickStyle {
    Solid,
    Dashed,
}

/// Direction a tick points away from its mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// One straight stroke, in sheet millimetres from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub style: TickStyle,
}

/// Strokes leaving `(x, y)` in each of `directions`.
///
/// Each stroke starts [`TICK_GAP_MM`] from the point and ends
/// [`TICK_LENGTH_MM`] from it, or at the sheet edge when the point is no
/// further than that from the edge.
pub fn tick(
    (x, y): (f64, f64),
    directions: &[Direction],
    style: TickStyle,
    (page_width, page_height): (f64, f64),
) -> Vec<Tick> {
    directions
        .iter()
        .map(|direction| {
            let (from, to) = match direction {
                Direction::West => {
                    let end = if x <= TICK_LENGTH_MM { 0.0 } else { x - TICK_LENGTH_MM };
                    ((x - TICK_GAP_MM, y), (end, y))
                }
                Direction::East => {
                    let end = if page_width - x <= TICK_LENGTH_MM {
                        page_width
                    } else {
                        x + TICK_LENGTH_MM
                    };
                    ((x + TICK_GAP_MM, y), (end, y))
                }
                Direction::North => {
                    let end = if y <= TICK_LENGTH_MM { 0.0 } else { y - TICK_LENGTH_MM };
                    ((x, y - TICK_GAP_MM), (x, end))
                }
                Direction::South => {
                    let end = if page_height - y <= TICK_LENGTH_MM {
                        page_height
                    } else {
                        y + TICK_LENGTH_MM
                    };
                    ((x, y + TICK_GAP_MM), (x, end))
                }
            };
            Tick { from, to, style }
        })
        .collect()
}

/// Marks for the sheet that prints `tile` of `plan`.
pub fn tile_marks(plan: &LayoutPlan, tile: &Tile) -> Vec<Tick> {
    use Direction::{East, North, South, West};

    let page = plan.page_size_mm();
    let west = plan.border.west;
    let north = plan.border.north;
    let width = f64::from(tile.rect.width) / plan.pixels_per_mm;
    let height = f64::from(tile.rect.height) / plan.pixels_per_mm;

    let mut ticks = Vec::with_capacity(12);
    ticks.extend(tick((west, north), &[North, West], TickStyle::Solid, page));
    ticks.extend(tick((west, north + height), &[South, West], TickStyle::Solid, page));
    ticks.extend(tick((west + width, north + height), &[East, South], TickStyle::Solid, page));
    ticks.extend(tick((west + width, north), &[East, North], TickStyle::Solid, page));

    if !plan.is_last_column(tile.page_x) {
        let x = west + plan.page_width_mm;
        ticks.extend(tick((x, north + height), &[South], TickStyle::Dashed, page));
        ticks.extend(tick((x, north), &[North], TickStyle::Dashed, page));
    }

    if !plan.is_last_row(tile.page_y) {
        let y = north + plan.page_height_mm;
        ticks.extend(tick((west, y), &[West], TickStyle::Dashed, page));
        ticks.extend(tick((west + width, y), &[East], TickStyle::Dashed, page));
    }

    ticks
}
