use ordered_float::OrderedFloat;
use rand_distr::Distribution as _;
use std::iter::FusedIterator;
use std::num::NonZeroU32;

use crate::geometry::{AABB, ScreenBlock, ScreenPoint};

pub trait ScreenBlockExt {
    fn internal_points(&self) -> InternalPoints;
    fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock>;
}

impl ScreenBlockExt for ScreenBlock {
    /// Create an iterator over coordinates (x, y) pairs inside the block,
    /// in C order (x changes first, then y)
    fn internal_points(&self) -> InternalPoints {
        if self.is_empty() {
            InternalPoints::empty()
        } else {
            InternalPoints {
                min_x: self.min.x,
                max: self.max,

                cursor: self.min,
            }
        }
    }

    /// Create a vec sub blocks in a randomized order, starting in the middle of the block.
    /// Tiles are tile_size * tile_size large, except on the bottom and right side of the
    /// block, where they may be clipped if tile size doesn't evenly divide block size.
    /// This could be much simpler, but I like how the pattern looks when rendering :)
    fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock> {
        if self.is_empty() {
            return Vec::new();
        }

        let center = self.center().cast::<f32>();

        let (min_x, min_y) = (self.min.x, self.min.y);
        let (max_x, max_y) = (self.max.x, self.max.y);

        let x_iter = divide_range(min_x, max_x, tile_size); // We construct x_iter only for size_hint...
        let y_iter = divide_range(min_y, max_y, tile_size);

        let mut tiles = Vec::with_capacity(x_iter.size_hint().0 * y_iter.size_hint().0);

        let randomness_scale = center.coords.norm() * 0.1;
        let distribution = rand_distr::Exp::new(1.0 / randomness_scale.max(1e-3)).unwrap();

        for (tile_min_y, tile_max_y) in y_iter {
            for (tile_min_x, tile_max_x) in divide_range(min_x, max_x, tile_size) {
                let tile = AABB::new(
                    ScreenPoint::new(tile_min_x, tile_min_y),
                    ScreenPoint::new(tile_max_x, tile_max_y),
                );

                let to_center = center - tile.center().cast::<f32>();

                tiles.push((
                    tile,
                    OrderedFloat(
                        to_center.coords.norm() + distribution.sample(&mut rand::rng()),
                    ),
                ));
            }
        }

        tiles.sort_unstable_by_key(|(_tile, key)| *key);
        tiles.into_iter().map(|(tile, _key)| tile).collect()
    }
}

#[derive(Copy, Clone, Debug)]
pub struct InternalPoints {
    min_x: u32,
    max: ScreenPoint,

    cursor: ScreenPoint,
}

impl InternalPoints {
    // Construct an iterator over internal points that returns no points
    fn empty() -> Self {
        InternalPoints {
            min_x: 1,
            max: ScreenPoint::origin(),

            cursor: ScreenPoint::origin(),
        }
    }
}

impl Iterator for InternalPoints {
    type Item = ScreenPoint;

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.y >= self.max.y {
            return None;
        }

        let ret = self.cursor;

        debug_assert!(self.cursor.x < self.max.x);
        self.cursor.x += 1;
        if self.cursor.x >= self.max.x {
            self.cursor.x = self.min_x;
            self.cursor.y += 1;
        }

        Some(ret)
    }
}

impl ExactSizeIterator for InternalPoints {
    fn len(&self) -> usize {
        if self.cursor.y >= self.max.y {
            0
        } else {
            let whole_rows_height = self.max.y - (self.cursor.y + 1);
            let width = self.max.x - self.min_x;
            let whole_rows_area = whole_rows_height * width;
            let current_row_area = self.max.x - self.cursor.x;
            (whole_rows_area + current_row_area) as usize
        }
    }
}

impl FusedIterator for InternalPoints {}

fn divide_range(start: u32, end: u32, tile_size: NonZeroU32) -> impl Iterator<Item = (u32, u32)> {
    let tile_size = tile_size.get();
    let total = end - start;
    let full_tiles = total / tile_size;
    let n = full_tiles
        + if full_tiles * tile_size != total {
            1
        } else {
            0
        };

    (0..n).map(move |i| {
        let tile_start = start + i * tile_size;
        let tile_end = end.min(tile_start + tile_size);
        (tile_start, tile_end)
    })
}
