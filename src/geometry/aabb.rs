use num_traits::One;
use std::{
    borrow::Borrow,
    ops::{Add, Sub},
};

use nalgebra::{
    ClosedAddAssign, ClosedDivAssign, DefaultAllocator, DimName, OPoint, Point, Point2, Scalar,
    allocator::Allocator,
};

use super::WorldPoint;

#[derive(Clone, Copy, Debug)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }

    pub fn with_size<S>(min: Point, size: &S) -> AABB<Point>
    where
        for<'a> &'a Point: Add<&'a S, Output = Point>,
    {
        let max = &min + size;
        AABB { min, max }
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> AABB<Point2> {
        AABB {
            min: f(&self.min),
            max: f(&self.max),
        }
    }

    pub fn zip_map<Point2, Point3, F: FnMut(&Point, &Point2) -> Point3>(
        &self,
        rhs: &AABB<Point2>,
        mut f: F,
    ) -> AABB<Point3> {
        AABB {
            min: f(&self.min, &rhs.min),
            max: f(&self.max, &rhs.max),
        }
    }
}

impl<T: Scalar, D: DimName> AABB<OPoint<T, D>>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn map_coords<T2: Scalar, F: FnMut(T) -> T2>(&self, mut f: F) -> AABB<OPoint<T2, D>> {
        self.map(|x| x.map(&mut f))
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    pub fn size(&self) -> Point::Output {
        self.max - self.min
    }
}

impl<T: Scalar + Copy + Sub> AABB<Point2<T>> {
    pub fn width(&self) -> T::Output {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> T::Output {
        self.max[1] - self.min[1]
    }
}

impl AABB<Point2<u32>> {
    pub fn from_size(size: nalgebra::Vector2<u32>) -> Self {
        AABB::with_size(Point2::origin(), &size)
    }

    /// True if the box contains no pixels (max <= min on any axis).
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    pub fn area(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.width() * self.height()
        }
    }

    pub fn contains(&self, p: Point2<u32>) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

impl<T: Scalar + ClosedAddAssign + ClosedDivAssign + One, const D: usize> AABB<Point<T, D>> {
    pub fn center(&self) -> Point<T, D> {
        let two = T::one() + T::one();
        let avg_coords = (&self.min.coords + &self.max.coords) / two;
        Point::from(avg_coords)
    }
}

impl<Point> From<[Point; 2]> for AABB<Point> {
    fn from(value: [Point; 2]) -> Self {
        let [min, max] = value;
        AABB { min, max }
    }
}

impl<Point> From<(Point, Point)> for AABB<Point> {
    fn from(value: (Point, Point)) -> Self {
        let (min, max) = value;
        AABB { min, max }
    }
}

impl<T, D: DimName> AABB<OPoint<T, D>>
where
    DefaultAllocator: Allocator<D>,
    T: Scalar + nalgebra::SimdPartialOrd,
{
    pub fn intersect(&self, other: &AABB<OPoint<T, D>>) -> AABB<OPoint<T, D>> {
        AABB {
            min: self.min.sup(&other.min),
            max: self.max.inf(&other.max),
        }
    }

    pub fn union(&self, other: &AABB<OPoint<T, D>>) -> AABB<OPoint<T, D>> {
        AABB {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

impl AABB<WorldPoint> {
    pub fn empty() -> Self {
        AABB {
            min: WorldPoint::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: WorldPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn extend_point(&mut self, p: &WorldPoint) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn extend_points<I>(&mut self, points: I)
    where
        I: IntoIterator,
        I::Item: Borrow<WorldPoint>,
    {
        for p in points.into_iter() {
            self.extend_point(p.borrow());
        }
    }

    pub fn from_points<I>(points: I) -> Option<AABB<WorldPoint>>
    where
        I: IntoIterator,
        I::Item: Borrow<WorldPoint>,
    {
        let mut it = points.into_iter();
        let first = *it.next()?.borrow();

        let mut b = AABB::new(first, first);
        b.extend_points(it);

        Some(b)
    }

    pub fn volume(&self) -> f32 {
        self.size().product()
    }

    pub fn surface_area(&self) -> f32 {
        let size = self.size();

        2.0 * (size.x * (size.y + size.z) + size.y * size.z)
    }

    /// Clips this box so it doesn't extend past `plane_pos` on `axis` on the
    /// side given by `keep_greater` (true keeps the half-space `>= plane_pos`).
    pub fn clipped(&self, axis: usize, plane_pos: f32, keep_greater: bool) -> AABB<WorldPoint> {
        let mut result = *self;
        if keep_greater {
            result.min[axis] = result.min[axis].max(plane_pos);
        } else {
            result.max[axis] = result.max[axis].min(plane_pos);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn world_box_surface_area() {
        let b = AABB::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(2.0, 3.0, 4.0));
        // 2*(2*3 + 3*4 + 2*4) = 2*(6+12+8) = 52
        assert!((b.surface_area() - 52.0).abs() < 1e-5);
    }

    #[test]
    fn world_box_volume() {
        let b = AABB::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(2.0, 3.0, 4.0));
        assert!((b.volume() - 24.0).abs() < 1e-5);
    }

    #[test]
    fn screen_block_area_and_emptiness() {
        let b = AABB::from_size(nalgebra::Vector2::new(4u32, 3u32));
        assert!(b.area() == 12);
        assert!(!b.is_empty());
        assert!(b.contains(Point2::new(0, 0)));
        assert!(b.contains(Point2::new(3, 2)));
        assert!(!b.contains(Point2::new(4, 2)));

        let empty = AABB::new(Point2::new(2u32, 2u32), Point2::new(2u32, 5u32));
        assert!(empty.is_empty());
        assert!(empty.area() == 0);
    }
}
