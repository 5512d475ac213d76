use nalgebra::{point, Matrix4, Point3, Vector3};

use super::Ray;

/// Axis aligned box, world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    pub lower: Point3<f32>,
    pub upper: Point3<f32>,
}

impl BoundBox {
    pub fn new(lower: Point3<f32>, upper: Point3<f32>) -> BoundBox {
        BoundBox { lower, upper }
    }

    /// Zero sized boundbox
    ///
    /// For testing purposes, where bound box is irrelevant
    pub fn empty() -> BoundBox {
        BoundBox {
            lower: point![0.0, 0.0, 0.0],
            upper: point![0.0, 0.0, 0.0],
        }
    }

    pub fn from_position_dims(position: Point3<f32>, dimensions: Vector3<f32>) -> BoundBox {
        BoundBox {
            lower: position,
            upper: position + dimensions,
        }
    }

    /// Smallest box containing all `points`, `None` for no points
    pub fn from_points<'a, I>(points: I) -> Option<BoundBox>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = BoundBox::new(first, first);
        for p in iter {
            bbox.add_point(p);
        }
        Some(bbox)
    }

    pub fn add_point(&mut self, p: &Point3<f32>) {
        self.lower = self.lower.inf(p);
        self.upper = self.upper.sup(p);
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundBox) -> BoundBox {
        BoundBox {
            lower: self.lower.inf(&other.lower),
            upper: self.upper.sup(&other.upper),
        }
    }

    pub fn position(&self) -> Point3<f32> {
        self.lower
    }

    pub fn dims(&self) -> Vector3<f32> {
        self.upper - self.lower
    }

    pub fn center(&self) -> Point3<f32> {
        self.lower + 0.5 * self.dims()
    }

    pub fn diagonal(&self) -> f32 {
        self.dims().magnitude()
    }

    /// Bounding box of this box after applying `matrix` to its corners
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> BoundBox {
        let mut corners = self.into_iter().map(|p| matrix.transform_point(&p));
        // a box always has 8 corners
        let first = corners.next().unwrap_or(self.lower);
        let mut bbox = BoundBox::new(first, first);
        for p in corners {
            bbox.add_point(&p);
        }
        bbox
    }

    pub fn is_in(&self, pos: &Point3<f32>) -> bool {
        self.upper.x > pos.x
            && self.upper.y > pos.y
            && self.upper.z > pos.z
            && pos.x > self.lower.x
            && pos.y > self.lower.y
            && pos.z > self.lower.z
    }

    /// `other` lies inside this box, touching faces included
    pub fn contains_box(&self, other: &BoundBox) -> bool {
        let inside = |p: &Point3<f32>| {
            (0..3).all(|i| self.lower[i] <= p[i] && p[i] <= self.upper[i])
        };
        inside(&other.lower) && inside(&other.upper)
    }

    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        // Source: An Efficient and Robust Ray–Box Intersection Algorithm. Amy Williams et al. 2004.
        // http://citeseerx.ist.psu.edu/viewdoc/summary?doi=10.1.1.64.7663

        // t value of intersection with the 6 planes of a bounding box
        let t0 = (self.lower - ray.origin).component_div(&ray.direction);
        let t1 = (self.upper - ray.origin).component_div(&ray.direction);

        // [ (min,max) , (min,max) , (min,max) ]
        let t_minmax = t0.zip_map(&t1, |t0, t1| if t0 < t1 { (t0, t1) } else { (t1, t0) });

        let tmin = f32::max(f32::max(t_minmax.x.0, t_minmax.y.0), t_minmax.z.0);
        let tmax = f32::min(f32::min(t_minmax.x.1, t_minmax.y.1), t_minmax.z.1);

        // if tmax < 0, ray is intersecting AABB, but the whole AABB is behind us
        if tmax.is_sign_negative() {
            return None;
        }

        // if tmin > tmax, ray doesn't intersect AABB
        if tmin > tmax {
            return None;
        }

        Some((tmin.max(0.0), tmax))
    }
}

pub struct BoundBoxIterator {
    pub lower: Point3<f32>,
    pub upper: Point3<f32>,
    state: u8,
}

impl Iterator for BoundBoxIterator {
    type Item = Point3<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        let p = match self.state {
            0 => self.lower,
            1 => point![self.upper.x, self.lower.y, self.lower.z],
            2 => point![self.upper.x, self.upper.y, self.lower.z],
            3 => point![self.lower.x, self.upper.y, self.lower.z],
            4 => point![self.lower.x, self.lower.y, self.upper.z],
            5 => point![self.upper.x, self.lower.y, self.upper.z],
            6 => self.upper,
            7 => point![self.lower.x, self.upper.y, self.upper.z],
            _ => return None,
        };
        self.state += 1;
        Some(p)
    }
}

impl IntoIterator for BoundBox {
    type Item = Point3<f32>;

    type IntoIter = BoundBoxIterator;

    fn into_iter(self) -> Self::IntoIter {
        BoundBoxIterator {
            lower: self.lower,
            upper: self.upper,
            state: 0,
        }
    }
}

impl IntoIterator for &BoundBox {
    type Item = Point3<f32>;

    type IntoIter = BoundBoxIterator;

    fn into_iter(self) -> Self::IntoIter {
        (*self).into_iter()
    }
}

#[cfg(test)]
mod test {
    use nalgebra::vector;

    use super::*;

    #[test]
    fn intersect_works() {
        let bbox = BoundBox::new(point![0.0, 0.0, 0.0], point![1.0, 1.0, 1.0]);
        let ray = Ray::new(point![-1.0, -1.0, 0.0], vector![1.0, 1.0, 1.0]);
        let inter = bbox.intersect(&ray);
        assert!(inter.is_some());
    }

    #[test]
    fn not_intersecting() {
        let bbox = BoundBox::new(point![0.0, 0.0, 0.0], point![1.0, 1.0, 1.0]);
        let ray = Ray::new(point![200.0, 200.0, 200.0], vector![1.0, 0.0, 0.0]);
        assert!(bbox.intersect(&ray).is_none());
    }

    #[test]
    fn origin_inside_clamps_entry() {
        let bbox = BoundBox::new(point![0.0, 0.0, 0.0], point![2.0, 2.0, 2.0]);
        let ray = Ray::new(point![1.0, 1.0, 1.0], vector![1.0, 0.0, 0.0]);
        let (t0, t1) = bbox.intersect(&ray).unwrap();
        assert_eq!(t0, 0.0);
        assert!((t1 - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn union_and_center() {
        let a = BoundBox::new(point![0.0, 0.0, 0.0], point![1.0, 1.0, 1.0]);
        let b = BoundBox::new(point![-1.0, 0.5, 0.5], point![0.5, 3.0, 0.5]);
        let u = a.union(&b);
        assert_eq!(u.lower, point![-1.0, 0.0, 0.0]);
        assert_eq!(u.upper, point![1.0, 3.0, 1.0]);
        assert_eq!(u.center(), point![0.0, 1.5, 0.5]);
        assert!(u.contains_box(&a));
        assert!(u.contains_box(&b));
        assert!(!a.contains_box(&u));
    }

    #[test]
    fn from_points() {
        assert!(BoundBox::from_points(&[]).is_none());

        let pts = [point![1.0, 2.0, 3.0], point![-1.0, 5.0, 0.0]];
        let bbox = BoundBox::from_points(&pts).unwrap();
        assert_eq!(bbox.lower, point![-1.0, 2.0, 0.0]);
        assert_eq!(bbox.upper, point![1.0, 5.0, 3.0]);
    }

    #[test]
    fn transformed_by_translation() {
        let bbox = BoundBox::new(point![0.0, 0.0, 0.0], point![1.0, 1.0, 1.0]);
        let m = Matrix4::new_translation(&vector![10.0, 0.0, -2.0]);
        let moved = bbox.transformed(&m);
        assert_eq!(moved.lower, point![10.0, 0.0, -2.0]);
        assert_eq!(moved.upper, point![11.0, 1.0, -1.0]);
    }
}
