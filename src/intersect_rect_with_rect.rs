use nalgebra::Vector2;

/// Closed intervals, so rectangles sharing an edge tile overlap.
pub fn intersect_interval(min0: i32, max0: i32, min1: i32, max1: i32) -> bool {
    min0.max(min1) <= max0.min(max1)
}

pub fn intersect_rect_with_rect(
    rect0: (&Vector2<i32>, &Vector2<i32>),
    rect1: (&Vector2<i32>, &Vector2<i32>),
) -> bool {
    intersect_interval(rect0.0.x, rect0.1.x, rect1.0.x, rect1.1.x)
        && intersect_interval(rect0.0.y, rect0.1.y, rect1.0.y, rect1.1.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_overlap() {
        let a = (Vector2::new(0, 0), Vector2::new(4, 4));
        let b = (Vector2::new(4, 2), Vector2::new(8, 6));
        let c = (Vector2::new(5, 0), Vector2::new(8, 4));
        assert!(intersect_rect_with_rect((&a.0, &a.1), (&b.0, &b.1)));
        assert!(!intersect_rect_with_rect((&a.0, &a.1), (&c.0, &c.1)));
        assert!(intersect_rect_with_rect((&b.0, &b.1), (&c.0, &c.1)));
    }

    #[test]
    fn separated_on_one_axis_is_enough() {
        assert!(!intersect_interval(0, 3, 4, 9));
        assert!(intersect_interval(0, 3, 3, 9));
        let a = (Vector2::new(0, 0), Vector2::new(10, 2));
        let b = (Vector2::new(2, 3), Vector2::new(4, 8));
        assert!(!intersect_rect_with_rect((&a.0, &a.1), (&b.0, &b.1)));
    }
}
