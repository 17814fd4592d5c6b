use crate::models::Rectangle;

/// Drop every rectangle that lies inside another one, edges included.
///
/// Glyph holes (the loops of an 8 or a 0) give a second box nested in the
/// stroke's box; only the outer one is a usable glyph. Among identical
/// rectangles the first one survives. Input order is preserved.
pub fn eliminate_nested(rects: &[Rectangle]) -> Vec<Rectangle> {
    if rects.len() < 2 {
        return rects.to_vec();
    }

    rects
        .iter()
        .enumerate()
        .filter(|&(i, inner)| {
            !rects.iter().enumerate().any(|(j, outer)| {
                j != i && outer.contains(inner) && (outer != inner || j < i)
            })
        })
        .map(|(_, r)| *r)
        .collect()
}
