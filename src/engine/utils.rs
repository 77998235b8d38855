use crate::types::Direction;

pub fn manhattan(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    (ax - bx).abs() + (ay - by).abs()
}

pub(super) fn offset(x: i32, y: i32, dir: Direction) -> (i32, i32) {
    let (dx, dy) = dir.delta();
    (x + dx, y + dy)
}
