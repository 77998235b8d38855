use crate::constants::{COIN_POINTS, MAP_SIZE, POWER_PELLET_POINTS};
use crate::types::{CellType, GridInit};

const SIDE: usize = MAP_SIZE as usize;

// 0 empty, 1 coin, 2 power pellet, anything else is a wall piece.
#[rustfmt::skip]
pub const MAZE_TEMPLATE: [[u8; SIDE]; SIDE] = [
    [7, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 8, 7, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 8],
    [3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3],
    [3, 1, 7, 4, 8, 1, 7, 4, 4, 4, 8, 1, 3, 3, 1, 7, 4, 4, 4, 8, 1, 7, 4, 8, 1, 3],
    [3, 2, 3, 0, 3, 1, 3, 0, 0, 0, 3, 1, 3, 3, 1, 3, 0, 0, 0, 3, 1, 3, 0, 3, 2, 3],
    [3, 1, 5, 4, 6, 1, 5, 4, 4, 4, 6, 1, 5, 6, 1, 5, 4, 4, 4, 6, 1, 5, 4, 6, 1, 3],
    [3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3],
    [3, 1, 9, 4, 10, 1, 7, 8, 1, 9, 4, 4, 8, 7, 4, 4, 10, 1, 7, 8, 1, 9, 4, 10, 1, 3],
    [3, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1, 1, 3],
    [5, 4, 4, 4, 8, 1, 3, 5, 4, 4, 8, 1, 3, 3, 1, 7, 4, 4, 6, 3, 1, 7, 4, 4, 4, 6],
    [0, 0, 0, 0, 3, 1, 3, 7, 4, 4, 6, 1, 5, 6, 1, 5, 4, 4, 8, 3, 1, 3, 0, 0, 0, 0],
    [7, 4, 4, 4, 6, 1, 3, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 5, 4, 4, 4, 8],
    [3, 1, 1, 1, 1, 1, 5, 6, 1, 7, 4, 4, 4, 4, 4, 4, 8, 1, 5, 6, 1, 1, 1, 1, 1, 3],
    [5, 4, 4, 4, 8, 1, 1, 1, 1, 3, 0, 0, 0, 0, 0, 0, 3, 1, 1, 1, 1, 7, 4, 4, 4, 6],
    [0, 0, 0, 0, 3, 1, 7, 8, 1, 5, 4, 4, 4, 4, 4, 4, 6, 1, 7, 8, 1, 3, 0, 0, 0, 0],
    [7, 4, 4, 4, 6, 1, 3, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 5, 4, 4, 4, 8],
    [3, 1, 1, 1, 1, 1, 3, 3, 1, 7, 4, 4, 4, 4, 4, 4, 8, 1, 3, 3, 1, 1, 1, 1, 1, 3],
    [3, 1, 7, 4, 10, 1, 5, 6, 1, 5, 4, 4, 8, 7, 4, 4, 6, 1, 5, 6, 1, 9, 4, 8, 1, 3],
    [3, 1, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 1, 3],
    [3, 1, 5, 4, 4, 8, 1, 7, 4, 4, 8, 1, 3, 3, 1, 7, 4, 4, 8, 1, 7, 4, 4, 6, 1, 3],
    [3, 1, 1, 1, 1, 3, 1, 5, 4, 4, 6, 1, 5, 6, 1, 5, 4, 4, 6, 1, 3, 1, 1, 1, 1, 3],
    [5, 4, 4, 8, 1, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 1, 7, 4, 4, 6],
    [7, 4, 4, 6, 1, 11, 1, 7, 8, 1, 9, 4, 8, 7, 4, 10, 1, 7, 8, 1, 11, 1, 5, 4, 4, 8],
    [3, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1, 3, 3, 1, 1, 1, 3, 3, 1, 1, 1, 1, 1, 1, 3],
    [3, 2, 9, 4, 4, 4, 4, 6, 5, 4, 10, 1, 5, 6, 1, 9, 4, 6, 5, 4, 4, 4, 4, 10, 2, 3],
    [3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3],
    [5, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 6],
];

pub fn classify(code: u8) -> CellType {
    match code {
        0 => CellType::Empty,
        1 => CellType::Coin,
        2 => CellType::Power,
        _ => CellType::Obstacle,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pickup {
    pub points: i32,
    pub power_granted: bool,
}

#[derive(Clone, Debug)]
pub struct Grid {
    size: i32,
    cells: Vec<CellType>,
    remaining_collectibles: i32,
}

pub fn build_grid() -> Grid {
    Grid::from_codes(&MAZE_TEMPLATE)
}

impl Grid {
    pub fn from_codes<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        let mut remaining_collectibles = 0;
        for row in rows {
            let row = row.as_ref();
            for x in 0..size {
                let cell = row.get(x).copied().map(classify).unwrap_or(CellType::Obstacle);
                if cell.is_collectible() {
                    remaining_collectibles += 1;
                }
                cells.push(cell);
            }
        }
        Self {
            size: size as i32,
            cells,
            remaining_collectibles,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn remaining_collectibles(&self) -> i32 {
        self.remaining_collectibles
    }

    pub fn count_collectibles(&self) -> i32 {
        self.cells.iter().filter(|cell| cell.is_collectible()).count() as i32
    }

    pub fn wrap_x(&self, x: i32) -> i32 {
        if x < 0 {
            self.size - 1
        } else if x >= self.size {
            0
        } else {
            x
        }
    }

    pub fn clamp_coord(&self, value: i32) -> i32 {
        value.clamp(0, (self.size - 1).max(0))
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if self.size == 0 || y < 0 || y >= self.size {
            return None;
        }
        let x = x.rem_euclid(self.size);
        Some((y * self.size + x) as usize)
    }

    pub fn cell(&self, x: i32, y: i32) -> CellType {
        self.index_of(x, y)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or(CellType::Obstacle)
    }

    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == CellType::Obstacle
    }

    pub fn collect(&mut self, x: i32, y: i32) -> Pickup {
        let Some(idx) = self.index_of(x, y) else {
            return Pickup::default();
        };
        let pickup = match self.cells[idx] {
            CellType::Coin => Pickup {
                points: COIN_POINTS,
                power_granted: false,
            },
            CellType::Power => Pickup {
                points: POWER_PELLET_POINTS,
                power_granted: true,
            },
            CellType::Empty | CellType::Obstacle => return Pickup::default(),
        };
        self.cells[idx] = CellType::Empty;
        self.remaining_collectibles -= 1;
        pickup
    }

    pub fn tiles(&self) -> Vec<String> {
        self.cells
            .chunks(self.size.max(1) as usize)
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        CellType::Obstacle => '#',
                        CellType::Empty => ' ',
                        CellType::Coin => '.',
                        CellType::Power => 'o',
                    })
                    .collect::<String>()
            })
            .collect()
    }
}

pub fn to_grid_init(grid: &Grid) -> GridInit {
    GridInit {
        size: grid.size(),
        tiles: grid.tiles(),
        remaining_collectibles: grid.remaining_collectibles(),
    }
}

// `#` wall, space empty, `.` coin, `o` power pellet.
#[cfg(test)]
pub(crate) fn grid_from_layout(rows: &[&str]) -> Grid {
    let codes: Vec<Vec<u8>> = rows
        .iter()
        .map(|row| {
            row.chars()
                .map(|c| match c {
                    ' ' => 0,
                    '.' => 1,
                    'o' => 2,
                    _ => 3,
                })
                .collect()
        })
        .collect();
    Grid::from_codes(&codes)
}
