//! Electrode layouts of common recording devices.

use ndarray::{Array2, Array3, Axis};

use crate::types::*;

/// Default square layout for `num_electrodes` channels.
///
/// The origin is the bottom-right cell and numbers grow bottom to top, then
/// right to left. For 16 electrodes:
///
/// ```text
/// [[15, 11,  7,  3],
///  [14, 10,  6,  2],
///  [13,  9,  5,  1],
///  [12,  8,  4,  0]]
/// ```
///
/// Returns `None` when `num_electrodes` is not a perfect square.
pub fn default_layout(num_electrodes: usize) -> Option<Array2<usize>> {
    let size = (num_electrodes as f64).sqrt() as usize;
    if size * size != num_electrodes {
        return None;
    }
    let last = num_electrodes.saturating_sub(1);
    Some(Array2::from_shape_fn((size, size), |(row, col)| {
        last - size * col - row
    }))
}

/// Orientation of an ECoG grid relative to its stored map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `R`: the map as stored
    AsStored,
    /// `S`: columns mirrored left to right
    Mirrored,
}

impl Orientation {
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'R' => Ok(Orientation::AsStored),
            'S' => Ok(Orientation::Mirrored),
            other => Err(HtkError::invalid_argument(format!(
                "orientation must be 'R' or 'S', got '{}'",
                other
            ))),
        }
    }
}

/// Cell-to-electrode map of a device plus optional spatial positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectrodeLayout {
    /// 0-based electrode index per cell; `None` for empty cells
    pub indices: Array2<Option<usize>>,
    /// Position per cell as `[row, col, (y, x)]`
    pub positions: Option<Array3<f64>>,
}

const GRID_64: [[usize; 8]; 8] = [
    [15, 13, 11, 9, 7, 5, 3, 1],
    [16, 14, 12, 10, 8, 6, 4, 2],
    [32, 30, 28, 26, 24, 22, 20, 18],
    [31, 29, 27, 25, 23, 21, 19, 17],
    [47, 45, 43, 41, 39, 37, 35, 33],
    [48, 46, 44, 42, 40, 38, 36, 34],
    [64, 62, 60, 58, 56, 54, 52, 50],
    [63, 61, 59, 57, 55, 53, 51, 49],
];

const GRID_128: [[usize; 8]; 16] = [
    [47, 48, 64, 63, 65, 66, 82, 81],
    [45, 46, 62, 61, 67, 68, 84, 83],
    [43, 44, 60, 59, 69, 70, 86, 85],
    [41, 42, 58, 57, 71, 72, 88, 87],
    [39, 40, 56, 55, 73, 74, 90, 89],
    [37, 38, 54, 53, 75, 76, 92, 91],
    [35, 36, 52, 51, 77, 78, 94, 93],
    [33, 34, 50, 49, 79, 80, 96, 95],
    [31, 29, 27, 25, 103, 101, 99, 97],
    [23, 21, 19, 17, 111, 109, 107, 105],
    [32, 30, 28, 26, 104, 102, 100, 98],
    [24, 22, 20, 18, 112, 110, 108, 106],
    [16, 14, 12, 10, 120, 118, 116, 114],
    [8, 6, 4, 2, 128, 126, 124, 122],
    [15, 13, 11, 9, 119, 117, 115, 113],
    [7, 5, 3, 1, 127, 125, 123, 121],
];

// 0 marks an empty cell
const POLYTRODE_2: [[usize; 2]; 16] = [
    [20, 18],
    [16, 14],
    [12, 10],
    [8, 6],
    [4, 2],
    [22, 24],
    [26, 28],
    [30, 32],
    [31, 29],
    [27, 25],
    [23, 21],
    [1, 3],
    [5, 7],
    [9, 11],
    [13, 15],
    [17, 19],
];

const POLYTRODE_3: [[usize; 3]; 12] = [
    [0, 17, 0],
    [10, 16, 23],
    [9, 18, 24],
    [8, 15, 25],
    [7, 19, 26],
    [6, 14, 27],
    [5, 20, 28],
    [4, 13, 29],
    [3, 21, 30],
    [2, 12, 31],
    [1, 22, 32],
    [0, 11, 0],
];

/// Layout of a 64- or 128-electrode ECoG grid.
///
/// Positions place cell `(row, col)` at `(col * y_spacing, row * x_spacing)`.
pub fn grid(
    orientation: Orientation,
    num_electrodes: usize,
    x_spacing: f64,
    y_spacing: f64,
) -> Result<ElectrodeLayout> {
    let mut indices = match num_electrodes {
        64 => from_one_based(&GRID_64[..]),
        128 => from_one_based(&GRID_128[..]),
        other => {
            return Err(HtkError::invalid_argument(format!(
                "grid must have 64 or 128 electrodes, got {}",
                other
            )))
        }
    };
    if orientation == Orientation::Mirrored {
        indices.invert_axis(Axis(1));
    }

    let (rows, cols) = indices.dim();
    let positions = Array3::from_shape_fn((rows, cols, 2), |(row, col, axis)| {
        if axis == 0 {
            col as f64 * y_spacing
        } else {
            row as f64 * x_spacing
        }
    });

    Ok(ElectrodeLayout {
        indices,
        positions: Some(positions),
    })
}

/// Layout of a 2- or 3-column polytrode. No positions are known.
pub fn polytrode(num_columns: usize) -> Result<ElectrodeLayout> {
    let indices = match num_columns {
        2 => from_one_based(&POLYTRODE_2[..]),
        3 => from_one_based(&POLYTRODE_3[..]),
        other => {
            return Err(HtkError::invalid_argument(format!(
                "polytrode must have 2 or 3 columns, got {}",
                other
            )))
        }
    };
    Ok(ElectrodeLayout {
        indices,
        positions: None,
    })
}

/// Location of the polytrode relative to the ECoG grid.
///
/// Returns the `(row, col)` index location and the matching spatial location.
pub fn polytrode_position_in_grid(x_spacing: f64, y_spacing: f64) -> ([f64; 2], [f64; 2]) {
    let index_location = [7.0, 0.5];
    let spatial_location = [index_location[0] * y_spacing, index_location[1] * x_spacing];
    (index_location, spatial_location)
}

fn from_one_based<const C: usize>(rows: &[[usize; C]]) -> Array2<Option<usize>> {
    Array2::from_shape_fn((rows.len(), C), |(row, col)| {
        rows[row][col].checked_sub(1)
    })
}
