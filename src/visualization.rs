use crate::error::RbmError;
use image::{GrayImage, Luma};
use ndarray::Array1;
use std::path::Path;

const WHITE: Luma<u8> = Luma([255]);

/// Lays sampled visible states out as a grid of square-pixel tiles.
///
/// Each sample becomes one tile. Unit `i` of a sample is drawn at column
/// `i % tile_width` and row `i / tile_width` inside its tile, as a
/// `pixel_size x pixel_size` square: white when the unit is on, black when it is off.
/// Tiles are filled left to right, then top to bottom; unused tiles stay black.
///
/// # Fields
///
/// - `columns` - Number of tiles per image row
/// - `rows` - Number of tile rows
/// - `tile_width` - Units per tile row (28 for MNIST digits)
/// - `pixel_size` - Side length in pixels of the square drawn for one unit
///
/// # Examples
/// ```rust
/// use rustyrbm::visualization::SampleGrid;
/// use ndarray::array;
///
/// let grid = SampleGrid::new(2, 1, 2, 3).unwrap();
/// let samples = vec![array![true, false, false, true], array![false, false, false, false]];
/// let image = grid.render(&samples).unwrap();
///
/// assert_eq!(image.dimensions(), (12, 6));
/// assert_eq!(image.get_pixel(0, 0).0, [255]);
/// assert_eq!(image.get_pixel(3, 0).0, [0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGrid {
    columns: usize,
    rows: usize,
    tile_width: usize,
    pixel_size: usize,
}

impl Default for SampleGrid {
    /// A 10 x 10 grid of 28-unit-wide tiles drawn with 5-pixel squares.
    fn default() -> Self {
        SampleGrid {
            columns: 10,
            rows: 10,
            tile_width: 28,
            pixel_size: 5,
        }
    }
}

impl SampleGrid {
    /// Creates a grid layout.
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If any dimension is 0
    pub fn new(
        columns: usize,
        rows: usize,
        tile_width: usize,
        pixel_size: usize,
    ) -> Result<Self, RbmError> {
        if columns == 0 || rows == 0 || tile_width == 0 || pixel_size == 0 {
            return Err(RbmError::InvalidInput(format!(
                "Grid dimensions must be greater than 0, got columns={}, rows={}, tile_width={}, pixel_size={}",
                columns, rows, tile_width, pixel_size
            )));
        }

        Ok(SampleGrid {
            columns,
            rows,
            tile_width,
            pixel_size,
        })
    }

    get_field!(get_columns, columns, usize);
    get_field!(get_rows, rows, usize);
    get_field!(get_tile_width, tile_width, usize);
    get_field!(get_pixel_size, pixel_size, usize);

    /// Number of tiles in the grid.
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// Renders the samples into a grayscale image.
    ///
    /// # Parameters
    ///
    /// - `samples` - Visible states, all of the same length
    ///
    /// # Returns
    ///
    /// - `Ok(GrayImage)` - The rendered grid
    /// - `Err(RbmError::InvalidInput)` - If there are no samples, more samples than tiles,
    ///   samples of different lengths, or the image would be too large
    pub fn render(&self, samples: &[Array1<bool>]) -> Result<GrayImage, RbmError> {
        let n_units = match samples.first() {
            Some(sample) => sample.len(),
            None => {
                return Err(RbmError::InvalidInput(
                    "No samples to render".to_string(),
                ));
            }
        };

        if samples.len() > self.capacity() {
            return Err(RbmError::InvalidInput(format!(
                "{} samples do not fit in a {}x{} grid",
                samples.len(),
                self.columns,
                self.rows
            )));
        }

        if let Some(bad) = samples.iter().position(|s| s.len() != n_units) {
            return Err(RbmError::InvalidInput(format!(
                "Sample {} has {} units, expected {}",
                bad,
                samples[bad].len(),
                n_units
            )));
        }

        let tile_height = n_units.div_ceil(self.tile_width).max(1);
        let width = to_pixels(self.columns * self.tile_width * self.pixel_size)?;
        let height = to_pixels(self.rows * tile_height * self.pixel_size)?;

        let mut image = GrayImage::new(width, height);

        for (idx, sample) in samples.iter().enumerate() {
            let tile_x = (idx % self.columns) * self.tile_width;
            let tile_y = (idx / self.columns) * tile_height;

            for (unit, _) in sample.iter().enumerate().filter(|(_, on)| **on) {
                let x = (tile_x + unit % self.tile_width) * self.pixel_size;
                let y = (tile_y + unit / self.tile_width) * self.pixel_size;
                self.fill_square(&mut image, x, y);
            }
        }

        Ok(image)
    }

    /// Renders the samples and writes the image; the format follows the file extension.
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - See [`SampleGrid::render`]
    /// - `RbmError::Image` - If the image cannot be encoded or written
    pub fn save<P: AsRef<Path>>(&self, samples: &[Array1<bool>], path: P) -> Result<(), RbmError> {
        let path = path.as_ref();
        let image = self.render(samples)?;
        image.save(path)?;

        tracing::info!(
            path = %path.display(),
            samples = samples.len(),
            width = image.width(),
            height = image.height(),
            "Sample grid written"
        );
        Ok(())
    }

    // Coordinates were range-checked by `to_pixels` on the full image size
    fn fill_square(&self, image: &mut GrayImage, x: usize, y: usize) {
        for dy in 0..self.pixel_size {
            for dx in 0..self.pixel_size {
                image.put_pixel((x + dx) as u32, (y + dy) as u32, WHITE);
            }
        }
    }
}

fn to_pixels(extent: usize) -> Result<u32, RbmError> {
    u32::try_from(extent).map_err(|_| {
        RbmError::InvalidInput(format!("Image extent of {} pixels is too large", extent))
    })
}
