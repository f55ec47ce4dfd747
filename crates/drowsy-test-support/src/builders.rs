//! Synthetic images, landmark sets and dataset directories for testing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use drowsy_core::domain::{Landmarks, Point, DROWSY_LABEL, LANDMARK_COUNT, NON_DROWSY_LABEL};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use tempfile::TempDir;

/// Builder for synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates a uniform gray RGB image.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    /// Creates a uniform RGB image.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([r, g, b])))
    }

    /// Creates a black/white checkerboard.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let cell = cell_size.max(1);
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }
}

/// Builds 68-point landmark sets with known feature ratios.
///
/// Both eyes are 20 px wide, so EAR = `eye_height / 20`. The mouth is 40 px
/// wide, so MOR = `mouth_height / 40`. Nose top, tip and chin are fixed,
/// giving NLR = 20 / 50 = 0.4.
#[derive(Debug, Clone)]
pub struct LandmarkBuilder {
    eye_height: i32,
    mouth_height: i32,
}

impl Default for LandmarkBuilder {
    fn default() -> Self {
        Self {
            eye_height: 8,
            mouth_height: 4,
        }
    }
}

impl LandmarkBuilder {
    /// Open eyes (EAR 0.4) and a nearly closed mouth (MOR 0.1).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vertical eye opening in pixels.
    #[must_use]
    pub const fn eye_height(mut self, height: i32) -> Self {
        self.eye_height = height;
        self
    }

    /// Sets the vertical mouth opening in pixels.
    #[must_use]
    pub const fn mouth_height(mut self, height: i32) -> Self {
        self.mouth_height = height;
        self
    }

    /// Closed eyes and a wide open mouth.
    #[must_use]
    pub fn drowsy() -> Self {
        Self::new().eye_height(0).mouth_height(30)
    }

    /// Builds the landmark set.
    #[must_use]
    pub fn build(&self) -> Landmarks {
        let mut points = [Point::new(64, 64); LANDMARK_COUNT];

        let half = self.eye_height / 2;
        let rest = self.eye_height - half;
        for (start, x0) in [(36, 30), (42, 78)] {
            let eye = [
                Point::new(x0, 40),
                Point::new(x0 + 7, 40 - half),
                Point::new(x0 + 13, 40 - half),
                Point::new(x0 + 20, 40),
                Point::new(x0 + 13, 40 + rest),
                Point::new(x0 + 7, 40 + rest),
            ];
            points[start..start + 6].copy_from_slice(&eye);
        }

        let half = self.mouth_height / 2;
        let rest = self.mouth_height - half;
        let (top, bottom) = (90 - half, 90 + rest);
        let mouth = [
            Point::new(44, 90),
            Point::new(50, top),
            Point::new(56, top),
            Point::new(64, top),
            Point::new(72, top),
            Point::new(78, top),
            Point::new(84, 90),
            Point::new(78, bottom),
            Point::new(72, bottom),
            Point::new(64, bottom),
            Point::new(56, bottom),
            Point::new(50, bottom),
        ];
        points[48..60].copy_from_slice(&mouth);
        for (i, p) in points[60..68].iter_mut().enumerate() {
            let x = 50 + i32::try_from(i).unwrap_or(0) * 4;
            *p = Point::new(x, 90);
        }

        points[27] = Point::new(64, 40);
        points[30] = Point::new(64, 60);
        points[8] = Point::new(64, 110);

        Landmarks::new(points)
    }
}

/// On-disk dataset fixture with `Drowsy/` and `Non Drowsy/` folders.
///
/// The directory is removed when the builder is dropped.
pub struct DatasetDirBuilder {
    root: TempDir,
    written: Vec<PathBuf>,
}

impl DatasetDirBuilder {
    /// Creates an empty dataset root with both class folders.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn new() -> Result<Self> {
        let root = TempDir::new().context("Failed to create temp dir")?;
        for label in [DROWSY_LABEL, NON_DROWSY_LABEL] {
            std::fs::create_dir(root.path().join(label))
                .with_context(|| format!("Failed to create {label} folder"))?;
        }
        Ok(Self {
            root,
            written: Vec::new(),
        })
    }

    /// Writes `image` as `<label>/<name>`. The format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be saved.
    pub fn image(mut self, label: &str, name: &str, image: &DynamicImage) -> Result<Self> {
        let path = self.root.path().join(label).join(name);
        image
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        self.written.push(path);
        Ok(self)
    }

    /// Writes `count` bright drowsy images and `count` dark non-drowsy images.
    ///
    /// # Errors
    ///
    /// Returns an error if an image cannot be saved.
    pub fn balanced(self, count: usize) -> Result<Self> {
        (0..count).try_fold(self, |builder, i| {
            builder
                .image(
                    DROWSY_LABEL,
                    &format!("drowsy_{i:03}.png"),
                    &SyntheticImageBuilder::uniform_gray(48, 48, 220),
                )?
                .image(
                    NON_DROWSY_LABEL,
                    &format!("alert_{i:03}.png"),
                    &SyntheticImageBuilder::uniform_gray(48, 48, 30),
                )
        })
    }

    /// Dataset root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Every file written so far, in write order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}
