//! Dataset directory layout and per-frame depth loading.
//!
//! ```text
//! <root>/
//!   cameras.txt          COLMAP camera model
//!   images.txt           COLMAP poses, IMAGE_ID = frame index
//!   rgb/img_00001.png    colour frames (only counted)
//!   depth/img_00001.npy  depth in metres, or img_00001.png (16-bit)
//! ```
//!
//! Frames are numbered from 1.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use image::{DynamicImage, ImageReader};
use log::{debug, info};
use tsdf_core::{DepthMap, Iso3, PinholeIntrinsics, PoseConvention, Scalar};

use crate::{colmap, npy};

/// Storage format of a depth frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFormat {
    /// `.npy` array; float values are metres.
    Npy,
    /// 8- or 16-bit grayscale `.png`, raw units divided by the depth scale.
    Png,
}

impl DepthFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Npy => "npy",
            Self::Png => "png",
        }
    }
}

/// A dataset directory with its camera and poses already parsed.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    intrinsics: PinholeIntrinsics,
    poses: BTreeMap<usize, Iso3>,
    frame_count: usize,
    depth_scale: Scalar,
}

impl Dataset {
    /// Open `root`, reading `cameras.txt`, `images.txt` and counting frames.
    ///
    /// `depth_scale` converts integer depth units to metres (e.g. `1000.0`
    /// for millimetre PNGs).
    pub fn open(root: &Path, depth_scale: Scalar, convention: PoseConvention) -> Result<Self> {
        ensure!(
            depth_scale.is_finite() && depth_scale > 0.0,
            "depth scale must be positive, got {depth_scale}"
        );
        ensure!(root.is_dir(), "dataset root {} is not a directory", root.display());

        let intrinsics = colmap::load_intrinsics(&root.join("cameras.txt"))?;
        let poses = colmap::load_poses(&root.join("images.txt"), convention)?;
        let frame_count = count_frames(root)?;
        ensure!(frame_count > 0, "no frames found under {}", root.display());

        info!(
            "dataset {}: {frame_count} frames, {} poses, f={:.3} cx={:.3} cy={:.3}",
            root.display(),
            poses.len(),
            intrinsics.f,
            intrinsics.cx,
            intrinsics.cy
        );

        Ok(Self {
            root: root.to_path_buf(),
            intrinsics,
            poses,
            frame_count,
            depth_scale,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn intrinsics(&self) -> &PinholeIntrinsics {
        &self.intrinsics
    }

    pub fn poses(&self) -> &BTreeMap<usize, Iso3> {
        &self.poses
    }

    /// Number of frames; valid indices are `1..=frame_count`.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn depth_scale(&self) -> Scalar {
        self.depth_scale
    }

    /// World-to-camera pose of frame `index`.
    pub fn pose(&self, index: usize) -> Result<Iso3> {
        self.poses
            .get(&index)
            .copied()
            .with_context(|| format!("no pose for frame {index} in images.txt"))
    }

    /// Path and format of the depth file for frame `index`; `.npy` wins
    /// when both exist.
    pub fn depth_path(&self, index: usize) -> Result<(PathBuf, DepthFormat)> {
        let dir = self.root.join("depth");
        for format in [DepthFormat::Npy, DepthFormat::Png] {
            let path = dir.join(format!("{}.{}", frame_stem(index), format.extension()));
            if path.is_file() {
                return Ok((path, format));
            }
        }
        bail!("no depth file for frame {index} in {}", dir.display())
    }

    /// Load the depth map of frame `index` in metres.
    pub fn load_depth(&self, index: usize) -> Result<DepthMap> {
        let (path, format) = self.depth_path(index)?;
        debug!("frame {index}: reading {}", path.display());
        match format {
            DepthFormat::Npy => npy::read_depth(&path, self.depth_scale),
            DepthFormat::Png => read_png_depth(&path, self.depth_scale),
        }
    }

    /// Depth map and pose of frame `index`.
    pub fn frame(&self, index: usize) -> Result<(DepthMap, Iso3)> {
        ensure!(
            (1..=self.frame_count).contains(&index),
            "frame {index} outside 1..={}",
            self.frame_count
        );
        Ok((self.load_depth(index)?, self.pose(index)?))
    }
}

/// Write a dataset in the layout read by [`Dataset::open`]: `cameras.txt`,
/// `images.txt` and `depth/img_XXXXX.npy`. `frames[k]` becomes frame `k + 1`;
/// poses are world-to-camera.
pub fn write_dataset(
    root: &Path,
    intrinsics: &PinholeIntrinsics,
    frames: &[(DepthMap, Iso3)],
) -> Result<()> {
    let depth_dir = root.join("depth");
    std::fs::create_dir_all(&depth_dir)
        .with_context(|| format!("failed to create {}", depth_dir.display()))?;

    let cameras = root.join("cameras.txt");
    std::fs::write(&cameras, colmap::format_cameras(intrinsics)?)
        .with_context(|| format!("failed to write {}", cameras.display()))?;

    let poses: BTreeMap<usize, Iso3> = frames
        .iter()
        .enumerate()
        .map(|(k, (_, pose))| (k + 1, *pose))
        .collect();
    let images = root.join("images.txt");
    std::fs::write(&images, colmap::format_images(&poses))
        .with_context(|| format!("failed to write {}", images.display()))?;

    for (k, (depth, _)) in frames.iter().enumerate() {
        let path = depth_dir.join(format!("{}.npy", frame_stem(k + 1)));
        npy::write_depth(&path, depth)?;
    }
    info!("wrote {} frames to {}", frames.len(), root.display());
    Ok(())
}

/// `img_00042` for frame 42.
pub fn frame_stem(index: usize) -> String {
    format!("img_{index:05}")
}

/// Number of frames: files in `rgb/`, or in `depth/` when `rgb/` is absent.
fn count_frames(root: &Path) -> Result<usize> {
    let rgb = root.join("rgb");
    let dir = if rgb.is_dir() { rgb } else { root.join("depth") };

    let mut count = 0usize;
    for entry in std::fs::read_dir(&dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| n.starts_with("img_")) {
            count += 1;
        }
    }
    Ok(count)
}

fn read_png_depth(path: &Path, depth_scale: Scalar) -> Result<DepthMap> {
    let img = ImageReader::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let (width, height) = (img.width() as usize, img.height() as usize);
    let data: Vec<Scalar> = match img {
        DynamicImage::ImageLuma16(buf) => buf
            .into_raw()
            .into_iter()
            .map(|v| v as Scalar / depth_scale)
            .collect(),
        DynamicImage::ImageLuma8(buf) => buf
            .into_raw()
            .into_iter()
            .map(|v| v as Scalar / depth_scale)
            .collect(),
        other => bail!(
            "{}: depth PNG must be single-channel, got {:?}",
            path.display(),
            other.color()
        ),
    };
    Ok(DepthMap::from_vec(width, height, data)?)
}
