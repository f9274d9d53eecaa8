//! COLMAP text model parsing.
//!
//! `cameras.txt` lines: `CAMERA_ID MODEL WIDTH HEIGHT PARAMS...`
//!
//! `images.txt` stores two lines per image:
//! `IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME` followed by the (possibly
//! empty) list of 2D observations. Lines starting with `#` are comments.
//!
//! COLMAP poses map world points into the camera frame, which is the
//! convention [`tsdf_fusion::TsdfVolume::integrate`] expects.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use log::warn;
use tsdf_core::{pose_from_quaternion, Iso3, PinholeIntrinsics, PoseConvention, Real, Vec3};

/// Relative tolerance when collapsing `fx`/`fy` into one focal length.
const SQUARE_PIXEL_TOL: Real = 1e-6;

/// Load the single camera of a COLMAP `cameras.txt`.
pub fn load_intrinsics(path: &Path) -> Result<PinholeIntrinsics> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cameras from {}", path.display()))?;
    parse_cameras(&text).with_context(|| format!("invalid cameras file {}", path.display()))
}

/// Load per-frame world-to-camera poses keyed by COLMAP `IMAGE_ID`.
///
/// `convention` describes how the file stores poses; COLMAP itself writes
/// [`PoseConvention::WorldToCamera`]. Returned poses are always
/// world-to-camera.
pub fn load_poses(path: &Path, convention: PoseConvention) -> Result<BTreeMap<usize, Iso3>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read poses from {}", path.display()))?;
    let poses =
        parse_images(&text).with_context(|| format!("invalid images file {}", path.display()))?;
    Ok(poses
        .into_iter()
        .map(|(id, pose)| (id, convention.to_world_to_camera(pose)))
        .collect())
}

/// Parse `cameras.txt` contents into pinhole intrinsics.
///
/// Distortion parameters are ignored. Only the first camera is used.
pub fn parse_cameras(text: &str) -> Result<PinholeIntrinsics> {
    let mut lines = data_lines(text).filter(|(_, l)| !l.trim().is_empty());
    let Some((line_no, line)) = lines.next() else {
        bail!("no camera entries found");
    };
    let extra = lines.count();
    if extra > 0 {
        warn!("{extra} additional camera(s) ignored; only the first camera is used");
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    ensure!(
        tokens.len() >= 4,
        "line {line_no}: expected CAMERA_ID MODEL WIDTH HEIGHT PARAMS..., got {} fields",
        tokens.len()
    );
    let model = tokens[1];
    let width: usize = tokens[2]
        .parse()
        .with_context(|| format!("line {line_no}: invalid width {:?}", tokens[2]))?;
    let height: usize = tokens[3]
        .parse()
        .with_context(|| format!("line {line_no}: invalid height {:?}", tokens[3]))?;
    let params = parse_floats(&tokens[4..])
        .with_context(|| format!("line {line_no}: invalid camera parameters"))?;

    let (f, cx, cy, used) = match model {
        "SIMPLE_PINHOLE" | "SIMPLE_RADIAL" | "RADIAL" | "SIMPLE_RADIAL_FISHEYE"
        | "RADIAL_FISHEYE" => {
            ensure!(params.len() >= 3, "line {line_no}: {model} needs f cx cy");
            (params[0], params[1], params[2], 3)
        }
        "PINHOLE" | "OPENCV" | "FULL_OPENCV" | "OPENCV_FISHEYE" => {
            ensure!(params.len() >= 4, "line {line_no}: {model} needs fx fy cx cy");
            let (fx, fy) = (params[0], params[1]);
            ensure!(
                (fx - fy).abs() <= SQUARE_PIXEL_TOL * fx.abs().max(1.0),
                "line {line_no}: non-square pixels (fx={fx}, fy={fy}) are not supported"
            );
            (fx, params[2], params[3], 4)
        }
        other => bail!("line {line_no}: unsupported camera model {other}"),
    };
    if params[used..].iter().any(|p| *p != 0.0) {
        warn!("camera model {model}: distortion parameters {:?} ignored", &params[used..]);
    }

    let intrinsics = PinholeIntrinsics::new(f, cx, cy).with_image_size(width, height);
    intrinsics.validate()?;
    Ok(intrinsics)
}

/// Parse `images.txt` contents into poses keyed by `IMAGE_ID`.
///
/// Poses are returned exactly as stored (world-to-camera for COLMAP).
pub fn parse_images(text: &str) -> Result<BTreeMap<usize, Iso3>> {
    let lines: Vec<(usize, &str)> = data_lines(text).collect();
    let mut poses = BTreeMap::new();

    // Every image occupies two lines; the second one may be empty.
    for chunk in lines.chunks(2) {
        let (line_no, line) = chunk[0];
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        ensure!(
            tokens.len() >= 9,
            "line {line_no}: expected IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME, got {} fields",
            tokens.len()
        );
        let id: usize = tokens[0]
            .parse()
            .with_context(|| format!("line {line_no}: invalid image id {:?}", tokens[0]))?;
        let v = parse_floats(&tokens[1..8]).with_context(|| format!("line {line_no}"))?;
        let pose = pose_from_quaternion(v[0], v[1], v[2], v[3], Vec3::new(v[4], v[5], v[6]))
            .with_context(|| format!("line {line_no}: image {id}"))?;
        ensure!(
            poses.insert(id, pose).is_none(),
            "line {line_no}: duplicate image id {id}"
        );
    }

    ensure!(!poses.is_empty(), "no image entries found");
    Ok(poses)
}

/// Render `intrinsics` as a single-camera `SIMPLE_PINHOLE` model.
pub fn format_cameras(intrinsics: &PinholeIntrinsics) -> Result<String> {
    let size = intrinsics
        .image_size
        .context("camera model needs an image size")?;
    Ok(format!(
        "# Camera list with one line of data per camera:\n\
         #   CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[]\n\
         1 SIMPLE_PINHOLE {} {} {} {} {}\n",
        size.width, size.height, intrinsics.f, intrinsics.cx, intrinsics.cy
    ))
}

/// Render world-to-camera poses as `images.txt` with empty point lists.
pub fn format_images(poses: &BTreeMap<usize, Iso3>) -> String {
    let mut out = String::from(
        "# Image list with two lines of data per image:\n\
         #   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME\n\
         #   POINTS2D[] as (X, Y, POINT3D_ID)\n",
    );
    for (id, pose) in poses {
        let q = pose.rotation.quaternion();
        let t = pose.translation.vector;
        out.push_str(&format!(
            "{id} {} {} {} {} {} {} {} 1 img_{id:05}.png\n\n",
            q.w, q.i, q.j, q.k, t.x, t.y, t.z
        ));
    }
    out
}

/// Non-comment lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim_start().starts_with('#'))
}

fn parse_floats(tokens: &[&str]) -> Result<Vec<Real>> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<Real>()
                .with_context(|| format!("invalid number {t:?}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsdf_core::Pt3;

    const CAMERAS: &str = "\
# Camera list with one line of data per camera:
#   CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[]
# Number of cameras: 1
1 SIMPLE_RADIAL 640 480 525.5 320 240 0.012
";

    const IMAGES: &str = "\
# Image list with two lines of data per image:
#   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME
#   POINTS2D[] as (X, Y, POINT3D_ID)
# Number of images: 3, mean observations per image: 1
1 1 0 0 0 0 0 1 1 img_00001.png
100.5 200.5 -1
2 0.7071067811865476 0 0.7071067811865476 0 0.1 0 2 1 img_00002.png

3 1 0 0 0 0 0 3 1 img_00003.png
";

    #[test]
    fn parses_simple_radial_camera() {
        let k = parse_cameras(CAMERAS).unwrap();
        assert_eq!(k.f, 525.5);
        assert_eq!((k.cx, k.cy), (320.0, 240.0));
        let size = k.image_size.unwrap();
        assert_eq!((size.width, size.height), (640, 480));
    }

    #[test]
    fn parses_pinhole_with_square_pixels() {
        let k = parse_cameras("1 PINHOLE 64 48 50 50 31.5 23.5\n").unwrap();
        assert_eq!(k.f, 50.0);
        assert_eq!(k.cy, 23.5);
        assert!(parse_cameras("1 PINHOLE 64 48 50 51 31.5 23.5\n").is_err());
    }

    #[test]
    fn rejects_bad_camera_files() {
        assert!(parse_cameras("# only comments\n").is_err());
        assert!(parse_cameras("1 EQUIRECTANGULAR 64 48 1 2 3\n").is_err());
        assert!(parse_cameras("1 SIMPLE_PINHOLE 64 48 50 31.5\n").is_err());
        assert!(parse_cameras("1 SIMPLE_PINHOLE 64 48 -5 31.5 23.5\n").is_err());
    }

    #[test]
    fn parses_images_with_empty_point_lines() {
        let poses = parse_images(IMAGES).unwrap();
        assert_eq!(poses.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);

        let p = poses[&1].transform_point(&Pt3::origin());
        assert!((p - Pt3::new(0.0, 0.0, 1.0)).norm() < 1e-12);

        // 90 degrees about +y maps +x to -z, then translate
        let p = poses[&2].transform_point(&Pt3::new(1.0, 0.0, 0.0));
        assert!((p - Pt3::new(0.1, 0.0, 1.0)).norm() < 1e-9, "{p:?}");

        let p = poses[&3].transform_point(&Pt3::origin());
        assert!((p.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn formatted_models_parse_back() {
        let k = PinholeIntrinsics::new(50.0, 31.5, 23.5).with_image_size(64, 48);
        assert_eq!(parse_cameras(&format_cameras(&k).unwrap()).unwrap(), k);
        assert!(format_cameras(&PinholeIntrinsics::new(50.0, 31.5, 23.5)).is_err());

        let poses = parse_images(IMAGES).unwrap();
        let back = parse_images(&format_images(&poses)).unwrap();
        for (id, pose) in &poses {
            let p = Pt3::new(0.3, -0.2, 1.1);
            let diff = pose.transform_point(&p) - back[id].transform_point(&p);
            assert!(diff.norm() < 1e-12);
        }
    }

    #[test]
    fn rejects_duplicate_and_malformed_images() {
        let dup = "1 1 0 0 0 0 0 1 1 a.png\n\n1 1 0 0 0 0 0 2 1 b.png\n\n";
        assert!(parse_images(dup).is_err());
        assert!(parse_images("1 1 0 0 0 0 0 1\n\n").is_err());
        assert!(parse_images("1 1 0 0 x 0 0 1 1 a.png\n\n").is_err());
        assert!(parse_images("1 0 0 0 0 0 0 1 1 a.png\n\n").is_err());
        assert!(parse_images("# nothing\n").is_err());
    }
}
