//! Height-map sources and the scalable sampler used by terrain brushes.

use std::path::{Component, Path, PathBuf};

use brushwork_geom::Vec3;
use brushwork_structures::{Clipboard, rotate_yaw_inv};
use log::warn;
use rand::Rng;

use crate::StrokeRng;

/// Name that selects the top surface of the current clipboard.
pub const CLIPBOARD_SOURCE: &str = "#clipboard";

#[derive(Debug, thiserror::Error)]
pub enum HeightMapError {
    #[error("height map `{0}` not found")]
    NotFound(String),
    #[error("height map `{0}` is remote; only local files are read")]
    Network(String),
    #[error("height map `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("height map `{name}`: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("height map has no samples")]
    Empty,
}

/// Grid of heights in 0..=1, row-major by z.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: usize,
    length: usize,
    values: Vec<f32>,
}

impl HeightMap {
    pub fn new(width: usize, length: usize, values: Vec<f32>) -> Result<Self, HeightMapError> {
        if width == 0 || length == 0 || values.len() != width * length {
            return Err(HeightMapError::Empty);
        }
        let values = values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Ok(Self {
            width,
            length,
            values,
        })
    }

    pub fn from_clipboard(clip: &Clipboard) -> Result<Self, HeightMapError> {
        let profile = clip.top_surface();
        Self::new(profile.width, profile.length, profile.heights)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.values[z.min(self.length - 1) * self.width + x.min(self.width - 1)]
    }

    /// Bilinear sample at normalised coordinates; outside 0..=1 reads as 0.
    pub fn sample_uv(&self, u: f64, v: f64) -> f64 {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return 0.0;
        }
        let fx = u * (self.width - 1) as f64;
        let fz = v * (self.length - 1) as f64;
        let (x0, z0) = (fx.floor() as usize, fz.floor() as usize);
        let (tx, tz) = (fx - x0 as f64, fz - z0 as f64);
        let a = self.get(x0, z0) as f64;
        let b = self.get(x0 + 1, z0) as f64;
        let c = self.get(x0, z0 + 1) as f64;
        let d = self.get(x0 + 1, z0 + 1) as f64;
        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * tz
    }
}

pub trait HeightMapLoader {
    fn load(&self, name: &str) -> Result<HeightMap, HeightMapError>;
}

/// Reads grayscale images from a directory; `name` may omit the `.png` extension.
#[derive(Clone, Debug)]
pub struct ImageHeightMapLoader {
    dir: PathBuf,
}

impl ImageHeightMapLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = self.dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        let png = self.dir.join(format!("{name}.png"));
        png.is_file().then_some(png)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl HeightMapLoader for ImageHeightMapLoader {
    fn load(&self, name: &str) -> Result<HeightMap, HeightMapError> {
        if name.starts_with("http://") || name.starts_with("https://") {
            return Err(HeightMapError::Network(name.to_string()));
        }
        // only plain relative names stay inside the directory
        let confined = Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !confined {
            return Err(HeightMapError::NotFound(name.to_string()));
        }
        let path = self
            .resolve(name)
            .ok_or_else(|| HeightMapError::NotFound(name.to_string()))?;
        let img = image::ImageReader::open(&path)
            .map_err(|source| HeightMapError::Io {
                name: name.to_string(),
                source,
            })?
            .decode()
            .map_err(|source| HeightMapError::Image {
                name: name.to_string(),
                source,
            })?
            .into_luma16();
        let (w, h) = img.dimensions();
        let values = img.pixels().map(|p| p.0[0] as f32 / u16::MAX as f32).collect();
        HeightMap::new(w as usize, h as usize, values)
    }
}

/// Pick the source named by a terrain brush argument. An empty name is the flat default;
/// [`CLIPBOARD_SOURCE`] without a clipboard also falls back to the default.
pub fn resolve_source(
    loader: &dyn HeightMapLoader,
    name: &str,
    clipboard: Option<&Clipboard>,
) -> Result<Option<HeightMap>, HeightMapError> {
    match name {
        "" => Ok(None),
        CLIPBOARD_SOURCE => match clipboard {
            Some(clip) => HeightMap::from_clipboard(clip).map(Some),
            None => {
                warn!("no clipboard to sample; using the default height map");
                Ok(None)
            }
        },
        _ => loader.load(name).map(Some),
    }
}

/// How the brush weight drops off towards its edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Falloff {
    /// Linear from full at the centre to zero at the radius.
    #[default]
    Cone,
    /// Full weight across the whole disc.
    Cylinder,
}

/// A height map stretched over the brush disc, optionally rotated.
#[derive(Clone, Debug)]
pub struct ScalableHeightMap {
    source: Option<HeightMap>,
    pub rotation: f64,
    pub random_rotate: bool,
    pub falloff: Falloff,
}

impl ScalableHeightMap {
    pub fn new(source: Option<HeightMap>, falloff: Falloff) -> Self {
        Self {
            source,
            rotation: 0.0,
            random_rotate: false,
            falloff,
        }
    }

    pub fn source(&self) -> Option<&HeightMap> {
        self.source.as_ref()
    }

    /// Rotation for one application: fixed, or a fresh uniform angle when randomising.
    pub fn roll_rotation(&self, rng: &mut StrokeRng) -> f64 {
        if self.random_rotate {
            rng.random_range(0.0..360.0)
        } else {
            self.rotation
        }
    }

    /// Raw source value under a column offset, 0 outside the disc.
    pub fn value(&self, dx: i32, dz: i32, size: f64, rotation: f64) -> f64 {
        let d2 = (dx as f64).powi(2) + (dz as f64).powi(2);
        if d2 > size * size {
            return 0.0;
        }
        let Some(map) = &self.source else {
            return 1.0;
        };
        if size <= 0.0 {
            return map.sample_uv(0.5, 0.5);
        }
        let local = rotate_yaw_inv(Vec3::new(dx as f32, 0.0, dz as f32), rotation as f32);
        let u = (local.x as f64 + size) / (2.0 * size);
        let v = (local.z as f64 + size) / (2.0 * size);
        map.sample_uv(u, v)
    }

    /// Raise amount for a column offset: source value times size times falloff.
    pub fn sample(&self, dx: i32, dz: i32, size: f64, rotation: f64) -> f64 {
        let v = self.value(dx, dz, size, rotation);
        if v == 0.0 {
            return 0.0;
        }
        let fall = match self.falloff {
            Falloff::Cylinder => 1.0,
            Falloff::Cone if size > 0.0 => {
                let d = ((dx as f64).powi(2) + (dz as f64).powi(2)).sqrt();
                (1.0 - d / size).max(0.0)
            }
            Falloff::Cone => 1.0,
        };
        v * size * fall
    }
}
