use serde::{Deserialize, Serialize};

/// Adaptive threshold settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeParams {
    /// Half-size of the square averaging window in pixels.
    pub window_radius: usize,
    /// A pixel is ink when it is darker than the local mean by more than this.
    pub offset: u8,
}

impl Default for BinarizeParams {
    fn default() -> Self {
        Self {
            window_radius: 7,
            offset: 12,
        }
    }
}

/// Grid candidate selection among labeled components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentParams {
    /// Components with fewer pixels are ignored outright.
    pub min_pixels: usize,
    /// Longer bounding-box side over shorter side must not exceed this.
    pub max_aspect_ratio: f32,
}

impl Default for ComponentParams {
    fn default() -> Self {
        Self {
            min_pixels: 200,
            max_aspect_ratio: 1.6,
        }
    }
}

/// Corner fitting and outline validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerParams {
    /// Minimum outline (and bounding-box) area as a fraction of the frame area.
    pub min_area_fraction: f32,
    /// Interior angles must lie within `[min_angle_deg, 180 - min_angle_deg]`.
    pub min_angle_deg: f32,
}

impl Default for CornerParams {
    fn default() -> Self {
        Self {
            min_area_fraction: 0.04,
            min_angle_deg: 30.0,
        }
    }
}

/// Rectification and cell partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    /// Side of the rectified square; a multiple of 9.
    pub size: usize,
    /// Pixels trimmed from every side of each cell to drop the ruling.
    pub cell_margin: usize,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            size: 252,
            cell_margin: 3,
        }
    }
}

impl ExtractParams {
    /// Side of one cell in the rectified square, before trimming.
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.size as f32 / 9.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let p: BinarizeParams = serde_json::from_str(r#"{ "offset": 20 }"#).unwrap();
        assert_eq!(p.offset, 20);
        assert_eq!(p.window_radius, BinarizeParams::default().window_radius);
        assert_eq!(ExtractParams::default().cell_size(), 28.0);
    }
}
