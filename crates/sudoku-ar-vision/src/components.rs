//! 8-connected component labeling over an ink mask.

use crate::{BinaryMask, ComponentParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One maximal connected set of ink pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    /// Label value used in [`Labeling::labels`] (never 0).
    pub label: u32,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
    pub pixel_count: usize,
}

impl Component {
    #[inline]
    pub fn bbox_width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn bbox_height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    #[inline]
    pub fn bbox_area(&self) -> usize {
        self.bbox_width() * self.bbox_height()
    }

    /// Longer bounding-box side over the shorter one (≥ 1).
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = (self.bbox_width() as f32, self.bbox_height() as f32);
        w.max(h) / w.min(h)
    }

    /// Whether the bounding box touches the `[0, w) × [0, h)` border.
    pub fn touches_border(&self, width: usize, height: usize) -> bool {
        self.min_x == 0 || self.min_y == 0 || self.max_x + 1 >= width || self.max_y + 1 >= height
    }
}

/// Label image plus per-component statistics, ranked by pixel count.
#[derive(Clone, Debug)]
pub struct Labeling {
    pub width: usize,
    pub height: usize,
    /// Row-major labels; 0 is background.
    pub labels: Vec<u32>,
    /// Components sorted by `pixel_count`, largest first.
    pub components: Vec<Component>,
}

impl Labeling {
    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }

    /// Pixels of `c` with at least one 4-neighbour outside it (or off-frame).
    pub fn boundary_pixels(&self, c: &Component) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in c.min_y..=c.max_y {
            for x in c.min_x..=c.max_x {
                if self.label_at(x, y) != c.label {
                    continue;
                }
                let edge = x == 0
                    || y == 0
                    || x + 1 == self.width
                    || y + 1 == self.height
                    || self.label_at(x - 1, y) != c.label
                    || self.label_at(x + 1, y) != c.label
                    || self.label_at(x, y - 1) != c.label
                    || self.label_at(x, y + 1) != c.label;
                if edge {
                    out.push((x, y));
                }
            }
        }
        out
    }
}

// Union-find over provisional labels, with path halving.
struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    fn new() -> Self {
        // Index 0 is the background and never merged.
        Self { parent: vec![0] }
    }

    fn make(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut a: u32) -> u32 {
        while self.parent[a as usize] != a {
            let grand = self.parent[self.parent[a as usize] as usize];
            self.parent[a as usize] = grand;
            a = grand;
        }
        a
    }

    fn union(&mut self, a: u32, b: u32) -> u32 {
        let (ra, rb) = (self.find(a), self.find(b));
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        lo
    }
}

/// Two-pass 8-connected labeling of the ink pixels in `mask`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask), fields(w = mask.width, h = mask.height))
)]
pub fn label_components(mask: &BinaryMask) -> Labeling {
    let (w, h) = (mask.width, mask.height);
    let mut labels = vec![0u32; w * h];
    let mut sets = DisjointSet::new();

    for y in 0..h {
        for x in 0..w {
            if !mask.get(x, y) {
                continue;
            }
            // Already-visited neighbours: W, NW, N, NE.
            let mut current = 0u32;
            let mut visit = |l: u32, sets: &mut DisjointSet| {
                if l == 0 {
                    return;
                }
                current = if current == 0 { l } else { sets.union(current, l) };
            };
            if x > 0 {
                visit(labels[y * w + x - 1], &mut sets);
            }
            if y > 0 {
                let up = (y - 1) * w;
                if x > 0 {
                    visit(labels[up + x - 1], &mut sets);
                }
                visit(labels[up + x], &mut sets);
                if x + 1 < w {
                    visit(labels[up + x + 1], &mut sets);
                }
            }
            labels[y * w + x] = if current == 0 { sets.make() } else { current };
        }
    }

    // Second pass: resolve roots to dense ids and gather statistics.
    let mut dense = vec![0u32; sets.parent.len()];
    let mut components: Vec<Component> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if labels[idx] == 0 {
                continue;
            }
            let root = sets.find(labels[idx]) as usize;
            if dense[root] == 0 {
                components.push(Component {
                    label: components.len() as u32 + 1,
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                    pixel_count: 0,
                });
                dense[root] = components.len() as u32;
            }
            let id = dense[root];
            labels[idx] = id;
            let c = &mut components[id as usize - 1];
            c.min_x = c.min_x.min(x);
            c.max_x = c.max_x.max(x);
            c.min_y = c.min_y.min(y);
            c.max_y = c.max_y.max(y);
            c.pixel_count += 1;
        }
    }

    components.sort_by(|a, b| b.pixel_count.cmp(&a.pixel_count).then(a.label.cmp(&b.label)));
    Labeling {
        width: w,
        height: h,
        labels,
        components,
    }
}

/// Largest component that is big enough and roughly square.
///
/// `None` means this frame shows no grid, which is a normal outcome.
pub fn select_grid_candidate<'a>(
    labeling: &'a Labeling,
    params: &ComponentParams,
) -> Option<&'a Component> {
    let candidate = labeling
        .components
        .iter()
        .take_while(|c| c.pixel_count >= params.min_pixels)
        .find(|c| c.aspect_ratio() <= params.max_aspect_ratio);
    if candidate.is_none() {
        log::trace!(
            "no grid candidate among {} components",
            labeling.components.len()
        );
    }
    candidate
}
