// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Marker-controlled watershed flooding (Meyer's algorithm).
//
// Labels grow outward from seed markers in order of colour difference, using
// a 256-level bucket queue that is FIFO within each level. A pixel reached by
// two different labels becomes a ridge (`BOUNDARY`). The outermost row and
// column of the image are always ridge pixels.

use std::collections::VecDeque;

use image::{GrayImage, ImageBuffer, Luma, RgbImage};

/// Label value of a ridge pixel between two regions.
pub const BOUNDARY: i32 = -1;

/// Pixel has been pushed but not yet labelled.
const IN_QUEUE: i32 = -2;

/// Number of priority levels: colour differences are 0..=255.
const LEVELS: usize = 256;

/// Per-pixel label image.
///
/// `0` is unknown, positive values are region labels, `BOUNDARY` marks a
/// ridge after flooding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    width: u32,
    height: u32,
    labels: Vec<i32>,
}

impl Markers {
    /// All-unknown markers of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            labels: vec![0; width as usize * height as usize],
        }
    }

    /// Seed markers from connected-component labels: every component label is
    /// shifted up by one so the component background becomes region 1, then
    /// pixels inside `unknown` are cleared to 0.
    pub fn from_components(
        components: &ImageBuffer<Luma<u32>, Vec<u32>>,
        unknown: &GrayImage,
    ) -> Self {
        let (width, height) = components.dimensions();
        let labels = components
            .pixels()
            .zip(unknown.pixels())
            .map(|(label, band)| {
                if band.0[0] > 0 {
                    0
                } else {
                    i32::try_from(label.0[0]).map_or(i32::MAX, |l| l.saturating_add(1))
                }
            })
            .collect();
        Self {
            width,
            height,
            labels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.labels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, label: i32) {
        let idx = self.index(x, y);
        self.labels[idx] = label;
    }

    pub fn is_boundary(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == BOUNDARY
    }

    /// Number of distinct positive labels.
    pub fn region_count(&self) -> usize {
        let mut seen: Vec<i32> = self.labels.iter().copied().filter(|&l| l > 0).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Iterate over the coordinates of every ridge pixel.
    pub fn boundary_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == BOUNDARY)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Priority queue over pixel indices with one FIFO per colour difference.
struct BucketQueue {
    buckets: Vec<VecDeque<usize>>,
    /// Lowest level that may be non-empty.
    active: usize,
}

impl BucketQueue {
    fn new() -> Self {
        Self {
            buckets: vec![VecDeque::new(); LEVELS],
            active: LEVELS,
        }
    }

    fn push(&mut self, level: u8, idx: usize) {
        let level = usize::from(level);
        self.buckets[level].push_back(idx);
        self.active = self.active.min(level);
    }

    fn pop(&mut self) -> Option<usize> {
        while self.active < LEVELS {
            if let Some(idx) = self.buckets[self.active].pop_front() {
                return Some(idx);
            }
            self.active += 1;
        }
        None
    }
}

fn rgb_at(raw: &[u8], idx: usize) -> &[u8] {
    &raw[idx * 3..idx * 3 + 3]
}

/// Largest per-channel absolute difference between two RGB pixels.
fn colour_diff(a: &[u8], b: &[u8]) -> u8 {
    a.iter()
        .zip(b)
        .map(|(&p, &q)| p.abs_diff(q))
        .max()
        .unwrap_or(0)
}

/// Flood `markers` over `image` in place.
///
/// Negative labels already present inside the frame are treated as unknown.
/// Unknown pixels that no label can reach stay 0.
pub fn flood(image: &RgbImage, markers: &mut Markers) {
    debug_assert_eq!(image.dimensions(), markers.dimensions());
    let (w, h) = (markers.width as usize, markers.height as usize);
    if w == 0 || h == 0 {
        return;
    }

    let raw: &[u8] = image.as_raw();
    let labels = &mut markers.labels;

    // Frame.
    for x in 0..w {
        labels[x] = BOUNDARY;
        labels[(h - 1) * w + x] = BOUNDARY;
    }
    for y in 0..h {
        labels[y * w] = BOUNDARY;
        labels[y * w + w - 1] = BOUNDARY;
    }

    let mut queue = BucketQueue::new();

    // Seed the queue with unknown pixels touching a labelled region.
    for y in 1..h.saturating_sub(1) {
        for x in 1..w - 1 {
            let idx = y * w + x;
            if labels[idx] < 0 {
                labels[idx] = 0;
            }
            if labels[idx] != 0 {
                continue;
            }
            let priority = [idx - 1, idx + 1, idx - w, idx + w]
                .into_iter()
                .filter(|&n| labels[n] > 0)
                .map(|n| colour_diff(rgb_at(raw, idx), rgb_at(raw, n)))
                .min();
            if let Some(priority) = priority {
                queue.push(priority, idx);
                labels[idx] = IN_QUEUE;
            }
        }
    }

    while let Some(idx) = queue.pop() {
        let neighbours = [idx - 1, idx + 1, idx - w, idx + w];

        let mut label = 0;
        for &n in &neighbours {
            let t = labels[n];
            if t > 0 {
                if label == 0 {
                    label = t;
                } else if t != label {
                    label = BOUNDARY;
                }
            }
        }
        // Queued pixels always touch at least one label.
        labels[idx] = label;
        if label == BOUNDARY {
            continue;
        }

        for &n in &neighbours {
            if labels[n] == 0 {
                labels[n] = IN_QUEUE;
                queue.push(colour_diff(rgb_at(raw, n), rgb_at(raw, idx)), n);
            }
        }
    }
}

// -- Tests --------------------------------------------------------------------
