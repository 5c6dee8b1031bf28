//! Force kernels.
//!
//! Each kernel reads positions from [`Bodies`] and accumulates into the
//! velocity buffers, scaled by the current alpha. The integrator in
//! [`Simulation::tick`](super::Simulation::tick) applies velocity decay and
//! moves the bodies afterwards. The center force is the exception: it shifts
//! positions directly.

use rand::Rng;
use rand::rngs::StdRng;

use crate::spatial::SpatialIndex;

/// Position and velocity buffers in SoA layout. Slot `i` is one node.
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
}

impl Bodies {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, x: f32, y: f32) {
        self.x.push(x);
        self.y.push(y);
        self.vx.push(0.0);
        self.vy.push(0.0);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A resolved link between two slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    /// Rest length.
    pub distance: f32,
    pub strength: f32,
    /// Share of the correction taken by the target; the source takes the
    /// rest. Nodes with more links move less.
    pub bias: f32,
}

/// Tiny random offset used to separate coincident nodes.
fn jiggle(rng: &mut StdRng) -> f32 {
    (rng.r#gen::<f32>() - 0.5) * 1e-6
}

/// Spring toward each link's rest length.
pub fn apply_links(bodies: &mut Bodies, links: &[Link], alpha: f32, rng: &mut StdRng) {
    for link in links {
        let (s, t) = (link.source, link.target);
        let mut dx = bodies.x[t] + bodies.vx[t] - bodies.x[s] - bodies.vx[s];
        let mut dy = bodies.y[t] + bodies.vy[t] - bodies.y[s] - bodies.vy[s];
        if dx == 0.0 {
            dx = jiggle(rng);
        }
        if dy == 0.0 {
            dy = jiggle(rng);
        }

        let length = (dx * dx + dy * dy).sqrt();
        let k = (length - link.distance) / length * alpha * link.strength;
        dx *= k;
        dy *= k;

        bodies.vx[t] -= dx * link.bias;
        bodies.vy[t] -= dy * link.bias;
        bodies.vx[s] += dx * (1.0 - link.bias);
        bodies.vy[s] += dy * (1.0 - link.bias);
    }
}

/// Pairwise inverse-square repulsion. `strengths[j]` is the charge node `j`
/// exerts on every other node (negative repels).
pub fn apply_charge(
    bodies: &mut Bodies,
    strengths: &[f32],
    distance_min: f32,
    alpha: f32,
    rng: &mut StdRng,
) {
    let n = bodies.len();
    let distance_min_2 = distance_min * distance_min;

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut dx = bodies.x[j] - bodies.x[i];
            let mut dy = bodies.y[j] - bodies.y[i];
            if dx == 0.0 {
                dx = jiggle(rng);
            }
            if dy == 0.0 {
                dy = jiggle(rng);
            }

            let mut l = dx * dx + dy * dy;
            if l < distance_min_2 {
                l = (distance_min_2 * l).sqrt();
            }
            let k = strengths[j] * alpha / l;
            bodies.vx[i] += dx * k;
            bodies.vy[i] += dy * k;
        }
    }
}

/// Move the centroid a fraction of the way toward `(cx, cy)`.
pub fn apply_center(bodies: &mut Bodies, cx: f32, cy: f32, strength: f32) {
    let n = bodies.len();
    if n == 0 {
        return;
    }
    let mean_x = bodies.x.iter().sum::<f32>() / n as f32;
    let mean_y = bodies.y.iter().sum::<f32>() / n as f32;
    let shift_x = (mean_x - cx) * strength;
    let shift_y = (mean_y - cy) * strength;
    for x in &mut bodies.x {
        *x -= shift_x;
    }
    for y in &mut bodies.y {
        *y -= shift_y;
    }
}

/// Push overlapping circles apart, the smaller circle moving more.
///
/// Works on next-step positions (position + velocity). Candidate pairs come
/// from an R-tree over those positions instead of testing every pair.
pub fn apply_collide(bodies: &mut Bodies, radii: &[f32], strength: f32, rng: &mut StdRng) {
    let n = bodies.len();
    if n < 2 {
        return;
    }

    let next_x: Vec<f32> = (0..n).map(|i| bodies.x[i] + bodies.vx[i]).collect();
    let next_y: Vec<f32> = (0..n).map(|i| bodies.y[i] + bodies.vy[i]).collect();
    let index = SpatialIndex::from_positions(&next_x, &next_y);
    let max_radius = radii.iter().copied().fold(0.0f32, f32::max);

    for i in 0..n {
        let ri = radii[i];
        let ri_2 = ri * ri;
        let xi = bodies.x[i] + bodies.vx[i];
        let yi = bodies.y[i] + bodies.vy[i];

        for j in index.within(next_x[i], next_y[i], ri + max_radius) {
            // Each pair once.
            if j <= i {
                continue;
            }
            let rj = radii[j];
            let r = ri + rj;
            let mut dx = xi - bodies.x[j] - bodies.vx[j];
            let mut dy = yi - bodies.y[j] - bodies.vy[j];
            let mut l = dx * dx + dy * dy;
            if l >= r * r {
                continue;
            }
            if dx == 0.0 {
                dx = jiggle(rng);
                l += dx * dx;
            }
            if dy == 0.0 {
                dy = jiggle(rng);
                l += dy * dy;
            }

            let length = l.sqrt();
            let k = (r - length) / length * strength;
            dx *= k;
            dy *= k;

            let rj_2 = rj * rj;
            let share = rj_2 / (ri_2 + rj_2);
            bodies.vx[i] += dx * share;
            bodies.vy[i] += dy * share;
            bodies.vx[j] -= dx * (1.0 - share);
            bodies.vy[j] -= dy * (1.0 - share);
        }
    }
}

/// Pull every node toward a ring of `radius` around `(cx, cy)`.
pub fn apply_radial(bodies: &mut Bodies, cx: f32, cy: f32, radius: f32, strength: f32, alpha: f32) {
    for i in 0..bodies.len() {
        let dx = bodies.x[i] - cx;
        let dy = bodies.y[i] - cy;
        let r = (dx * dx + dy * dy).sqrt().max(1e-6);
        let k = (radius - r) * strength * alpha / r;
        bodies.vx[i] += dx * k;
        bodies.vy[i] += dy * k;
    }
}

/// Pull each node toward its own target along both axes.
pub fn apply_axes(bodies: &mut Bodies, targets: &[[f32; 2]], strength: f32, alpha: f32) {
    for (i, &[tx, ty]) in targets.iter().enumerate().take(bodies.len()) {
        bodies.vx[i] += (tx - bodies.x[i]) * strength * alpha;
        bodies.vy[i] += (ty - bodies.y[i]) * strength * alpha;
    }
}
