//! Layout forces.
//!
//! Every force works on a flat slice of [`Body`] values and, apart from
//! centering, only writes velocities. The simulation applies them in a
//! fixed order each tick; they do not commute under discrete integration.

/// Per-node working state for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl Body {
    pub fn at(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
            fx: None,
            fy: None,
        }
    }

    /// Advance position by velocity; pinned axes snap to the pin.
    pub fn integrate(&mut self, velocity_decay: f64) {
        match self.fx {
            Some(fx) => {
                self.x = fx;
                self.vx = 0.0;
            }
            None => {
                self.vx *= velocity_decay;
                self.x += self.vx;
            }
        }
        match self.fy {
            Some(fy) => {
                self.y = fy;
                self.vy = 0.0;
            }
            None => {
                self.vy *= velocity_decay;
                self.y += self.vy;
            }
        }
    }
}

/// A link as seen by the link force: body indices plus degree weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    /// `1 / min(degree(source), degree(target))`.
    pub strength: f64,
    /// Share of the correction applied to the target:
    /// `degree(source) / (degree(source) + degree(target))`.
    pub bias: f64,
}

impl Spring {
    /// Build springs for `links`, given as `(source, target)` body indices.
    pub fn build(links: &[(usize, usize)], body_count: usize) -> Vec<Spring> {
        let mut degree = vec![0usize; body_count];
        for &(s, t) in links {
            degree[s] += 1;
            degree[t] += 1;
        }
        links
            .iter()
            .map(|&(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Spring {
                    source,
                    target,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect()
    }
}

/// Deterministic tiny perturbation used in place of a zero-length vector.
///
/// Linear congruential generator with the classic Numerical Recipes
/// constants, so a given graph always lays out the same way.
#[derive(Debug, Clone)]
pub struct Jiggle {
    state: u32,
}

impl Default for Jiggle {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Jiggle {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn unit(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.state) / 4_294_967_296.0
    }

    /// A non-zero value in `(-0.5e-6, 0.5e-6)`.
    pub fn next(&mut self) -> f64 {
        let v = (self.unit() - 0.5) * 1e-6;
        if v == 0.0 { 1e-7 } else { v }
    }
}

/// Pull linked bodies toward `(r_source + r_target) * distance_scale`.
pub fn link(
    bodies: &mut [Body],
    springs: &[Spring],
    distance_scale: f64,
    alpha: f64,
    jiggle: &mut Jiggle,
) {
    for spring in springs {
        let (src, tgt) = (bodies[spring.source], bodies[spring.target]);
        let mut x = tgt.x + tgt.vx - src.x - src.vx;
        let mut y = tgt.y + tgt.vy - src.y - src.vy;
        if x == 0.0 {
            x = jiggle.next();
        }
        if y == 0.0 {
            y = jiggle.next();
        }
        let l = (x * x + y * y).sqrt();
        let distance = (src.radius + tgt.radius) * distance_scale;
        let k = (l - distance) / l * alpha * spring.strength;
        x *= k;
        y *= k;

        let b = spring.bias;
        bodies[spring.target].vx -= x * b;
        bodies[spring.target].vy -= y * b;
        bodies[spring.source].vx += x * (1.0 - b);
        bodies[spring.source].vy += y * (1.0 - b);
    }
}

/// Push apart bodies whose padded circles overlap.
///
/// Works on predicted positions (`x + vx`) and runs `iterations` passes,
/// since resolving one pair can create a new overlap with another.
/// Larger bodies give way less than smaller ones.
pub fn collide(
    bodies: &mut [Body],
    padding: f64,
    strength: f64,
    iterations: usize,
    jiggle: &mut Jiggle,
) {
    let n = bodies.len();
    for _ in 0..iterations {
        for i in 0..n {
            let ri = bodies[i].radius + padding;
            let ri2 = ri * ri;
            let xi = bodies[i].x + bodies[i].vx;
            let yi = bodies[i].y + bodies[i].vy;

            for j in (i + 1)..n {
                let rj = bodies[j].radius + padding;
                let r = ri + rj;
                let mut x = xi - (bodies[j].x + bodies[j].vx);
                let mut y = yi - (bodies[j].y + bodies[j].vy);
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = jiggle.next();
                    l += x * x;
                }
                if y == 0.0 {
                    y = jiggle.next();
                    l += y * y;
                }
                let d = l.sqrt();
                let k = (r - d) / d * strength;
                x *= k;
                y *= k;

                let rj2 = rj * rj;
                let share = rj2 / (ri2 + rj2);
                bodies[i].vx += x * share;
                bodies[i].vy += y * share;
                bodies[j].vx -= x * (1.0 - share);
                bodies[j].vy -= y * (1.0 - share);
            }
        }
    }
}

/// All-pairs inverse-distance interaction. Negative `strength` repels.
pub fn many_body(
    bodies: &mut [Body],
    strength: f64,
    distance_min: f64,
    alpha: f64,
    jiggle: &mut Jiggle,
) {
    let n = bodies.len();
    let distance_min2 = distance_min * distance_min;
    let mut dv = vec![(0.0, 0.0); n];

    for (i, delta) in dv.iter_mut().enumerate() {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut x = bodies[j].x - bodies[i].x;
            let mut y = bodies[j].y - bodies[i].y;
            if x == 0.0 {
                x = jiggle.next();
            }
            if y == 0.0 {
                y = jiggle.next();
            }
            let mut l = x * x + y * y;
            if l < distance_min2 {
                l = (distance_min2 * l).sqrt();
            }
            let w = strength * alpha / l;
            delta.0 += x * w;
            delta.1 += y * w;
        }
    }

    for (body, (dx, dy)) in bodies.iter_mut().zip(dv) {
        body.vx += dx;
        body.vy += dy;
    }
}

/// Translate every body so the centroid moves toward `(cx, cy)`.
pub fn center(bodies: &mut [Body], cx: f64, cy: f64, strength: f64) {
    if bodies.is_empty() {
        return;
    }
    let n = bodies.len() as f64;
    let (sx, sy) = bodies
        .iter()
        .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
    let dx = (sx / n - cx) * strength;
    let dy = (sy / n - cy) * strength;
    for body in bodies {
        body.x -= dx;
        body.y -= dy;
    }
}

/// Weak pull of every body's x toward `x`.
pub fn axis_x(bodies: &mut [Body], x: f64, strength: f64, alpha: f64) {
    for body in bodies {
        body.vx += (x - body.x) * strength * alpha;
    }
}

/// Weak pull of every body's y toward `y`.
pub fn axis_y(bodies: &mut [Body], y: f64, strength: f64, alpha: f64) {
    for body in bodies {
        body.vy += (y - body.y) * strength * alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_weights_follow_degree() {
        // 0 is a hub linked to 1, 2 and 3
        let springs = Spring::build(&[(0, 1), (0, 2), (0, 3)], 4);
        assert_eq!(springs.len(), 3);
        for s in &springs {
            assert!((s.strength - 1.0).abs() < 1e-12);
            assert!((s.bias - 0.75).abs() < 1e-12);
        }
    }

    #[test]
    fn link_pulls_stretched_pair_together() {
        let mut bodies = [Body::at(0.0, 0.0, 10.0), Body::at(200.0, 0.0, 10.0)];
        let springs = Spring::build(&[(0, 1)], 2);
        link(&mut bodies, &springs, 1.5, 1.0, &mut Jiggle::default());
        assert!(bodies[0].vx > 0.0);
        assert!(bodies[1].vx < 0.0);
    }

    #[test]
    fn collide_separates_overlapping_bodies() {
        let mut bodies = [Body::at(0.0, 0.0, 20.0), Body::at(10.0, 0.0, 20.0)];
        collide(&mut bodies, 8.0, 1.0, 1, &mut Jiggle::default());
        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
    }

    #[test]
    fn collide_handles_coincident_bodies() {
        let mut bodies = [Body::at(5.0, 5.0, 20.0), Body::at(5.0, 5.0, 20.0)];
        collide(&mut bodies, 8.0, 1.0, 16, &mut Jiggle::default());
        for b in &bodies {
            assert!(b.vx.is_finite() && b.vy.is_finite());
        }
        assert_ne!(bodies[0].vx, bodies[1].vx);
    }

    #[test]
    fn many_body_repels() {
        let mut bodies = [Body::at(0.0, 0.0, 20.0), Body::at(30.0, 0.0, 20.0)];
        many_body(&mut bodies, -30.0, 1.0, 1.0, &mut Jiggle::default());
        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
    }

    #[test]
    fn center_moves_centroid_to_target() {
        let mut bodies = [Body::at(0.0, 0.0, 20.0), Body::at(10.0, 20.0, 20.0)];
        center(&mut bodies, 100.0, 100.0, 1.0);
        let cx = (bodies[0].x + bodies[1].x) / 2.0;
        let cy = (bodies[0].y + bodies[1].y) / 2.0;
        assert!((cx - 100.0).abs() < 1e-9);
        assert!((cy - 100.0).abs() < 1e-9);
    }

    #[test]
    fn integrate_respects_pins() {
        let mut body = Body::at(0.0, 0.0, 20.0);
        body.vx = 5.0;
        body.vy = 5.0;
        body.fx = Some(42.0);
        body.integrate(0.6);
        assert_eq!(body.x, 42.0);
        assert_eq!(body.vx, 0.0);
        assert!((body.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn jiggle_is_deterministic_and_nonzero() {
        let mut a = Jiggle::new(7);
        let mut b = Jiggle::new(7);
        for _ in 0..100 {
            let v = a.next();
            assert_eq!(v, b.next());
            assert!(v != 0.0 && v.abs() < 1e-6);
        }
    }
}
