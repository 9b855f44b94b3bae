//! Seeded simplex noise.
//!
//! Motion in the scenes is sampled from this field instead of stored
//! trajectories, so two instances built from the same seed drive identical
//! animations.

const F2: f32 = 0.366_025_42; // 0.5 * (sqrt(3) - 1)
const G2: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6
const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;

const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    perm: [u8; 512],
    perm_mod12: [u8; 512],
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);
        fastrand::Rng::with_seed(seed).shuffle(&mut base);

        let mut perm = [0u8; 512];
        let mut perm_mod12 = [0u8; 512];
        for i in 0..512 {
            perm[i] = base[i & 255];
            perm_mod12[i] = perm[i] % 12;
        }
        Self {
            seed,
            perm,
            perm_mod12,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i & 511] as usize
    }

    #[inline]
    fn g(&self, i: usize) -> &'static [f32; 3] {
        &GRAD3[self.perm_mod12[i & 511] as usize]
    }

    /// 2D simplex noise, roughly in [-1, 1].
    pub fn value2(&self, x: f32, y: f32) -> f32 {
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        let (i1, j1) = if x0 > y0 { (1usize, 0usize) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i32 & 255) as usize;
        let jj = (j as i32 & 255) as usize;
        let g0 = self.g(ii + self.p(jj));
        let g1 = self.g(ii + i1 + self.p(jj + j1));
        let g2 = self.g(ii + 1 + self.p(jj + 1));

        let n0 = corner2(0.5 - x0 * x0 - y0 * y0, g0, x0, y0);
        let n1 = corner2(0.5 - x1 * x1 - y1 * y1, g1, x1, y1);
        let n2 = corner2(0.5 - x2 * x2 - y2 * y2, g2, x2, y2);

        70.0 * (n0 + n1 + n2)
    }

    /// 3D simplex noise, roughly in [-1, 1]. The third axis is usually time.
    pub fn value3(&self, x: f32, y: f32, z: f32) -> f32 {
        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let t = (i + j + k) * G3;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f32 + G3;
        let y1 = y0 - j1 as f32 + G3;
        let z1 = z0 - k1 as f32 + G3;
        let x2 = x0 - i2 as f32 + 2.0 * G3;
        let y2 = y0 - j2 as f32 + 2.0 * G3;
        let z2 = z0 - k2 as f32 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i as i32 & 255) as usize;
        let jj = (j as i32 & 255) as usize;
        let kk = (k as i32 & 255) as usize;
        let g0 = self.g(ii + self.p(jj + self.p(kk)));
        let g1 = self.g(ii + i1 + self.p(jj + j1 + self.p(kk + k1)));
        let g2 = self.g(ii + i2 + self.p(jj + j2 + self.p(kk + k2)));
        let g3 = self.g(ii + 1 + self.p(jj + 1 + self.p(kk + 1)));

        let n0 = corner3(0.6 - x0 * x0 - y0 * y0 - z0 * z0, g0, x0, y0, z0);
        let n1 = corner3(0.6 - x1 * x1 - y1 * y1 - z1 * z1, g1, x1, y1, z1);
        let n2 = corner3(0.6 - x2 * x2 - y2 * y2 - z2 * z2, g2, x2, y2, z2);
        let n3 = corner3(0.6 - x3 * x3 - y3 * y3 - z3 * z3, g3, x3, y3, z3);

        32.0 * (n0 + n1 + n2 + n3)
    }
}

#[inline]
fn corner2(t: f32, g: &[f32; 3], x: f32, y: f32) -> f32 {
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    t2 * t2 * (g[0] * x + g[1] * y)
}

#[inline]
fn corner3(t: f32, g: &[f32; 3], x: f32, y: f32, z: f32) -> f32 {
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    t2 * t2 * (g[0] * x + g[1] * y + g[2] * z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_origin_is_zero() {
        // Every corner contribution vanishes at an integer lattice point's skewed origin.
        let n = NoiseField::new(7);
        assert!(n.value2(0.0, 0.0).abs() < 1e-6);
        assert!(n.value3(0.0, 0.0, 0.0).abs() < 1e-6);
    }

    #[test]
    fn permutation_is_a_doubled_bijection() {
        let n = NoiseField::new(99);
        let mut seen = [false; 256];
        for &v in &n.perm[..256] {
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(n.perm[..256], n.perm[256..]);
    }
}
