//! Derivative-free minimization (Nelder-Mead simplex).

/// Simplex optimizer settings.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    /// Iteration cap; `None` means `200 * dim`.
    pub max_iter: Option<usize>,
    pub xatol: f64,
    pub fatol: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iter: None,
            xatol: 1e-6,
            fatol: 1e-8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
    pub converged: bool,
}

const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

impl NelderMead {
    /// Minimize `f` from `x0`. Non-finite objective values count as `+inf`.
    pub fn minimize<F>(&self, f: F, x0: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = x0.len();
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() {
                v
            } else {
                f64::INFINITY
            }
        };

        if n == 0 {
            return Minimum {
                x: Vec::new(),
                fx: eval(x0),
                iterations: 0,
                converged: true,
            };
        }

        let max_iter = self.max_iter.unwrap_or(200 * n);

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((x0.to_vec(), eval(x0)));
        for i in 0..n {
            let mut v = x0.to_vec();
            v[i] = if v[i] != 0.0 { v[i] * 1.05 } else { 0.00025 };
            let fv = eval(&v);
            simplex.push((v, fv));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iter {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            if self.has_converged(&simplex) {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(v, _)| v[j]).sum::<f64>() / n as f64)
                .collect();
            let worst = simplex[n].clone();
            let along = |t: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(&worst.0)
                    .map(|(c, w)| c + t * (c - w))
                    .collect()
            };

            let xr = along(ALPHA);
            let fr = eval(&xr);

            if fr < simplex[0].1 {
                let xe = along(ALPHA * GAMMA);
                let fe = eval(&xe);
                simplex[n] = if fe < fr { (xe, fe) } else { (xr, fr) };
                continue;
            }
            if fr < simplex[n - 1].1 {
                simplex[n] = (xr, fr);
                continue;
            }

            // Contract outside when the reflection improved on the worst point.
            let (xc, fc) = if fr < worst.1 {
                let xc = along(ALPHA * RHO);
                let fc = eval(&xc);
                (xc, fc)
            } else {
                let xc = along(-RHO);
                let fc = eval(&xc);
                (xc, fc)
            };
            if fc < fr.min(worst.1) {
                simplex[n] = (xc, fc);
                continue;
            }

            // Shrink toward the best vertex.
            let best = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                for (v, b) in vertex.0.iter_mut().zip(&best) {
                    *v = b + SIGMA * (*v - b);
                }
                vertex.1 = eval(&vertex.0);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (x, fx) = simplex.swap_remove(0);
        Minimum {
            x,
            fx,
            iterations,
            converged,
        }
    }

    fn has_converged(&self, simplex: &[(Vec<f64>, f64)]) -> bool {
        let (best, fbest) = (&simplex[0].0, simplex[0].1);
        if !fbest.is_finite() {
            return false;
        }
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|(v, _)| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        let f_spread = simplex[1..]
            .iter()
            .map(|(_, fv)| (fv - fbest).abs())
            .fold(0.0_f64, f64::max);
        x_spread <= self.xatol && f_spread <= self.fatol
    }
}
