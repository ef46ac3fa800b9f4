//! # Nelder-Mead 单纯形优化
//!
//! 固定维度的无约束最小化，用于 GEV 极大似然估计。
//! 目标函数返回非有限值时视为 +∞。
//!
//! ## 依赖关系
//! - 被 `stats/gev.rs` 使用

/// 优化结果
#[derive(Debug, Clone, Copy)]
pub struct Minimum<const N: usize> {
    pub point: [f64; N],
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead 参数
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    pub max_iter: usize,
    /// 单纯形顶点函数值的收敛容差
    pub f_tol: f64,
    /// 单纯形尺寸的收敛容差
    pub x_tol: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            f_tol: 1e-10,
            x_tol: 1e-10,
        }
    }
}

impl NelderMead {
    /// 从 `start` 出发最小化 `f`，初始单纯形沿各轴偏移 `step`
    pub fn minimize<const N: usize, F>(&self, f: F, start: [f64; N], step: [f64; N]) -> Minimum<N>
    where
        F: Fn(&[f64; N]) -> f64,
    {
        let eval = |p: &[f64; N]| {
            let v = f(p);
            if v.is_finite() {
                v
            } else {
                f64::INFINITY
            }
        };

        let mut simplex: Vec<([f64; N], f64)> = Vec::with_capacity(N + 1);
        simplex.push((start, eval(&start)));
        for i in 0..N {
            let mut p = start;
            p[i] += step[i];
            simplex.push((p, eval(&p)));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best = simplex[0].1;
            let worst = simplex[N].1;
            let f_spread = (worst - best).abs();
            let x_spread = simplex[1..]
                .iter()
                .flat_map(|(p, _)| p.iter().zip(simplex[0].0.iter()).map(|(a, b)| (a - b).abs()))
                .fold(0.0_f64, f64::max);
            if best.is_finite() && f_spread <= self.f_tol && x_spread <= self.x_tol {
                converged = true;
                break;
            }

            // 除最差点外的质心
            let mut centroid = [0.0; N];
            for (p, _) in &simplex[..N] {
                for (c, v) in centroid.iter_mut().zip(p.iter()) {
                    *c += v / N as f64;
                }
            }

            let worst_point = simplex[N].0;
            let along = |t: f64| {
                let mut p = [0.0; N];
                for i in 0..N {
                    p[i] = centroid[i] + t * (worst_point[i] - centroid[i]);
                }
                p
            };

            let reflected = along(-1.0);
            let f_reflected = eval(&reflected);

            if f_reflected < simplex[0].1 {
                let expanded = along(-2.0);
                let f_expanded = eval(&expanded);
                simplex[N] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
                continue;
            }

            if f_reflected < simplex[N - 1].1 {
                simplex[N] = (reflected, f_reflected);
                continue;
            }

            let (contracted, f_contracted) = if f_reflected < simplex[N].1 {
                let p = along(-0.5);
                (p, eval(&p))
            } else {
                let p = along(0.5);
                (p, eval(&p))
            };

            if f_contracted < simplex[N].1.min(f_reflected) {
                simplex[N] = (contracted, f_contracted);
                continue;
            }

            // 收缩到最优点
            let best_point = simplex[0].0;
            for vertex in simplex.iter_mut().skip(1) {
                let mut p = [0.0; N];
                for i in 0..N {
                    p[i] = best_point[i] + 0.5 * (vertex.0[i] - best_point[i]);
                }
                *vertex = (p, eval(&p));
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        Minimum {
            point: simplex[0].0,
            value: simplex[0].1,
            iterations,
            converged,
        }
    }
}
