//! Derivative-free minimization for model estimation.
//!
//! A bounded Nelder-Mead simplex search; the ARIMA fitter minimizes its
//! conditional sum of squares with it.

/// Configuration for the simplex search.
#[derive(Debug, Clone)]
pub struct SimplexConfig {
    /// Maximum number of iterations (the optimizer's cancellation budget).
    pub max_iter: usize,
    /// Convergence tolerance on the objective spread across the simplex.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Relative step used to build the initial simplex.
    pub initial_step: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex search.
#[derive(Debug, Clone)]
pub struct SimplexOutcome {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed within tolerance before the budget
    /// ran out.
    pub converged: bool,
}

/// Minimize `objective` starting from `initial`, clamping every candidate
/// point to `bounds` when provided.
///
/// # Arguments
/// * `objective` - Function to minimize
/// * `initial` - Starting point; the simplex is built by perturbing each
///   coordinate by the configured step
/// * `bounds` - Per-coordinate `(low, high)` clamp, when provided
/// * `config` - Iteration budget, tolerance, and simplex coefficients
pub fn simplex_minimize<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &SimplexConfig,
) -> SimplexOutcome
where
    F: Fn(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        return SimplexOutcome {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(clamp(initial.to_vec(), bounds));
    for i in 0..dim {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(clamp(vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[dim];
        let second_worst = order[dim - 1];

        if values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; dim];
        for (idx, vertex) in simplex.iter().enumerate() {
            if idx != worst {
                for (c, v) in centroid.iter_mut().zip(vertex.iter()) {
                    *c += v;
                }
            }
        }
        for c in &mut centroid {
            *c /= dim as f64;
        }

        let spread = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if spread < config.tolerance {
            converged = true;
            break;
        }

        let reflected = clamp(
            combine(&centroid, &simplex[worst], 1.0 + config.alpha, -config.alpha),
            bounds,
        );
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            let expanded = clamp(
                combine(&centroid, &reflected, 1.0 - config.gamma, config.gamma),
                bounds,
            );
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction, outside or inside depending on the reflected value.
        let toward = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = clamp(
            combine(&centroid, toward, 1.0 - config.rho, config.rho),
            bounds,
        );
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink toward the best vertex.
        let anchor = simplex[best].clone();
        for idx in 0..=dim {
            if idx != best {
                for j in 0..dim {
                    simplex[idx][j] = anchor[j] + config.sigma * (simplex[idx][j] - anchor[j]);
                }
                simplex[idx] = clamp(simplex[idx].clone(), bounds);
                values[idx] = objective(&simplex[idx]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    SimplexOutcome {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// `weight_a * a + weight_b * b`, element-wise.
fn combine(a: &[f64], b: &[f64], weight_a: f64, weight_b: f64) -> Vec<f64> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| weight_a * x + weight_b * y)
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn clamp(point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point,
        Some(b) => point
            .into_iter()
            .enumerate()
            .map(|(i, x)| {
                if i < b.len() {
                    x.clamp(b[i].0, b[i].1)
                } else {
                    x
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_quadratic_2d() {
        let outcome = simplex_minimize(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            &SimplexConfig::default(),
        );

        assert!(outcome.converged);
        assert_relative_eq!(outcome.point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.point[1], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn minimizes_rosenbrock() {
        let config = SimplexConfig {
            max_iter: 5000,
            tolerance: 1e-10,
            ..Default::default()
        };
        let outcome = simplex_minimize(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            &config,
        );

        assert_relative_eq!(outcome.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(outcome.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained optimum at x = 5, bound caps at 3.
        let outcome = simplex_minimize(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            &SimplexConfig::default(),
        );

        assert_relative_eq!(outcome.point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn reports_non_convergence_within_budget() {
        let config = SimplexConfig {
            max_iter: 2,
            tolerance: 1e-14,
            ..Default::default()
        };
        let outcome = simplex_minimize(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-3.0, 7.0],
            None,
            &config,
        );

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 2);
    }

    #[test]
    fn empty_initial_point() {
        let outcome = simplex_minimize(|_| 0.0, &[], None, &SimplexConfig::default());
        assert!(!outcome.converged);
        assert!(outcome.value.is_nan());
    }
}
