//! Moment-adaptive gradient steps (Kingma & Ba, 2015).

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// Running first and second moment estimates for one flat parameter vector.
///
/// Callers own the parameters and hand them in on every [`Adam::apply`];
/// an intercept is simply one more coordinate.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    first_moment: Vec<f64>,
    second_moment: Vec<f64>,
    beta1_power: f64,
    beta2_power: f64,
}

impl Adam {
    pub fn new(dim: usize, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            first_moment: vec![0.0; dim],
            second_moment: vec![0.0; dim],
            beta1_power: 1.0,
            beta2_power: 1.0,
        }
    }

    pub fn dim(&self) -> usize {
        self.first_moment.len()
    }

    /// Move `params` one bias-corrected step against `grad`.
    pub fn apply(&mut self, params: &mut [f64], grad: &[f64]) {
        debug_assert_eq!(params.len(), self.dim());
        debug_assert_eq!(grad.len(), self.dim());

        self.beta1_power *= BETA1;
        self.beta2_power *= BETA2;
        let m_scale = 1.0 / (1.0 - self.beta1_power);
        let v_scale = 1.0 / (1.0 - self.beta2_power);

        let moments = self.first_moment.iter_mut().zip(self.second_moment.iter_mut());
        for ((param, &g), (m, v)) in params.iter_mut().zip(grad).zip(moments) {
            *m += (1.0 - BETA1) * (g - *m);
            *v += (1.0 - BETA2) * (g * g - *v);
            *param -= self.learning_rate * (*m * m_scale) / ((*v * v_scale).sqrt() + EPSILON);
        }
    }
}
