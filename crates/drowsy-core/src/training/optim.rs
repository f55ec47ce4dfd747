//! Adam with L2-coupled weight decay.
//!
//! `candle_nn::AdamW` decouples weight decay from the gradient. This variant
//! folds the penalty into the gradient before the moment updates, which is
//! the classic Adam formulation:
//!
//! ```text
//! g  = grad + weight_decay * theta
//! m  = beta1 * m + (1 - beta1) * g
//! v  = beta2 * v + (1 - beta2) * g^2
//! theta -= lr * m_hat / (sqrt(v_hat) + eps)
//! ```
//!
//! A variable that received no gradient in a step is skipped entirely,
//! including its decay term.

// Step counters fit comfortably in i32
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use candle_core::backprop::GradStore;
use candle_core::{Result, Var};
use candle_nn::Optimizer;

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsAdam {
    /// Step size.
    pub lr: f64,
    /// First moment decay.
    pub beta1: f64,
    /// Second moment decay.
    pub beta2: f64,
    /// Denominator epsilon.
    pub eps: f64,
    /// L2 penalty coefficient.
    pub weight_decay: f64,
}

impl Default for ParamsAdam {
    fn default() -> Self {
        Self {
            lr: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
        }
    }
}

#[derive(Debug)]
struct VarAdam {
    var: Var,
    first_moment: Var,
    second_moment: Var,
}

/// Adam optimizer over a set of candle variables.
#[derive(Debug)]
pub struct Adam {
    vars: Vec<VarAdam>,
    step_t: usize,
    params: ParamsAdam,
}

impl Adam {
    /// Current hyperparameters.
    #[must_use]
    pub const fn params(&self) -> &ParamsAdam {
        &self.params
    }

    /// Number of steps taken.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.step_t
    }
}

impl Optimizer for Adam {
    type Config = ParamsAdam;

    fn new(vars: Vec<Var>, params: ParamsAdam) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(|var| {
                let first_moment = Var::zeros(var.shape(), var.dtype(), var.device())?;
                let second_moment = Var::zeros(var.shape(), var.dtype(), var.device())?;
                Ok(VarAdam {
                    var,
                    first_moment,
                    second_moment,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vars,
            step_t: 0,
            params,
        })
    }

    fn learning_rate(&self) -> f64 {
        self.params.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.params.lr = lr;
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.step_t += 1;
        let ParamsAdam {
            lr,
            beta1,
            beta2,
            eps,
            weight_decay,
        } = self.params;
        let scale_m = 1.0 / (1.0 - beta1.powi(self.step_t as i32));
        let scale_v = 1.0 / (1.0 - beta2.powi(self.step_t as i32));

        for state in &self.vars {
            let theta = &state.var;
            // No gradient: no decay and no moment update
            let Some(grad) = grads.get(theta.as_tensor()) else {
                continue;
            };

            let grad = if weight_decay == 0.0 {
                grad.clone()
            } else {
                (grad + (theta.as_tensor() * weight_decay)?)?
            };

            let m = &state.first_moment;
            let v = &state.second_moment;
            let next_m = ((m.as_tensor() * beta1)? + (&grad * (1.0 - beta1))?)?;
            let next_v = ((v.as_tensor() * beta2)? + (grad.sqr()? * (1.0 - beta2))?)?;

            let m_hat = (&next_m * scale_m)?;
            let v_hat = (&next_v * scale_v)?;
            let update = (m_hat / (v_hat.sqrt()? + eps)?)?;
            let next_theta = (theta.as_tensor() - (update * lr)?)?;

            m.set(&next_m)?;
            v.set(&next_v)?;
            theta.set(&next_theta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use candle_core::{Device, Tensor};

    fn scalar_var(value: f32) -> Var {
        Var::from_tensor(&Tensor::new(&[value], &Device::Cpu).unwrap()).unwrap()
    }

    fn value(var: &Var) -> f32 {
        var.as_tensor().to_vec1::<f32>().unwrap()[0]
    }

    #[test]
    fn test_first_step_moves_by_lr() {
        // With bias correction the first step is lr * sign(grad)
        let x = scalar_var(1.0);
        let mut opt = Adam::new(
            vec![x.clone()],
            ParamsAdam {
                lr: 0.1,
                ..ParamsAdam::default()
            },
        )
        .unwrap();

        let loss = (x.as_tensor() * 3.0).unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();

        assert!((value(&x) - 0.9).abs() < 1e-5);
        assert_eq!(opt.steps(), 1);
    }

    #[test]
    fn test_zero_grad_without_decay_is_noop() {
        let x = scalar_var(2.0);
        let mut opt = Adam::new(vec![x.clone()], ParamsAdam::default()).unwrap();

        let loss = (x.as_tensor() * 0.0).unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();

        assert!((value(&x) - 2.0).abs() < 1e-6);
    }

    fn decay_step(weight_decay: f64) -> f32 {
        let x = scalar_var(2.0);
        let mut opt = Adam::new(
            vec![x.clone()],
            ParamsAdam {
                lr: 0.1,
                weight_decay,
                ..ParamsAdam::default()
            },
        )
        .unwrap();

        let loss = x.as_tensor().neg().unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();
        value(&x)
    }

    #[test]
    fn test_weight_decay_is_added_to_gradient() {
        // grad = -1 + 0.5 * 2 = 0, so the parameter stays put
        assert_eq!(decay_step(0.5), 2.0);
        // Without decay the first step is +lr
        assert!((decay_step(0.0) - 2.1).abs() < 1e-5);
    }

    #[test]
    fn test_variable_without_gradient_is_skipped() {
        let x = scalar_var(2.0);
        let unused = scalar_var(3.0);
        let mut opt = Adam::new(
            vec![x.clone(), unused.clone()],
            ParamsAdam {
                lr: 0.1,
                weight_decay: 0.5,
                ..ParamsAdam::default()
            },
        )
        .unwrap();

        let loss = x.as_tensor().neg().unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();

        assert_eq!(value(&unused), 3.0);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let x = scalar_var(5.0);
        let mut opt = Adam::new(
            vec![x.clone()],
            ParamsAdam {
                lr: 0.1,
                ..ParamsAdam::default()
            },
        )
        .unwrap();

        for _ in 0..500 {
            let loss = x.as_tensor().sqr().unwrap().sum_all().unwrap();
            opt.backward_step(&loss).unwrap();
        }
        assert!(value(&x).abs() < 0.5);
    }

    #[test]
    fn test_set_learning_rate() {
        let mut opt = Adam::new(vec![scalar_var(0.0)], ParamsAdam::default()).unwrap();
        opt.set_learning_rate(0.5);
        assert!((opt.learning_rate() - 0.5).abs() < f64::EPSILON);
        assert!((opt.params().lr - 0.5).abs() < f64::EPSILON);
    }
}
