//! Linear SVM with sigmoid (Platt) probability calibration.
//!
//! [`LinearSvm`] is an L2-regularized squared-hinge-loss SVM solved with dual
//! coordinate descent. It only produces margins, so [`CalibratedSvm`] fits
//! one SVM per stratified fold and maps each SVM's held-out margins to
//! probabilities with [`PlattScaling`]. Predictions average the calibrated
//! probabilities of all folds.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};
use crate::feature::SparseVector;
use crate::ml::split::{stratified_k_fold, take};
use crate::ml::{BinaryClassifier, Label, balanced_class_weights, check_training_data};

/// SVM and calibration hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Penalty of the squared hinge loss.
    pub c: f64,
    /// Maximum number of passes over the data.
    pub max_iter: usize,
    /// Stop once the projected-gradient spread falls below this value.
    pub tol: f64,
    /// Number of stratified folds used for calibration.
    pub calibration_folds: usize,
    /// Seed of the coordinate-descent visiting order.
    pub seed: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 10000,
            tol: 1e-4,
            calibration_folds: 3,
            seed: 42,
        }
    }
}

impl SvmConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) || !(self.tol > 0.0) || self.max_iter == 0 {
            return Err(SpamSiftError::invalid_config(format!(
                "svm needs positive c, tol and max_iter: {self:?}"
            )));
        }
        if self.calibration_folds < 2 {
            return Err(SpamSiftError::invalid_config(
                "svm calibration needs at least 2 folds",
            ));
        }
        Ok(())
    }
}

/// A linear large-margin classifier `sign(w·x + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearSvm {
    /// Fit with class-balanced penalties.
    ///
    /// The bias is learned as the weight of a constant feature 1.0 and is
    /// regularized together with `w`.
    pub fn fit(rows: &[SparseVector], labels: &[Label], config: &SvmConfig) -> Result<Self> {
        config.validate()?;
        let n_features = check_training_data(rows, labels)?;
        let class_weight = balanced_class_weights(labels)?;

        let n = rows.len();
        let y: Vec<f64> = labels.iter().map(|l| l.sign()).collect();
        // Squared hinge loss: diagonal term 1/(2·Cᵢ), no upper bound on alpha.
        let diag: Vec<f64> = labels
            .iter()
            .map(|l| 0.5 / (config.c * class_weight[l.as_index()]))
            .collect();
        let qd: Vec<f64> = rows
            .iter()
            .zip(&diag)
            .map(|(row, d)| row.squared_norm() + 1.0 + d)
            .collect();

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;
        let mut alpha = vec![0.0; n];
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut converged = false;
        let mut passes = 0;

        while passes < config.max_iter {
            passes += 1;
            order.shuffle(&mut rng);
            let mut pg_max = f64::NEG_INFINITY;
            let mut pg_min = f64::INFINITY;

            for &i in &order {
                let row = &rows[i];
                let g = y[i] * (row.dot(&weights) + bias) - 1.0 + diag[i] * alpha[i];
                let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
                pg_max = pg_max.max(pg);
                pg_min = pg_min.min(pg);

                if pg.abs() > 1e-12 {
                    let old = alpha[i];
                    alpha[i] = (old - g / qd[i]).max(0.0);
                    let step = (alpha[i] - old) * y[i];
                    for (idx, value) in row.iter() {
                        weights[idx] += step * value;
                    }
                    bias += step;
                }
            }

            if pg_max - pg_min <= config.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "Linear SVM did not converge within {} passes (tol={})",
                config.max_iter,
                config.tol
            );
        }
        log::debug!("Linear SVM fitted in {passes} passes");

        Ok(Self { weights, bias })
    }

    /// Signed margin `w·x + b`; positive means spam.
    pub fn decision_function(&self, row: &SparseVector) -> Result<f64> {
        if row.dim() != self.weights.len() {
            return Err(SpamSiftError::feature_dimension(
                "svm input",
                self.weights.len(),
                row.dim(),
            ));
        }
        Ok(row.dot(&self.weights) + self.bias)
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }
}

/// Sigmoid calibration `P(spam | f) = 1 / (1 + exp(a·f + b))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit by Newton's method with backtracking line search on the
    /// regularized targets of Platt's method.
    pub fn fit(decisions: &[f64], labels: &[Label]) -> Result<Self> {
        if decisions.len() != labels.len() || decisions.is_empty() {
            return Err(SpamSiftError::training(
                "calibration needs one decision value per label",
            ));
        }

        const MAX_ITER: usize = 100;
        const MIN_STEP: f64 = 1e-10;
        const SIGMA: f64 = 1e-12;
        const EPS: f64 = 1e-5;

        let prior1 = labels.iter().filter(|l| **l == Label::Spam).count() as f64;
        let prior0 = labels.len() as f64 - prior1;
        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l == Label::Spam { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            decisions
                .iter()
                .zip(&targets)
                .map(|(&f, &t)| {
                    let z = f * a + b;
                    if z >= 0.0 {
                        t * z + (-z).exp().ln_1p()
                    } else {
                        (t - 1.0) * z + z.exp().ln_1p()
                    }
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..MAX_ITER {
            let (mut h11, mut h22, mut h21, mut g1, mut g2) = (SIGMA, SIGMA, 0.0, 0.0, 0.0);
            for (&f, &t) in decisions.iter().zip(&targets) {
                let z = f * a + b;
                let (p, q) = if z >= 0.0 {
                    let e = (-z).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = z.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let (new_a, new_b) = (a + step * da, b + step * db);
                let new_f = objective(new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }
            if step < MIN_STEP {
                log::debug!("Platt scaling line search stopped early");
                break;
            }
        }

        Ok(Self { a, b })
    }

    /// Probability of spam for a decision value.
    pub fn probability(&self, decision: f64) -> f64 {
        super::sigmoid(-(self.a * decision + self.b))
    }
}

/// One fold's SVM and its calibration map.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibratedMember {
    svm: LinearSvm,
    calibration: PlattScaling,
}

/// A linear SVM ensemble with k-fold sigmoid calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratedSvm {
    members: Vec<CalibratedMember>,
    n_features: usize,
}

impl CalibratedSvm {
    /// Fit one calibrated SVM per stratified fold (folds are not shuffled).
    pub fn fit(rows: &[SparseVector], labels: &[Label], config: &SvmConfig) -> Result<Self> {
        config.validate()?;
        let n_features = check_training_data(rows, labels)?;
        let folds = stratified_k_fold(labels, config.calibration_folds, None)?;

        let mut members = Vec::with_capacity(folds.len());
        for (fold_no, fold) in folds.iter().enumerate() {
            let train_rows = take(rows, &fold.train);
            let train_labels = take(labels, &fold.train);
            let svm = LinearSvm::fit(&train_rows, &train_labels, config)?;

            let decisions = fold
                .test
                .iter()
                .map(|&i| svm.decision_function(&rows[i]))
                .collect::<Result<Vec<f64>>>()?;
            let calibration = PlattScaling::fit(&decisions, &take(labels, &fold.test))?;
            log::debug!(
                "Calibration fold {fold_no}: a={:.4}, b={:.4}",
                calibration.a,
                calibration.b
            );
            members.push(CalibratedMember { svm, calibration });
        }

        Ok(Self {
            members,
            n_features,
        })
    }

    pub fn n_members(&self) -> usize {
        self.members.len()
    }

    /// Every member must match the declared width and hold finite parameters.
    pub fn check_consistency(&self) -> Result<()> {
        if self.members.is_empty() {
            return Err(SpamSiftError::artifact_load("calibrated svm has no members"));
        }
        for (no, member) in self.members.iter().enumerate() {
            if member.svm.n_features() != self.n_features {
                return Err(SpamSiftError::feature_dimension(
                    format!("svm member {no}"),
                    self.n_features,
                    member.svm.n_features(),
                ));
            }
            let CalibratedMember { svm, calibration } = member;
            let finite = svm.bias.is_finite()
                && svm.weights.iter().all(|w| w.is_finite())
                && calibration.a.is_finite()
                && calibration.b.is_finite();
            if !finite {
                return Err(SpamSiftError::artifact_load(format!(
                    "svm member {no} has non-finite parameters"
                )));
            }
        }
        Ok(())
    }
}

impl BinaryClassifier for CalibratedSvm {
    fn predict_proba(&self, row: &SparseVector) -> Result<f64> {
        if self.members.is_empty() {
            return Err(SpamSiftError::artifact_load("calibrated svm has no members"));
        }
        let mut total = 0.0;
        for member in &self.members {
            total += member
                .calibration
                .probability(member.svm.decision_function(row)?);
        }
        Ok(total / self.members.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "svm"
    }
}
