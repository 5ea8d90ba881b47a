use nalgebra::DVector;

/// Result of the forward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameterization {
    /// No profile from the requested start velocity reaches the requested end velocity.
    Infeasible,
    Feasible(VelocityProfile),
}

impl Parameterization {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible)
    }

    pub fn profile(&self) -> Option<&VelocityProfile> {
        match self {
            Self::Infeasible => None,
            Self::Feasible(profile) => Some(profile),
        }
    }

    pub fn into_profile(self) -> Option<VelocityProfile> {
        match self {
            Self::Infeasible => None,
            Self::Feasible(profile) => Some(profile),
        }
    }
}

/// Squared velocities at the `N + 1` grid points and controls over the `N`
/// stages. `None` marks entries the forward pass could not compute.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityProfile {
    xs: Vec<Option<f64>>,
    us: Vec<Option<f64>>,
    aux: Vec<Option<DVector<f64>>>,
    deltas: Vec<f64>,
}

impl VelocityProfile {
    pub(crate) fn new(
        xs: Vec<Option<f64>>,
        us: Vec<Option<f64>>,
        aux: Vec<Option<DVector<f64>>>,
        deltas: Vec<f64>,
    ) -> Self {
        Self {
            xs,
            us,
            aux,
            deltas,
        }
    }

    pub fn squared_velocities(&self) -> &[Option<f64>] {
        &self.xs
    }

    /// Path velocities `sd = sqrt(x)`.
    pub fn sd(&self) -> Vec<Option<f64>> {
        self.xs.iter().map(|x| x.map(|x| x.max(0.).sqrt())).collect()
    }

    /// Path accelerations, one per stage.
    pub fn sdd(&self) -> &[Option<f64>] {
        &self.us
    }

    pub fn aux(&self) -> &[Option<DVector<f64>>] {
        &self.aux
    }

    /// Every entry was computed.
    pub fn is_complete(&self) -> bool {
        self.xs.iter().all(Option::is_some) && self.us.iter().all(Option::is_some)
    }

    /// Time at each grid point, starting at 0.
    ///
    /// Over a stage the acceleration is constant, so it takes
    /// `2·delta / (sd_i + sd_{i+1})`. A stage with both ends at rest is never
    /// left and ends the known part of the timeline.
    pub fn time_stamps(&self) -> Vec<Option<f64>> {
        let sd = self.sd();
        let mut stamps = Vec::with_capacity(sd.len());
        let mut t = Some(0.);
        stamps.push(t);
        for (i, delta) in self.deltas.iter().enumerate() {
            t = match (t, sd[i], sd[i + 1]) {
                (Some(t), Some(a), Some(b)) if a + b > 0. => Some(t + 2. * delta / (a + b)),
                _ => None,
            };
            stamps.push(t);
        }
        stamps
    }

    /// Duration of the whole profile, when every stage was computed.
    pub fn duration(&self) -> Option<f64> {
        self.time_stamps().last().copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(xs: Vec<Option<f64>>, us: Vec<Option<f64>>) -> VelocityProfile {
        let n = us.len();
        VelocityProfile::new(xs, us, vec![Some(DVector::zeros(0)); n], vec![1.; n])
    }

    #[test]
    fn time_stamps_integrate_mean_velocity() {
        let p = profile(
            vec![Some(0.), Some(4.), Some(4.), Some(0.)],
            vec![Some(2.), Some(0.), Some(-2.)],
        );
        assert_eq!(
            p.time_stamps(),
            vec![Some(0.), Some(1.), Some(1.5), Some(2.5)]
        );
        assert_eq!(p.duration(), Some(2.5));
    }

    #[test]
    fn rest_to_rest_stage_has_no_duration() {
        let p = profile(vec![Some(0.), Some(0.)], vec![Some(0.)]);
        assert_eq!(p.time_stamps(), vec![Some(0.), None]);
        assert_eq!(p.duration(), None);
    }

    #[test]
    fn missing_entries_stay_missing() {
        let p = profile(vec![Some(1.), Some(0.25), None], vec![Some(-0.375), None]);
        assert!(!p.is_complete());
        assert_eq!(p.sd(), vec![Some(1.), Some(0.5), None]);
        assert_eq!(p.time_stamps()[2], None);
    }
}
