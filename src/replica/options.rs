use std::convert::TryFrom;

#[derive(Clone, Default)]
pub struct ReplicaOptions {
    /// Chance, per request, that the replica dies before replying. Defaults to 0.3.
    pub crash_probability: Option<f64>,
}

pub(super) struct ReplicaOptionsValidated {
    pub crash_probability: f64,
}

impl ReplicaOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=1.0).contains(&self.crash_probability) {
            return Err("Crash probability must be within [0, 1]");
        }

        Ok(())
    }
}

impl TryFrom<ReplicaOptions> for ReplicaOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ReplicaOptions) -> Result<Self, Self::Error> {
        let values = ReplicaOptionsValidated {
            crash_probability: options.crash_probability.unwrap_or(0.3),
        };

        values.validate()?;
        Ok(values)
    }
}
