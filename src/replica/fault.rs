use rand::Rng;

/// CrashFault decides, once per request, whether the replica dies before replying.
#[derive(Copy, Clone, Debug)]
pub(super) struct CrashFault {
    probability: f64,
}

impl CrashFault {
    /// `probability` must already be validated to lie within [0, 1].
    pub(super) fn new(probability: f64) -> Self {
        CrashFault { probability }
    }

    pub(super) fn should_crash(&self) -> bool {
        rand::thread_rng().gen_bool(self.probability)
    }
}
