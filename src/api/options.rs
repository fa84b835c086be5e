use std::convert::TryFrom;
use std::num::{NonZeroU32, NonZeroUsize};
use tokio::time::Duration;

/// Tuning knobs for the failover client. Unset fields take their defaults. None of these values
/// are part of the failover algorithm itself; pick them per deployment.
#[derive(Clone, Default)]
pub struct FailoverOptions {
    /// Budget for one attempt against one replica, connect through reply. Default 1s.
    pub attempt_timeout: Option<Duration>,
    /// Full passes over the replica list before giving up. Default 3.
    pub max_rounds: Option<u32>,
    /// Pause between rounds. Default 200ms.
    pub inter_round_delay: Option<Duration>,
    /// Logical requests allowed to dispatch at once in concurrent runs. Default 10.
    pub max_in_flight: Option<usize>,
    /// Pause between logical requests in sequential runs. Default 0.
    pub request_interval: Option<Duration>,
}

pub(super) struct FailoverOptionsValidated {
    pub attempt_timeout: Duration,
    pub max_rounds: NonZeroU32,
    pub inter_round_delay: Duration,
    pub max_in_flight: NonZeroUsize,
    pub request_interval: Duration,
}

impl TryFrom<FailoverOptions> for FailoverOptionsValidated {
    type Error = &'static str;

    fn try_from(options: FailoverOptions) -> Result<Self, Self::Error> {
        let attempt_timeout = options.attempt_timeout.unwrap_or(Duration::from_secs(1));
        if attempt_timeout == Duration::from_secs(0) {
            return Err("Attempt timeout must be greater than zero");
        }

        let max_rounds =
            NonZeroU32::new(options.max_rounds.unwrap_or(3)).ok_or("Max rounds must be at least 1")?;
        let max_in_flight =
            NonZeroUsize::new(options.max_in_flight.unwrap_or(10)).ok_or("Max in-flight requests must be at least 1")?;

        Ok(FailoverOptionsValidated {
            attempt_timeout,
            max_rounds,
            inter_round_delay: options.inter_round_delay.unwrap_or(Duration::from_millis(200)),
            max_in_flight,
            request_interval: options.request_interval.unwrap_or(Duration::from_secs(0)),
        })
    }
}
