use std::time::Duration;

/// Fixed-attempt exponential backoff.
///
/// Delays are only slept *between* attempts, so the final multiplication step
/// of a schedule is never waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
}

/// AddPolicyGrant: 5 attempts, 5s doubling.
pub const ADD_GRANT_SCHEDULE: RetrySchedule = RetrySchedule {
    max_attempts: 5,
    initial_delay: Duration::from_secs(5),
    multiplier: 2,
};

/// RemovePolicyGrant: 3 attempts, 5s tripling.
pub const REMOVE_GRANT_SCHEDULE: RetrySchedule = RetrySchedule {
    max_attempts: 3,
    initial_delay: Duration::from_secs(5),
    multiplier: 3,
};

impl RetrySchedule {
    /// Delay to wait after the given 1-based attempt fails, or `None` when
    /// that attempt was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.saturating_pow(attempt - 1);
        Some(self.initial_delay.saturating_mul(factor))
    }

    pub fn delays(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .filter_map(|attempt| self.delay_after(attempt))
            .collect()
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { attempts: u32 },
    Exhausted { attempts: u32, last_error: String },
}

/// Runs `operation` until it succeeds or the schedule runs out.
///
/// `on_failure` sees each failed attempt together with the delay that will
/// follow it (`None` for the final attempt). Errors never escape: exhaustion
/// is reported as [`ApplyOutcome::Exhausted`].
pub fn run_with_retry(
    schedule: &RetrySchedule,
    sleeper: &dyn Sleeper,
    mut operation: impl FnMut(u32) -> Result<(), String>,
    mut on_failure: impl FnMut(u32, &str, Option<Duration>),
) -> ApplyOutcome {
    let mut last_error = String::new();
    for attempt in 1..=schedule.max_attempts {
        match operation(attempt) {
            Ok(()) => return ApplyOutcome::Applied { attempts: attempt },
            Err(error) => {
                let delay = schedule.delay_after(attempt);
                on_failure(attempt, &error, delay);
                last_error = error;
                if let Some(delay) = delay {
                    sleeper.sleep(delay);
                }
            }
        }
    }

    ApplyOutcome::Exhausted {
        attempts: schedule.max_attempts,
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_secs).collect()
    }

    #[test]
    fn add_schedule_doubles_from_five_seconds() {
        assert_eq!(ADD_GRANT_SCHEDULE.delays(), secs(&[5, 10, 20, 40]));
        assert_eq!(ADD_GRANT_SCHEDULE.delay_after(5), None);
    }

    #[test]
    fn remove_schedule_triples_from_five_seconds() {
        assert_eq!(REMOVE_GRANT_SCHEDULE.delays(), secs(&[5, 15]));
        assert_eq!(REMOVE_GRANT_SCHEDULE.delay_after(3), None);
    }

    #[test]
    fn stops_at_first_success() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let outcome = run_with_retry(
            &ADD_GRANT_SCHEDULE,
            &sleeper,
            |attempt| {
                calls += 1;
                if attempt < 3 {
                    Err(format!("throttled on attempt {attempt}"))
                } else {
                    Ok(())
                }
            },
            |_, _, _| {},
        );

        assert_eq!(outcome, ApplyOutcome::Applied { attempts: 3 });
        assert_eq!(calls, 3);
        assert_eq!(*sleeper.slept.borrow(), secs(&[5, 10]));
    }

    #[test]
    fn exhaustion_keeps_last_error_and_skips_trailing_sleep() {
        let sleeper = RecordingSleeper::default();
        let mut failures = Vec::new();

        let outcome = run_with_retry(
            &REMOVE_GRANT_SCHEDULE,
            &sleeper,
            |attempt| Err(format!("boom {attempt}")),
            |attempt, _, delay| failures.push((attempt, delay)),
        );

        assert_eq!(
            outcome,
            ApplyOutcome::Exhausted {
                attempts: 3,
                last_error: "boom 3".to_string(),
            }
        );
        assert_eq!(*sleeper.slept.borrow(), secs(&[5, 15]));
        assert_eq!(
            failures,
            vec![
                (1, Some(Duration::from_secs(5))),
                (2, Some(Duration::from_secs(15))),
                (3, None),
            ]
        );
    }
}
