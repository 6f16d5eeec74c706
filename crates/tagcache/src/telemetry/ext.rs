// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use tick::Clock;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedResult<R> {
    pub result: R,
    pub duration: Duration,
}

pub(crate) trait ClockExt {
    /// Runs `f` and measures it with this clock.
    fn timed_async<F, R>(&self, f: F) -> impl Future<Output = TimedResult<R>> + Send
    where
        F: Future<Output = R> + Send;
}

impl ClockExt for Clock {
    async fn timed_async<F, R>(&self, f: F) -> TimedResult<R>
    where
        F: Future<Output = R> + Send,
    {
        let start = self.instant();
        let result = f.await;
        TimedResult {
            result,
            duration: self.instant().saturating_duration_since(start),
        }
    }
}
