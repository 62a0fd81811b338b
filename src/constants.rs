// SPDX-License-Identifier: Apache-2.0

/// Name used for OperatorGroups created by olmctl. At most one OperatorGroup
/// may exist per namespace, so an existing group is adopted instead.
pub const OPERATOR_GROUP_NAME: &str = "olmctl-og";

/// The operator name used as the field manager on writes
pub const OPERATOR_NAME: &str = "olmctl";

/// Polling configuration for bounded waits
pub mod poll {
    use std::time::Duration;

    /// Interval between checks while waiting for an install plan reference,
    /// catalog readiness, or a CSV phase transition
    pub const INTERVAL: Duration = Duration::from_millis(200);
}

/// Optimistic-concurrency retry configuration for install plan approval
pub mod approve {
    use std::time::Duration;

    /// Maximum update attempts before the last conflict is surfaced
    pub const MAX_ATTEMPTS: u32 = 5;
    /// Initial backoff between attempts, doubled after each conflict
    pub const BASE_BACKOFF: Duration = Duration::from_millis(10);
}
