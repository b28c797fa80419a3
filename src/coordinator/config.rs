// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// How long computed suggestions stay valid for an unchanged session.
    pub suggestion_ttl: Duration,
    pub classifier_timeout: Duration,
    pub engine_timeout: Duration,
    /// Past sets per exercise the suggestion engine may look at.
    pub history_limit: usize,
    /// Re-read the session after every apply and resync on drift.
    pub verify_after_apply: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            suggestion_ttl: Duration::from_secs(5 * 60),
            classifier_timeout: Duration::from_secs(20),
            engine_timeout: Duration::from_secs(20),
            history_limit: 10,
            verify_after_apply: false,
        }
    }
}
