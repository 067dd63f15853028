// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stock ray predicates.

use crate::model::Model;
use crate::types::Visibility;

/// Accepts models whose visibility intersects `flag`, ignoring the finder's
/// own hierarchy.
///
/// This is what range sensors use: a laser passes `Visibility::RANGER` and
/// does not see the robot it is mounted on.
pub fn returns(
    flag: Visibility,
) -> impl Fn(&Model, Option<&Model>) -> bool + Copy + Send + Sync {
    move |candidate: &Model, finder: Option<&Model>| {
        candidate.visibility().intersects(flag)
            && finder.is_none_or(|f| !f.is_related(candidate))
    }
}

/// Accepts every model except the finder itself.
pub fn any_other() -> impl Fn(&Model, Option<&Model>) -> bool + Copy + Send + Sync {
    |candidate: &Model, finder: Option<&Model>| finder.is_none_or(|f| f.id() != candidate.id())
}
