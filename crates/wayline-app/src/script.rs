//! Scripted navigation sessions: one entry per location fix, carrying what the
//! routing engine and the platform should report while that fix is processed.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wayline_core::{CarDirection, Distance, Location, RouteFollowingInfo};

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationScript {
    #[serde(default, rename = "tick")]
    pub ticks: Vec<ScriptTick>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptTick {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_true")]
    pub navigating: bool,
    #[serde(default = "default_true")]
    pub notifications_allowed: bool,
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub route: Option<RouteStep>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteStep {
    pub direction: CarDirection,
    pub distance: Distance,
    #[serde(default)]
    pub street: String,
}

impl ScriptTick {
    pub fn location(&self, timestamp: DateTime<Utc>) -> Location {
        Location::new(self.latitude, self.longitude, timestamp)
    }

    pub fn following_info(&self) -> Option<RouteFollowingInfo> {
        self.route.as_ref().map(|step| RouteFollowingInfo {
            car_direction: step.direction,
            dist_to_turn: step.distance,
            next_street: step.street.clone(),
        })
    }
}

/// Timestamp of fix number `seq` when fixes arrive `period_ms` apart.
/// Offsets too large to represent saturate at the latest representable time.
pub fn fix_time(started: DateTime<Utc>, period_ms: u64, seq: usize) -> DateTime<Utc> {
    let offset_ms = period_ms.saturating_mul(seq as u64);
    i64::try_from(offset_ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .and_then(|offset| started.checked_add_signed(offset))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Counts reported by `wayline validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSummary {
    pub ticks: usize,
    pub navigating: usize,
    pub prompts: usize,
    pub with_route: usize,
    pub notifications_blocked: usize,
}

impl NavigationScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let script: NavigationScript = toml::from_str(content)?;
        if script.ticks.is_empty() {
            anyhow::bail!("script has no [[tick]] entries");
        }
        Ok(script)
    }

    pub fn summary(&self) -> ScriptSummary {
        ScriptSummary {
            ticks: self.ticks.len(),
            navigating: self.ticks.iter().filter(|t| t.navigating).count(),
            prompts: self.ticks.iter().map(|t| t.prompts.len()).sum(),
            with_route: self.ticks.iter().filter(|t| t.route.is_some()).count(),
            notifications_blocked: self
                .ticks
                .iter()
                .filter(|t| !t.notifications_allowed)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayline_core::DistanceUnits;

    const SCRIPT: &str = r#"
        [[tick]]
        latitude = 52.5200
        longitude = 13.4050
        prompts = ["In 200 meters, turn right"]
        route = { direction = "turn_right", distance = { value = 200.0, units = "meters" }, street = "Main St" }

        [[tick]]
        latitude = 52.5203
        longitude = 13.4051
        notifications_allowed = false

        [[tick]]
        latitude = 52.5210
        longitude = 13.4060
        navigating = false
    "#;

    #[test]
    fn parse_applies_defaults() {
        let script = NavigationScript::parse(SCRIPT).unwrap();
        assert_eq!(script.ticks.len(), 3);
        let first = &script.ticks[0];
        assert!(first.navigating);
        assert!(first.notifications_allowed);
        let info = first.following_info().unwrap();
        assert_eq!(info.car_direction, CarDirection::TurnRight);
        assert_eq!(info.dist_to_turn, Distance::new(200.0, DistanceUnits::Meters));
        assert_eq!(info.next_street, "Main St");
        assert!(script.ticks[1].following_info().is_none());
    }

    #[test]
    fn summary_counts() {
        let summary = NavigationScript::parse(SCRIPT).unwrap().summary();
        assert_eq!(
            summary,
            ScriptSummary {
                ticks: 3,
                navigating: 2,
                prompts: 1,
                with_route: 1,
                notifications_blocked: 1,
            }
        );
    }

    #[test]
    fn empty_script_is_rejected() {
        assert!(NavigationScript::parse("").is_err());
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let bad = r#"
            [[tick]]
            latitude = 0.0
            longitude = 0.0
            route = { direction = "teleport", distance = { value = 1.0, units = "meters" } }
        "#;
        assert!(NavigationScript::parse(bad).is_err());
    }

    #[test]
    fn fix_time_spaces_fixes_by_period() {
        let started = Utc::now();
        assert_eq!(fix_time(started, 1000, 0), started);
        assert_eq!(fix_time(started, 1000, 3), started + chrono::Duration::seconds(3));
    }

    #[test]
    fn fix_time_saturates_on_huge_period() {
        let started = Utc::now();
        assert_eq!(fix_time(started, u64::MAX, 2), DateTime::<Utc>::MAX_UTC);
        assert_eq!(fix_time(started, i64::MAX as u64, 1), DateTime::<Utc>::MAX_UTC);
    }
}
