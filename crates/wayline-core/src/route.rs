//! Value types exchanged with the routing engine and the location subsystem.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single location sample delivered by the location subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }
}

/// Maneuver the driver has to perform at the next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarDirection {
    NoTurn,
    GoStraight,
    TurnRight,
    TurnSharpRight,
    TurnSlightRight,
    TurnLeft,
    TurnSharpLeft,
    TurnSlightLeft,
    UTurnLeft,
    UTurnRight,
    EnterRoundAbout,
    LeaveRoundAbout,
    StayOnRoundAbout,
    StartAtEndOfStreet,
    ReachedYourDestination,
    ExitHighwayToLeft,
    ExitHighwayToRight,
}

impl CarDirection {
    /// Icon resource shown in the notification for this maneuver.
    pub fn icon_id(self) -> &'static str {
        match self {
            // No dedicated artwork for "no turn"; keep the straight arrow.
            CarDirection::NoTurn | CarDirection::GoStraight => "ic_turn_straight",
            CarDirection::TurnRight => "ic_turn_right",
            CarDirection::TurnSharpRight => "ic_turn_right_sharp",
            CarDirection::TurnSlightRight => "ic_turn_right_slight",
            CarDirection::TurnLeft => "ic_turn_left",
            CarDirection::TurnSharpLeft => "ic_turn_left_sharp",
            CarDirection::TurnSlightLeft => "ic_turn_left_slight",
            CarDirection::UTurnLeft => "ic_turn_uleft",
            CarDirection::UTurnRight => "ic_turn_uright",
            CarDirection::EnterRoundAbout
            | CarDirection::LeaveRoundAbout
            | CarDirection::StayOnRoundAbout => "ic_turn_round",
            CarDirection::StartAtEndOfStreet => "ic_turn_straight",
            CarDirection::ReachedYourDestination => "ic_turn_finish",
            CarDirection::ExitHighwayToLeft => "ic_exit_highway_to_left",
            CarDirection::ExitHighwayToRight => "ic_exit_highway_to_right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnits {
    Meters,
    Kilometers,
    Feet,
    Miles,
}

impl DistanceUnits {
    pub fn symbol(self) -> &'static str {
        match self {
            DistanceUnits::Meters => "m",
            DistanceUnits::Kilometers => "km",
            DistanceUnits::Feet => "ft",
            DistanceUnits::Miles => "mi",
        }
    }
}

/// Distance to the next turn, already expressed in display units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub units: DistanceUnits,
}

impl Distance {
    pub fn new(value: f64, units: DistanceUnits) -> Self {
        Self { value, units }
    }
}

impl fmt::Display for Distance {
    /// Short values keep one decimal ("1.5 km"), everything else is rounded ("200 m").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = (self.value * 10.0).round() / 10.0;
        if tenths < 10.0 && tenths.fract().abs() >= 0.05 {
            write!(f, "{:.1} {}", tenths, self.units.symbol())
        } else {
            write!(f, "{:.0} {}", self.value, self.units.symbol())
        }
    }
}

/// The routing engine's answer to "what should be displayed right now".
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFollowingInfo {
    pub car_direction: CarDirection,
    pub dist_to_turn: Distance,
    /// May be empty when the next road has no name.
    pub next_street: String,
}
