//! The category taxonomy and the record-type classifier.
//!
//! A category routes a day's readings to exactly one summariser. The
//! classifier is a fixed lookup over the Apple Health type vocabulary;
//! record types outside the table are expected and silently skipped by
//! callers.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// One of the nine fixed domains a reading can belong to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Vitals,
  Activity,
  Sleep,
  Body,
  Nutrition,
  Fitness,
  Mindfulness,
  Workout,
  Other,
}

impl Category {
  /// The discriminant string stored in the `category` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Vitals => "vitals",
      Self::Activity => "activity",
      Self::Sleep => "sleep",
      Self::Body => "body",
      Self::Nutrition => "nutrition",
      Self::Fitness => "fitness",
      Self::Mindfulness => "mindfulness",
      Self::Workout => "workout",
      Self::Other => "other",
    }
  }

  /// All categories, in summariser-dispatch order.
  pub const ALL: [Category; 9] = [
    Self::Vitals,
    Self::Activity,
    Self::Sleep,
    Self::Body,
    Self::Nutrition,
    Self::Fitness,
    Self::Mindfulness,
    Self::Workout,
    Self::Other,
  ];

  /// One-line human description, used by the CLI `stats` report.
  pub fn describe(self) -> &'static str {
    match self {
      Self::Vitals => "Heart rate, HRV, blood pressure, SpO2, respiratory rate",
      Self::Activity => {
        "Steps, distance, active energy, exercise time, flights climbed"
      }
      Self::Sleep => "Sleep analysis, sleep stages, sleep duration",
      Self::Body => "Weight, height, BMI, body fat percentage",
      Self::Nutrition => "Calories, protein, carbs, fat, water intake",
      Self::Fitness => "VO2 Max, readiness scores",
      Self::Mindfulness => "Mindful sessions, meditation",
      Self::Workout => "Exercise sessions, workout details",
      Self::Other => "Documents, clinical photos, misc",
    }
  }
}

impl std::str::FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "vitals" => Ok(Self::Vitals),
      "activity" => Ok(Self::Activity),
      "sleep" => Ok(Self::Sleep),
      "body" => Ok(Self::Body),
      "nutrition" => Ok(Self::Nutrition),
      "fitness" => Ok(Self::Fitness),
      "mindfulness" => Ok(Self::Mindfulness),
      "workout" => Ok(Self::Workout),
      "other" => Ok(Self::Other),
      other => Err(Error::UnknownCategory(other.to_owned())),
    }
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Classifier ──────────────────────────────────────────────────────────────

/// Map an exporter record-type identifier to its `(Category, short name)`
/// pair. Returns `None` for types outside the supported vocabulary; the
/// caller skips the record; this is not an error.
pub fn classify(record_type: &str) -> Option<(Category, &'static str)> {
  use Category::*;
  Some(match record_type {
    // Vitals
    "HKQuantityTypeIdentifierHeartRate" => (Vitals, "HeartRate"),
    "HKQuantityTypeIdentifierRestingHeartRate" => (Vitals, "RestingHR"),
    "HKQuantityTypeIdentifierWalkingHeartRateAverage" => (Vitals, "WalkingHR"),
    "HKQuantityTypeIdentifierHeartRateVariabilitySDNN" => (Vitals, "HRV"),
    "HKQuantityTypeIdentifierOxygenSaturation" => (Vitals, "SpO2"),
    "HKQuantityTypeIdentifierRespiratoryRate" => (Vitals, "RespiratoryRate"),
    "HKQuantityTypeIdentifierBloodPressureSystolic" => (Vitals, "BPSystolic"),
    "HKQuantityTypeIdentifierBloodPressureDiastolic" => (Vitals, "BPDiastolic"),
    "HKQuantityTypeIdentifierBloodGlucose" => (Vitals, "BloodGlucose"),
    "HKQuantityTypeIdentifierBodyTemperature" => (Vitals, "BodyTemp"),
    // Activity
    "HKQuantityTypeIdentifierStepCount" => (Activity, "Steps"),
    "HKQuantityTypeIdentifierDistanceWalkingRunning" => (Activity, "Distance"),
    "HKQuantityTypeIdentifierActiveEnergyBurned" => (Activity, "ActiveEnergy"),
    "HKQuantityTypeIdentifierBasalEnergyBurned" => (Activity, "BasalEnergy"),
    "HKQuantityTypeIdentifierFlightsClimbed" => (Activity, "FlightsClimbed"),
    "HKQuantityTypeIdentifierAppleExerciseTime" => (Activity, "ExerciseTime"),
    "HKQuantityTypeIdentifierAppleStandTime" => (Activity, "StandTime"),
    // Sleep
    "HKCategoryTypeIdentifierSleepAnalysis" => (Sleep, "SleepAnalysis"),
    // Body
    "HKQuantityTypeIdentifierBodyMass" => (Body, "Weight"),
    "HKQuantityTypeIdentifierHeight" => (Body, "Height"),
    "HKQuantityTypeIdentifierBodyMassIndex" => (Body, "BMI"),
    "HKQuantityTypeIdentifierBodyFatPercentage" => (Body, "BodyFat"),
    "HKQuantityTypeIdentifierLeanBodyMass" => (Body, "LeanMass"),
    // Nutrition
    "HKQuantityTypeIdentifierDietaryEnergyConsumed" => (Nutrition, "Calories"),
    "HKQuantityTypeIdentifierDietaryProtein" => (Nutrition, "Protein"),
    "HKQuantityTypeIdentifierDietaryCarbohydrates" => (Nutrition, "Carbs"),
    "HKQuantityTypeIdentifierDietaryFatTotal" => (Nutrition, "Fat"),
    "HKQuantityTypeIdentifierDietaryWater" => (Nutrition, "Water"),
    // Fitness
    "HKQuantityTypeIdentifierVO2Max" => (Fitness, "VO2Max"),
    // Mindfulness
    "HKCategoryTypeIdentifierMindfulSession" => (Mindfulness, "MindfulSession"),
    _ => return None,
  })
}

/// Whether a record type accumulates over a day (summed by its summariser).
///
/// Documentation of the taxonomy rather than an aggregation input; the
/// per-category summarisers encode the same rule directly.
pub fn is_daily_cumulative(record_type: &str) -> bool {
  matches!(
    record_type,
    "HKQuantityTypeIdentifierStepCount"
      | "HKQuantityTypeIdentifierDistanceWalkingRunning"
      | "HKQuantityTypeIdentifierActiveEnergyBurned"
      | "HKQuantityTypeIdentifierBasalEnergyBurned"
      | "HKQuantityTypeIdentifierFlightsClimbed"
      | "HKQuantityTypeIdentifierAppleExerciseTime"
      | "HKQuantityTypeIdentifierAppleStandTime"
      | "HKQuantityTypeIdentifierDietaryEnergyConsumed"
      | "HKQuantityTypeIdentifierDietaryProtein"
      | "HKQuantityTypeIdentifierDietaryCarbohydrates"
      | "HKQuantityTypeIdentifierDietaryFatTotal"
      | "HKQuantityTypeIdentifierDietaryWater"
  )
}

/// Whether a record type is counted by occurrence rather than by value.
pub fn is_occurrence_counted(record_type: &str) -> bool {
  matches!(
    record_type,
    "HKCategoryTypeIdentifierSleepAnalysis"
      | "HKCategoryTypeIdentifierMindfulSession"
  )
}
