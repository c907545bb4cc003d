//! Category summarisers: pure functions from a day's grouped metrics and
//! the trailing-week baseline to narrative text plus a structured digest.
//!
//! Clauses are joined with `". "` and the narrative always ends in a
//! period; a day with no usable values degenerates to `"."`, which the
//! aggregator drops. No summariser performs I/O.

use serde_json::{Map, Value, json};
use vitalog_core::Category;

use crate::metrics::{DayMetrics, WeeklyBaseline, total_of};

/// Narrative and digest produced by one summariser for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
  pub text: String,
  pub data: Map<String, Value>,
}

/// Dispatch to the summariser for `category`. The closed enum guarantees
/// every category lands somewhere; `Other` takes the generic arm.
pub fn narrate(
  category: Category,
  metrics: &DayMetrics,
  weekly: &WeeklyBaseline,
) -> Narrative {
  match category {
    Category::Activity => activity(metrics, weekly),
    Category::Vitals => vitals(metrics, weekly),
    Category::Sleep => sleep(metrics),
    Category::Body => body(metrics, weekly),
    Category::Nutrition => nutrition(metrics),
    Category::Workout => workout(metrics),
    Category::Fitness => fitness(metrics, weekly),
    Category::Mindfulness => mindfulness(metrics),
    Category::Other => generic(metrics),
  }
}

// ─── Formatting helpers ──────────────────────────────────────────────────────

/// Round half-away-from-zero to a whole number and thousands-separate.
fn fmt_int(n: f64) -> String {
  let rounded = n.round() as i64;
  let digits = rounded.abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
  if rounded < 0 {
    out.push('-');
  }
  let lead = digits.len() % 3;
  for (i, c) in digits.chars().enumerate() {
    if i != 0 && (i + 3 - lead) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

fn round1(n: f64) -> f64 { (n * 10.0).round() / 10.0 }

/// One decimal place, rounded half away from zero.
fn fmt_1(n: f64) -> String { format!("{:.1}", round1(n)) }

/// Minutes as `"Hh Mm"` once ≥ 60, else `"M min"`.
fn fmt_duration(minutes: f64) -> String {
  let h = (minutes / 60.0).floor() as i64;
  let m = (minutes % 60.0).round() as i64;
  if h == 0 {
    format!("{m} min")
  } else {
    format!("{h}h {m}m")
  }
}

/// Percent-style fields arrive as either a fraction or a percentage.
fn as_percent(v: f64) -> f64 {
  if v <= 1.0 { v * 100.0 } else { v }
}

/// `" (above/below weekly avg of N)"`, rendered only when the baseline has
/// at least 3 samples and the value departs more than ±20 % from its
/// average.
fn weekly_note(
  weekly: &WeeklyBaseline,
  short_name: &str,
  value: f64,
) -> String {
  let Some(ctx) = weekly.get(short_name) else {
    return String::new();
  };
  if ctx.count < 3 {
    return String::new();
  }
  if value > ctx.avg * 1.2 {
    format!(" (above weekly avg of {})", fmt_int(ctx.avg))
  } else if value < ctx.avg * 0.8 {
    format!(" (below weekly avg of {})", fmt_int(ctx.avg))
  } else {
    String::new()
  }
}

fn seal(parts: Vec<String>, data: Map<String, Value>) -> Narrative {
  Narrative {
    text: parts.join(". ") + ".",
    data,
  }
}

// ─── Activity ────────────────────────────────────────────────────────────────

fn activity(metrics: &DayMetrics, weekly: &WeeklyBaseline) -> Narrative {
  let steps = total_of(metrics, "Steps");
  let distance = total_of(metrics, "Distance");
  let flights = total_of(metrics, "FlightsClimbed");
  let exercise = total_of(metrics, "ExerciseTime");
  let active_energy = total_of(metrics, "ActiveEnergy");
  let basal_energy = total_of(metrics, "BasalEnergy");
  let stand_time = total_of(metrics, "StandTime");

  let label = if steps > 12_000.0 {
    "Active day"
  } else if steps > 6_000.0 {
    "Moderate day"
  } else if steps > 0.0 {
    "Light day"
  } else {
    "Rest day"
  };

  let mut parts = vec![label.to_owned()];
  let mut data = Map::new();

  if steps > 0.0 {
    let mut s = format!("{} steps", fmt_int(steps));
    if distance > 0.0 {
      s.push_str(&format!(" ({} km)", fmt_1(distance)));
    }
    s.push_str(&weekly_note(weekly, "Steps", steps));
    parts.push(s);
    data.insert("steps".into(), (steps.round() as i64).into());
  }
  if distance > 0.0 {
    data.insert("distance_km".into(), round1(distance).into());
  }
  if flights > 0.0 {
    parts.push(format!("{} flights climbed", fmt_int(flights)));
    data.insert("flights".into(), (flights.round() as i64).into());
  }
  if exercise > 0.0 {
    parts.push(format!("Exercise: {}", fmt_duration(exercise)));
    data.insert("exercise_min".into(), (exercise.round() as i64).into());
  }
  if active_energy > 0.0 {
    parts.push(format!("Active energy: {} kcal", fmt_int(active_energy)));
    data.insert(
      "active_energy_kcal".into(),
      (active_energy.round() as i64).into(),
    );
  }
  if stand_time > 0.0 {
    parts.push(format!("Standing: {}", fmt_duration(stand_time)));
    data.insert("stand_time_min".into(), (stand_time.round() as i64).into());
  }
  if basal_energy > 0.0 {
    parts.push(format!("Basal: {} kcal", fmt_int(basal_energy)));
    data.insert(
      "basal_energy_kcal".into(),
      (basal_energy.round() as i64).into(),
    );
  }

  seal(parts, data)
}

// ─── Vitals ──────────────────────────────────────────────────────────────────

fn vitals(metrics: &DayMetrics, weekly: &WeeklyBaseline) -> Narrative {
  let mut parts = Vec::new();
  let mut data = Map::new();

  if let Some(resting) = metrics.get("RestingHR").filter(|m| !m.values.is_empty())
  {
    let avg = resting.mean();
    let mut s = format!("Resting heart rate: {} bpm", fmt_int(avg));
    // Min/max context beats the ±20 % note for resting HR: flag weekly
    // extremes, otherwise cite the average.
    if let Some(ctx) = weekly.get("RestingHR").filter(|c| c.count >= 3) {
      if avg <= ctx.min {
        s.push_str(" (lowest this week)");
      } else if avg >= ctx.max {
        s.push_str(" (highest this week)");
      } else {
        s.push_str(&format!(" (weekly avg {})", fmt_int(ctx.avg)));
      }
    }
    parts.push(s);
    data.insert("resting_hr_bpm".into(), (avg.round() as i64).into());
  }

  if let Some(hr) = metrics.get("HeartRate").filter(|m| !m.values.is_empty()) {
    let lo = hr.values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = hr.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    parts.push(format!(
      "Heart rate range: {}-{} bpm",
      fmt_int(lo),
      fmt_int(hi)
    ));
    data.insert("hr_min".into(), (lo.round() as i64).into());
    data.insert("hr_max".into(), (hi.round() as i64).into());
  }

  if let Some(hrv) = metrics.get("HRV").filter(|m| !m.values.is_empty()) {
    let avg = hrv.mean();
    parts.push(format!("HRV: {}ms (SDNN)", fmt_int(avg)));
    data.insert("hrv_ms".into(), (avg.round() as i64).into());
  }

  if let Some(spo2) = metrics.get("SpO2").filter(|m| !m.values.is_empty()) {
    let pct = as_percent(spo2.mean());
    parts.push(format!("SpO2: {}%", fmt_int(pct)));
    data.insert("spo2_pct".into(), (pct.round() as i64).into());
  }

  if let Some(rr) =
    metrics.get("RespiratoryRate").filter(|m| !m.values.is_empty())
  {
    let avg = rr.mean();
    parts.push(format!("Respiratory rate: {} breaths/min", fmt_1(avg)));
    data.insert("resp_rate".into(), round1(avg).into());
  }

  seal(parts, data)
}

// ─── Sleep ───────────────────────────────────────────────────────────────────

fn sleep(metrics: &DayMetrics) -> Narrative {
  let Some(sleep) = metrics.get("SleepAnalysis") else {
    return Narrative {
      text: "No sleep data recorded.".to_owned(),
      data: Map::new(),
    };
  };

  let total_min = sleep.total();
  let mut data = Map::new();

  // Two exporter conventions: duration-valued segments sum to a total;
  // category-only segments (stage names, no numeric value) are counted.
  let text = if total_min > 0.0 {
    data.insert("total_sleep_min".into(), (total_min.round() as i64).into());
    data.insert("total_sleep_hours".into(), round1(total_min / 60.0).into());
    format!("Sleep: {}.", fmt_duration(total_min))
  } else {
    let segments = sleep.occurrences();
    data.insert("segments".into(), segments.into());
    format!("Sleep: {segments} sleep segments recorded.")
  };

  Narrative { text, data }
}

// ─── Body ────────────────────────────────────────────────────────────────────

fn body(metrics: &DayMetrics, weekly: &WeeklyBaseline) -> Narrative {
  let mut parts = Vec::new();
  let mut data = Map::new();

  if let Some(val) = metrics.get("Weight").and_then(|m| m.last_value()) {
    let unit = metrics
      .get("Weight")
      .filter(|m| !m.unit.is_empty())
      .map_or("kg", |m| m.unit.as_str());
    let mut s = format!("Weight: {} {}", fmt_1(val), unit);
    if let Some(ctx) = weekly.get("Weight").filter(|c| c.count >= 2) {
      let diff = val - ctx.avg;
      if diff.abs() > 0.1 {
        let dir = if diff > 0.0 { "up" } else { "down" };
        s.push_str(&format!(" ({dir} {} from weekly avg)", fmt_1(diff.abs())));
      }
    }
    parts.push(s);
    data.insert("weight".into(), round1(val).into());
    data.insert("weight_unit".into(), unit.into());
  }

  if let Some(val) = metrics.get("BMI").and_then(|m| m.last_value()) {
    parts.push(format!("BMI: {}", fmt_1(val)));
    data.insert("bmi".into(), round1(val).into());
  }

  if let Some(val) = metrics.get("BodyFat").and_then(|m| m.last_value()) {
    let pct = as_percent(val);
    parts.push(format!("Body fat: {}%", fmt_1(pct)));
    data.insert("body_fat_pct".into(), round1(pct).into());
  }

  seal(parts, data)
}

// ─── Nutrition ───────────────────────────────────────────────────────────────

fn nutrition(metrics: &DayMetrics) -> Narrative {
  let calories = total_of(metrics, "Calories");
  let protein = total_of(metrics, "Protein");
  let carbs = total_of(metrics, "Carbs");
  let fat = total_of(metrics, "Fat");
  let water = total_of(metrics, "Water");

  let mut parts = Vec::new();
  let mut data = Map::new();

  if calories > 0.0 {
    parts.push(format!("Intake: {} kcal", fmt_int(calories)));
    data.insert("calories_kcal".into(), (calories.round() as i64).into());
  }

  let mut macros = Vec::new();
  if protein > 0.0 {
    macros.push(format!("Protein: {}g", fmt_int(protein)));
    data.insert("protein_g".into(), (protein.round() as i64).into());
  }
  if carbs > 0.0 {
    macros.push(format!("Carbs: {}g", fmt_int(carbs)));
    data.insert("carbs_g".into(), (carbs.round() as i64).into());
  }
  if fat > 0.0 {
    macros.push(format!("Fat: {}g", fmt_int(fat)));
    data.insert("fat_g".into(), (fat.round() as i64).into());
  }
  if !macros.is_empty() {
    parts.push(macros.join(", "));
  }

  if water > 0.0 {
    // Logged in millilitres; narrated in litres.
    parts.push(format!("Water: {}L", fmt_1(water / 1000.0)));
    data.insert("water_ml".into(), (water.round() as i64).into());
  }

  seal(parts, data)
}

// ─── Workout ─────────────────────────────────────────────────────────────────

fn workout(metrics: &DayMetrics) -> Narrative {
  let mut parts = Vec::new();
  let mut workouts = Vec::new();

  for (name, metric) in metrics {
    for &duration in &metric.values {
      parts.push(format!("Workout: {name}, {}", fmt_duration(duration)));
      workouts.push(json!({ "name": name, "duration": duration }));
    }
  }

  let mut data = Map::new();
  data.insert("count".into(), workouts.len().into());
  data.insert("workouts".into(), Value::Array(workouts));

  if parts.is_empty() {
    return Narrative {
      text: "No workout data.".to_owned(),
      data,
    };
  }
  seal(parts, data)
}

// ─── Fitness ─────────────────────────────────────────────────────────────────

fn fitness(metrics: &DayMetrics, weekly: &WeeklyBaseline) -> Narrative {
  let mut parts = Vec::new();
  let mut data = Map::new();

  if let Some(val) = metrics.get("VO2Max").and_then(|m| m.last_value()) {
    let mut s = format!("VO2 Max: {} mL/kg/min", fmt_1(val));
    s.push_str(&weekly_note(weekly, "VO2Max", val));
    parts.push(s);
    data.insert("vo2max".into(), round1(val).into());
  }

  if parts.is_empty() {
    return Narrative {
      text: "Fitness data recorded.".to_owned(),
      data,
    };
  }
  seal(parts, data)
}

// ─── Mindfulness ─────────────────────────────────────────────────────────────

fn mindfulness(metrics: &DayMetrics) -> Narrative {
  let session = metrics.get("MindfulSession");
  let count = session.map_or(0, |m| m.occurrences());
  let total_min = session.map_or(0.0, |m| m.total());

  let mut data = Map::new();
  data.insert("sessions".into(), count.into());
  data.insert("total_min".into(), (total_min.round() as i64).into());

  if count == 0 {
    return Narrative {
      text: "No mindfulness sessions recorded.".to_owned(),
      data,
    };
  }
  let plural = if count > 1 { "s" } else { "" };
  Narrative {
    text: format!(
      "Mindfulness: {count} session{plural}, {} total.",
      fmt_duration(total_min)
    ),
    data,
  }
}

// ─── Generic fallback ────────────────────────────────────────────────────────

fn generic(metrics: &DayMetrics) -> Narrative {
  let mut parts = Vec::new();
  let mut data = Map::new();

  for (name, metric) in metrics {
    if metric.values.is_empty() {
      continue;
    }
    let avg = metric.mean();
    parts.push(format!(
      "{name}: {} {} ({} readings)",
      fmt_1(avg),
      metric.unit,
      metric.values.len()
    ));
    data.insert(
      name.clone(),
      json!({ "avg": round1(avg), "count": metric.values.len() }),
    );
  }

  seal(parts, data)
}
