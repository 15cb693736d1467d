// src/trial/task.rs
//! Task naming for canonical records

use serde::Serialize;

use super::{LocomotionMode, TrialInfo};

/// Task name, id and free-form `key:value,...` info of a trial segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub task: String,
    pub task_id: String,
    pub task_info: String,
}

impl TaskDescriptor {
    /// Derive the descriptor from trial metadata and an optional segment label
    ///
    /// Labels such as `stairascent` or `rampdescent` decide the direction of
    /// stair and ramp segments; without a label the direction comes from the
    /// sign of the incline.
    pub fn from_segment(info: &TrialInfo, label: Option<&str>) -> Self {
        let label = label.map(|l| l.to_ascii_lowercase());
        let label = label.as_deref();

        let incline = info.incline_deg.unwrap_or(0.0);
        let (task, parameter) = match info.mode {
            LocomotionMode::Treadmill | LocomotionMode::LevelGround => {
                if incline.abs() > f64::EPSILON {
                    Self::slope_task(incline > 0.0, incline)
                } else {
                    (
                        "level_walking".to_string(),
                        info.speed_m_s.map(|s| format!("{:.2}", s)),
                    )
                }
            }
            LocomotionMode::Ramp => match label {
                Some(l) if l.contains("ascent") => Self::slope_task(true, incline),
                Some(l) if l.contains("descent") => Self::slope_task(false, incline),
                _ => Self::slope_task(incline >= 0.0, incline),
            },
            LocomotionMode::Stair => {
                let height = info.stair_height_mm.map(|h| format!("{:.0}", h.abs()));
                match label {
                    Some(l) if l.contains("ascent") => ("stair_ascent".to_string(), height),
                    Some(l) if l.contains("descent") => ("stair_descent".to_string(), height),
                    _ => ("stair_walking".to_string(), height),
                }
            }
        };

        let task_id = match parameter {
            Some(p) => format!("{}_{}", task, p),
            None => task.clone(),
        };

        Self {
            task,
            task_id,
            task_info: Self::info_string(info),
        }
    }

    fn slope_task(uphill: bool, incline: f64) -> (String, Option<String>) {
        let name = if uphill { "incline_walking" } else { "decline_walking" };
        (name.to_string(), Some(format!("{:.0}", incline.abs())))
    }

    fn info_string(info: &TrialInfo) -> String {
        let mut parts = Vec::new();
        if let Some(speed) = info.speed_m_s {
            parts.push(format!("speed_m_s:{}", speed));
        }
        if let Some(incline) = info.incline_deg {
            parts.push(format!("incline_deg:{}", incline));
        }
        if let Some(height) = info.stair_height_mm {
            parts.push(format!("stair_height_mm:{}", height));
        }
        parts.push(format!("treadmill:{}", info.mode == LocomotionMode::Treadmill));
        parts.push(format!("mode:{}", info.mode));
        parts.join(",")
    }
}
