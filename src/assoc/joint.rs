use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyValue {
    pub day: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct JointPoint {
    pub day: NaiveDate,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("series lengths differ: x has {x} days, y has {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("series start on different days: x starts {x}, y starts {y}")]
    StartMismatch { x: NaiveDate, y: NaiveDate },
    #[error("series disagree on day at index {index}: x is {x}, y is {y}")]
    DayMismatch {
        index: usize,
        x: NaiveDate,
        y: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointSeries {
    pub points: Vec<JointPoint>,
}

impl JointSeries {
    /// Both sides must cover the same days in the same order.
    pub fn align(x: &[DailyValue], y: &[DailyValue]) -> Result<Self, AlignmentError> {
        if x.len() != y.len() {
            return Err(AlignmentError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if let (Some(first_x), Some(first_y)) = (x.first(), y.first()) {
            if first_x.day != first_y.day {
                return Err(AlignmentError::StartMismatch {
                    x: first_x.day,
                    y: first_y.day,
                });
            }
        }
        let mut points = Vec::with_capacity(x.len());
        for (index, (a, b)) in x.iter().zip(y).enumerate() {
            if a.day != b.day {
                return Err(AlignmentError::DayMismatch {
                    index,
                    x: a.day,
                    y: b.day,
                });
            }
            points.push(JointPoint {
                day: a.day,
                x: a.value,
                y: b.value,
            });
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }
}
