/*
  Copyright 2020 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/
use std::fmt::{self, Display};

/// min/max range of the joint position
#[derive(Copy, Debug, Clone, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Create new Range instance
    ///
    /// A range with `min` greater than `max` is rejected when the joint is
    /// finalized.
    ///
    /// # Examples
    ///
    /// ```
    /// let range = symkin::joint::Range::new(-1.0, 1.0);
    /// assert_eq!(range.to_string(), "[-1, 1]");
    /// ```
    pub fn new(min: f64, max: f64) -> Self {
        Range { min, max }
    }
}

impl From<::std::ops::RangeInclusive<f64>> for Range {
    /// # Examples
    ///
    /// ```
    /// let range : symkin::joint::Range = (-1.0..=1.0).into();
    /// assert_eq!(range, symkin::joint::Range::new(-1.0, 1.0));
    /// ```
    fn from(range: ::std::ops::RangeInclusive<f64>) -> Self {
        let (min, max) = range.into_inner();
        Range::new(min, max)
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Limits of a joint variable, all optional
#[derive(Copy, Debug, Clone, Default, PartialEq)]
pub struct Limits {
    pub position: Option<Range>,
    pub velocity: Option<f64>,
    pub acceleration: Option<f64>,
}

impl Limits {
    pub(crate) fn is_finite(&self) -> bool {
        let position = self
            .position
            .map(|r| r.min.is_finite() && r.max.is_finite())
            .unwrap_or(true);
        position
            && self.velocity.map(f64::is_finite).unwrap_or(true)
            && self.acceleration.map(f64::is_finite).unwrap_or(true)
    }
}
