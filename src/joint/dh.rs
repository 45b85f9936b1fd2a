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
use crate::errors::*;
use std::fmt::{self, Display};

/// One of the four Denavit–Hartenberg parameters of a joint
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DhParameter {
    /// `d`, translation along the previous z axis
    Offset,
    /// `theta`, rotation around the previous z axis
    Angle,
    /// `r`, translation along the new x axis
    Length,
    /// `alpha`, rotation around the new x axis
    Twist,
}

impl DhParameter {
    pub const ALL: [DhParameter; 4] = [
        DhParameter::Offset,
        DhParameter::Angle,
        DhParameter::Length,
        DhParameter::Twist,
    ];

    #[inline]
    pub fn is_rotational(self) -> bool {
        matches!(self, DhParameter::Angle | DhParameter::Twist)
    }

    /// Conventional symbol of the parameter
    pub fn symbol(self) -> &'static str {
        match self {
            DhParameter::Offset => "d",
            DhParameter::Angle => "theta",
            DhParameter::Length => "r",
            DhParameter::Twist => "alpha",
        }
    }
}

impl Display for DhParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Value of a DH parameter, a constant or the variable of the joint
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DhValue {
    Constant(f64),
    Variable,
}

impl DhValue {
    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, DhValue::Variable)
    }
}

impl Default for DhValue {
    fn default() -> Self {
        DhValue::Constant(0.0)
    }
}

impl From<f64> for DhValue {
    fn from(value: f64) -> Self {
        DhValue::Constant(value)
    }
}

/// The four DH parameters of a joint
///
/// # Examples
///
/// ```
/// use symkin::joint::{DhParameter, DhParameters, DhValue};
///
/// let dh = DhParameters::new(0.1, DhValue::Variable, 0.3, 0.0);
/// assert_eq!(dh.variable(), Some(DhParameter::Angle));
/// assert_eq!(dh.get(DhParameter::Length), DhValue::Constant(0.3));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DhParameters {
    pub offset: DhValue,
    pub angle: DhValue,
    pub length: DhValue,
    pub twist: DhValue,
}

impl DhParameters {
    pub fn new(
        offset: impl Into<DhValue>,
        angle: impl Into<DhValue>,
        length: impl Into<DhValue>,
        twist: impl Into<DhValue>,
    ) -> Self {
        Self {
            offset: offset.into(),
            angle: angle.into(),
            length: length.into(),
            twist: twist.into(),
        }
    }

    pub fn get(&self, parameter: DhParameter) -> DhValue {
        match parameter {
            DhParameter::Offset => self.offset,
            DhParameter::Angle => self.angle,
            DhParameter::Length => self.length,
            DhParameter::Twist => self.twist,
        }
    }

    /// Parameters left symbolic, in `DhParameter::ALL` order
    pub fn variables(&self) -> impl Iterator<Item = DhParameter> + '_ {
        DhParameter::ALL
            .into_iter()
            .filter(move |p| self.get(*p).is_variable())
    }

    /// The degree of freedom, if any
    pub fn variable(&self) -> Option<DhParameter> {
        self.variables().next()
    }
}

/// Axis of an elementary transformation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// Column of a homogeneous transform holding this axis
    #[inline]
    pub fn column(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Z => 2,
        }
    }
}

/// Elementary transformation of a DH convention
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Translation { axis: Axis, parameter: DhParameter },
    Rotation { axis: Axis, parameter: DhParameter },
}

impl Step {
    pub fn trans_x(parameter: DhParameter) -> Self {
        Step::Translation {
            axis: Axis::X,
            parameter,
        }
    }
    pub fn trans_z(parameter: DhParameter) -> Self {
        Step::Translation {
            axis: Axis::Z,
            parameter,
        }
    }
    pub fn rot_x(parameter: DhParameter) -> Self {
        Step::Rotation {
            axis: Axis::X,
            parameter,
        }
    }
    pub fn rot_z(parameter: DhParameter) -> Self {
        Step::Rotation {
            axis: Axis::Z,
            parameter,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Step::Translation { axis, .. } | Step::Rotation { axis, .. } => axis,
        }
    }

    pub fn parameter(self) -> DhParameter {
        match self {
            Step::Translation { parameter, .. } | Step::Rotation { parameter, .. } => parameter,
        }
    }

    #[inline]
    pub fn is_rotation(self) -> bool {
        matches!(self, Step::Rotation { .. })
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = if self.is_rotation() { "Rot" } else { "Trans" };
        let axis = match self.axis() {
            Axis::X => "X",
            Axis::Z => "Z",
        };
        write!(f, "{}{}({})", kind, axis, self.parameter())
    }
}

/// Ordered elementary transformations composing every joint transform
///
/// # Examples
///
/// ```
/// use symkin::joint::{Convention, DhParameter, Step};
///
/// let convention = Convention::new([
///     Step::rot_x(DhParameter::Twist),
///     Step::trans_x(DhParameter::Length),
///     Step::rot_z(DhParameter::Angle),
///     Step::trans_z(DhParameter::Offset),
/// ])
/// .unwrap();
/// assert_eq!(convention, Convention::modified());
///
/// // translation by an angle is rejected
/// assert!(Convention::new([
///     Step::trans_z(DhParameter::Angle),
///     Step::rot_z(DhParameter::Offset),
///     Step::trans_x(DhParameter::Length),
///     Step::rot_x(DhParameter::Twist),
/// ])
/// .is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Convention {
    steps: [Step; 4],
}

impl Convention {
    pub fn new(steps: [Step; 4]) -> Result<Self> {
        for step in &steps {
            if step.is_rotation() != step.parameter().is_rotational() {
                return Err(Error::InvalidTree {
                    reason: format!("DH convention step {step} mixes rotation and translation"),
                });
            }
        }
        for parameter in DhParameter::ALL {
            let count = steps.iter().filter(|s| s.parameter() == parameter).count();
            if count != 1 {
                return Err(Error::InvalidTree {
                    reason: format!(
                        "DH convention uses `{parameter}` {count} times, it must be used once"
                    ),
                });
            }
        }
        Ok(Self { steps })
    }

    /// Classic convention: `TransZ(d) RotZ(theta) TransX(r) RotX(alpha)`
    pub fn standard() -> Self {
        Self {
            steps: [
                Step::trans_z(DhParameter::Offset),
                Step::rot_z(DhParameter::Angle),
                Step::trans_x(DhParameter::Length),
                Step::rot_x(DhParameter::Twist),
            ],
        }
    }

    /// Craig's convention: `RotX(alpha) TransX(r) RotZ(theta) TransZ(d)`
    pub fn modified() -> Self {
        Self {
            steps: [
                Step::rot_x(DhParameter::Twist),
                Step::trans_x(DhParameter::Length),
                Step::rot_z(DhParameter::Angle),
                Step::trans_z(DhParameter::Offset),
            ],
        }
    }

    #[inline]
    pub fn steps(&self) -> &[Step; 4] {
        &self.steps
    }

    /// Position of the step using `parameter`
    pub fn position(&self, parameter: DhParameter) -> usize {
        self.steps
            .iter()
            .position(|s| s.parameter() == parameter)
            .unwrap_or_default()
    }
}

impl Default for Convention {
    fn default() -> Self {
        Self::standard()
    }
}

impl Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let steps = self.steps.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        write!(f, "{}", steps.join(" "))
    }
}
