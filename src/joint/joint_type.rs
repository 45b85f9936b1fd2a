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

/// Type of Joint, `Fixed`, `Revolute`, `Continuous` and `Prismatic` are supported
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Fixed joint. It has no variable.
    Fixed,
    /// Rotational joint with position limits. Its variable is an angle [rad].
    Revolute,
    /// Rotational joint without position limits.
    Continuous,
    /// Linear joint. Its variable is a length [m].
    Prismatic,
}

impl JointType {
    #[inline]
    pub fn is_movable(self) -> bool {
        !matches!(self, JointType::Fixed)
    }

    #[inline]
    pub fn is_rotational(self) -> bool {
        matches!(self, JointType::Revolute | JointType::Continuous)
    }

    /// Lower case name used in generated documentation
    pub fn name(self) -> &'static str {
        match self {
            JointType::Fixed => "fixed",
            JointType::Revolute => "revolute",
            JointType::Continuous => "continuous",
            JointType::Prismatic => "prismatic",
        }
    }
}

impl Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JointType::Fixed => write!(f, "[⚓]"),
            JointType::Revolute => write!(f, "[⚙]"),
            JointType::Continuous => write!(f, "[⚙∞]"),
            JointType::Prismatic => write!(f, "[↕]"),
        }
    }
}
