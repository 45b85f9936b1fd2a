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
//! Functions to generate, before and after optimization
use crate::chain::Direction;
use crate::joint::{Joint, Limits};
use crate::robot::{JointId, LinkId};
use crate::symbolic::SymMatrix;
use std::fmt::{self, Display};

/// Identity of a generated function
///
/// Two requests giving the same key give the same function, which is
/// generated once.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKey {
    Transform { joint: JointId, direction: Direction },
    ForwardKinematics { origin: LinkId, destination: LinkId },
    Jacobian { origin: LinkId, destination: LinkId },
    CenterOfMass,
    CenterOfMassJacobian,
}

impl FunctionKey {
    pub fn section(&self) -> Section {
        match self {
            FunctionKey::Transform {
                direction: Direction::Forward,
                ..
            } => Section::ForwardTransforms,
            FunctionKey::Transform {
                direction: Direction::Backward,
                ..
            } => Section::BackwardTransforms,
            FunctionKey::ForwardKinematics { .. } => Section::ForwardKinematics,
            FunctionKey::Jacobian { .. } => Section::Jacobians,
            FunctionKey::CenterOfMass | FunctionKey::CenterOfMassJacobian => Section::CenterOfMass,
        }
    }
}

/// Group of functions in the generated file, in output order
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    ForwardTransforms,
    BackwardTransforms,
    ForwardKinematics,
    Jacobians,
    CenterOfMass,
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::ForwardTransforms => "FORWARD TRANSITION MATRICES",
            Section::BackwardTransforms => "BACKWARD TRANSITION MATRICES",
            Section::ForwardKinematics => "FORWARD KINEMATICS",
            Section::Jacobians => "JACOBIANS",
            Section::CenterOfMass => "CENTER OF MASS",
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Input of a generated function, one per degree of freedom
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// Variable name, `theta_<joint>` or `d_<joint>`
    pub name: String,
    pub joint: String,
    pub rotational: bool,
    pub limits: Limits,
}

impl Parameter {
    /// `None` for a fixed joint
    pub(crate) fn of_joint(joint: &Joint) -> Option<Self> {
        Some(Self {
            name: joint.variable_name()?,
            joint: joint.name.clone(),
            rotational: joint.joint_type.is_rotational(),
            limits: joint.limits,
        })
    }

    /// Documentation of the parameter
    pub fn description(&self) -> String {
        let mut text = if self.rotational {
            format!("Rotation value (in radians) around the {} joint axis.", self.joint)
        } else {
            format!(
                "Translation value (in meters) along the {} prismatic joint axis.",
                self.joint
            )
        };
        if let Some(range) = self.limits.position {
            text.push_str(&format!(" Position limits: {range}."));
        }
        if let Some(v) = self.limits.velocity {
            text.push_str(&format!(" Velocity limit: {v}."));
        }
        if let Some(a) = self.limits.acceleration {
            text.push_str(&format!(" Acceleration limit: {a}."));
        }
        text
    }
}

/// Function built from a request, before optimization
#[derive(Clone, Debug, PartialEq)]
pub struct RawFunction {
    pub key: FunctionKey,
    pub name: String,
    /// Index of the request which asked for it
    pub request: usize,
    pub description: String,
    /// Meaning of the returned matrix
    pub returns: String,
    pub parameters: Vec<Parameter>,
    /// Parameter moving each column, for Jacobians
    pub columns: Vec<String>,
    pub output: SymMatrix,
}

impl RawFunction {
    /// `true` if every parameter of `self` is also a parameter of `other`
    pub fn parameters_within(&self, other: &RawFunction) -> bool {
        self.parameters
            .iter()
            .all(|p| other.parameters.iter().any(|q| q.name == p.name))
    }
}

/// Replace the characters which can not appear in an identifier
pub(crate) fn sanitize(name: &str) -> String {
    let mut out = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    if out.is_empty() {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Range;

    #[test]
    fn test_section_order() {
        assert!(Section::ForwardTransforms < Section::BackwardTransforms);
        assert!(Section::Jacobians < Section::CenterOfMass);
        assert_eq!(FunctionKey::CenterOfMassJacobian.section(), Section::CenterOfMass);
    }

    #[test]
    fn test_parameter_description() {
        let mut parameter = Parameter {
            name: "theta_j1".to_owned(),
            joint: "j1".to_owned(),
            rotational: true,
            limits: Limits::default(),
        };
        assert_eq!(
            parameter.description(),
            "Rotation value (in radians) around the j1 joint axis."
        );
        parameter.rotational = false;
        parameter.limits.position = Some(Range::new(-0.5, 0.5));
        assert_eq!(
            parameter.description(),
            "Translation value (in meters) along the j1 prismatic joint axis. Position limits: [-0.5, 0.5]."
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("link-1.a"), "link_1_a");
        assert_eq!(sanitize(""), "_");
    }
}
