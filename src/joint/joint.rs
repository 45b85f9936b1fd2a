/*
  Copyright 2017 Takashi Ogura

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
use super::dh::*;
use super::joint_type::*;
use super::range::*;
use crate::errors::*;
use crate::robot::LinkId;
use std::fmt::{self, Display};

/// Joint between two links, described by its DH parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Name of this joint
    pub name: String,
    /// Type of this joint, derived from `dh` and `limits`
    pub joint_type: JointType,
    /// DH parameters, at most one of them is `DhValue::Variable`
    pub dh: DhParameters,
    /// Limits of the variable
    pub limits: Limits,
    parent: LinkId,
    child: LinkId,
}

impl Joint {
    #[inline]
    pub fn parent(&self) -> LinkId {
        self.parent
    }

    #[inline]
    pub fn child(&self) -> LinkId {
        self.child
    }

    #[inline]
    pub fn is_movable(&self) -> bool {
        self.joint_type.is_movable()
    }

    /// The DH parameter which is the degree of freedom
    #[inline]
    pub fn dof(&self) -> Option<DhParameter> {
        self.dh.variable()
    }

    /// Name of the symbolic variable, `theta_<joint>` or `d_<joint>`
    ///
    /// # Examples
    ///
    /// ```
    /// use symkin::{DhValue, JointBuilder, LinkBuilder, RobotBuilder};
    ///
    /// let robot = RobotBuilder::new("arm")
    ///     .link(LinkBuilder::new().name("base"))
    ///     .link(LinkBuilder::new().name("l1"))
    ///     .joint(
    ///         JointBuilder::new()
    ///             .name("shoulder")
    ///             .parent("base")
    ///             .child("l1")
    ///             .angle(DhValue::Variable),
    ///     )
    ///     .finalize()
    ///     .unwrap();
    /// let joint = robot.find_joint("shoulder").unwrap();
    /// assert_eq!(robot.joint(joint).variable_name().unwrap(), "theta_shoulder");
    /// ```
    pub fn variable_name(&self) -> Option<String> {
        self.dof().map(|p| {
            let prefix = if p.is_rotational() { "theta" } else { "d" };
            format!("{}_{}", prefix, self.name)
        })
    }

    /// Same as `variable_name`, but fails if the name can not be used as an
    /// identifier in the generated code
    pub(crate) fn checked_variable_name(&self) -> Result<Option<String>> {
        match self.variable_name() {
            Some(name) if !is_identifier(&name) => Err(Error::InvalidDegreeOfFreedomName {
                joint_name: self.name.clone(),
                identifier: name,
            }),
            name => Ok(name),
        }
    }
}

impl Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name, self.joint_type)
    }
}

/// ASCII letters, digits and underscores, not starting with a digit
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Build a `Joint` for `RobotBuilder`
///
/// The parent and child links are given by name and resolved when the robot
/// is finalized.
#[derive(Debug, Clone, Default)]
pub struct JointBuilder {
    pub(crate) name: String,
    pub(crate) parent: String,
    pub(crate) child: String,
    dh: DhParameters,
    limits: Limits,
}

impl JointBuilder {
    pub fn new() -> JointBuilder {
        JointBuilder::default()
    }
    /// Set the name of the `Joint`
    pub fn name(mut self, name: &str) -> JointBuilder {
        self.name = name.to_string();
        self
    }
    /// Set the name of the parent link
    pub fn parent(mut self, link_name: &str) -> JointBuilder {
        self.parent = link_name.to_string();
        self
    }
    /// Set the name of the child link
    pub fn child(mut self, link_name: &str) -> JointBuilder {
        self.child = link_name.to_string();
        self
    }
    /// Set all the DH parameters
    pub fn dh(mut self, dh: DhParameters) -> JointBuilder {
        self.dh = dh;
        self
    }
    /// Set `d`
    pub fn offset(mut self, value: impl Into<DhValue>) -> JointBuilder {
        self.dh.offset = value.into();
        self
    }
    /// Set `theta`
    pub fn angle(mut self, value: impl Into<DhValue>) -> JointBuilder {
        self.dh.angle = value.into();
        self
    }
    /// Set `r`
    pub fn length(mut self, value: impl Into<DhValue>) -> JointBuilder {
        self.dh.length = value.into();
        self
    }
    /// Set `alpha`
    pub fn twist(mut self, value: impl Into<DhValue>) -> JointBuilder {
        self.dh.twist = value.into();
        self
    }
    /// Set the position limits
    pub fn position_limits(mut self, range: impl Into<Range>) -> JointBuilder {
        self.limits.position = Some(range.into());
        self
    }
    pub fn velocity_limit(mut self, limit: f64) -> JointBuilder {
        self.limits.velocity = Some(limit);
        self
    }
    pub fn acceleration_limit(mut self, limit: f64) -> JointBuilder {
        self.limits.acceleration = Some(limit);
        self
    }
    /// Set all the limits
    pub fn limits(mut self, limits: Limits) -> JointBuilder {
        self.limits = limits;
        self
    }

    /// Create `Joint` connecting the resolved links
    pub(crate) fn finalize(self, parent: LinkId, child: LinkId) -> Result<Joint> {
        let variables = self.dh.variables().collect::<Vec<_>>();
        if variables.len() > 1 {
            return Err(Error::InvalidTree {
                reason: format!(
                    "joint `{}` has {} variable DH parameters, at most one is allowed",
                    self.name,
                    variables.len()
                ),
            });
        }
        for parameter in DhParameter::ALL {
            if let DhValue::Constant(value) = self.dh.get(parameter) {
                if !value.is_finite() {
                    return Err(Error::InvalidTree {
                        reason: format!("joint `{}` has non finite `{}`", self.name, parameter),
                    });
                }
            }
        }
        if !self.limits.is_finite() {
            return Err(Error::InvalidTree {
                reason: format!("joint `{}` has non finite limits", self.name),
            });
        }
        if let Some(range) = self.limits.position {
            if range.min > range.max {
                return Err(Error::InvalidTree {
                    reason: format!(
                        "joint `{}` has a position range {} with min greater than max",
                        self.name, range
                    ),
                });
            }
        }
        let joint_type = match variables.first() {
            None => JointType::Fixed,
            Some(p) if p.is_rotational() => {
                if self.limits.position.is_some() {
                    JointType::Revolute
                } else {
                    JointType::Continuous
                }
            }
            Some(_) => JointType::Prismatic,
        };
        Ok(Joint {
            name: self.name,
            joint_type,
            dh: self.dh,
            limits: self.limits,
            parent,
            child,
        })
    }
}
