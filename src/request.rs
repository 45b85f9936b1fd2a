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
use crate::robot::Robot;
use std::fmt::{self, Display};

/// What a request asks to generate
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Transform of a single joint, between its parent and child links
    Transform,
    /// 4×4 transform from the destination frame to the origin frame
    ForwardKinematics,
    /// 6×N geometric Jacobian of the destination in the origin frame
    Jacobian,
    /// Center of mass of the whole robot in the root frame
    CenterOfMass,
    /// 3×N Jacobian of the center of mass
    CenterOfMassJacobian,
}

/// Which directions of a joint transform are generated
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Directions {
    pub forward: bool,
    pub backward: bool,
}

impl Default for Directions {
    fn default() -> Self {
        Self {
            forward: true,
            backward: true,
        }
    }
}

/// One unit of code generation
///
/// `origin` and `destination` are link names. They are empty for the
/// center of mass kinds.
///
/// # Examples
///
/// ```
/// use symkin::Request;
///
/// let requests = vec![
///     Request::transform("base", "link_1").forward_only(),
///     Request::forward_kinematics("base", "link_2"),
///     Request::jacobian("base", "link_2").disabled(),
///     Request::center_of_mass(),
/// ];
/// assert_eq!(requests.iter().filter(|r| r.enabled).count(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Request {
    pub kind: RequestKind,
    pub origin: String,
    pub destination: String,
    pub directions: Directions,
    pub enabled: bool,
}

impl Request {
    fn new(kind: RequestKind, origin: &str, destination: &str) -> Self {
        Self {
            kind,
            origin: origin.to_owned(),
            destination: destination.to_owned(),
            directions: Directions::default(),
            enabled: true,
        }
    }

    /// Transform of the joint between `parent` and `child`, in both directions
    pub fn transform(parent: &str, child: &str) -> Self {
        Self::new(RequestKind::Transform, parent, child)
    }

    pub fn forward_kinematics(origin: &str, destination: &str) -> Self {
        Self::new(RequestKind::ForwardKinematics, origin, destination)
    }

    pub fn jacobian(origin: &str, destination: &str) -> Self {
        Self::new(RequestKind::Jacobian, origin, destination)
    }

    pub fn center_of_mass() -> Self {
        Self::new(RequestKind::CenterOfMass, "", "")
    }

    pub fn center_of_mass_jacobian() -> Self {
        Self::new(RequestKind::CenterOfMassJacobian, "", "")
    }

    pub fn forward_only(mut self) -> Self {
        self.directions = Directions {
            forward: true,
            backward: false,
        };
        self
    }

    pub fn backward_only(mut self) -> Self {
        self.directions = Directions {
            forward: false,
            backward: true,
        };
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The usual set of requests for a robot
    ///
    /// Both transforms of every movable joint, forward kinematics and
    /// Jacobian from the root to every terminal link, then the center of
    /// mass and its Jacobian.
    pub fn defaults_for(robot: &Robot) -> Vec<Request> {
        let mut requests = Vec::new();
        for joint in robot.movable_joints() {
            let joint = robot.joint(joint);
            requests.push(Request::transform(
                &robot.link(joint.parent()).name,
                &robot.link(joint.child()).name,
            ));
        }
        let root = &robot.link(robot.root()).name;
        let terminals = robot
            .terminal_links()
            .into_iter()
            .filter(|link| *link != robot.root())
            .map(|link| robot.link(link).name.as_str())
            .collect::<Vec<_>>();
        for terminal in &terminals {
            requests.push(Request::forward_kinematics(root, terminal));
        }
        for terminal in &terminals {
            requests.push(Request::jacobian(root, terminal));
        }
        requests.push(Request::center_of_mass());
        requests.push(Request::center_of_mass_jacobian());
        requests
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            RequestKind::Transform => write!(f, "transform {} -> {}", self.origin, self.destination),
            RequestKind::ForwardKinematics => {
                write!(f, "forward kinematics {} -> {}", self.origin, self.destination)
            }
            RequestKind::Jacobian => write!(f, "jacobian {} -> {}", self.origin, self.destination),
            RequestKind::CenterOfMass => write!(f, "center of mass"),
            RequestKind::CenterOfMassJacobian => write!(f, "center of mass jacobian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::*;
    use crate::robot::*;

    #[test]
    fn test_defaults() {
        let robot = Robot::from_dh_rows(
            "r",
            Convention::standard(),
            vec![
                DhRow::new("j1", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
                DhRow::new("fixed", DhParameters::new(0.1, 0.0, 0.0, 0.0)),
                DhRow::new("j2", DhParameters::new(DhValue::Variable, 0.0, 0.0, 0.0)),
            ],
        )
        .unwrap();
        let requests = Request::defaults_for(&robot);
        let printed = requests.iter().map(|r| r.to_string()).collect::<Vec<_>>();
        assert_eq!(
            printed,
            vec![
                "transform base -> link_1",
                "transform link_2 -> link_3",
                "forward kinematics base -> link_3",
                "jacobian base -> link_3",
                "center of mass",
                "center of mass jacobian",
            ]
        );
    }
}
