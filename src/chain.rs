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
use std::fmt::{self, Display};

use crate::errors::*;
use crate::robot::*;

/// Traversal direction of a joint
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// From the parent link to the child link
    Forward,
    /// From the child link to the parent link
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// One joint of a chain and the direction it is traversed in
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainStep {
    pub joint: JointId,
    pub direction: Direction,
}

/// Ordered joints to go from `origin` to `destination`
///
/// # Examples
///
/// ```
/// use symkin::*;
///
/// let robot = RobotBuilder::new("y")
///     .link(LinkBuilder::new().name("base"))
///     .link(LinkBuilder::new().name("left"))
///     .link(LinkBuilder::new().name("right"))
///     .joint(JointBuilder::new().name("jl").parent("base").child("left").angle(DhValue::Variable))
///     .joint(JointBuilder::new().name("jr").parent("base").child("right").angle(DhValue::Variable))
///     .finalize()
///     .unwrap();
/// let chain = robot.resolve_chain("left", "right").unwrap();
/// assert_eq!(chain.len(), 2);
/// assert_eq!(chain.steps()[0].direction, Direction::Backward);
/// assert_eq!(chain.steps()[1].direction, Direction::Forward);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    origin: LinkId,
    destination: LinkId,
    steps: Vec<ChainStep>,
}

impl Chain {
    pub fn origin(&self) -> LinkId {
        self.origin
    }

    pub fn destination(&self) -> LinkId {
        self.destination
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps whose joint is movable
    pub fn movable_steps<'a>(&'a self, robot: &'a Robot) -> impl Iterator<Item = ChainStep> + 'a {
        self.steps
            .iter()
            .copied()
            .filter(move |s| robot.joint(s.joint).is_movable())
    }

    /// Number of degrees of freedom along the chain
    pub fn dof(&self, robot: &Robot) -> usize {
        self.movable_steps(robot).count()
    }

    /// The same joints, traversed from `destination` to `origin`
    pub fn reversed(&self) -> Chain {
        Chain {
            origin: self.destination,
            destination: self.origin,
            steps: self
                .steps
                .iter()
                .rev()
                .map(|s| ChainStep {
                    joint: s.joint,
                    direction: s.direction.reversed(),
                })
                .collect(),
        }
    }

    pub fn display<'a>(&'a self, robot: &'a Robot) -> ChainDisplay<'a> {
        ChainDisplay { chain: self, robot }
    }
}

/// `Display` helper naming the joints of a chain
pub struct ChainDisplay<'a> {
    chain: &'a Chain,
    robot: &'a Robot,
}

impl Display for ChainDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.robot.link(self.chain.origin).name)?;
        for step in &self.chain.steps {
            let arrow = match step.direction {
                Direction::Forward => "->",
                Direction::Backward => "<-",
            };
            write!(f, " {} {}", arrow, self.robot.joint(step.joint).name)?;
        }
        write!(f, " : {}", self.robot.link(self.chain.destination).name)
    }
}

impl Robot {
    /// Find the chain between two links by their names
    ///
    /// Both links are walked up to their lowest common ancestor. The joints
    /// climbed from `origin` are `Backward`, the ones descending to
    /// `destination` are `Forward`.
    pub fn resolve_chain(&self, origin: &str, destination: &str) -> Result<Chain> {
        let unresolvable = |reason: String| Error::UnresolvableChain {
            origin: origin.to_owned(),
            destination: destination.to_owned(),
            reason,
        };
        let origin_id = self
            .find_link(origin)
            .ok_or_else(|| unresolvable(format!("unknown link `{origin}`")))?;
        let destination_id = self
            .find_link(destination)
            .ok_or_else(|| unresolvable(format!("unknown link `{destination}`")))?;
        Ok(self.chain_between(origin_id, destination_id))
    }

    /// Chain between two links of this robot
    pub fn chain_between(&self, origin: LinkId, destination: LinkId) -> Chain {
        let up = self.ancestors(origin).collect::<Vec<_>>();
        let down = self.ancestors(destination).collect::<Vec<_>>();
        // common suffix of both root paths
        let common = up
            .iter()
            .rev()
            .zip(down.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        let mut steps = Vec::new();
        for link in &up[..up.len() - common] {
            if let Some(joint) = self.parent_joint(*link) {
                steps.push(ChainStep {
                    joint,
                    direction: Direction::Backward,
                });
            }
        }
        for link in down[..down.len() - common].iter().rev() {
            if let Some(joint) = self.parent_joint(*link) {
                steps.push(ChainStep {
                    joint,
                    direction: Direction::Forward,
                });
            }
        }
        Chain {
            origin,
            destination,
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::*;
    use crate::link::*;

    fn robot() -> Robot {
        RobotBuilder::new("t")
            .link(LinkBuilder::new().name("base"))
            .link(LinkBuilder::new().name("a"))
            .link(LinkBuilder::new().name("b"))
            .link(LinkBuilder::new().name("c"))
            .joint(JointBuilder::new().name("ja").parent("base").child("a").angle(DhValue::Variable))
            .joint(JointBuilder::new().name("jb").parent("a").child("b"))
            .joint(JointBuilder::new().name("jc").parent("a").child("c").offset(DhValue::Variable))
            .finalize()
            .unwrap()
    }

    #[test]
    fn test_same_link() {
        let robot = robot();
        let chain = robot.resolve_chain("b", "b").unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.origin(), chain.destination());
    }

    #[test]
    fn test_down_and_up() {
        let robot = robot();
        let chain = robot.resolve_chain("base", "b").unwrap();
        assert_eq!(format!("{}", chain.display(&robot)), "base -> ja -> jb : b");
        assert_eq!(chain.dof(&robot), 1);
        let back = robot.resolve_chain("b", "base").unwrap();
        assert_eq!(back, chain.reversed());
        assert_eq!(format!("{}", back.display(&robot)), "b <- jb <- ja : base");
    }

    #[test]
    fn test_siblings() {
        let robot = robot();
        let chain = robot.resolve_chain("b", "c").unwrap();
        assert_eq!(format!("{}", chain.display(&robot)), "b <- jb -> jc : c");
    }

    #[test]
    fn test_unknown() {
        let robot = robot();
        let err = robot.resolve_chain("base", "nowhere").unwrap_err();
        assert!(matches!(err, Error::UnresolvableChain { .. }));
        assert!(!err.is_fatal());
    }
}
