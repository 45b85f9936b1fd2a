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
use crate::errors::*;
use crate::iterator::*;
use crate::joint::*;
use crate::link::*;
use nalgebra::Vector3;
use std::collections::HashMap;
use std::fmt::{self, Display};
use tracing::info;

/// Index of a link inside its `Robot`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(usize);

impl LinkId {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        LinkId(index)
    }
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a joint inside its `Robot`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(usize);

impl JointId {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        JointId(index)
    }
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Validated tree of links connected by joints
///
/// Links and joints are stored in declaration order and never change after
/// `RobotBuilder::finalize`.
///
/// # Examples
///
/// ```
/// use symkin::*;
///
/// let robot = RobotBuilder::new("arm")
///     .link(LinkBuilder::new().name("base"))
///     .link(LinkBuilder::new().name("upper").mass(1.0))
///     .link(LinkBuilder::new().name("lower").mass(0.5))
///     .joint(
///         JointBuilder::new()
///             .name("shoulder")
///             .parent("base")
///             .child("upper")
///             .angle(DhValue::Variable)
///             .offset(0.2),
///     )
///     .joint(
///         JointBuilder::new()
///             .name("elbow")
///             .parent("upper")
///             .child("lower")
///             .angle(DhValue::Variable)
///             .length(0.4),
///     )
///     .finalize()
///     .unwrap();
/// assert_eq!(robot.dof(), 2);
/// assert_eq!(robot.link(robot.root()).name, "base");
/// ```
#[derive(Debug, Clone)]
pub struct Robot {
    name: String,
    convention: Convention,
    links: Vec<Link>,
    joints: Vec<Joint>,
    root: LinkId,
    parent_joint: Vec<Option<JointId>>,
    child_joints: Vec<Vec<JointId>>,
    link_index: HashMap<String, LinkId>,
    joint_index: HashMap<String, JointId>,
}

impl Robot {
    /// Build a serial robot from DH table rows
    ///
    /// The first link is called `base`, the link after the i-th row
    /// (starting from 1) is called `link_<i>`. Each joint takes the name of its row.
    ///
    /// # Examples
    ///
    /// ```
    /// use symkin::*;
    /// use std::f64::consts::FRAC_PI_2;
    ///
    /// let robot = Robot::from_dh_rows(
    ///     "planar",
    ///     Convention::standard(),
    ///     vec![
    ///         DhRow::new("j1", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
    ///         DhRow::new("j2", DhParameters::new(0.0, DhValue::Variable, 0.0, FRAC_PI_2)),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(robot.links().len(), 3);
    /// assert!(robot.find_link("link_2").is_some());
    /// ```
    pub fn from_dh_rows(
        name: &str,
        convention: Convention,
        rows: impl IntoIterator<Item = DhRow>,
    ) -> Result<Robot> {
        let mut builder = RobotBuilder::new(name)
            .convention(convention)
            .link(LinkBuilder::new().name("base"));
        let mut parent = "base".to_owned();
        for (i, row) in rows.into_iter().enumerate() {
            let child = format!("link_{}", i + 1);
            builder = builder
                .link(LinkBuilder::new().name(&child).mass(row.mass).com(row.com))
                .joint(
                    JointBuilder::new()
                        .name(&row.name)
                        .parent(&parent)
                        .child(&child)
                        .dh(row.dh)
                        .limits(row.limits),
                );
            parent = child;
        }
        builder.finalize()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    #[inline]
    pub fn root(&self) -> LinkId {
        self.root
    }

    #[inline]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    #[inline]
    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.0]
    }

    /// All links in declaration order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// All joints in declaration order
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn find_link(&self, name: &str) -> Option<LinkId> {
        self.link_index.get(name).copied()
    }

    pub fn find_joint(&self, name: &str) -> Option<JointId> {
        self.joint_index.get(name).copied()
    }

    /// Joint whose child is `link`, `None` for the root
    #[inline]
    pub fn parent_joint(&self, link: LinkId) -> Option<JointId> {
        self.parent_joint[link.0]
    }

    /// Joints whose parent is `link`, in declaration order
    #[inline]
    pub fn child_joints(&self, link: LinkId) -> &[JointId] {
        &self.child_joints[link.0]
    }

    pub fn parent_link(&self, link: LinkId) -> Option<LinkId> {
        self.parent_joint(link).map(|j| self.joint(j).parent())
    }

    /// Iterate from `link` up to the root, `link` included
    pub fn ancestors(&self, link: LinkId) -> Ancestors<'_> {
        Ancestors::new(self, Some(link))
    }

    /// Iterate the subtree of `link` in pre-order, `link` included
    pub fn descendants(&self, link: LinkId) -> Descendants<'_> {
        Descendants::new(self, vec![link])
    }

    /// Every joint in tree pre-order
    pub fn joints_in_tree_order(&self) -> Vec<JointId> {
        self.descendants(self.root)
            .filter_map(|link| self.parent_joint(link))
            .collect()
    }

    /// Movable joints in tree pre-order
    pub fn movable_joints(&self) -> Vec<JointId> {
        self.joints_in_tree_order()
            .into_iter()
            .filter(|j| self.joint(*j).is_movable())
            .collect()
    }

    /// Links without child joints, in tree pre-order
    pub fn terminal_links(&self) -> Vec<LinkId> {
        self.descendants(self.root)
            .filter(|link| self.child_joints(*link).is_empty())
            .collect()
    }

    /// Number of degrees of freedom
    pub fn dof(&self) -> usize {
        self.joints.iter().filter(|j| j.is_movable()).count()
    }

    pub fn total_mass(&self) -> f64 {
        self.links.iter().map(|l| l.mass).sum()
    }

    fn fmt_with_indent_level(
        &self,
        link: LinkId,
        level: usize,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        writeln!(f, "{}{}", "    ".repeat(level), self.link(link))?;
        for joint in self.child_joints(link) {
            let joint = self.joint(*joint);
            writeln!(f, "{}{}", "    ".repeat(level + 1), joint)?;
            self.fmt_with_indent_level(joint.child(), level + 2, f)?;
        }
        Ok(())
    }
}

impl Display for Robot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.convention)?;
        self.fmt_with_indent_level(self.root, 0, f)
    }
}

/// One row of a DH table, used by `Robot::from_dh_rows`
#[derive(Debug, Clone, PartialEq)]
pub struct DhRow {
    pub name: String,
    pub dh: DhParameters,
    pub limits: Limits,
    /// Mass of the link after this joint
    pub mass: f64,
    /// Center of mass of the link after this joint
    pub com: Vector3<f64>,
}

impl DhRow {
    pub fn new(name: &str, dh: DhParameters) -> Self {
        Self {
            name: name.to_owned(),
            dh,
            limits: Limits::default(),
            mass: 0.0,
            com: Vector3::zeros(),
        }
    }
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }
    pub fn com(mut self, com: Vector3<f64>) -> Self {
        self.com = com;
        self
    }
}

/// Build a validated `Robot`
#[derive(Debug, Clone)]
pub struct RobotBuilder {
    name: String,
    convention: Convention,
    links: Vec<LinkBuilder>,
    joints: Vec<JointBuilder>,
}

impl RobotBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            convention: Convention::default(),
            links: Vec::new(),
            joints: Vec::new(),
        }
    }
    /// Set the DH convention shared by every joint
    pub fn convention(mut self, convention: Convention) -> Self {
        self.convention = convention;
        self
    }
    pub fn link(mut self, link: LinkBuilder) -> Self {
        self.links.push(link);
        self
    }
    pub fn joint(mut self, joint: JointBuilder) -> Self {
        self.joints.push(joint);
        self
    }

    /// Check the tree invariants and create `Robot`
    ///
    /// It returns `Error::InvalidTree` if the links and joints do not form
    /// exactly one tree.
    pub fn finalize(self) -> Result<Robot> {
        if self.links.is_empty() {
            return Err(invalid_tree(format!("robot `{}` has no link", self.name)));
        }
        let mut link_index = HashMap::new();
        let mut links = Vec::with_capacity(self.links.len());
        for (i, builder) in self.links.into_iter().enumerate() {
            let name = builder.link_name().to_owned();
            if name.is_empty() {
                return Err(invalid_tree(format!("link #{i} has no name")));
            }
            if link_index.insert(name.clone(), LinkId(i)).is_some() {
                return Err(invalid_tree(format!("link `{name}` is defined twice")));
            }
            links.push(builder.finalize()?);
        }

        let mut joint_index = HashMap::new();
        let mut joints = Vec::with_capacity(self.joints.len());
        let mut parent_joint = vec![None; links.len()];
        let mut child_joints = vec![Vec::new(); links.len()];
        for (i, builder) in self.joints.into_iter().enumerate() {
            let id = JointId(i);
            let name = builder.name.clone();
            if name.is_empty() {
                return Err(invalid_tree(format!("joint #{i} has no name")));
            }
            if joint_index.insert(name.clone(), id).is_some() {
                return Err(invalid_tree(format!("joint `{name}` is defined twice")));
            }
            let lookup = |link: &str| {
                link_index.get(link).copied().ok_or_else(|| {
                    invalid_tree(format!("joint `{name}` refers to unknown link `{link}`"))
                })
            };
            let parent = lookup(&builder.parent)?;
            let child = lookup(&builder.child)?;
            if parent == child {
                return Err(invalid_tree(format!(
                    "joint `{name}` connects link `{}` to itself",
                    builder.parent
                )));
            }
            if let Some(other) = parent_joint[child.0] {
                let other: &Joint = &joints[JointId::index(other)];
                return Err(invalid_tree(format!(
                    "link `{}` has two parent joints, `{}` and `{name}`",
                    builder.child, other.name
                )));
            }
            parent_joint[child.0] = Some(id);
            child_joints[parent.0].push(id);
            joints.push(builder.finalize(parent, child)?);
        }

        let roots = (0..links.len())
            .filter(|i| parent_joint[*i].is_none())
            .collect::<Vec<_>>();
        let root = match roots.as_slice() {
            [root] => LinkId(*root),
            [] => {
                return Err(invalid_tree(format!(
                    "robot `{}` has no root link, the joints form a cycle",
                    self.name
                )))
            }
            _ => {
                let names = roots
                    .iter()
                    .map(|i| links[*i].name.as_str())
                    .collect::<Vec<_>>();
                return Err(invalid_tree(format!(
                    "robot `{}` has several root links: {}",
                    self.name,
                    names.join(", ")
                )));
            }
        };

        let robot = Robot {
            name: self.name,
            convention: self.convention,
            links,
            joints,
            root,
            parent_joint,
            child_joints,
            link_index,
            joint_index,
        };
        // With one root and one parent per link, a link missing from the
        // root's subtree sits on a cycle.
        let reachable = robot.descendants(root).count();
        if reachable != robot.links.len() {
            return Err(invalid_tree(format!(
                "robot `{}` has {} links unreachable from `{}`",
                robot.name,
                robot.links.len() - reachable,
                robot.link(root).name
            )));
        }
        info!(
            robot = %robot.name,
            links = robot.links.len(),
            dof = robot.dof(),
            "robot finalized"
        );
        Ok(robot)
    }
}

fn invalid_tree(reason: String) -> Error {
    Error::InvalidTree { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_links() -> RobotBuilder {
        RobotBuilder::new("r")
            .link(LinkBuilder::new().name("a"))
            .link(LinkBuilder::new().name("b"))
    }

    #[test]
    fn test_empty() {
        assert!(RobotBuilder::new("r").finalize().is_err());
    }

    #[test]
    fn test_single_link() {
        let robot = RobotBuilder::new("r")
            .link(LinkBuilder::new().name("only"))
            .finalize()
            .unwrap();
        assert_eq!(robot.dof(), 0);
        assert_eq!(robot.terminal_links(), vec![robot.root()]);
    }

    #[test]
    fn test_duplicate_names() {
        let result = two_links()
            .link(LinkBuilder::new().name("a"))
            .finalize();
        assert!(matches!(result, Err(Error::InvalidTree { .. })));
        let result = two_links()
            .link(LinkBuilder::new().name("c"))
            .joint(JointBuilder::new().name("j").parent("a").child("b"))
            .joint(JointBuilder::new().name("j").parent("a").child("c"))
            .finalize();
        assert!(matches!(result, Err(Error::InvalidTree { .. })));
    }

    #[test]
    fn test_unknown_link() {
        let result = two_links()
            .joint(JointBuilder::new().name("j").parent("a").child("z"))
            .finalize();
        assert!(matches!(result, Err(Error::InvalidTree { .. })));
    }

    #[test]
    fn test_two_roots() {
        assert!(two_links().finalize().is_err());
    }

    #[test]
    fn test_two_parents() {
        let result = two_links()
            .link(LinkBuilder::new().name("c"))
            .joint(JointBuilder::new().name("j1").parent("a").child("c"))
            .joint(JointBuilder::new().name("j2").parent("b").child("c"))
            .finalize();
        assert!(matches!(result, Err(Error::InvalidTree { .. })));
    }

    #[test]
    fn test_cycle() {
        let result = two_links()
            .link(LinkBuilder::new().name("c"))
            .joint(JointBuilder::new().name("j1").parent("a").child("b"))
            .joint(JointBuilder::new().name("j2").parent("c").child("c"))
            .finalize();
        assert!(result.is_err());
        // a is the root, b and c form a loop which is not reachable
        let result = RobotBuilder::new("r")
            .link(LinkBuilder::new().name("a"))
            .link(LinkBuilder::new().name("b"))
            .link(LinkBuilder::new().name("c"))
            .joint(JointBuilder::new().name("j1").parent("b").child("c"))
            .joint(JointBuilder::new().name("j2").parent("c").child("b"))
            .finalize();
        assert!(matches!(result, Err(Error::InvalidTree { .. })));
    }

    #[test]
    fn test_tree_order() {
        let robot = RobotBuilder::new("r")
            .link(LinkBuilder::new().name("base"))
            .link(LinkBuilder::new().name("l"))
            .link(LinkBuilder::new().name("l2"))
            .link(LinkBuilder::new().name("r"))
            .joint(
                JointBuilder::new()
                    .name("jl")
                    .parent("base")
                    .child("l")
                    .angle(DhValue::Variable),
            )
            .joint(
                JointBuilder::new()
                    .name("jr")
                    .parent("base")
                    .child("r")
                    .offset(DhValue::Variable),
            )
            .joint(
                JointBuilder::new()
                    .name("jl2")
                    .parent("l")
                    .child("l2")
                    .angle(DhValue::Variable),
            )
            .finalize()
            .unwrap();
        let names = robot
            .movable_joints()
            .into_iter()
            .map(|j| robot.joint(j).name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["jl", "jl2", "jr"]);
        let terminals = robot
            .terminal_links()
            .into_iter()
            .map(|l| robot.link(l).name.clone())
            .collect::<Vec<_>>();
        assert_eq!(terminals, vec!["l2", "r"]);
        let printed = format!("{robot}");
        assert!(printed.contains("        l2"));
    }
}
