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
//! Iterators to iterate descendants and ancestors
use crate::robot::{LinkId, Robot};

#[derive(Debug)]
/// Iterator for parents
pub struct Ancestors<'a> {
    robot: &'a Robot,
    link: Option<LinkId>,
}

impl<'a> Ancestors<'a> {
    pub fn new(robot: &'a Robot, link: Option<LinkId>) -> Self {
        Self { robot, link }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = LinkId;

    fn next(&mut self) -> Option<LinkId> {
        let next = self.link?;
        self.link = self.robot.parent_link(next);
        Some(next)
    }
}

#[derive(Debug)]
/// Iterator for children, in pre-order
pub struct Descendants<'a> {
    robot: &'a Robot,
    stack: Vec<LinkId>,
}

impl<'a> Descendants<'a> {
    pub fn new(robot: &'a Robot, stack: Vec<LinkId>) -> Self {
        Self { robot, stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = LinkId;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.stack.pop()?;
        let robot = self.robot;
        // reversed, so that the first declared child is popped first
        self.stack.extend(
            robot
                .child_joints(link)
                .iter()
                .rev()
                .map(|j| robot.joint(*j).child()),
        );
        Some(link)
    }
}
