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
use nalgebra::Vector3;
use std::fmt::{self, Display};

/// Rigid body of the robot
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    /// Mass [kg]
    pub mass: f64,
    /// Center of mass in the link frame [m]
    pub com: Vector3<f64>,
}

impl Link {
    #[inline]
    pub fn has_mass(&self) -> bool {
        self.mass > 0.0
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_mass() {
            write!(f, "{} ({} kg)", self.name, self.mass)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkBuilder {
    name: String,
    mass: f64,
    com: Vector3<f64>,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkBuilder {
    pub fn new() -> Self {
        Self {
            name: "".to_owned(),
            mass: 0.0,
            com: Vector3::zeros(),
        }
    }
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
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
    pub(crate) fn link_name(&self) -> &str {
        &self.name
    }
    pub fn finalize(self) -> Result<Link> {
        if !self.mass.is_finite() || self.mass < 0.0 {
            return Err(Error::InvalidTree {
                reason: format!("link `{}` has invalid mass {}", self.name, self.mass),
            });
        }
        if self.com.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidTree {
                reason: format!("link `{}` has non finite center of mass", self.name),
            });
        }
        Ok(Link {
            name: self.name,
            mass: self.mass,
            com: self.com,
        })
    }
}

#[test]
fn test_link_builder() {
    let link = LinkBuilder::new()
        .name("l1")
        .mass(1.5)
        .com(Vector3::new(0.0, 0.0, 0.1))
        .finalize()
        .unwrap();
    assert_eq!(link.name, "l1");
    assert!(link.has_mass());
    assert_eq!(format!("{link}"), "l1 (1.5 kg)");
    assert!(LinkBuilder::new().name("bad").mass(-1.0).finalize().is_err());
    assert!(LinkBuilder::new().name("nan").mass(f64::NAN).finalize().is_err());
}
