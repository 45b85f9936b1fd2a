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
use thiserror::Error;

/// Error for building robots and generating code
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The links and joints do not form a single tree
    #[error("invalid robot tree: {reason}")]
    InvalidTree { reason: String },
    /// A request names a link which is not in the tree, or two links which
    /// cannot be connected the way the request needs
    #[error("cannot resolve a chain from `{origin}` to `{destination}`: {reason}")]
    UnresolvableChain {
        origin: String,
        destination: String,
        reason: String,
    },
    /// The joint name cannot be used inside generated variable or function names
    #[error("joint `{joint_name}` gives `{identifier}`, which is not a valid identifier")]
    InvalidDegreeOfFreedomName {
        joint_name: String,
        identifier: String,
    },
    /// Total mass of the robot is zero
    #[error("center of mass of `{robot_name}` is undefined: the total mass is zero")]
    UndefinedCenterOfMass { robot_name: String },
    /// Generated functions call each other in a loop
    #[error("generated functions depend on each other in a cycle: {functions:?}")]
    DependencyCycle { functions: Vec<String> },
    /// No language profile has this name
    #[error("unsupported language `{name}` (expected python, julia or matlab)")]
    UnsupportedLanguage { name: String },
    /// Numeric evaluation met a variable without value
    #[error("variable `{name}` has no value")]
    UnboundVariable { name: String },
    /// The cancel flag was raised between two requests
    #[error("generation cancelled")]
    Cancelled,
}

impl Error {
    /// `true` if the error stops the whole generation, `false` if only the
    /// request which caused it is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// let err = symkin::Error::UndefinedCenterOfMass { robot_name: "arm".to_owned() };
    /// assert!(!err.is_fatal());
    /// assert!(symkin::Error::Cancelled.is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::InvalidTree { .. }
            | Error::DependencyCycle { .. }
            | Error::UnsupportedLanguage { .. }
            | Error::Cancelled => true,
            Error::UnresolvableChain { .. }
            | Error::InvalidDegreeOfFreedomName { .. }
            | Error::UndefinedCenterOfMass { .. }
            | Error::UnboundVariable { .. } => false,
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
