use std::{any::Any, sync::Arc};

use crate::error::{InjectorError, Result};

/// A produced value, shared by every consumer that resolved it
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) fn downcast<T: Any + Send + Sync>(instance: Instance, target: &str) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| InjectorError::TypeMismatch {
            target: target.to_owned(),
            expected: std::any::type_name::<T>(),
        })
}

/// The outcome of one `Injector::get` call
///
/// A request made with `multi = false` always yields `Single`, a multi request
/// always yields `Multiple` (possibly empty).
#[derive(Clone)]
pub enum Resolved {
    Single(Instance),
    Multiple(Vec<Instance>),
}

impl Resolved {
    pub fn into_instances(self) -> Vec<Instance> {
        match self {
            Resolved::Single(instance) => vec![instance],
            Resolved::Multiple(instances) => instances,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolved::Single(_) => 1,
            Resolved::Multiple(instances) => instances.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn downcast<T: Any + Send + Sync>(self, target: &str) -> Result<Arc<T>> {
        match self {
            Resolved::Single(instance) => downcast(instance, target),
            Resolved::Multiple(_) => Err(InjectorError::TypeMismatch {
                target: target.to_owned(),
                expected: "a single instance",
            }),
        }
    }

    pub fn downcast_all<T: Any + Send + Sync>(self, target: &str) -> Result<Vec<Arc<T>>> {
        self.into_instances()
            .into_iter()
            .map(|instance| downcast(instance, target))
            .collect()
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::Single(_) => f.write_str("Resolved::Single"),
            Resolved::Multiple(instances) => {
                write!(f, "Resolved::Multiple({})", instances.len())
            }
        }
    }
}

/// Resolved dependencies handed to a constructible, in declared order
pub struct Arguments {
    target: String,
    values: std::vec::IntoIter<Resolved>,
    position: usize,
}

impl Arguments {
    pub fn new(target: impl Into<String>, values: Vec<Resolved>) -> Self {
        Self {
            target: target.into(),
            values: values.into_iter(),
            position: 0,
        }
    }

    pub fn empty(target: impl Into<String>) -> Self {
        Self::new(target, Vec::new())
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Takes the next argument whatever its shape
    pub fn next_resolved(&mut self) -> Result<Resolved> {
        let position = self.position;
        self.position += 1;
        self.values
            .next()
            .ok_or_else(|| InjectorError::MissingArgument {
                target: self.target.clone(),
                position,
            })
    }

    /// Takes the next argument as a single instance of `T`
    pub fn next<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
        let resolved = self.next_resolved()?;
        resolved.downcast(&self.describe_previous())
    }

    /// Takes the next argument as the instances of a multi dependency
    pub fn next_multi<T: Any + Send + Sync>(&mut self) -> Result<Vec<Arc<T>>> {
        match self.next_resolved()? {
            Resolved::Multiple(instances) => {
                let target = self.describe_previous();
                instances
                    .into_iter()
                    .map(|instance| downcast(instance, &target))
                    .collect()
            }
            Resolved::Single(_) => Err(InjectorError::TypeMismatch {
                target: self.describe_previous(),
                expected: "a multi dependency",
            }),
        }
    }

    fn describe_previous(&self) -> String {
        format!("argument {} of {}", self.position - 1, self.target)
    }
}
