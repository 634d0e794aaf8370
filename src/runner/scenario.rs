//! Scenarios declared in Rust: a name, tags and an ordered list of steps

use crate::steps::UiSteps;
use crate::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

type StepFn = dyn for<'a> Fn(&'a mut UiSteps) -> BoxFuture<'a, Result<()>> + Send + Sync;

/// One named step
#[derive(Clone)]
pub struct Step {
    name: String,
    run: Arc<StepFn>,
}

impl Step {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, world: &mut UiSteps) -> Result<()> {
        (self.run)(world).await
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Step").field(&self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Add a tag; a missing `@` is prepended
    pub fn tag(mut self, tag: &str) -> Self {
        let tag = if tag.starts_with('@') {
            tag.to_string()
        } else {
            format!("@{}", tag)
        };
        self.tags.push(tag);
        self
    }

    /// Append a step named `name`
    pub fn step<S, F>(mut self, name: S, run: F) -> Self
    where
        S: Into<String>,
        F: for<'a> Fn(&'a mut UiSteps) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.steps.push(Step {
            name: name.into(),
            run: Arc::new(run),
        });
        self
    }
}
