//! Placement constraints
//!
//! A constraint is a preference, not a hard rule: the strategy picks a
//! violating location only when no satisfying one exists anywhere, and then
//! runs the failure hook of every violated constraint. A hook returns
//! `Ok(())` to accept the placement, `OutOfLocations` to request a new
//! attempt, or any other error to abort.

use std::fmt;
use std::rc::Rc;

use rando_core::RandoResult;

type Test<I, L> = Rc<dyn Fn(&I, &L) -> bool>;
type Fail<I, L> = Rc<dyn Fn(&I, &L) -> RandoResult<()>>;

pub struct Constraint<I, L> {
    test: Test<I, L>,
    fail: Option<Fail<I, L>>,
    label: Option<String>,
}

impl<I, L> Constraint<I, L> {
    pub fn new(test: impl Fn(&I, &L) -> bool + 'static) -> Self {
        Constraint {
            test: Rc::new(test),
            fail: None,
            label: None,
        }
    }

    pub fn with_fail(mut self, fail: impl Fn(&I, &L) -> RandoResult<()> + 'static) -> Self {
        self.fail = Some(Rc::new(fail));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[inline]
    pub fn is_satisfied(&self, item: &I, location: &L) -> bool {
        (self.test)(item, location)
    }

    /// Run the failure hook; constraints without one accept the placement
    pub fn on_violated(&self, item: &I, location: &L) -> RandoResult<()> {
        match &self.fail {
            Some(fail) => fail(item, location),
            None => Ok(()),
        }
    }
}

impl<I, L> Clone for Constraint<I, L> {
    fn clone(&self) -> Self {
        Constraint {
            test: Rc::clone(&self.test),
            fail: self.fail.clone(),
            label: self.label.clone(),
        }
    }
}

impl<I, L> fmt::Debug for Constraint<I, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("label", &self.label)
            .field("has_fail", &self.fail.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rando_core::RandoError;

    #[test]
    fn test_constraint_hooks() {
        let even = Constraint::<u32, u32>::new(|i, l| (i + l) % 2 == 0)
            .with_fail(|i, l| {
                Err(RandoError::ConstraintViolation {
                    label: "Even".into(),
                    item: i.to_string(),
                    location: l.to_string(),
                })
            })
            .with_label("Even");

        assert!(even.is_satisfied(&1, &3));
        assert!(!even.is_satisfied(&1, &2));
        assert!(even.on_violated(&1, &2).is_err());
        assert_eq!(even.clone().label(), Some("Even"));

        let lenient = Constraint::<u32, u32>::new(|_, _| false);
        assert_eq!(lenient.on_violated(&0, &0), Ok(()));
    }
}
