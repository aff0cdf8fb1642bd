//! Model-based tests: random operation sequences are executed against both
//! the Hat and a plain `Vec`, with the structural invariants audited after
//! every step.

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::failure::Failure;
use crate::hat::{DefaultHatHooks, Doubling, Fixed, Hat, Schedule};

/// Operations to test against both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Push(i32),
    Pop,
    Set(u16, i32),
    Get(u16),
    Clear,
}

/// Test harness executing actions on both the Hat and the model.
struct Test<S: Schedule> {
    hat: Hat<i32, S, DefaultHatHooks>,
    model: Vec<i32>,
}

impl<S: Schedule> Test<S> {
    fn new() -> Self {
        Test {
            hat: Hat::new(),
            model: Vec::new(),
        }
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::Push(value) => {
                self.hat.push(value);
                self.model.push(value);
            }
            Action::Pop => {
                assert_eq!(self.model.pop(), self.hat.pop());
            }
            Action::Set(at, value) => {
                if self.model.is_empty() {
                    assert_eq!(Err(Failure::OutOfBounds), self.hat.try_set(at as usize, value));
                } else {
                    let at = at as usize % self.model.len();
                    self.hat.set(at, value);
                    self.model[at] = value;
                }
            }
            Action::Get(at) => {
                let at = at as usize;
                assert_eq!(self.model.get(at), self.hat.get(at));
            }
            Action::Clear => {
                self.hat.clear();
                self.model.clear();
            }
        }

        self.hat.check_invariants();
        assert_eq!(self.model.len(), self.hat.len());
    }

    fn finish(self) {
        for (index, expected) in self.model.iter().enumerate() {
            assert_eq!(Some(expected), self.hat.get(index));
        }

        assert_eq!(self.model.iter().sum::<i32>(), self.hat.iter().sum::<i32>());
    }
}

fn run<S: Schedule>(actions: Vec<Action>) {
    let mut test = Test::<S>::new();

    for action in actions {
        test.execute(action);
    }

    test.finish();
}

proptest! {
    #[test]
    fn doubling_matches_model(actions: Vec<Action>) {
        run::<Doubling>(actions);
    }

    #[test]
    fn fixed_2_matches_model(actions: Vec<Action>) {
        run::<Fixed<2>>(actions);
    }

    #[test]
    fn fixed_5_matches_model(actions: Vec<Action>) {
        run::<Fixed<5>>(actions);
    }

    #[test]
    fn doubling_drain_after_growth(length in 0usize..2_000) {
        let mut test = Test::<Doubling>::new();

        for i in 0..length {
            test.execute(Action::Push(i as i32));
        }

        for _ in 0..length {
            test.execute(Action::Pop);
        }

        test.execute(Action::Pop);
        test.finish();
    }
}
