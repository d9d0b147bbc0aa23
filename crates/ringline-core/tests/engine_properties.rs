//! Property tests for the call engine.
//!
//! Random action sequences must keep the machine coherent: exactly one
//! state at a time, a held call iff ringing, and terminal outcomes frozen
//! until consumed.

use proptest::prelude::*;

use ringline_core::{ActionToken, CallEngine, CallState, IncomingCall};

#[derive(Debug, Clone)]
enum Op {
    Begin,
    Accept,
    Reject,
    Timeout,
    ExternalCancel,
    NoOp,
    Consume,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Begin),
        Just(Op::Accept),
        Just(Op::Reject),
        Just(Op::Timeout),
        Just(Op::ExternalCancel),
        Just(Op::NoOp),
        Just(Op::Consume),
    ]
}

proptest! {
    #[test]
    fn action_sequences_keep_the_machine_coherent(
        ops in prop::collection::vec(op_strategy(), 0..48)
    ) {
        let mut engine = CallEngine::new();
        // Model mirror: the state the machine must be in after each op.
        let mut expected = CallState::Idle;

        for op in ops {
            match op {
                Op::Begin => {
                    let result = engine.begin(IncomingCall::new(None, None));
                    if expected == CallState::Idle {
                        prop_assert!(result.is_ok());
                        expected = CallState::Ringing;
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
                Op::Accept | Op::Reject | Op::Timeout | Op::ExternalCancel => {
                    let (token, outcome) = match op {
                        Op::Accept => (ActionToken::Accept, CallState::Accepted),
                        Op::Reject => (ActionToken::Reject, CallState::Rejected),
                        Op::Timeout => (ActionToken::Timeout, CallState::TimedOut),
                        _ => (ActionToken::ExternalCancel, CallState::Cancelled),
                    };
                    let result = engine.apply(token);
                    if expected == CallState::Ringing {
                        prop_assert!(result.is_ok());
                        expected = outcome;
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
                Op::NoOp => {
                    prop_assert!(engine.apply(ActionToken::NoOp).is_ok());
                }
                Op::Consume => {
                    let consumed = engine.consume();
                    if expected.is_terminal() {
                        prop_assert_eq!(consumed, Some(expected));
                        expected = CallState::Idle;
                    } else {
                        prop_assert_eq!(consumed, None);
                    }
                }
            }

            prop_assert_eq!(engine.state(), expected);
            prop_assert_eq!(
                engine.active_call().is_some(),
                expected == CallState::Ringing
            );
        }
    }

    #[test]
    fn a_ringing_call_resolves_exactly_once(
        resolvers in prop::collection::vec(0usize..4, 1..12)
    ) {
        let mut engine = CallEngine::new();
        engine.begin(IncomingCall::new(None, None)).unwrap();

        let mut wins = 0;
        for pick in resolvers {
            let token = match pick {
                0 => ActionToken::Accept,
                1 => ActionToken::Reject,
                2 => ActionToken::Timeout,
                _ => ActionToken::ExternalCancel,
            };
            if engine.apply(token).is_ok() {
                wins += 1;
            }
        }

        prop_assert_eq!(wins, 1);
        prop_assert!(engine.state().is_terminal());
    }
}
