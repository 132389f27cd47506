use limero_runtime::{message, EnqueueError, Envelope, Mailbox, Message, MsgId};
use proptest::prelude::*;

#[derive(Debug, PartialEq)]
struct Seq(usize);
message!(Seq);

proptest! {
    #[test]
    fn prop_capacity_is_exact(capacity in 1usize..64, extra in 1usize..8) {
        let (tx, mut mailbox) = Mailbox::new(capacity);
        for i in 0..capacity {
            prop_assert!(tx.try_enqueue(Envelope::new(Seq(i))).is_ok());
        }
        for i in 0..extra {
            match tx.try_enqueue(Envelope::new(Seq(capacity + i))) {
                Err(EnqueueError::Full(env)) => {
                    prop_assert_eq!(env.take::<Seq>().ok(), Some(Seq(capacity + i)));
                }
                other => prop_assert!(false, "expected full, got {:?}", other),
            }
        }

        // one dequeue frees exactly one slot, and order is preserved
        prop_assert_eq!(mailbox.try_dequeue().and_then(|e| e.take::<Seq>().ok()), Some(Seq(0)));
        prop_assert!(tx.try_enqueue(Envelope::new(Seq(usize::MAX))).is_ok());
        prop_assert!(matches!(tx.try_enqueue(Envelope::new(Seq(0))), Err(EnqueueError::Full(_))));

        for i in 1..capacity {
            prop_assert_eq!(mailbox.try_dequeue().and_then(|e| e.take::<Seq>().ok()), Some(Seq(i)));
        }
        prop_assert_eq!(mailbox.drain(), 1);
    }
}

#[test]
fn declared_id_matches_name() {
    assert_eq!(Seq::ID, MsgId::of("Seq"));
}
