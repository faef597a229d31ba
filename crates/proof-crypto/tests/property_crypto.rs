//! Property-based tests covering §8's signature round-trip invariant:
//! verify(public_of(seed), message, sign(seed, message)) == VALID, and any
//! single-byte alteration of the message or signature yields INVALID.

use proof_crypto::{sign, verify, Keypair, Verdict};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A signature always verifies against its own key and message.
    #[test]
    fn sign_then_verify_is_always_valid(msg in prop::collection::vec(any::<u8>(), 0..256)) {
        let kp = Keypair::generate();
        let sig = sign(&kp.sk.0, &msg);
        prop_assert_eq!(verify(kp.vk.as_bytes(), &msg, &sig), Verdict::Valid);
    }

    /// Flipping any single byte of the message invalidates the signature.
    #[test]
    fn flipping_any_message_byte_invalidates(
        msg in prop::collection::vec(any::<u8>(), 1..256),
        idx_seed in any::<usize>(),
    ) {
        let kp = Keypair::generate();
        let sig = sign(&kp.sk.0, &msg);
        let idx = idx_seed % msg.len();
        let mut tampered = msg.clone();
        tampered[idx] ^= 0xff;
        prop_assert_eq!(verify(kp.vk.as_bytes(), &tampered, &sig), Verdict::Invalid);
    }

    /// Flipping any single byte of the signature invalidates it.
    #[test]
    fn flipping_any_signature_byte_invalidates(
        msg in prop::collection::vec(any::<u8>(), 0..256),
        idx in 0usize..64,
    ) {
        let kp = Keypair::generate();
        let mut sig = sign(&kp.sk.0, &msg);
        sig[idx] ^= 0xff;
        prop_assert_eq!(verify(kp.vk.as_bytes(), &msg, &sig), Verdict::Invalid);
    }

    /// A signature from a different keypair never verifies as valid.
    #[test]
    fn wrong_key_never_verifies(msg in prop::collection::vec(any::<u8>(), 0..256)) {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = sign(&kp1.sk.0, &msg);
        prop_assert_ne!(verify(kp2.vk.as_bytes(), &msg, &sig), Verdict::Valid);
    }
}
