use alloy::primitives::{keccak256, B256, U256};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};

/// Convert B256 to BN254 field element (reduced mod p).
pub fn b256_to_fr(value: B256) -> Fr {
    Fr::from_be_bytes_mod_order(value.as_ref())
}

/// Convert BN254 field element to B256.
pub fn fr_to_b256(value: Fr) -> B256 {
    let big_int = value.into_bigint();
    let bytes = big_int.to_bytes_be();
    B256::from_slice(&bytes)
}

/// Reduce an arbitrary 256-bit word into the BN254 scalar field.
pub fn reduce_to_field(value: B256) -> B256 {
    fr_to_b256(b256_to_fr(value))
}

/// Interpret a field word as an unsigned integer.
pub fn b256_to_u256(value: B256) -> U256 {
    U256::from_be_bytes(value.0)
}

/// Poseidon hash with 1 input.
/// Used for: identity_commitment = poseidon1(identity_secret)
pub fn poseidon1(a: B256) -> B256 {
    let mut hasher = Poseidon::<Fr>::new_circom(1).expect("Failed to create Poseidon hasher");
    let result = hasher
        .hash(&[b256_to_fr(a)])
        .expect("Failed to compute Poseidon hash");
    fr_to_b256(result)
}

/// Poseidon hash with 2 inputs.
/// Used for:
/// - identity_secret = poseidon2(identity_nullifier, identity_trapdoor)
/// - nullifier_hash = poseidon2(external_nullifier, identity_nullifier)
/// - merkle_node = poseidon2(left, right)
pub fn poseidon2(a: B256, b: B256) -> B256 {
    let mut hasher = Poseidon::<Fr>::new_circom(2).expect("Failed to create Poseidon hasher");
    let inputs = [b256_to_fr(a), b256_to_fr(b)];
    let result = hasher
        .hash(&inputs)
        .expect("Failed to compute Poseidon hash");
    fr_to_b256(result)
}

/// Hash an arbitrary byte string into the field the way the on-chain verifier
/// does: `keccak256(bytes) >> 8`.
pub fn hash_to_field(bytes: &[u8]) -> B256 {
    let digest = b256_to_u256(keccak256(bytes));
    B256::from(digest >> 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poseidon2_circom_vector() {
        // poseidon([1, 2]) from circomlibjs
        let one = B256::from(U256::from(1u64));
        let two = B256::from(U256::from(2u64));
        let expected: U256 =
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
                .parse()
                .unwrap();
        assert_eq!(b256_to_u256(poseidon2(one, two)), expected);
    }

    #[test]
    fn test_poseidon1_deterministic() {
        let input = B256::repeat_byte(0x11);
        assert_eq!(poseidon1(input), poseidon1(input));
        assert_ne!(poseidon1(input), poseidon1(B256::repeat_byte(0x12)));
    }

    #[test]
    fn test_poseidon2_order_matters() {
        let a = B256::repeat_byte(0x01);
        let b = B256::repeat_byte(0x02);
        assert_ne!(poseidon2(a, b), poseidon2(b, a));
    }

    #[test]
    fn test_reduce_to_field_is_idempotent() {
        let wide = B256::repeat_byte(0xff);
        let reduced = reduce_to_field(wide);
        assert_ne!(wide, reduced);
        assert_eq!(reduce_to_field(reduced), reduced);
    }

    #[test]
    fn test_hash_to_field_clears_top_byte() {
        let hashed = hash_to_field(b"Hello ZKU");
        assert_eq!(hashed[0], 0);
        assert_eq!(hashed, hash_to_field(b"Hello ZKU"));
        assert_ne!(hashed, hash_to_field(b"Hi"));
    }
}
