//! End-to-end container properties: round-trips, tamper detection,
//! fingerprint behavior, and framing edge cases.

use std::io::{Cursor, Read};

use proptest::prelude::*;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use encfile_codec::v1::{EncryptReader, KdfParams, HEADER_SIZE, TAG_SIZE};
use encfile_codec::{
    fingerprint, new_decrypter, new_encrypter, CodecError, Version, MAX_HEADER_SIZE, OVERHEAD,
    PREFERRED_VERSION,
};

fn drain(mut reader: Box<dyn Read>) -> Vec<u8> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    out
}

fn encrypt_container(plaintext: &[u8], password: &SecretString) -> Vec<u8> {
    drain(new_encrypter(Cursor::new(plaintext.to_vec()), password).unwrap())
}

fn decrypt_container(container: &[u8], password: &SecretString) -> std::io::Result<Vec<u8>> {
    let mut reader = new_decrypter(Cursor::new(container.to_vec()), password)?;
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

fn is_auth_failure(err: &std::io::Error) -> bool {
    matches!(
        err.get_ref().and_then(|e| e.downcast_ref::<CodecError>()),
        Some(CodecError::AuthenticationFailed)
    )
}

#[test]
fn scenario_hello_world() {
    let password = SecretString::from("correct1");
    let container = encrypt_container(b"hello world", &password);
    assert_eq!(container.len(), 11 + OVERHEAD);

    let plaintext = decrypt_container(&container, &password).unwrap();
    assert_eq!(plaintext, b"hello world");

    let err = decrypt_container(&container, &SecretString::from("wrongpass")).unwrap_err();
    assert!(is_auth_failure(&err), "wrong password must fail closed: {err}");

    // One byte short: either the framing check or the tag check must trip.
    let truncated = &container[..container.len() - 1];
    match new_decrypter(Cursor::new(truncated.to_vec()), &password) {
        Err(CodecError::TruncatedContainer { .. }) => {}
        Err(other) => panic!("unexpected open error: {other}"),
        Ok(mut reader) => {
            let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
            assert!(is_auth_failure(&err), "truncation must not verify: {err}");
        }
    }
}

#[test]
fn tampering_any_body_or_tag_byte_fails() {
    let password = SecretString::from("correct1");
    let container = encrypt_container(b"tamper target", &password);

    let body_start = 4 + HEADER_SIZE;
    let tag_start = container.len() - TAG_SIZE;
    for offset in [body_start, body_start + 7, tag_start, container.len() - 1] {
        let mut mutated = container.clone();
        mutated[offset] ^= 0x01;
        let err = decrypt_container(&mutated, &password).unwrap_err();
        assert!(
            is_auth_failure(&err),
            "flipped byte at {offset} must fail authentication, got: {err}"
        );
    }
}

#[test]
fn unknown_version_is_a_typed_error() {
    let password = SecretString::from("correct1");
    let mut container = encrypt_container(b"versioned", &password);
    container[..4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());

    match new_decrypter(Cursor::new(container), &password) {
        Err(CodecError::UnknownVersion(v)) => assert_eq!(v, 0xDEAD_BEEF),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unregistered version must not decrypt"),
    }
}

#[test]
fn preferred_version_tag_leads_the_container() {
    let password = SecretString::from("correct1");
    let container = encrypt_container(b"x", &password);
    assert_eq!(&container[..4], &PREFERRED_VERSION.to_le_bytes());
    assert_eq!(Version::from_le_bytes(container[..4].try_into().unwrap()), Version::V1);
}

#[test]
fn empty_input_round_trips_at_exact_overhead() {
    let password = SecretString::from("correct1");
    let container = encrypt_container(b"", &password);
    assert_eq!(container.len(), OVERHEAD);

    let plaintext = decrypt_container(&container, &password).unwrap();
    assert!(plaintext.is_empty());
}

#[test]
fn same_input_never_reuses_header_material() {
    let password = SecretString::from("correct1");
    let a = encrypt_container(b"same plaintext", &password);
    let b = encrypt_container(b"same plaintext", &password);
    // Fresh salt/nonce per encryption: headers and bodies both differ.
    assert_ne!(a[4..4 + HEADER_SIZE], b[4..4 + HEADER_SIZE]);
    assert_ne!(a[4 + HEADER_SIZE..], b[4 + HEADER_SIZE..]);
}

#[test]
fn fingerprint_matches_tagless_container_hash() {
    let password = SecretString::from("correct1");
    let plaintext = b"fingerprint me";
    let container = encrypt_container(plaintext, &password);

    let mut hasher = Sha256::new();
    let fp = fingerprint(
        &mut &plaintext[..],
        &mut &container[..],
        &password,
        &mut hasher,
    )
    .unwrap();

    let expected = Sha256::digest(&container[..container.len() - TAG_SIZE]);
    assert_eq!(fp, expected.to_vec());
}

#[test]
fn fingerprint_is_deterministic_and_sensitive() {
    let password = SecretString::from("correct1");
    let plaintext = b"stable content";
    let container = encrypt_container(plaintext, &password);

    let fp = |candidate: &[u8], pw: &SecretString| {
        let mut hasher = Sha256::new();
        fingerprint(&mut &candidate[..], &mut &container[..], pw, &mut hasher).unwrap()
    };

    assert_eq!(fp(plaintext, &password), fp(plaintext, &password));

    let mut altered = plaintext.to_vec();
    altered[0] ^= 0x01;
    assert_ne!(fp(&altered, &password), fp(plaintext, &password));

    assert_ne!(
        fp(plaintext, &SecretString::from("wrongpass")),
        fp(plaintext, &password)
    );
}

#[test]
fn fingerprint_needs_only_max_header_size_bytes() {
    let password = SecretString::from("correct1");
    let plaintext = b"prefix sufficiency";
    let container = encrypt_container(plaintext, &password);

    let fp_from = |fragment: &[u8]| {
        let mut hasher = Sha256::new();
        fingerprint(&mut &plaintext[..], &mut &fragment[..], &password, &mut hasher).unwrap()
    };

    let from_prefix = fp_from(&container[..MAX_HEADER_SIZE]);
    let from_full = fp_from(&container);
    assert_eq!(from_prefix, from_full);
}

#[test]
fn fingerprint_rejects_short_fragment() {
    let password = SecretString::from("correct1");
    let container = encrypt_container(b"short", &password);

    let mut hasher = Sha256::new();
    let err = fingerprint(
        &mut &b"short"[..],
        &mut &container[..MAX_HEADER_SIZE - 1],
        &password,
        &mut hasher,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::TruncatedContainer { .. }));
}

#[test]
fn decrypts_from_a_real_file() {
    use std::io::Write;

    let password = SecretString::from("correct1");
    let container = encrypt_container(b"on disk", &password);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&container).unwrap();
    file.flush().unwrap();

    let source = std::fs::File::open(file.path()).unwrap();
    let mut reader = new_decrypter(source, &password).unwrap();
    let mut plaintext = Vec::new();
    reader.read_to_end(&mut plaintext).unwrap();
    assert_eq!(plaintext, b"on disk");
}

// Round-trips through the registry decrypter with cheap Argon2id parameters,
// so arbitrary inputs stay affordable. The version tag is prepended by hand
// exactly as the registry's encrypter would.
fn encrypt_fast(plaintext: &[u8], password: &SecretString) -> Vec<u8> {
    let params = KdfParams {
        mem_cost_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    };
    let mut enc = EncryptReader::with_params(plaintext, password, params).unwrap();
    let mut container = Version::V1.to_le_bytes().to_vec();
    enc.read_to_end(&mut container).unwrap();
    container
}

proptest! {
    #[test]
    fn prop_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..4096),
                      password in "[a-zA-Z0-9]{6,24}") {
        let password = SecretString::from(password);
        let container = encrypt_fast(&plaintext, &password);
        prop_assert_eq!(container.len(), plaintext.len() + OVERHEAD);

        let recovered = decrypt_container(&container, &password).unwrap();
        prop_assert_eq!(recovered, plaintext);
    }

    #[test]
    fn prop_single_bit_flip_detected(plaintext in proptest::collection::vec(any::<u8>(), 1..512),
                                     seed in any::<u64>()) {
        let password = SecretString::from("proptest-pw");
        let mut container = encrypt_fast(&plaintext, &password);

        // Flip one bit anywhere in the body or tag region.
        let body_start = 4 + HEADER_SIZE;
        let span = container.len() - body_start;
        let offset = body_start + (seed as usize % span);
        let bit = (seed >> 32) as u32 % 8;
        container[offset] ^= 1 << bit;

        match new_decrypter(Cursor::new(container), &password) {
            Err(_) => {}
            Ok(mut reader) => {
                let result = reader.read_to_end(&mut Vec::new());
                prop_assert!(result.is_err(), "corrupted container must not verify");
            }
        }
    }
}
