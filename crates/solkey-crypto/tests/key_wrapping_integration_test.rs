//! Integration tests for wallet-derived key wrapping.
//!
//! This test suite validates:
//! - Signature-derived keypairs are reproducible across sessions
//! - Wrap/unwrap correctness and wrong-key rejection
//! - Tamper detection on payloads and wrapped keys
//! - Ed25519 to X25519 conversion agreement
//! - Wire encoding errors stay distinct from integrity failures

use solkey_crypto::{
    address_to_x25519, cipher, public_key_to_x25519, unwrap, wrap_for_recipient, ConvertedKeypair,
    CryptoError, Encoding, EncryptedPayload, KdfParams, SignatureKeyDeriver, SymmetricKey,
    WalletKeypair, WalletSignature, WrapMethod, DERIVATION_MESSAGE,
};

fn deriver() -> SignatureKeyDeriver {
    SignatureKeyDeriver::new(KdfParams::insecure_fast())
}

// ============================================================================
// Test Category 1: Deterministic Derivation
// ============================================================================

#[test]
fn test_same_wallet_recovers_same_keypair_across_sessions() {
    let secret = WalletKeypair::generate().secret_bytes();

    // Session one
    let wallet = WalletKeypair::from_secret_bytes(secret);
    let sig1 = wallet.sign(DERIVATION_MESSAGE.as_bytes());
    let kp1 = deriver().derive_recipient_keypair(sig1.as_bytes()).unwrap();
    drop(wallet);

    // Session two, wallet reconnected
    let wallet = WalletKeypair::from_secret_bytes(secret);
    let sig2 = wallet.sign(DERIVATION_MESSAGE.as_bytes());
    let kp2 = deriver().derive_recipient_keypair(sig2.as_bytes()).unwrap();

    assert_eq!(sig1, sig2);
    assert_eq!(kp1.public, kp2.public);
}

#[test]
fn test_different_message_gives_different_keypair() {
    let wallet = WalletKeypair::generate();
    let a = wallet.sign(DERIVATION_MESSAGE.as_bytes());
    let b = wallet.sign(b"some-other-message");

    let ka = deriver().derive_recipient_keypair(a.as_bytes()).unwrap();
    let kb = deriver().derive_recipient_keypair(b.as_bytes()).unwrap();
    assert_ne!(ka.public, kb.public);
}

#[test]
fn test_record_wrapped_last_session_opens_this_session() {
    let wallet = WalletKeypair::generate();
    let enrolled = deriver()
        .derive_recipient_keypair(wallet.sign(DERIVATION_MESSAGE.as_bytes()).as_bytes())
        .unwrap()
        .public;

    let key = SymmetricKey::generate();
    let record = wrap_for_recipient(&key, &enrolled, WrapMethod::SignatureDerived).unwrap();

    let later = deriver()
        .derive_recipient_keypair(wallet.sign(DERIVATION_MESSAGE.as_bytes()).as_bytes())
        .unwrap();
    assert_eq!(unwrap(&record, &later).unwrap().as_bytes(), key.as_bytes());
}

// ============================================================================
// Test Category 2: Wrap / Unwrap
// ============================================================================

#[test]
fn test_unwrap_with_other_wallet_is_access_denied() {
    let alice = WalletKeypair::generate();
    let mallory = WalletKeypair::generate();

    let alice_kp = deriver()
        .derive_recipient_keypair(alice.sign(DERIVATION_MESSAGE.as_bytes()).as_bytes())
        .unwrap();
    let mallory_kp = deriver()
        .derive_recipient_keypair(mallory.sign(DERIVATION_MESSAGE.as_bytes()).as_bytes())
        .unwrap();

    let key = SymmetricKey::generate();
    let record = wrap_for_recipient(&key, &alice_kp.public, WrapMethod::SignatureDerived).unwrap();

    for _ in 0..8 {
        assert!(matches!(
            unwrap(&record, &mallory_kp),
            Err(CryptoError::AccessDenied)
        ));
    }
}

#[test]
fn test_every_bit_flip_in_wrapped_key_is_rejected() {
    let kp = deriver().derive_recipient_keypair(&[9u8; 64]).unwrap();
    let key = SymmetricKey::generate();
    let record = wrap_for_recipient(&key, &kp.public, WrapMethod::SignatureDerived).unwrap();

    for byte in 0..record.wrapped_key.len() {
        let mut bad = record.clone();
        bad.wrapped_key[byte] ^= 0x04;
        assert!(
            matches!(unwrap(&bad, &kp), Err(CryptoError::AccessDenied)),
            "byte {} flip was not rejected",
            byte
        );
    }
}

#[test]
fn test_truncated_wrapped_key_is_rejected() {
    let kp = deriver().derive_recipient_keypair(&[9u8; 64]).unwrap();
    let key = SymmetricKey::generate();
    let mut record = wrap_for_recipient(&key, &kp.public, WrapMethod::SignatureDerived).unwrap();
    record.wrapped_key.truncate(20);

    assert!(matches!(unwrap(&record, &kp), Err(CryptoError::AccessDenied)));
}

// ============================================================================
// Test Category 3: Payload Integrity
// ============================================================================

#[test]
fn test_every_bit_of_iv_and_tag_is_checked() {
    let key = SymmetricKey::generate();
    let payload = cipher::encrypt(b"API_KEY=sk_live_123", &key).unwrap();

    for byte in 0..payload.iv.len() {
        let mut bad = payload.clone();
        bad.iv[byte] ^= 0x01;
        assert!(matches!(
            cipher::decrypt(&bad, &key),
            Err(CryptoError::IntegrityCheckFailed)
        ));
    }
    for byte in 0..payload.auth_tag.len() {
        let mut bad = payload.clone();
        bad.auth_tag[byte] ^= 0x01;
        assert!(matches!(
            cipher::decrypt(&bad, &key),
            Err(CryptoError::IntegrityCheckFailed)
        ));
    }
}

#[test]
fn test_swapped_iv_between_secrets_fails() {
    let key = SymmetricKey::generate();
    let a = cipher::encrypt(b"first", &key).unwrap();
    let b = cipher::encrypt(b"second", &key).unwrap();

    let mixed = EncryptedPayload {
        ciphertext: a.ciphertext.clone(),
        iv: b.iv,
        auth_tag: a.auth_tag,
    };
    assert!(matches!(
        cipher::decrypt(&mixed, &key),
        Err(CryptoError::IntegrityCheckFailed)
    ));
}

// ============================================================================
// Test Category 4: Key Conversion
// ============================================================================

#[test]
fn test_converted_key_roundtrip_via_address_string() {
    let wallet = WalletKeypair::generate();
    let address = wallet.address().to_string();

    let recipient = address_to_x25519(&address.parse().unwrap()).unwrap();
    let key = SymmetricKey::generate();
    let record = wrap_for_recipient(&key, &recipient, WrapMethod::ConvertedWalletKey).unwrap();

    let opened = unwrap(&record, &ConvertedKeypair::from_wallet(&wallet)).unwrap();
    assert_eq!(opened.as_bytes(), key.as_bytes());
}

#[test]
fn test_conversion_of_malformed_keys_fails_closed() {
    assert!(public_key_to_x25519(b"short").is_none());
    assert!(public_key_to_x25519(&[0u8; 64]).is_none());
}

#[test]
fn test_converted_record_not_openable_by_other_wallet() {
    let alice = WalletKeypair::generate();
    let eve = WalletKeypair::generate();

    let recipient = address_to_x25519(&alice.address()).unwrap();
    let key = SymmetricKey::generate();
    let record = wrap_for_recipient(&key, &recipient, WrapMethod::ConvertedWalletKey).unwrap();

    assert!(matches!(
        unwrap(&record, &ConvertedKeypair::from_wallet(&eve)),
        Err(CryptoError::AccessDenied)
    ));
}

// ============================================================================
// Test Category 5: Wire Encodings
// ============================================================================

#[test]
fn test_hex_signature_decoded_as_base64_is_not_integrity_error() {
    let wallet = WalletKeypair::generate();
    let sig = wallet.sign(DERIVATION_MESSAGE.as_bytes());
    let as_hex = Encoding::Hex.encode(sig.as_bytes());

    let err = WalletSignature::decode(&as_hex, Encoding::Base64).unwrap_err();
    assert!(!matches!(err, CryptoError::IntegrityCheckFailed));
    assert!(matches!(
        err,
        CryptoError::Derivation(_) | CryptoError::Encoding { .. }
    ));
}

#[test]
fn test_payload_fields_in_hex_roundtrip() {
    let key = SymmetricKey::generate();
    let payload = cipher::encrypt(b"{\"a\":1}", &key).unwrap();

    let restored = EncryptedPayload::from_encoded(
        &Encoding::Hex.encode(&payload.ciphertext),
        &Encoding::Hex.encode(&payload.iv),
        &Encoding::Hex.encode(&payload.auth_tag),
        Encoding::Hex,
    )
    .unwrap();

    assert_eq!(cipher::decrypt(&restored, &key).unwrap(), b"{\"a\":1}");
}

#[test]
fn test_wrapped_key_json_shape() {
    let kp = deriver().derive_recipient_keypair(&[2u8; 64]).unwrap();
    let record =
        wrap_for_recipient(&SymmetricKey::generate(), &kp.public, WrapMethod::SignatureDerived)
            .unwrap();

    let json = serde_json::to_value(&record).unwrap();
    for field in ["wrapped_key", "nonce", "ephemeral_public_key", "method"] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }
    let nonce = Encoding::Base64
        .decode("nonce", json["nonce"].as_str().unwrap())
        .unwrap();
    assert_eq!(nonce.len(), 24);
}
