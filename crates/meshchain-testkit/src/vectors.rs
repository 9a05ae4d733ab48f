//! Golden test vectors for deterministic verification.
//!
//! ID vectors pin the ID derivation. Payload vectors pin the canonical
//! encoding for metadata without keys, where no key material is involved.

use meshchain_core::{canonical_payload, generate_id, Metadata};

/// A known-answer vector for `generate_id`.
#[derive(Debug, Clone)]
pub struct IdVector {
    pub name: &'static str,
    pub local_id: &'static str,
    pub public_keys: &'static [&'static str],
    pub expected_id: &'static str,
}

/// A known-answer vector for the canonical payload.
#[derive(Debug, Clone)]
pub struct PayloadVector {
    pub name: &'static str,
    pub id: &'static str,
    pub local_id: &'static str,
    pub data: &'static [u8],
    /// Canonical bytes, hex.
    pub expected_payload: &'static str,
    /// SHA-256 of the canonical bytes, hex.
    pub expected_hash: &'static str,
}

pub fn id_vectors() -> Vec<IdVector> {
    vec![
        IdVector {
            name: "empty",
            local_id: "",
            public_keys: &[],
            expected_id: "e7ac0786-668e-0ff0-f02b-62bd04f45ff6",
        },
        IdVector {
            name: "local id only",
            local_id: "my-id",
            public_keys: &[],
            expected_id: "08290410-72f9-d6ce-f370-aca3162c2760",
        },
        IdVector {
            name: "single key",
            local_id: "",
            public_keys: &["a"],
            expected_id: "b5c5cc1f-be8f-a86a-78a8-9d5247010c2f",
        },
        IdVector {
            name: "two keys",
            local_id: "",
            public_keys: &["a", "b"],
            expected_id: "8b187574-61b8-f34c-33bf-a90b5b2a6431",
        },
        IdVector {
            name: "two keys reversed",
            local_id: "",
            public_keys: &["b", "a"],
            expected_id: "d787d2b7-6eb9-5358-7792-8907d17387fc",
        },
        IdVector {
            name: "named with three keys",
            local_id: "name",
            public_keys: &["key-1", "key-2", "key-3"],
            expected_id: "744c06ce-c58e-441b-0c13-f6793aaa40c3",
        },
        IdVector {
            name: "utf-8 local id",
            local_id: "héllo",
            public_keys: &["k"],
            expected_id: "76592e3b-c804-70ec-aaa3-ff3cbf8da5df",
        },
        // Separators are not escaped: these collide with their neighbours.
        IdVector {
            name: "colon inside key",
            local_id: "a",
            public_keys: &[":"],
            expected_id: "a21cc63b-015a-3323-ef82-8b0414f9690f",
        },
        IdVector {
            name: "colon inside local id",
            local_id: "a:",
            public_keys: &[],
            expected_id: "a21cc63b-015a-3323-ef82-8b0414f9690f",
        },
        IdVector {
            name: "comma inside key",
            local_id: "",
            public_keys: &["a,b"],
            expected_id: "8b187574-61b8-f34c-33bf-a90b5b2a6431",
        },
    ]
}

pub fn payload_vectors() -> Vec<PayloadVector> {
    vec![
        PayloadVector {
            name: "all empty",
            id: "",
            local_id: "",
            data: b"",
            expected_payload: "a200a30060016002800140",
            expected_hash: "d6ee16b9cff44b47127cb86dec18c66eda35aac0355c98c76c3c0f3b71e55776",
        },
        PayloadVector {
            name: "short id with data",
            id: "x",
            local_id: "",
            data: b"abc",
            expected_payload: "a200a3006178016002800143616263",
            expected_hash: "9322d55a6e06fec96d9f5ca03446b0536ea09d26f5549498036f3e9b9722b4a2",
        },
        PayloadVector {
            name: "id, local id and data",
            id: "id",
            local_id: "local",
            data: b"hello world",
            expected_payload: "a200a30062696401656c6f63616c0280014b68656c6c6f20776f726c64",
            expected_hash: "75d070cf025c60f9dbb4fd0d141e65c1ab2a5c46071fedc33889ba1d907fdd6a",
        },
    ]
}

/// Check every ID vector. Returns `(name, passed, actual)` per vector.
pub fn verify_id_vectors() -> Vec<(String, bool, String)> {
    id_vectors()
        .iter()
        .map(|v| {
            let actual = generate_id(v.local_id, v.public_keys);
            (v.name.to_string(), actual == v.expected_id, actual)
        })
        .collect()
}

/// Check every payload vector. Returns `(name, passed, actual payload hex)`.
pub fn verify_payload_vectors() -> Vec<(String, bool, String)> {
    payload_vectors()
        .iter()
        .map(|v| {
            let metadata = Metadata {
                id: v.id.to_string(),
                local_id: v.local_id.to_string(),
                public_keys: Vec::new(),
            };
            match canonical_payload(&metadata, v.data) {
                Ok(bytes) => {
                    let actual = hex::encode(&bytes);
                    let hash = meshchain_core::Sha256Hash::hash(&bytes).to_hex();
                    let passed = actual == v.expected_payload && hash == v.expected_hash;
                    (v.name.to_string(), passed, actual)
                }
                Err(e) => (v.name.to_string(), false, e.to_string()),
            }
        })
        .collect()
}
