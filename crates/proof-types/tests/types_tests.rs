use proof_types::{ContextItem, Digest32, ForensicCapsule, GatedContext};

#[test]
fn digest32_hex_roundtrips_through_json() {
    let d = Digest32([0x42; 32]);
    let json = serde_json::to_string(&d).unwrap();
    assert_eq!(json.len(), 66); // quotes + 64 hex chars
    let back: Digest32 = serde_json::from_str(&json).unwrap();
    assert_eq!(d, back);
}

#[test]
fn digest32_rejects_odd_length_hex() {
    assert!(Digest32::from_hex("abc").is_err());
}

#[test]
fn gated_context_preserves_item_order() {
    let items = vec![
        ContextItem {
            doc_id: "a".into(),
            content_hash: Digest32([1; 32]),
            timestamp: 10,
            source_id: "s".into(),
        },
        ContextItem {
            doc_id: "b".into(),
            content_hash: Digest32([2; 32]),
            timestamp: 20,
            source_id: "s".into(),
        },
    ];
    let gated = GatedContext {
        items: items.clone(),
        policy_id: "none".into(),
        boundary: 100,
        has_post_target: false,
    };
    assert_eq!(gated.items, items);
}

#[test]
fn capsule_round_trips_with_optional_fields_present() {
    let capsule = ForensicCapsule {
        t_run: 1_700_000_000,
        t_target: 2026,
        gate_policy_id: "strict".into(),
        model_id: "gpt-4".into(),
        hash_prompt: "deadbeef".into(),
        output_hash: "00".repeat(32),
        context_merkle_root: "11".repeat(32),
        artifact_type: Some("text".into()),
        mode: None,
        hash_alg: Some("sha256".into()),
        snapshot_hash: None,
        normalization_params_id: None,
        proof_input: None,
        proof_input_hash: None,
    };
    let json = serde_json::to_string(&capsule).unwrap();
    assert!(json.contains("artifact_type"));
    assert!(!json.contains("\"mode\""));
    let back: ForensicCapsule = serde_json::from_str(&json).unwrap();
    assert_eq!(back.model_id, "gpt-4");
}
